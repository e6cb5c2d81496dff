//! What a run produced besides the table itself.

use std::fmt;

use tabjoin_operators::{AggregateError, AggregateOp, JoinStats, SkipReason};

/// One recovered per-row problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// 1-based row number in the stream the operator was applied to.
    pub row: usize,
    pub operator: &'static str,
    pub reason: SkipReason,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}, skipping", self.row, self.reason)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOutcome {
    pub op: AggregateOp,
    pub result: Result<i64, AggregateError>,
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub rows_emitted: usize,
    pub warnings: Vec<Warning>,
    pub aggregate: Option<AggregateOutcome>,
    pub join: Option<JoinStats>,
}

impl RunReport {
    /// The empty-accumulator failure, if the aggregate could not be produced.
    pub fn aggregate_error(&self) -> Option<&AggregateError> {
        self.aggregate.as_ref().and_then(|a| a.result.as_ref().err())
    }
}
