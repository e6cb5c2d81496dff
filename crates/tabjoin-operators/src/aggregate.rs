//! Single-column aggregate: collect integers, reduce once at the end.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tabjoin_core::row::Row;
use thiserror::Error;

use crate::expr::parse_int;
use crate::traits::{Outcome, RowOperator, SkipReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateOp {
    Average,
    Minimum,
    Maximum,
    Median,
}

impl FromStr for AggregateOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avg" => Ok(AggregateOp::Average),
            "min" => Ok(AggregateOp::Minimum),
            "max" => Ok(AggregateOp::Maximum),
            "med" => Ok(AggregateOp::Median),
            other => Err(format!("unknown aggregate '{other}' (expected avg, min, max or med)")),
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AggregateOp::Average => "avg",
            AggregateOp::Minimum => "min",
            AggregateOp::Maximum => "max",
            AggregateOp::Median => "med",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("cannot compute {op}: no values were accumulated")]
    EmptyAccumulator { op: AggregateOp },
}

#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    values: Vec<i64>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accumulate(&mut self, value: i64) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn reduce(&self, op: AggregateOp) -> Result<i64, AggregateError> {
        if self.values.is_empty() {
            return Err(AggregateError::EmptyAccumulator { op });
        }
        Ok(match op {
            AggregateOp::Average => average(&self.values),
            AggregateOp::Minimum => self.values.iter().copied().min().unwrap_or_default(),
            AggregateOp::Maximum => self.values.iter().copied().max().unwrap_or_default(),
            AggregateOp::Median => median(&self.values),
        })
    }
}

/// Mean truncated toward zero. Sums in i128 so the total cannot overflow.
fn average(values: &[i64]) -> i64 {
    let sum: i128 = values.iter().map(|&v| v as i128).sum();
    (sum / values.len() as i128) as i64
}

/// Element at n/2 of the sorted values: the upper median for even n.
fn median(values: &[i64]) -> i64 {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    sorted[sorted.len() / 2]
}

/// Feeds one column of every row into an `Accumulator`.
#[derive(Debug, Clone)]
pub struct ColumnAggregate {
    pub op: AggregateOp,
    pub column: usize,
    acc: Accumulator,
}

impl ColumnAggregate {
    pub fn new(op: AggregateOp, column: usize) -> Self {
        Self {
            op,
            column,
            acc: Accumulator::new(),
        }
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.acc
    }

    pub fn finish(&self) -> Result<i64, AggregateError> {
        self.acc.reduce(self.op)
    }
}

impl RowOperator for ColumnAggregate {
    fn name(&self) -> &'static str {
        "aggregate"
    }

    fn apply(&mut self, row: &mut Row) -> Outcome<()> {
        // Rows too short for the target column do not take part.
        let Some(value) = row.get(self.column) else {
            return Outcome::Value(());
        };
        match parse_int(value) {
            Some(v) => {
                self.acc.accumulate(v);
                Outcome::Value(())
            }
            None => Outcome::Skip(SkipReason::NotInteger {
                column: self.column,
                value: value.to_string(),
            }),
        }
    }
}
