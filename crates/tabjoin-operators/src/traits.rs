//! Row operator trait + per-row outcomes.
//!
//! The exec runtime calls `apply(...)` on each configured operator for every
//! row, in order, and turns `Outcome::Skip` into a warning.

use tabjoin_core::row::Row;
use thiserror::Error;

use crate::expr::EvalError;

/// Result of one operator on one row: the value, or why the row was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Value(T),
    Skip(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("invalid column expression: {0}")]
    Expression(#[from] EvalError),

    #[error("aggregate column {column} value '{value}' is not an integer")]
    NotInteger { column: usize, value: String },
}

/// Trait that all per-row operators implement.
///
/// Invariants:
/// - `apply` never fails the run; recoverable problems are `Outcome::Skip`.
/// - A skipped row is left exactly as it was passed in.
pub trait RowOperator {
    /// Human-readable operator name (stable, used in warnings).
    fn name(&self) -> &'static str;

    /// Process one row in place.
    fn apply(&mut self, row: &mut Row) -> Outcome<()>;
}
