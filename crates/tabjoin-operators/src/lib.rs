#![forbid(unsafe_code)]
//! tabjoin-operators: per-row operators (derived column, aggregate), the
//! hash join, and the width tracker used to render aligned output.
//!
//! Design intent:
//! - Pure and synchronous; no IO and no logging here.
//! - Per-row failures come back as `Outcome::Skip`, never as `Err`, so the
//!   caller can warn and keep streaming.
//! - The join side is staged: `SideTable` and `JoinIndex` are built once and
//!   only read afterwards; all mutable join state lives in `HashJoin`.

pub mod traits;

pub mod aggregate;
pub mod expr;
pub mod layout;

pub mod join;

pub use aggregate::{Accumulator, AggregateError, AggregateOp, ColumnAggregate};
pub use expr::{parse_expression, ColumnExpr, DerivedColumn, EvalError, DEFAULT_OPERATORS};
pub use join::{HashJoin, JoinIndex, JoinStats, SideTable};
pub use layout::{render, ColumnSelection, WidthTable};
pub use traits::{Outcome, RowOperator, SkipReason};
