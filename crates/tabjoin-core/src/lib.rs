#![forbid(unsafe_code)]
//! tabjoin-core: rows, the tokenizer, run configuration and core errors.
//!
//! Everything here is pure data plus the line tokenizer. No IO, no logging;
//! the operators and exec crates build on these types.

pub mod config;
pub mod error;
pub mod row;

pub use config::{AggregateConfig, JoinConfig, JoinMode, RunConfig};
pub use error::{Error, Result};
pub use row::{split_row, tokenize, OutputRow, Row, RowKind};
