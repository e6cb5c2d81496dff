#![forbid(unsafe_code)]
//! tabjoin-io: line readers for the primary stream and the side
//! table, and the writer that emits aligned table lines.

pub mod error;
pub mod readers;
pub mod writers;

pub use error::{Error, Result};
pub use readers::delimited::{read_side_table, DelimitedReader};
pub use writers::table::TableWriter;
