//! Writers for rendered output.

pub mod table;
