//! Streaming readers that turn delimited lines into `Row`s.

pub mod delimited;
