#![forbid(unsafe_code)]
//! tabjoin-exec: the staged pipeline runtime, run reports, YAML job files and
//! phase metrics.
//!
//! The runtime executes strictly sequentially: side table and index first,
//! then the primary pass, the join pass, the width pass, and only then
//! rendering.

pub mod job;
pub mod metrics;
pub mod report;
pub mod runtime;

pub use job::{load_job_file, parse_job_file, JobFile};
pub use report::{AggregateOutcome, RunReport, Warning};
pub use runtime::{Engine, ExecError, RunOutput};
