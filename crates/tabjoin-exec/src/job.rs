//! YAML job files: a saved set of run options.
//!
//! Example:
//! ```yaml
//! separator: ","
//! columns: [0, 1, 4]
//! expression: "col1*col3"
//! aggregate: { op: avg, column: 4 }
//! join: { mode: outer, column: 0, path: "lookup.csv" }
//! ```
//!
//! Every key is optional. Applying a job file overrides only what it sets.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use tabjoin_core::config::{parse_separator, AggregateConfig, JoinConfig, JoinMode, RunConfig};

use crate::runtime::ExecError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobFile {
    #[serde(default)]
    pub separator: Option<String>,
    #[serde(default)]
    pub columns: Option<Vec<usize>>,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub aggregate: Option<AggregateConfig>,
    #[serde(default)]
    pub join: Option<JoinDef>,
    #[serde(default)]
    pub read_buffer_bytes: Option<usize>,
}

/// Join section as written. `mode` stays a string so an unknown mode is a
/// configuration error rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinDef {
    pub mode: String,
    pub column: usize,
    pub path: PathBuf,
}

pub fn parse_job_file(yaml: &str) -> Result<JobFile, ExecError> {
    serde_yaml::from_str(yaml).map_err(|e| ExecError::Job(e.to_string()))
}

/// Read a job file. Relative side-table paths resolve against the file's directory.
pub fn load_job_file(path: &Path) -> Result<JobFile, ExecError> {
    let yaml = fs::read_to_string(path)
        .map_err(|e| ExecError::Job(format!("cannot read {}: {e}", path.display())))?;
    let mut job = parse_job_file(&yaml)?;
    if let (Some(join), Some(dir)) = (job.join.as_mut(), path.parent()) {
        if join.path.is_relative() {
            join.path = dir.join(&join.path);
        }
    }
    Ok(job)
}

impl JobFile {
    /// Layer this job over `cfg`.
    pub fn apply(&self, cfg: &mut RunConfig) -> Result<(), ExecError> {
        if let Some(sep) = &self.separator {
            cfg.separator = parse_separator(sep)?;
        }
        if let Some(cols) = &self.columns {
            cfg.columns = cols.clone();
        }
        if let Some(expr) = &self.expression {
            cfg.expression = Some(expr.clone());
        }
        if let Some(agg) = &self.aggregate {
            cfg.aggregate = Some(agg.clone());
        }
        if let Some(join) = &self.join {
            cfg.join = Some(JoinConfig {
                mode: join.mode.parse::<JoinMode>()?,
                column: join.column,
                path: join.path.clone(),
            });
        }
        if let Some(bytes) = self.read_buffer_bytes {
            cfg.read_buffer_bytes = bytes;
        }
        Ok(())
    }
}
