//! Run configuration that downstream crates can serialize/deserialize.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Join semantics. Exactly one may be active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinMode {
    /// Emit side ++ primary for every key match; unmatched rows vanish.
    Inner,
    /// Emit primary ++ side per match, unmatched primary rows unchanged,
    /// then every side row that never matched behind empty padding.
    Outer,
}

impl FromStr for JoinMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" | "innerjoin" => Ok(JoinMode::Inner),
            "outer" | "outerjoin" => Ok(JoinMode::Outer),
            other => Err(Error::Config(format!(
                "join mode '{other}' is neither inner nor outer"
            ))),
        }
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinMode::Inner => write!(f, "inner"),
            JoinMode::Outer => write!(f, "outer"),
        }
    }
}

/// Requested aggregate. The operator name is resolved by the operators crate;
/// an unknown name disables aggregation instead of failing the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateConfig {
    pub op: String,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinConfig {
    pub mode: JoinMode,
    /// Key column, applied to both the side table and the primary rows.
    pub column: usize,
    /// Side-table file, read fully before the primary stream.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Field separator for both inputs.
    pub separator: char,

    /// Column positions to print. Empty means all of them.
    pub columns: Vec<usize>,

    /// Derived-column expression such as `col0+col1`.
    pub expression: Option<String>,

    pub aggregate: Option<AggregateConfig>,

    pub join: Option<JoinConfig>,

    /// Capacity of the buffered readers in bytes.
    pub read_buffer_bytes: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            separator: ',',
            columns: Vec::new(),
            expression: None,
            aggregate: None,
            join: None,
            read_buffer_bytes: 64 * 1024,
        }
    }
}

impl RunConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `TABJOIN_SEPARATOR`: single separator character
    /// - `TABJOIN_COLUMNS`: comma-separated column positions to print
    /// - `TABJOIN_READ_BUFFER_BYTES`: reader buffer capacity
    ///
    /// Values that do not parse are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("TABJOIN_SEPARATOR") {
            if let Ok(c) = parse_separator(&s) {
                cfg.separator = c;
            }
        }

        if let Ok(s) = std::env::var("TABJOIN_COLUMNS") {
            if let Ok(cols) = parse_columns(&s) {
                cfg.columns = cols;
            }
        }

        if let Ok(s) = std::env::var("TABJOIN_READ_BUFFER_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.read_buffer_bytes = v;
            }
        }

        cfg
    }

    /// Reject settings no run can honour.
    pub fn validate(&self) -> Result<()> {
        if matches!(self.separator, '\n' | '\r') {
            return Err(Error::Config("separator cannot be a line break".into()));
        }
        if self.read_buffer_bytes == 0 {
            return Err(Error::Config("read buffer must be at least one byte".into()));
        }
        if let Some(join) = &self.join {
            if join.path.as_os_str().is_empty() {
                return Err(Error::Config(format!(
                    "{} join requested without a side-table path",
                    join.mode
                )));
            }
        }
        Ok(())
    }
}

/// Parse a separator given as exactly one character (`\t` is accepted for tab).
pub fn parse_separator(s: &str) -> Result<char> {
    if s == "\\t" {
        return Ok('\t');
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(Error::Config(format!(
            "separator must be a single character, got '{s}'"
        ))),
    }
}

/// Parse `"0,2,5"` into column positions.
pub fn parse_columns(s: &str) -> Result<Vec<usize>> {
    s.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| {
            c.parse::<usize>()
                .map_err(|_| Error::Config(format!("invalid column index '{c}'")))
        })
        .collect()
}
