//! Multi-valued key → side-row positions map.

use std::collections::HashMap;

use super::SideTable;

/// Built once from a `SideTable`; there is no way to mutate it afterwards.
#[derive(Debug, Clone)]
pub struct JoinIndex {
    key_column: usize,
    positions: HashMap<String, Vec<usize>>,
    indexed_rows: usize,
}

impl JoinIndex {
    /// Index every side row by its `key_column` field. Rows too short to have
    /// a key are left out of the index but stay in the table.
    pub fn build(side: &SideTable, key_column: usize) -> Self {
        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        let mut indexed_rows = 0;
        for (pos, row) in side.rows().iter().enumerate() {
            if let Some(key) = row.get(key_column) {
                positions.entry(key.to_string()).or_default().push(pos);
                indexed_rows += 1;
            }
        }
        Self {
            key_column,
            positions,
            indexed_rows,
        }
    }

    pub fn key_column(&self) -> usize {
        self.key_column
    }

    /// Side positions carrying `key`, in insertion order. Empty if none.
    pub fn lookup(&self, key: &str) -> &[usize] {
        self.positions.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct keys.
    pub fn distinct_keys(&self) -> usize {
        self.positions.len()
    }

    /// Number of side rows that made it into the index.
    pub fn indexed_rows(&self) -> usize {
        self.indexed_rows
    }
}
