//! Index-based equi-join of primary rows against a materialized side table.
//!
//! Two stages:
//! 1. `SideTable::from_rows` + `JoinIndex::build` (read-only afterwards).
//! 2. `HashJoin::probe` per primary row, then `HashJoin::finish`.

pub mod hash;
pub mod index;

pub use hash::{HashJoin, JoinStats};
pub use index::JoinIndex;

use tabjoin_core::row::Row;

use crate::layout::WidthTable;

/// The fully loaded side table and the widths of its own columns.
#[derive(Debug, Clone, Default)]
pub struct SideTable {
    rows: Vec<Row>,
    widths: WidthTable,
}

impl SideTable {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut widths = WidthTable::new();
        for row in &rows {
            widths.observe(row);
        }
        Self { rows, widths }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn widths(&self) -> &WidthTable {
        &self.widths
    }
}
