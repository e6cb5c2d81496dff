//! Column width tracking and fixed-width rendering.
//!
//! Widths must be complete before the first row is rendered: callers observe
//! every emitted row first, then render them all against the final table.

use std::collections::BTreeSet;

use tabjoin_core::row::Row;

/// Maximum field width seen per column position. Never shrinks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidthTable {
    widths: Vec<usize>,
}

impl WidthTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_widths(widths: Vec<usize>) -> Self {
        Self { widths }
    }

    /// Widen each position to fit `row`, growing the table for longer rows.
    pub fn observe(&mut self, row: &Row) {
        for (pos, field) in row.iter().enumerate() {
            let width = field.chars().count();
            match self.widths.get_mut(pos) {
                Some(w) => *w = (*w).max(width),
                None => self.widths.push(width),
            }
        }
    }

    /// Width at `pos`; zero for positions never observed.
    pub fn width(&self, pos: usize) -> usize {
        self.widths.get(pos).copied().unwrap_or(0)
    }

    /// Number of tracked column positions.
    pub fn len(&self) -> usize {
        self.widths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widths.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.widths
    }

    /// `self` followed by `other`, for the extended schema of joined rows.
    pub fn concat(&self, other: &WidthTable) -> WidthTable {
        let mut widths = self.widths.clone();
        widths.extend_from_slice(&other.widths);
        WidthTable { widths }
    }
}

/// Positions to print. Empty selects every column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSelection {
    columns: BTreeSet<usize>,
}

impl ColumnSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn includes(&self, pos: usize) -> bool {
        self.columns.is_empty() || self.columns.contains(&pos)
    }
}

impl FromIterator<usize> for ColumnSelection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// Render one line: `|` plus the field right-aligned to `width + 1` for each
/// selected position, then a closing ` |`.
pub fn render(row: &Row, selection: &ColumnSelection, widths: &WidthTable) -> String {
    let mut line = String::new();
    for (pos, field) in row.iter().enumerate() {
        if selection.includes(pos) {
            let width = widths.width(pos) + 1;
            line.push('|');
            line.push_str(&format!("{field:>width$}"));
        }
    }
    line.push_str(" |");
    line
}
