//! Hash join probe phase.
//!
//! Concatenation order depends on the mode: inner emits side ++ primary,
//! outer emits primary ++ side. Matches for one primary row come out in side
//! insertion order; outer-join leftovers come last, by ascending position.

use serde::{Deserialize, Serialize};
use tabjoin_core::config::JoinMode;
use tabjoin_core::row::{OutputRow, Row, RowKind};

use super::{JoinIndex, SideTable};

/// Counters for one join run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    /// Primary rows probed.
    pub probed: usize,
    /// Primary rows without a key column.
    pub keyless_rows: usize,
    /// Rows emitted, including outer-join leftovers.
    pub emitted: usize,
    /// Side rows matched by at least one primary row.
    pub matched_side_rows: usize,
    /// Side rows never matched.
    pub unmatched_side_rows: usize,
}

pub struct HashJoin<'a> {
    side: &'a SideTable,
    index: &'a JoinIndex,
    mode: JoinMode,
    touched: Vec<bool>,
    stats: JoinStats,
}

impl<'a> HashJoin<'a> {
    pub fn new(side: &'a SideTable, index: &'a JoinIndex, mode: JoinMode) -> Self {
        Self {
            side,
            index,
            mode,
            touched: vec![false; side.len()],
            stats: JoinStats::default(),
        }
    }

    /// Join one primary row, appending results to `out`.
    ///
    /// A row too short to carry the key column matches nothing: inner drops
    /// it, outer passes it through unchanged.
    pub fn probe(&mut self, row: Row, out: &mut Vec<OutputRow>) {
        self.stats.probed += 1;
        let index: &'a JoinIndex = self.index;
        let matches = match row.get(index.key_column()) {
            Some(key) => index.lookup(key),
            None => {
                self.stats.keyless_rows += 1;
                &[]
            }
        };

        match self.mode {
            JoinMode::Inner => {
                for &pos in matches {
                    let mut joined = self.side_row(pos).clone();
                    joined.extend_from(&row);
                    self.touched[pos] = true;
                    out.push(OutputRow::new(RowKind::Joined, joined));
                }
                self.stats.emitted += matches.len();
            }
            JoinMode::Outer => {
                if matches.is_empty() {
                    out.push(OutputRow::new(RowKind::Primary, row));
                    self.stats.emitted += 1;
                    return;
                }
                for &pos in matches {
                    let mut joined = row.clone();
                    joined.extend_from(self.side_row(pos));
                    self.touched[pos] = true;
                    out.push(OutputRow::new(RowKind::Joined, joined));
                }
                self.stats.emitted += matches.len();
            }
        }
    }

    /// Close the join. For outer joins, emit each never-matched side row behind
    /// `pad_width` empty fields.
    pub fn finish(mut self, pad_width: usize, out: &mut Vec<OutputRow>) -> JoinStats {
        let side = self.side;
        for (pos, row) in side.rows().iter().enumerate() {
            if self.touched[pos] {
                self.stats.matched_side_rows += 1;
                continue;
            }
            self.stats.unmatched_side_rows += 1;
            if self.mode == JoinMode::Outer {
                let mut padded = Row::empty(pad_width);
                padded.extend_from(row);
                out.push(OutputRow::new(RowKind::SideOnly, padded));
                self.stats.emitted += 1;
            }
        }
        self.stats
    }

    fn side_row(&self, pos: usize) -> &'a Row {
        let side: &'a SideTable = self.side;
        &side.rows()[pos]
    }
}
