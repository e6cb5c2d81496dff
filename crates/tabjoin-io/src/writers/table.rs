//! Aligned, pipe-delimited table output.

use std::fmt::Display;
use std::io::Write;

use tabjoin_core::row::Row;
use tabjoin_operators::layout::{render, ColumnSelection, WidthTable};

use crate::error::Result;

pub struct TableWriter<W: Write> {
    out: W,
    selection: ColumnSelection,
    lines_written: usize,
}

impl<W: Write> TableWriter<W> {
    pub fn new(out: W, selection: ColumnSelection) -> Self {
        Self {
            out,
            selection,
            lines_written: 0,
        }
    }

    /// Write one row formatted against `widths`.
    pub fn write_row(&mut self, row: &Row, widths: &WidthTable) -> Result<()> {
        writeln!(self.out, "{}", render(row, &self.selection, widths))?;
        self.lines_written += 1;
        Ok(())
    }

    /// Write the trailing `"<op>: <value>"` line.
    pub fn write_aggregate(&mut self, op: impl Display, value: i64) -> Result<()> {
        writeln!(self.out, "{op}: {value}")?;
        self.lines_written += 1;
        Ok(())
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
