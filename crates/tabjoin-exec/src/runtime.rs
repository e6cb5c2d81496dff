//! Runtime: load the side table, stream the primary rows, join, measure, render.
//!
//! Phase order is fixed:
//! 1. side table + join index (frozen afterwards)
//! 2. primary pass: tokenize, derived column, aggregate, track primary widths
//! 3. join pass over the finished primary rows
//! 4. width pass over the join output, one table per row kind
//! 5. aggregate reduce
//! 6. render, only once every width is known

use std::io::{BufReader, Read, Write};

use thiserror::Error;
use tracing::{debug, warn};

use tabjoin_core::config::{JoinMode, RunConfig};
use tabjoin_core::row::{OutputRow, Row, RowKind};

use tabjoin_operators::aggregate::{AggregateOp, ColumnAggregate};
use tabjoin_operators::expr::{parse_expression, ColumnExpr, DerivedColumn, DEFAULT_OPERATORS};
use tabjoin_operators::join::{HashJoin, JoinIndex, JoinStats, SideTable};
use tabjoin_operators::layout::{ColumnSelection, WidthTable};
use tabjoin_operators::traits::{Outcome, RowOperator};

use tabjoin_io::readers::delimited::{read_side_table, DelimitedReader};
use tabjoin_io::writers::table::TableWriter;

use crate::metrics::emit_phase;
use crate::report::{AggregateOutcome, RunReport, Warning};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error(transparent)]
    Config(#[from] tabjoin_core::Error),
    #[error("job file: {0}")]
    Job(String),
    #[error(transparent)]
    Io(#[from] tabjoin_io::Error),
    #[error("invalid run: {0}")]
    Invalid(String),
}

/// Engine owns the resolved run settings.
pub struct Engine {
    cfg: RunConfig,
    expr: Option<ColumnExpr>,
    aggregate: Option<(AggregateOp, usize)>,
    selection: ColumnSelection,
}

impl Engine {
    pub fn new(cfg: RunConfig) -> Result<Self, ExecError> {
        cfg.validate()?;

        let expr = cfg
            .expression
            .as_deref()
            .and_then(|raw| parse_expression(raw, &DEFAULT_OPERATORS));
        if cfg.expression.is_some() && expr.is_none() {
            debug!(expression = ?cfg.expression, "malformed expression, derived column disabled");
        }

        let aggregate = match &cfg.aggregate {
            Some(agg) => match agg.op.parse::<AggregateOp>() {
                Ok(op) => Some((op, agg.column)),
                Err(msg) => {
                    warn!("{msg}; no aggregate will be computed");
                    None
                }
            },
            None => None,
        };

        let selection = cfg.columns.iter().copied().collect();

        Ok(Self {
            cfg,
            expr,
            aggregate,
            selection,
        })
    }

    /// The parsed derived-column expression, if the configured one is well-formed.
    pub fn expression(&self) -> Option<&ColumnExpr> {
        self.expr.as_ref()
    }

    /// Read the configured side table, if a join is requested.
    pub fn load_side_table(&self) -> Result<Option<SideTable>, ExecError> {
        let Some(join) = &self.cfg.join else {
            return Ok(None);
        };
        let rows = read_side_table(&join.path, self.cfg.separator, self.cfg.read_buffer_bytes)?;
        let side = SideTable::from_rows(rows);
        emit_phase(
            "side_table",
            &[
                ("path", join.path.display().to_string()),
                ("rows", side.len().to_string()),
            ],
        );
        Ok(Some(side))
    }

    /// Run every phase up to (not including) rendering.
    ///
    /// `side` must be present exactly when the config requests a join.
    pub fn execute<R: Read>(
        &self,
        input: R,
        side: Option<&SideTable>,
    ) -> Result<RunOutput, ExecError> {
        let join = match (&self.cfg.join, side) {
            (Some(cfg), Some(side)) => Some((cfg.mode, cfg.column, side)),
            (None, None) => None,
            (Some(cfg), None) => {
                return Err(ExecError::Invalid(format!(
                    "{} join requested but no side table was loaded",
                    cfg.mode
                )))
            }
            (None, Some(_)) => {
                return Err(ExecError::Invalid(
                    "side table supplied without a join mode".into(),
                ))
            }
        };

        let mut derived = self.expr.clone().map(DerivedColumn::new);
        let mut aggregate = self
            .aggregate
            .map(|(op, column)| ColumnAggregate::new(op, column));
        let mut ops: Vec<&mut dyn RowOperator> = Vec::new();
        if let Some(d) = derived.as_mut() {
            ops.push(d);
        }
        if let Some(a) = aggregate.as_mut() {
            ops.push(a);
        }

        let mut warnings = Vec::new();
        let mut primary_widths = WidthTable::new();
        let mut primary = Vec::new();

        let reader = BufReader::with_capacity(self.cfg.read_buffer_bytes, input);
        for (n, row) in DelimitedReader::new(reader, self.cfg.separator).enumerate() {
            let mut row = row?;
            apply_operators(&mut ops, &mut row, n + 1, &mut warnings);
            primary_widths.observe(&row);
            primary.push(row);
        }
        drop(ops);
        emit_phase(
            "primary",
            &[
                ("rows", primary.len().to_string()),
                ("columns", primary_widths.len().to_string()),
            ],
        );

        let mut output = RunOutput {
            rows: Vec::with_capacity(primary.len()),
            primary_widths,
            joined_widths: None,
            aggregate: None,
            warnings,
            join: None,
        };

        match join {
            None => {
                output.rows = primary
                    .into_iter()
                    .map(|row| OutputRow::new(RowKind::Primary, row))
                    .collect();
            }
            Some((mode, column, side)) => {
                let index = JoinIndex::build(side, column);
                emit_phase(
                    "index",
                    &[
                        ("keys", index.distinct_keys().to_string()),
                        ("indexed_rows", index.indexed_rows().to_string()),
                    ],
                );

                let pad_width = output.primary_widths.len();
                let mut joined_widths = match mode {
                    JoinMode::Outer => output.primary_widths.concat(side.widths()),
                    JoinMode::Inner => side.widths().concat(&output.primary_widths),
                };

                let mut engine = HashJoin::new(side, &index, mode);
                for row in primary {
                    engine.probe(row, &mut output.rows);
                }
                let stats = engine.finish(pad_width, &mut output.rows);
                log_join(mode, &stats);

                for out in output.rows.iter().filter(|o| o.is_joined_schema()) {
                    joined_widths.observe(&out.row);
                }

                output.joined_widths = Some(joined_widths);
                output.join = Some(stats);
            }
        }

        output.aggregate = aggregate.as_ref().map(|agg| AggregateOutcome {
            op: agg.op,
            result: agg.finish(),
        });
        if let Some(AggregateOutcome { op, result: Err(e) }) = &output.aggregate {
            debug!(%op, error = %e, "aggregate unavailable");
        }

        Ok(output)
    }

    /// Load, execute, render to `out`, and report.
    pub fn run<R: Read, W: Write>(&self, input: R, out: W) -> Result<RunReport, ExecError> {
        let side = self.load_side_table()?;
        let output = self.execute(input, side.as_ref())?;
        let mut writer = TableWriter::new(out, self.selection.clone());
        output.render(&mut writer)?;
        writer.finish()?;
        Ok(output.into_report())
    }
}

fn apply_operators(
    ops: &mut [&mut dyn RowOperator],
    row: &mut Row,
    row_no: usize,
    warnings: &mut Vec<Warning>,
) {
    for op in ops.iter_mut() {
        if let Outcome::Skip(reason) = op.apply(row) {
            let warning = Warning {
                row: row_no,
                operator: op.name(),
                reason,
            };
            warn!(operator = warning.operator, "{warning}");
            warnings.push(warning);
        }
    }
}

fn log_join(mode: JoinMode, stats: &JoinStats) {
    emit_phase(
        "join",
        &[
            ("mode", mode.to_string()),
            ("probed", stats.probed.to_string()),
            ("emitted", stats.emitted.to_string()),
            ("matched_side_rows", stats.matched_side_rows.to_string()),
            ("unmatched_side_rows", stats.unmatched_side_rows.to_string()),
            ("keyless_rows", stats.keyless_rows.to_string()),
        ],
    );
}

/// Everything needed to render: rows plus the final width tables.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub rows: Vec<OutputRow>,
    /// Widths of the un-joined schema (primary rows).
    pub primary_widths: WidthTable,
    /// Widths of the extended schema; present only when a join ran.
    pub joined_widths: Option<WidthTable>,
    pub aggregate: Option<AggregateOutcome>,
    pub warnings: Vec<Warning>,
    pub join: Option<JoinStats>,
}

impl RunOutput {
    /// The width table matching the row's own schema.
    pub fn widths_for(&self, row: &OutputRow) -> &WidthTable {
        match (&self.joined_widths, row.is_joined_schema()) {
            (Some(joined), true) => joined,
            _ => &self.primary_widths,
        }
    }

    /// Write all rows and, if it was computed, the aggregate line.
    pub fn render<W: Write>(&self, writer: &mut TableWriter<W>) -> Result<(), ExecError> {
        for out in &self.rows {
            writer.write_row(&out.row, self.widths_for(out))?;
        }
        if let Some(AggregateOutcome { op, result: Ok(v) }) = &self.aggregate {
            writer.write_aggregate(op, *v)?;
        }
        Ok(())
    }

    pub fn into_report(self) -> RunReport {
        RunReport {
            rows_emitted: self.rows.len(),
            warnings: self.warnings,
            aggregate: self.aggregate,
            join: self.join,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabjoin_core::config::{AggregateConfig, JoinConfig};

    fn side(lines: &[&str]) -> SideTable {
        SideTable::from_rows(
            lines
                .iter()
                .map(|l| tabjoin_core::row::split_row(l, ','))
                .collect(),
        )
    }

    fn render_to_string(output: &RunOutput, columns: &[usize]) -> String {
        let mut writer = TableWriter::new(Vec::new(), columns.iter().copied().collect());
        output.render(&mut writer).unwrap();
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn derived_column_and_average() {
        let cfg = RunConfig {
            expression: Some("col0+col1".into()),
            aggregate: Some(AggregateConfig {
                op: "avg".into(),
                column: 2,
            }),
            ..Default::default()
        };
        let engine = Engine::new(cfg).unwrap();
        let output = engine.execute("1,2\n3,4\n".as_bytes(), None).unwrap();

        assert_eq!(output.rows[0].row.fields, vec!["1", "2", "3"]);
        assert_eq!(output.rows[1].row.fields, vec!["3", "4", "7"]);
        assert_eq!(render_to_string(&output, &[]), "| 1| 2| 3 |\n| 3| 4| 7 |\navg: 5\n");
    }

    #[test]
    fn bad_rows_warn_without_stopping_the_run() {
        let cfg = RunConfig {
            expression: Some("col0*col1".into()),
            aggregate: Some(AggregateConfig {
                op: "max".into(),
                column: 0,
            }),
            ..Default::default()
        };
        let engine = Engine::new(cfg).unwrap();
        let output = engine
            .execute("2,5\nx,1\n4\n3,3\n".as_bytes(), None)
            .unwrap();

        assert_eq!(output.rows.len(), 4);
        assert_eq!(output.rows[0].row.len(), 3);
        assert_eq!(output.rows[1].row.len(), 2);
        assert_eq!(output.rows[2].row.len(), 1);
        assert_eq!(output.rows[3].row.fields, vec!["3", "3", "9"]);

        let ops: Vec<_> = output.warnings.iter().map(|w| (w.row, w.operator)).collect();
        assert_eq!(
            ops,
            vec![(2, "derived_column"), (2, "aggregate"), (3, "derived_column")]
        );
        assert_eq!(
            output.aggregate.unwrap().result,
            Ok(4),
            "non-integer 'x' is excluded"
        );
    }

    #[test]
    fn malformed_expression_is_silently_disabled() {
        let cfg = RunConfig {
            expression: Some("col0".into()),
            ..Default::default()
        };
        let engine = Engine::new(cfg).unwrap();
        assert!(engine.expression().is_none());
        let output = engine.execute("1,2\n".as_bytes(), None).unwrap();
        assert_eq!(output.rows[0].row.len(), 2);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn unknown_aggregate_name_disables_aggregation() {
        let cfg = RunConfig {
            aggregate: Some(AggregateConfig {
                op: "sum".into(),
                column: 0,
            }),
            ..Default::default()
        };
        let engine = Engine::new(cfg).unwrap();
        let output = engine.execute("1\n2\n".as_bytes(), None).unwrap();
        assert!(output.aggregate.is_none());
        assert_eq!(render_to_string(&output, &[]), "| 1 |\n| 2 |\n");
    }

    #[test]
    fn empty_accumulator_is_reported_not_printed() {
        let cfg = RunConfig {
            aggregate: Some(AggregateConfig {
                op: "med".into(),
                column: 5,
            }),
            ..Default::default()
        };
        let engine = Engine::new(cfg).unwrap();
        let output = engine.execute("1,2\n".as_bytes(), None).unwrap();
        assert!(matches!(
            output.aggregate.as_ref().unwrap().result,
            Err(tabjoin_operators::AggregateError::EmptyAccumulator { .. })
        ));
        assert_eq!(render_to_string(&output, &[]), "| 1| 2 |\n");
    }

    #[test]
    fn outer_join_uses_one_width_table_per_schema() {
        let cfg = RunConfig {
            join: Some(JoinConfig {
                mode: JoinMode::Outer,
                column: 0,
                path: "side.csv".into(),
            }),
            ..Default::default()
        };
        let engine = Engine::new(cfg).unwrap();
        let side = side(&["k1,X", "k2,Y"]);
        let output = engine
            .execute("k1,foo\nk3,longer\n".as_bytes(), Some(&side))
            .unwrap();

        assert_eq!(output.primary_widths.as_slice(), &[2, 6]);
        assert_eq!(output.joined_widths.as_ref().unwrap().as_slice(), &[2, 6, 2, 1]);
        assert_eq!(
            render_to_string(&output, &[]),
            "| k1|    foo| k1| X |\n| k3| longer |\n|   |       | k2| Y |\n"
        );
        let stats = output.join.unwrap();
        assert_eq!(stats.matched_side_rows + stats.unmatched_side_rows, side.len());
    }

    #[test]
    fn inner_join_widths_follow_side_first_order() {
        let cfg = RunConfig {
            join: Some(JoinConfig {
                mode: JoinMode::Inner,
                column: 0,
                path: "side.csv".into(),
            }),
            ..Default::default()
        };
        let engine = Engine::new(cfg).unwrap();
        let side = side(&["k1,XXXX"]);
        let output = engine.execute("k1,f\n".as_bytes(), Some(&side)).unwrap();
        assert_eq!(output.rows[0].row.fields, vec!["k1", "XXXX", "k1", "f"]);
        assert_eq!(render_to_string(&output, &[]), "| k1| XXXX| k1| f |\n");
    }

    #[test]
    fn derived_column_is_appended_before_the_join() {
        let cfg = RunConfig {
            expression: Some("col1*2".into()),
            aggregate: Some(AggregateConfig {
                op: "min".into(),
                column: 2,
            }),
            join: Some(JoinConfig {
                mode: JoinMode::Inner,
                column: 0,
                path: "side.csv".into(),
            }),
            ..Default::default()
        };
        let engine = Engine::new(cfg).unwrap();
        let side = side(&["a,10", "a,20", "b,30"]);
        let output = engine.execute("a,2\nb,3\n".as_bytes(), Some(&side)).unwrap();
        let rows: Vec<_> = output.rows.iter().map(|o| o.row.join(',')).collect();
        assert_eq!(rows, vec!["a,10,a,2,4", "a,20,a,2,4", "b,30,b,3,6"]);
        // Aggregated once per primary row, not per joined copy.
        assert_eq!(output.aggregate.unwrap().result, Ok(4));
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn outer_join_pads_leftovers_past_the_derived_column() {
        let cfg = RunConfig {
            expression: Some("col0+col1".into()),
            join: Some(JoinConfig {
                mode: JoinMode::Outer,
                column: 0,
                path: "side.csv".into(),
            }),
            ..Default::default()
        };
        let engine = Engine::new(cfg).unwrap();
        let side = side(&["1,X", "9,Y"]);
        let output = engine.execute("1,2\n".as_bytes(), Some(&side)).unwrap();

        assert_eq!(output.primary_widths.len(), 3);
        assert_eq!(output.rows[0].row.fields, vec!["1", "2", "3", "1", "X"]);
        assert_eq!(output.rows[1].kind, RowKind::SideOnly);
        assert_eq!(output.rows[1].row.fields, vec!["", "", "", "9", "Y"]);
        assert!(output.warnings.is_empty());
        assert_eq!(
            render_to_string(&output, &[]),
            "| 1| 2| 3| 1| X |\n|  |  |  | 9| Y |\n"
        );
    }

    #[test]
    fn join_without_side_table_is_rejected() {
        let cfg = RunConfig {
            join: Some(JoinConfig {
                mode: JoinMode::Inner,
                column: 0,
                path: "side.csv".into(),
            }),
            ..Default::default()
        };
        let engine = Engine::new(cfg).unwrap();
        assert!(matches!(
            engine.execute("a\n".as_bytes(), None),
            Err(ExecError::Invalid(_))
        ));
    }
}
