//! tabjoin CLI: read delimited rows, derive/aggregate/join, print an aligned table.

use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::PathBuf;
use tabjoin_core::config::{parse_separator, AggregateConfig, JoinConfig, JoinMode, RunConfig};
use tabjoin_core::Error;
use tabjoin_exec::{load_job_file, Engine, RunReport};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Default)]
#[command(name = "tabjoin")]
#[command(
    about = "Transform, join and tabulate delimited rows",
    long_about = "Reads delimited rows (stdin by default), optionally joins them against a \
                  side-table file, appends a derived column, computes one aggregate, and prints \
                  the result as a right-aligned, pipe-delimited table.\n\n\
                  Joined rows' columns can be referenced by --cols, --addcol and --aggcol."
)]
struct Cli {
    /// Column indices to print (default: all)
    #[arg(short = 'c', long = "cols", num_args = 1.., value_name = "N")]
    cols: Vec<usize>,

    /// Derived column: OPERAND OP OPERAND with operands colN or integers, OP in + - * /
    #[arg(long = "addcol", value_name = "EXPR")]
    addcol: Option<String>,

    /// Aggregate over column N with avg, min, max or med
    #[arg(long = "aggcol", num_args = 2, value_names = ["N", "OP"])]
    aggcol: Option<Vec<String>>,

    /// Inner join on column N against FILE (side fields first)
    #[arg(
        long = "innerjoin",
        num_args = 2,
        value_names = ["N", "FILE"],
        conflicts_with = "outerjoin"
    )]
    innerjoin: Option<Vec<String>>,

    /// Outer join on column N against FILE; unmatched FILE rows are listed last
    #[arg(long = "outerjoin", num_args = 2, value_names = ["N", "FILE"])]
    outerjoin: Option<Vec<String>>,

    /// Field separator (single character, default ',')
    #[arg(short = 's', long, value_name = "CHAR")]
    separator: Option<String>,

    /// YAML job file with default options (flags override it)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Read rows from FILE instead of stdin
    #[arg(short = 'i', long, value_name = "FILE")]
    input: Option<PathBuf>,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(report) => {
            if let Some(e) = report.aggregate_error() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("TABJOIN_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<RunReport, Box<dyn std::error::Error>> {
    let mut config = RunConfig::from_env();
    if let Some(path) = &cli.config {
        load_job_file(path)?.apply(&mut config)?;
    }
    apply_cli_overrides(&mut config, cli)?;

    let engine = Engine::new(config)?;

    let input: Box<dyn Read> = match &cli.input {
        Some(path) => Box::new(
            File::open(path).map_err(|e| format!("cannot open '{}': {}", path.display(), e))?,
        ),
        None => Box::new(io::stdin().lock()),
    };
    let out = BufWriter::new(io::stdout().lock());

    let report = engine.run(input, out)?;
    tracing::debug!(
        rows = report.rows_emitted,
        warnings = report.warnings.len(),
        "run finished"
    );
    Ok(report)
}

fn apply_cli_overrides(cfg: &mut RunConfig, cli: &Cli) -> Result<(), Error> {
    if let Some(sep) = &cli.separator {
        cfg.separator = parse_separator(sep)?;
    }
    if !cli.cols.is_empty() {
        cfg.columns = cli.cols.clone();
    }
    if let Some(expr) = &cli.addcol {
        cfg.expression = Some(expr.clone());
    }
    if let Some(args) = &cli.aggcol {
        cfg.aggregate = Some(parse_aggcol(args)?);
    }
    match (&cli.innerjoin, &cli.outerjoin) {
        (Some(_), Some(_)) => {
            return Err(Error::Config(
                "only one of --innerjoin and --outerjoin may be given".into(),
            ))
        }
        (Some(args), None) => cfg.join = Some(parse_join(JoinMode::Inner, args)?),
        (None, Some(args)) => cfg.join = Some(parse_join(JoinMode::Outer, args)?),
        (None, None) => {}
    }
    Ok(())
}

/// `N OP`, also accepted as `OP N`.
fn parse_aggcol(args: &[String]) -> Result<AggregateConfig, Error> {
    let [a, b] = args else {
        return Err(Error::Config("--aggcol takes a column index and an operator".into()));
    };
    let (column, op) = match (a.parse::<usize>(), b.parse::<usize>()) {
        (Ok(column), _) => (column, b),
        (Err(_), Ok(column)) => (column, a),
        _ => {
            return Err(Error::Config(format!(
                "--aggcol needs a column index, got '{a}' and '{b}'"
            )))
        }
    };
    Ok(AggregateConfig {
        op: op.clone(),
        column,
    })
}

fn parse_join(mode: JoinMode, args: &[String]) -> Result<JoinConfig, Error> {
    let [column, path] = args else {
        return Err(Error::Config(format!(
            "--{mode}join takes a column index and a file"
        )));
    };
    let column = column
        .parse::<usize>()
        .map_err(|_| Error::Config(format!("invalid join column '{column}'")))?;
    Ok(JoinConfig {
        mode,
        column,
        path: PathBuf::from(path),
    })
}
