use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use std::{io, path::PathBuf};

use payroll::RunConfig;

/// Summarises employee work records from CSV files.
///
/// Each file needs a header row with id, department, email, name,
/// hours_worked, and one of hourly_rate, rate or salary.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// CSV files with employee work records
    #[arg(value_name = "FILES", required = true)]
    files: Vec<PathBuf>,

    /// Type of report to generate (e.g. payout, employee)
    #[arg(short, long)]
    report: String,

    /// Don't print the report to the console
    #[arg(short, long)]
    silent: bool,

    /// Save the report to this file (extension added if missing)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Format of the saved report: json or text
    #[arg(short, long, default_value = "json")]
    format: String,

    /// Log more detail to stderr (repeat for more)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl From<Args> for RunConfig {
    fn from(args: Args) -> Self {
        Self {
            files: args.files,
            report: args.report,
            format: args.format,
            output: args.output,
            silent: args.silent,
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .with_target(verbose >= 2)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    debug!(?args, "starting");

    let config = RunConfig::from(args);
    if config.silent && config.output.is_none() {
        eprintln!("warning: --silent without --output: the report will not be shown or saved");
    }
    let mut diagnostics = Vec::new();
    let result = payroll::run(&config, &mut io::stdout().lock(), &mut diagnostics);
    for diagnostic in &diagnostics {
        eprintln!("warning: skipped row at {diagnostic}");
    }
    let outcome = result?;
    if let (Some(path), false) = (&outcome.written, config.silent) {
        eprintln!("Report saved to {}", path.display());
    }
    Ok(())
}
