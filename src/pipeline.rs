//! Runs a whole report: parse, group, render, write.

use chrono::Utc;
use tracing::info;

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    error::{Error, Result, RowError},
    format::{output_path, Format},
    records::Parsed,
    report::Report,
    strategy,
};

/// Everything a report run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// CSV files to read, in order.
    pub files: Vec<PathBuf>,
    /// Name of a registered report kind, such as `payout`.
    pub report: String,
    /// Name of the file format: `json` or `text`.
    pub format: String,
    /// Where to save the report. An extension is added if this has none.
    pub output: Option<PathBuf>,
    /// Suppresses the console table.
    pub silent: bool,
}

/// What a successful run produced.
#[derive(Debug)]
pub struct Outcome {
    pub report: Report,
    /// The file the report was saved to, if any.
    pub written: Option<PathBuf>,
}

/// Runs the report described by `config`.
///
/// The report kind and format are checked before any file is read. If
/// `config.output` is set, the rendered report is saved there; unless
/// `config.silent` is set, the console table is written to `console`. A run
/// where every row is skipped (or there are no rows) still succeeds, with an
/// empty report.
///
/// Every skipped row is appended to `diagnostics`, whether or not the run
/// succeeds, so rows rejected before a failure are still reported.
///
/// # Errors
///
/// Returns an error, without writing any output, if the report kind or
/// format is unknown, if any input file is missing or has a bad header, or
/// if the totals overflow ([`Error::Overflow`]). Returns [`Error::Io`] if the
/// output file cannot be written, and [`Error::Console`] if `console` fails.
pub fn run(
    config: &RunConfig,
    console: &mut impl Write,
    diagnostics: &mut Vec<RowError>,
) -> Result<Outcome> {
    let strategy = strategy::find(&config.report)?;
    let format: Format = config.format.parse()?;

    let mut parsed = Parsed::default();
    let read = config
        .files
        .iter()
        .try_for_each(|path| parsed.read_file(path));
    diagnostics.append(&mut parsed.diagnostics);
    read?;

    let report = Report::build(
        strategy,
        &parsed.rows,
        config.files.clone(),
        Utc::now(),
    )?;

    let written = match &config.output {
        Some(base) => Some(save(&report, format, base)?),
        None => None,
    };
    if !config.silent {
        let table = Format::Console.render(&report)?;
        console
            .write_all(table.as_bytes())
            .and_then(|()| console.flush())
            .map_err(Error::Console)?;
    }
    Ok(Outcome { report, written })
}

fn save(report: &Report, format: Format, base: &Path) -> Result<PathBuf> {
    let path = output_path(base, format);
    let payload = format.render(report)?;
    fs::write(&path, payload).map_err(|source| Error::Io {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), format = format.name(), "saved report");
    Ok(path)
}
