use chrono::SecondsFormat;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::{
    error::{Error, Result},
    report::Report,
};

/// The ways a [`Report`] can be rendered.
///
/// Rendering is pure: it turns a report into a string and never touches the
/// console or the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// The bare table, as printed to stdout.
    Console,
    /// The table preceded by report metadata, for saving to a `.txt` file.
    Text,
    /// A machine-readable document, for saving to a `.json` file.
    Json,
}

impl Format {
    /// Formats that can be requested by name for file output.
    pub const FILE_FORMATS: [Format; 2] = [Format::Json, Format::Text];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Format::Console => "console",
            Format::Text => "text",
            Format::Json => "json",
        }
    }

    /// File extension written for this format, without the leading dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Format::Console | Format::Text => "txt",
            Format::Json => "json",
        }
    }

    /// Renders `report` in this format.
    ///
    /// Hours and payouts are shown to 2 decimal places. The text formats list
    /// each group's rows (name, hours, rate and payout) under its totals;
    /// JSON carries the totals only. A report with no
    /// entries renders as `No data` in the text formats, and as a document
    /// with an empty `generated_groups` list in JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the report cannot be encoded as JSON.
    pub fn render(self, report: &Report) -> Result<String> {
        Ok(match self {
            Format::Console => Table(report).to_string(),
            Format::Text => {
                let sources: Vec<_> = report
                    .sources
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                format!(
                    "Report: {}\nGenerated: {}\nSources: {}\n\n{}",
                    report.kind,
                    report
                        .generated_at
                        .to_rfc3339_opts(SecondsFormat::Secs, true),
                    sources.join(", "),
                    Table(report),
                )
            }
            Format::Json => {
                let mut json = serde_json::to_string_pretty(report)?;
                json.push('\n');
                json
            }
        })
    }
}

impl FromStr for Format {
    type Err = Error;

    /// Looks up a file format by name: `json` or `text`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::FILE_FORMATS
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| Error::UnsupportedFormat {
                format: s.to_string(),
                available: Self::FILE_FORMATS.iter().map(|f| f.name()).collect(),
            })
    }
}

/// Returns where a report in `format` should be saved, given the path the
/// user asked for.
///
/// If `base` has no extension, or ends in a bare `.`, the format's extension
/// is appended; otherwise `base` is used as given.
///
/// ```
/// # use std::path::Path;
/// # use payroll::{output_path, Format};
/// assert_eq!(output_path(Path::new("out/march"), Format::Json), Path::new("out/march.json"));
/// assert_eq!(output_path(Path::new("march.txt"), Format::Json), Path::new("march.txt"));
/// ```
#[must_use]
pub fn output_path(base: &Path, format: Format) -> PathBuf {
    if base.extension().is_some_and(|ext| !ext.is_empty()) {
        base.to_path_buf()
    } else {
        base.with_extension(format.extension())
    }
}

/// Indent of a row's name under its group.
const DETAIL_INDENT: &str = "  ";

struct Table<'a>(&'a Report);

impl Display for Table<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let report = self.0;
        if report.is_empty() {
            return writeln!(f, "No data");
        }
        let names = report.entries.iter().flat_map(|e| &e.details);
        let width = report
            .entries
            .iter()
            .map(|e| e.group.chars().count())
            .chain(names.map(|d| DETAIL_INDENT.len() + d.name.chars().count()))
            .chain(["Group".len(), "Total".len()])
            .max()
            .unwrap_or_default();
        writeln!(
            f,
            "{:width$} {:>6} {:>12} {:>12} {:>12}",
            "Group", "Rows", "Hours", "Rate", "Payout"
        )?;
        let length = width + 46;
        writeln!(f, "{:-<length$}", "")?;
        for entry in &report.entries {
            writeln!(
                f,
                "{:width$} {:>6} {:>12} {:>12} {:>12}",
                entry.group, entry.row_count, entry.total_hours, "", entry.total_payout
            )?;
            for detail in &entry.details {
                writeln!(
                    f,
                    "{:width$} {:>6} {:>12} {:>12} {:>12}",
                    format!("{DETAIL_INDENT}{}", detail.name),
                    "",
                    detail.hours_worked,
                    detail.rate,
                    detail.payout
                )?;
            }
        }
        writeln!(f, "{:-<length$}", "")?;
        let totals = &report.totals;
        writeln!(
            f,
            "{:width$} {:>6} {:>12} {:>12} {:>12}",
            "Total", totals.row_count, totals.total_hours, "", totals.total_payout
        )
    }
}
