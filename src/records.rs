use csv::{Position, StringRecord};
use serde::Deserialize;
use tracing::{debug, info};

use std::{collections::HashSet, fs::File, io::Read, path::Path};

use crate::{
    amount::Amount,
    error::{Error, Result, RowError, SchemaProblem},
};

/// Columns every work record file must have.
pub const REQUIRED_COLUMNS: [&str; 5] = ["id", "department", "email", "name", "hours_worked"];

/// Accepted names for the rate column. Exactly one must be present.
pub const RATE_COLUMNS: [&str; 3] = ["hourly_rate", "rate", "salary"];

/// Defines the CSV format for employee work records.
///
/// Columns may appear in any order, and extra columns are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Row {
    pub id: String,
    pub department: String,
    pub email: String,
    pub name: String,
    pub hours_worked: Amount,
    #[serde(rename = "hourly_rate", alias = "rate", alias = "salary")]
    pub rate: Amount,
}

impl Row {
    /// Returns what this row earned: hours worked times rate, unrounded.
    ///
    /// Returns `None` if the product is too large to represent. Rows from
    /// [`read_files`] always have a payout.
    #[must_use]
    pub fn payout(&self) -> Option<Amount> {
        self.hours_worked.checked_mul(self.rate)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let text = [
            ("id", &self.id),
            ("department", &self.department),
            ("email", &self.email),
            ("name", &self.name),
        ];
        if let Some((column, _)) = text.iter().find(|(_, value)| value.is_empty()) {
            return Err(format!("{column} is empty"));
        }
        match self.payout() {
            Some(_) => Ok(()),
            None => Err(format!(
                "payout of {} hours at {} is too large",
                self.hours_worked, self.rate
            )),
        }
    }
}

/// Rows read from one or more files, plus the rows that were rejected.
#[derive(Debug, Default)]
pub struct Parsed {
    pub rows: Vec<Row>,
    pub diagnostics: Vec<RowError>,
}

/// Reads work records from the CSV files at `paths`, in order.
///
/// Rows from every file are concatenated; rows sharing an `id` are kept as
/// separate rows. A row with bad data is left out and described in
/// [`Parsed::diagnostics`].
///
/// # Errors
///
/// Stops at the first file that cannot be opened or read, or whose header
/// fails validation (see [`SchemaProblem`]). Files after it are not read.
/// Use [`Parsed::read_file`] to keep the diagnostics gathered before the
/// failure.
pub fn read_files<P: AsRef<Path>>(paths: &[P]) -> Result<Parsed> {
    let mut parsed = Parsed::default();
    for path in paths {
        parsed.read_file(path.as_ref())?;
    }
    Ok(parsed)
}

impl Parsed {
    /// Reads the work records in the CSV file at `path`, adding its rows and
    /// diagnostics to those already collected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened, [`Error::Schema`]
    /// if its header fails validation, and [`Error::Csv`] if it cannot be
    /// decoded. Rows and diagnostics from the file up to that point are
    /// kept.
    pub fn read_file(&mut self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "reading work records");
        let file = File::open(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        read_from(file, path, self)
    }
}

fn read_from<R: Read>(reader: R, path: &Path, parsed: &mut Parsed) -> Result<()> {
    let csv_error = |source: csv::Error| Error::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(csv_error)?.clone();
    check_header(&headers).map_err(|problem| Error::Schema {
        path: path.to_path_buf(),
        problem,
    })?;

    let (rows_before, skipped_before) = (parsed.rows.len(), parsed.diagnostics.len());
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => match row_problem(&err) {
                Some((line, message)) => {
                    skip(parsed, RowError::new(path, line, message));
                    continue;
                }
                None => return Err(csv_error(err)),
            },
        };
        let line = record.position().map_or(0, Position::line);
        let row = record
            .deserialize::<Row>(Some(&headers))
            .map_err(|err| describe_field_error(&err, &headers))
            .and_then(|row| row.validate().map(|()| row));
        match row {
            Ok(row) => parsed.rows.push(row),
            Err(message) => skip(parsed, RowError::new(path, line, message)),
        }
    }
    info!(
        path = %path.display(),
        rows = parsed.rows.len() - rows_before,
        skipped = parsed.diagnostics.len() - skipped_before,
        "read work records"
    );
    Ok(())
}

fn skip(parsed: &mut Parsed, diagnostic: RowError) {
    debug!(%diagnostic, "skipping row");
    parsed.diagnostics.push(diagnostic);
}

fn check_header(headers: &StringRecord) -> std::result::Result<(), SchemaProblem> {
    let mut seen = HashSet::new();
    for column in headers
        .iter()
        .filter(|h| REQUIRED_COLUMNS.contains(h) || RATE_COLUMNS.contains(h))
    {
        if !seen.insert(column) {
            return Err(SchemaProblem::DuplicateColumn(column.to_string()));
        }
    }
    let mut missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !seen.contains(*c))
        .map(ToString::to_string)
        .collect();
    let rates: Vec<String> = RATE_COLUMNS
        .iter()
        .filter(|c| seen.contains(*c))
        .map(ToString::to_string)
        .collect();
    if rates.is_empty() {
        missing.push(RATE_COLUMNS.join("|"));
    }
    if !missing.is_empty() {
        return Err(SchemaProblem::MissingColumns(missing));
    }
    if rates.len() > 1 {
        return Err(SchemaProblem::MultipleRateColumns(rates));
    }
    Ok(())
}

/// Returns the line and description of a CSV error confined to one row, or
/// `None` if the error affects the whole file.
fn row_problem(err: &csv::Error) -> Option<(u64, String)> {
    let line = |pos: &Option<Position>| pos.as_ref().map_or(0, Position::line);
    match err.kind() {
        csv::ErrorKind::UnequalLengths {
            pos,
            expected_len,
            len,
        } => Some((line(pos), format!("expected {expected_len} fields, found {len}"))),
        csv::ErrorKind::Utf8 { pos, err } => Some((line(pos), format!("invalid UTF-8: {err}"))),
        _ => None,
    }
}

fn describe_field_error(err: &csv::Error, headers: &StringRecord) -> String {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => {
            let column = err
                .field()
                .and_then(|i| headers.get(usize::try_from(i).ok()?))
                .unwrap_or("record");
            format!("{column}: {}", err.kind())
        }
        _ => err.to_string(),
    }
}
