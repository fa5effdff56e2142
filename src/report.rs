use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use std::{collections::HashMap, path::PathBuf};

use crate::{
    amount::Amount,
    error::{Error, Result},
    records::Row,
    strategy::Strategy,
};

/// Holds the totals for one group of rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub group: String,
    pub row_count: usize,
    #[serde(with = "crate::amount::json")]
    pub total_hours: Amount,
    #[serde(with = "crate::amount::json")]
    pub total_payout: Amount,
    /// The rows behind the totals, in input order. Shown by the text
    /// formats only, and empty in a report read back from JSON.
    #[serde(skip)]
    pub details: Vec<Detail>,
}

/// One row of a group, as listed under the group's totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub name: String,
    pub hours_worked: Amount,
    pub rate: Amount,
    pub payout: Amount,
}

impl ReportEntry {
    /// Sums hours worked, and hours times rate, across `rows`.
    ///
    /// Payouts are computed per row and added up exactly; nothing is rounded
    /// until the entry is displayed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] if a payout or a total is too large to
    /// represent.
    pub fn summarize(group: &str, rows: &[&Row]) -> Result<Self> {
        let overflow = || Error::Overflow {
            group: group.to_string(),
        };
        let details = rows
            .iter()
            .map(|row| {
                Ok(Detail {
                    name: row.name.clone(),
                    hours_worked: row.hours_worked,
                    rate: row.rate,
                    payout: row.payout().ok_or_else(overflow)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            group: group.to_string(),
            row_count: rows.len(),
            total_hours: Amount::checked_sum(details.iter().map(|d| d.hours_worked))
                .ok_or_else(overflow)?,
            total_payout: Amount::checked_sum(details.iter().map(|d| d.payout))
                .ok_or_else(overflow)?,
            details,
        })
    }
}

/// Grand totals across every entry in a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub row_count: usize,
    #[serde(with = "crate::amount::json")]
    pub total_hours: Amount,
    #[serde(with = "crate::amount::json")]
    pub total_payout: Amount,
}

/// Holds the result of one report run.
///
/// To build a report from parsed rows, use [`Report::build`].
///
/// To render it, use [`Format::render`](crate::Format::render).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Name of the strategy that produced the report.
    #[serde(rename = "report_type")]
    pub kind: String,
    pub generated_at: DateTime<Utc>,
    /// Input files, in the order they were read.
    pub sources: Vec<PathBuf>,
    #[serde(rename = "generated_groups")]
    pub entries: Vec<ReportEntry>,
    pub totals: Totals,
}

impl Report {
    /// Groups `rows` by `strategy`, totals each group, and orders the
    /// results.
    ///
    /// Groups are collected in the order their first row appears in `rows`,
    /// then stably sorted with [`Strategy::ordering`]. An empty `rows` gives
    /// a report with no entries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Overflow`] if a group's totals, or the grand totals,
    /// are too large to represent.
    pub fn build(
        strategy: &dyn Strategy,
        rows: &[Row],
        sources: Vec<PathBuf>,
        generated_at: DateTime<Utc>,
    ) -> Result<Self> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<&Row>)> = Vec::new();
        for row in rows {
            let key = strategy.group_key(row);
            match index.get(&key) {
                Some(&i) => groups[i].1.push(row),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push((key, vec![row]));
                }
            }
        }
        let mut entries = groups
            .iter()
            .map(|(key, rows)| strategy.aggregate(key, rows))
            .collect::<Result<Vec<_>>>()?;
        entries.sort_by(|a, b| strategy.ordering(a, b));

        let overflow = || Error::Overflow {
            group: "Total".to_string(),
        };
        let totals = Totals {
            row_count: entries.iter().map(|e| e.row_count).sum(),
            total_hours: Amount::checked_sum(entries.iter().map(|e| e.total_hours))
                .ok_or_else(overflow)?,
            total_payout: Amount::checked_sum(entries.iter().map(|e| e.total_payout))
                .ok_or_else(overflow)?,
        };
        info!(
            report = strategy.name(),
            groups = entries.len(),
            rows = totals.row_count,
            "built report"
        );
        Ok(Self {
            kind: strategy.name().to_string(),
            generated_at,
            sources,
            entries,
            totals,
        })
    }

    /// Returns `true` if no rows contributed to the report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::{
        records::read_files,
        strategy::{Employee, Payout},
    };

    fn build(strategy: &dyn Strategy, paths: &[&str]) -> Report {
        let parsed = read_files(paths).unwrap();
        Report::build(
            strategy,
            &parsed.rows,
            paths.iter().map(PathBuf::from).collect(),
            Utc::now(),
        )
        .unwrap()
    }

    fn row(id: &str, department: &str, hours: &str, rate: &str) -> Row {
        Row {
            id: id.into(),
            department: department.into(),
            email: "someone@example.com".into(),
            name: "Someone".into(),
            hours_worked: Amount::from_str(hours).unwrap(),
            rate: Amount::from_str(rate).unwrap(),
        }
    }

    #[test]
    fn build_fn_totals_each_department() {
        let report = build(&Payout, &["testdata/employees.csv"]);
        assert_eq!(report.kind, "payout");
        let groups: Vec<_> = report
            .entries
            .iter()
            .map(|e| (e.group.as_str(), e.row_count, e.total_hours.value(), e.total_payout.value()))
            .collect();
        assert_eq!(
            groups,
            vec![
                ("Design", 2, dec!(310), dec!(10050)),
                ("Engineering", 2, dec!(330), dec!(19000)),
                ("Marketing", 1, dec!(120), dec!(4800)),
            ]
        );
        assert_eq!(report.totals.row_count, 5);
        assert_eq!(report.totals.total_hours.value(), dec!(760));
        assert_eq!(report.totals.total_payout.value(), dec!(33850));
    }

    #[test]
    fn build_fn_counts_duplicate_ids_from_different_files() {
        let report = build(
            &Payout,
            &["testdata/employees.csv", "testdata/contractors.csv"],
        );
        let design = &report.entries[0];
        assert_eq!(design.group, "Design");
        assert_eq!(design.row_count, 3);
        assert_eq!(design.total_hours.value(), dec!(315));

        let by_id = build(
            &Employee,
            &["testdata/employees.csv", "testdata/contractors.csv"],
        );
        let e1 = by_id.entries.iter().find(|e| e.group == "E1").unwrap();
        assert_eq!(e1.row_count, 2);
        assert_eq!(e1.total_hours.value(), dec!(155));
    }

    #[test]
    fn build_fn_adds_hours_for_repeated_id_in_same_group() {
        let rows = vec![row("E1", "Ops", "5", "10"), row("E1", "Ops", "3", "10")];
        let report = Report::build(&Payout, &rows, vec![], Utc::now()).unwrap();
        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].total_hours.value(), dec!(8));
        assert_eq!(report.entries[0].total_payout.value(), dec!(80));
    }

    #[test]
    fn build_fn_total_payout_equals_sum_of_row_payouts() {
        let parsed = read_files(&[
            "testdata/employees.csv",
            "testdata/contractors.csv",
            "testdata/salaried.csv",
            "testdata/bad_rows.csv",
        ])
        .unwrap();
        let payouts = parsed.rows.iter().map(|r| r.payout().unwrap());
        let expected = Amount::checked_sum(payouts).unwrap();
        for strategy in crate::strategy::REGISTRY {
            let report = Report::build(*strategy, &parsed.rows, vec![], Utc::now()).unwrap();
            let from_entries =
                Amount::checked_sum(report.entries.iter().map(|e| e.total_payout)).unwrap();
            assert_eq!(from_entries, expected, "{}", strategy.name());
            assert_eq!(report.totals.total_payout, expected, "{}", strategy.name());
            assert_eq!(report.totals.row_count, parsed.rows.len());
        }
    }

    #[test]
    fn build_fn_keeps_first_seen_order_for_tied_entries() {
        let rows = vec![
            row("E3", "A", "1", "10"),
            row("E1", "A", "2", "10"),
            row("E2", "A", "1", "10"),
        ];
        let report = Report::build(&Employee, &rows, vec![], Utc::now()).unwrap();
        let ids: Vec<_> = report.entries.iter().map(|e| e.group.as_str()).collect();
        assert_eq!(ids, vec!["E1", "E3", "E2"]);
    }

    #[test]
    fn build_fn_returns_empty_report_for_no_rows() {
        let report =
            Report::build(&Payout, &[], vec!["empty.csv".into()], Utc::now()).unwrap();
        assert!(report.is_empty());
        assert_eq!(report.totals, Totals::default());
        assert_eq!(report.sources, vec![PathBuf::from("empty.csv")]);
    }

    #[test]
    fn build_fn_lists_each_row_under_its_group() {
        let report = build(&Payout, &["testdata/employees.csv"]);
        let design: Vec<_> = report.entries[0]
            .details
            .iter()
            .map(|d| (d.name.as_str(), d.hours_worked.value(), d.rate.value(), d.payout.value()))
            .collect();
        assert_eq!(
            design,
            vec![
                ("Alice Monroe", dec!(150), dec!(35), dec!(5250)),
                ("Bob Smith", dec!(160), dec!(30), dec!(4800)),
            ]
        );
    }

    #[test]
    fn build_fn_returns_overflow_error_for_group_total_too_large() {
        let rows = vec![
            row("E1", "Ops", "50000000000000", "1000000000000000"),
            row("E2", "Ops", "50000000000000", "1000000000000000"),
        ];
        match Report::build(&Payout, &rows, vec![], Utc::now()) {
            Err(Error::Overflow { group }) => assert_eq!(group, "Ops"),
            other => panic!("expected overflow error, got {other:?}"),
        }
    }

    #[test]
    fn build_fn_returns_overflow_error_for_grand_total_too_large() {
        let rows = vec![
            row("E1", "Ops", "50000000000000", "1000000000000000"),
            row("E2", "Sales", "50000000000000", "1000000000000000"),
        ];
        match Report::build(&Payout, &rows, vec![], Utc::now()) {
            Err(Error::Overflow { group }) => assert_eq!(group, "Total"),
            other => panic!("expected overflow error, got {other:?}"),
        }
    }
}
