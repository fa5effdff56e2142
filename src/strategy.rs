//! Report kinds: how rows are grouped, totalled and ordered.
//!
//! A kind is anything implementing [`Strategy`]. To make one available from
//! the command line, add it to [`REGISTRY`].

use std::cmp::Ordering;

use crate::{
    error::{Error, Result},
    records::Row,
    report::ReportEntry,
};

/// Grouping and aggregation rules for one kind of report.
pub trait Strategy {
    /// The name the report is requested by.
    fn name(&self) -> &'static str;

    /// Returns the key of the group `row` belongs to.
    fn group_key(&self, row: &Row) -> String;

    /// Computes the totals for one non-empty group.
    ///
    /// The default sums hours and payouts across `rows`, failing with
    /// [`Error::Overflow`] if they are too large to represent.
    fn aggregate(&self, group: &str, rows: &[&Row]) -> Result<ReportEntry> {
        ReportEntry::summarize(group, rows)
    }

    /// Orders entries in the finished report.
    ///
    /// Entries start out in the order their groups were first seen, and are
    /// sorted stably, so entries comparing equal keep that order.
    fn ordering(&self, a: &ReportEntry, b: &ReportEntry) -> Ordering;
}

/// Hours and payouts per department, departments in alphabetical order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Payout;

impl Strategy for Payout {
    fn name(&self) -> &'static str {
        "payout"
    }

    fn group_key(&self, row: &Row) -> String {
        row.department.clone()
    }

    fn ordering(&self, a: &ReportEntry, b: &ReportEntry) -> Ordering {
        a.group.cmp(&b.group)
    }
}

/// Hours and payouts per employee id, highest payout first.
#[derive(Debug, Clone, Copy, Default)]
pub struct Employee;

impl Strategy for Employee {
    fn name(&self) -> &'static str {
        "employee"
    }

    fn group_key(&self, row: &Row) -> String {
        row.id.clone()
    }

    fn ordering(&self, a: &ReportEntry, b: &ReportEntry) -> Ordering {
        b.total_payout.cmp(&a.total_payout)
    }
}

/// Every report kind that can be requested by name.
pub const REGISTRY: &[&dyn Strategy] = &[&Payout, &Employee];

/// Returns the names of all registered report kinds.
#[must_use]
pub fn available() -> Vec<&'static str> {
    REGISTRY.iter().map(|s| s.name()).collect()
}

/// Looks up a registered report kind by its exact name.
///
/// # Examples
///
/// ```
/// # use payroll::strategy;
/// assert_eq!(strategy::find("payout").unwrap().name(), "payout");
/// assert!(strategy::find("bogus").is_err());
/// ```
///
/// # Errors
///
/// Returns [`Error::UnknownReport`], listing the available kinds, if no kind
/// is registered under `name`.
pub fn find(name: &str) -> Result<&'static dyn Strategy> {
    REGISTRY
        .iter()
        .copied()
        .find(|s| s.name() == name)
        .ok_or_else(|| Error::UnknownReport {
            kind: name.to_string(),
            available: available(),
        })
}
