//! Fixed lookback anchors and the output column layout derived from them.

use std::fmt;

use chrono::{Months, NaiveDate};

/// Column carrying the textual failure of a snapshot job.
pub const ERROR_COLUMN: &str = "massive_error";

/// A named lookback offset from the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Anchor {
    FourYears,
    TwoYears,
    OneYear,
    SixMonths,
    ThreeMonths,
    OneMonth,
}

impl Anchor {
    /// All anchors, longest lookback first. This is also the column order.
    pub const ALL: [Anchor; 6] = [
        Anchor::FourYears,
        Anchor::TwoYears,
        Anchor::OneYear,
        Anchor::SixMonths,
        Anchor::ThreeMonths,
        Anchor::OneMonth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Anchor::FourYears => "4y",
            Anchor::TwoYears => "2y",
            Anchor::OneYear => "1y",
            Anchor::SixMonths => "6m",
            Anchor::ThreeMonths => "3m",
            Anchor::OneMonth => "1m",
        }
    }

    /// Lookback expressed in calendar months.
    pub fn months(self) -> u32 {
        match self {
            Anchor::FourYears => 48,
            Anchor::TwoYears => 24,
            Anchor::OneYear => 12,
            Anchor::SixMonths => 6,
            Anchor::ThreeMonths => 3,
            Anchor::OneMonth => 1,
        }
    }

    /// Position of this anchor in [`Anchor::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Reference date minus the lookback. Days past the end of the target
    /// month clamp to its last day (Mar 31 - 1m = Feb 28/29).
    pub fn target_date(self, reference: NaiveDate) -> Option<NaiveDate> {
        reference.checked_sub_months(Months::new(self.months()))
    }

    pub fn column(self, field: SnapshotField) -> String {
        format!("{}_{}", self.label(), field.name())
    }

    pub fn from_label(label: &str) -> Option<Anchor> {
        Anchor::ALL.into_iter().find(|a| a.label() == label)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One value projected from the selected bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotField {
    Date,
    Open,
    High,
    Low,
    Close,
    Volume,
    Vwap,
}

impl SnapshotField {
    pub const ALL: [SnapshotField; 7] = [
        SnapshotField::Date,
        SnapshotField::Open,
        SnapshotField::High,
        SnapshotField::Low,
        SnapshotField::Close,
        SnapshotField::Volume,
        SnapshotField::Vwap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SnapshotField::Date => "date",
            SnapshotField::Open => "open",
            SnapshotField::High => "high",
            SnapshotField::Low => "low",
            SnapshotField::Close => "close",
            SnapshotField::Volume => "volume",
            SnapshotField::Vwap => "vwap",
        }
    }
}

/// The 42 `{anchor}_{field}` columns, anchor-major.
pub fn snapshot_columns() -> Vec<String> {
    Anchor::ALL
        .iter()
        .flat_map(|anchor| SnapshotField::ALL.iter().map(move |field| anchor.column(*field)))
        .collect()
}

/// Snapshot columns followed by the error column: everything a run overwrites.
pub fn output_columns() -> Vec<String> {
    let mut cols = snapshot_columns();
    cols.push(ERROR_COLUMN.to_string());
    cols
}
