//! Status codes: the closed outcome vocabulary of a single test execution
//!
//! Results arrive from the store as single-letter codes (`P`, `F`, `E`, `D`, `M`).
//! Anything else is rejected when the record is parsed, never tallied.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one test execution on one host/context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatusCode {
    Pass,
    Fail,
    Error,
    Disabled,
    Missing,
}

impl StatusCode {
    /// Every status, in summary column order
    pub const ALL: [StatusCode; 5] = [
        StatusCode::Pass,
        StatusCode::Fail,
        StatusCode::Error,
        StatusCode::Disabled,
        StatusCode::Missing,
    ];

    /// Parse the single-letter store code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "P" => Some(StatusCode::Pass),
            "F" => Some(StatusCode::Fail),
            "E" => Some(StatusCode::Error),
            "D" => Some(StatusCode::Disabled),
            "M" => Some(StatusCode::Missing),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            StatusCode::Pass => "P",
            StatusCode::Fail => "F",
            StatusCode::Error => "E",
            StatusCode::Disabled => "D",
            StatusCode::Missing => "M",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusCode::Pass => "Pass",
            StatusCode::Fail => "Fail",
            StatusCode::Error => "Error",
            StatusCode::Disabled => "Disabled",
            StatusCode::Missing => "Missing",
        }
    }

    pub fn is_pass(self) -> bool {
        self == StatusCode::Pass
    }

    fn index(self) -> usize {
        match self {
            StatusCode::Pass => 0,
            StatusCode::Fail => 1,
            StatusCode::Error => 2,
            StatusCode::Disabled => 3,
            StatusCode::Missing => 4,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Fixed-shape per-status counter. Statuses never seen read as 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    counts: [u64; 5],
}

impl StatusCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, status: StatusCode) {
        self.counts[status.index()] += 1;
    }

    pub fn add(&mut self, other: &StatusCounts) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine += theirs;
        }
    }

    pub fn get(&self, status: StatusCode) -> u64 {
        self.counts[status.index()]
    }

    /// The synthetic `T` column
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn get_column(&self, column: TallyColumn) -> u64 {
        match column {
            TallyColumn::Total => self.total(),
            TallyColumn::Status(status) => self.get(status),
        }
    }
}

/// Summary table columns: the synthetic total followed by each status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TallyColumn {
    Total,
    Status(StatusCode),
}

impl TallyColumn {
    /// Fixed column order `T P F E D M`
    pub const ORDER: [TallyColumn; 6] = [
        TallyColumn::Total,
        TallyColumn::Status(StatusCode::Pass),
        TallyColumn::Status(StatusCode::Fail),
        TallyColumn::Status(StatusCode::Error),
        TallyColumn::Status(StatusCode::Disabled),
        TallyColumn::Status(StatusCode::Missing),
    ];

    pub fn code(self) -> &'static str {
        match self {
            TallyColumn::Total => "T",
            TallyColumn::Status(status) => status.code(),
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            TallyColumn::Total => "Total",
            TallyColumn::Status(status) => status.label(),
        }
    }
}
