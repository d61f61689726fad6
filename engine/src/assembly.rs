//! Line-capped anomaly report assembly
//!
//! Splits a classified bucket into the universal-failure table and the
//! partial-failure table, each capped at `max_lines` data rows (0 means no
//! cap). A capped table ends with a single suppression marker.

use serde::Serialize;

use crate::classifier::{BucketKey, ClassifiedBucket, ClassifiedRow};
use crate::status::StatusCode;

pub const SUPPRESSED_MESSAGE: &str = "The remainder of the output is suppressed";
pub const NO_ANOMALIES_MESSAGE: &str = "No anomalies to report";

/// A data row of an anomaly table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnomalyRow {
    /// Host name, or `All` for universal failures
    pub host: String,
    pub test_name: String,
    pub context: String,
    pub status: StatusCode,
}

/// One capped table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnomalySection {
    pub rows: Vec<AnomalyRow>,
    /// Set when rows beyond the cap were dropped
    pub suppressed: bool,
}

impl AnomalySection {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row count including the suppression marker
    pub fn line_count(&self) -> usize {
        self.rows.len() + usize::from(self.suppressed)
    }

    fn fill<'a, I>(rows: I, max_lines: usize) -> Self
    where
        I: IntoIterator<Item = (&'a BucketKey, &'a ClassifiedRow)>,
    {
        let mut section = AnomalySection::default();
        for (key, row) in rows {
            if max_lines > 0 && section.rows.len() >= max_lines {
                section.suppressed = true;
                break;
            }
            section.rows.push(AnomalyRow {
                host: key.as_str().to_string(),
                test_name: row.test_name.clone(),
                context: row.context.clone(),
                status: row.status,
            });
        }
        section
    }
}

/// Both tables of an anomaly report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnomalyReport {
    pub universal: AnomalySection,
    pub partial: AnomalySection,
}

impl AnomalyReport {
    /// True when neither table has anything to show
    pub fn is_empty(&self) -> bool {
        self.universal.is_empty() && self.partial.is_empty()
    }
}

/// Assemble the capped tables from a classified bucket
pub fn assemble(classified: &ClassifiedBucket, max_lines: usize) -> AnomalyReport {
    let universal = classified
        .iter()
        .filter(|(key, _)| **key == BucketKey::All)
        .flat_map(|(key, rows)| rows.iter().map(move |row| (key, row)));
    let partial = classified
        .iter()
        .filter(|(key, _)| **key != BucketKey::All)
        .flat_map(|(key, rows)| rows.iter().map(move |row| (key, row)));

    AnomalyReport {
        universal: AnomalySection::fill(universal, max_lines),
        partial: AnomalySection::fill(partial, max_lines),
    }
}
