//! Status Tally Aggregator: pass/fail/error/disabled/missing counts
//!
//! Counts are kept per (host, context) cell plus one flat roll-up over the
//! whole scope. Cells that never received a result are absent.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::record::ResultSet;
use crate::status::{StatusCode, StatusCounts, TallyColumn};

/// Label used for the roll-up row in both the host and context columns
pub const ALL_LABEL: &str = "All";

/// host → context → counts, plus the scope-wide roll-up
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TallyTable {
    cells: BTreeMap<String, BTreeMap<String, StatusCounts>>,
    all: StatusCounts,
}

/// One line of the summary table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TallyRow {
    pub host: String,
    pub context: String,
    pub counts: StatusCounts,
}

impl TallyRow {
    /// Values in `T P F E D M` order
    pub fn values(&self) -> [u64; 6] {
        TallyColumn::ORDER.map(|column| self.counts.get_column(column))
    }
}

impl TallyTable {
    pub fn record(&mut self, host: &str, context: &str, status: StatusCode) {
        self.cells
            .entry(host.to_string())
            .or_default()
            .entry(context.to_string())
            .or_default()
            .increment(status);
        self.all.increment(status);
    }

    /// Counts at a cell; `None` when nothing was recorded there
    pub fn cell(&self, host: &str, context: &str) -> Option<&StatusCounts> {
        self.cells.get(host).and_then(|contexts| contexts.get(context))
    }

    /// Counts at a cell, defaulting to zero
    pub fn count(&self, host: &str, context: &str, status: StatusCode) -> u64 {
        self.cell(host, context).map_or(0, |counts| counts.get(status))
    }

    /// The scope-wide roll-up
    pub fn all(&self) -> &StatusCounts {
        &self.all
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn contexts(&self, host: &str) -> impl Iterator<Item = &str> {
        self.cells
            .get(host)
            .into_iter()
            .flat_map(|contexts| contexts.keys().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Summary rows: `All/All` first, then hosts and their contexts in order
    pub fn rows(&self) -> Vec<TallyRow> {
        let mut rows = vec![TallyRow {
            host: ALL_LABEL.to_string(),
            context: ALL_LABEL.to_string(),
            counts: self.all,
        }];
        for (host, contexts) in &self.cells {
            for (context, counts) in contexts {
                rows.push(TallyRow {
                    host: host.clone(),
                    context: context.clone(),
                    counts: *counts,
                });
            }
        }
        rows
    }
}

/// Count every result of a set, passing ones included
pub fn tally(set: &ResultSet) -> TallyTable {
    let mut table = TallyTable::default();
    for result in set.results() {
        table.record(&result.host, &result.context, result.status);
    }

    debug!(
        "Tallied {}: {} results over {} hosts",
        set.scope(),
        table.all.total(),
        table.cells.len()
    );

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ResultTuple, Scope};
    use StatusCode::*;

    fn set(rows: &[(&str, &str, StatusCode)]) -> ResultSet {
        ResultSet::new(
            Scope::new("run", "proj"),
            rows.iter()
                .enumerate()
                .map(|(i, (h, c, s))| ResultTuple::new(h, c, &format!("t{i}"), *s))
                .collect(),
        )
    }

    #[test]
    fn test_single_cell() {
        let table = tally(&set(&[
            ("h1", "c1", Pass),
            ("h1", "c1", Pass),
            ("h1", "c1", Pass),
            ("h1", "c1", Fail),
        ]));

        let cell = table.cell("h1", "c1").unwrap();
        assert_eq!(cell.get(Pass), 3);
        assert_eq!(cell.get(Fail), 1);
        assert_eq!(cell.total(), 4);
        assert_eq!(table.all(), cell);
    }

    #[test]
    fn test_absent_cells_default_to_zero() {
        let table = tally(&set(&[("h1", "c1", Pass), ("h2", "c2", Error)]));
        assert!(table.cell("h1", "c2").is_none());
        assert_eq!(table.count("h1", "c2", Pass), 0);
        assert_eq!(table.count("h2", "c2", Error), 1);
    }

    #[test]
    fn test_rows_order_and_values() {
        let table = tally(&set(&[
            ("h2", "c1", Disabled),
            ("h1", "c2", Missing),
            ("h1", "c1", Pass),
            ("h1", "c1", Fail),
        ]));

        let rows = table.rows();
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.host.as_str(), r.context.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![("All", "All"), ("h1", "c1"), ("h1", "c2"), ("h2", "c1")]
        );
        assert_eq!(rows[0].values(), [4, 1, 1, 0, 1, 1]);
        assert_eq!(rows[1].values(), [2, 1, 1, 0, 0, 0]);
        assert_eq!(rows[3].values(), [1, 0, 0, 0, 1, 0]);
    }

    #[test]
    fn test_empty() {
        let table = tally(&set(&[]));
        assert!(table.is_empty());
        assert_eq!(table.all().total(), 0);
        assert_eq!(table.rows().len(), 1);
    }
}
