//! Anomaly Classifier: failed everywhere vs. failed somewhere
//!
//! A test is a universal failure when its non-passing rows cover every host
//! and every failing context of the scope. Such a test gets a single row in
//! the `All` bucket. Any other failing test is a partial failure and every
//! one of its rows lands in the bucket of the host it was recorded on.
//! Tests that only passed appear nowhere.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

use crate::grouping::{distinct_spread, Grouping};
use crate::record::ResultSet;
use crate::status::StatusCode;

/// Bucket key. `All` orders before every host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    All,
    Host(String),
}

impl BucketKey {
    pub fn host(name: &str) -> Self {
        BucketKey::Host(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            BucketKey::All => "All",
            BucketKey::Host(name) => name,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BucketKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One classified failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedRow {
    pub context: String,
    pub test_name: String,
    pub status: StatusCode,
}

impl ClassifiedRow {
    pub fn new(context: &str, test_name: &str, status: StatusCode) -> Self {
        Self {
            context: context.to_string(),
            test_name: test_name.to_string(),
            status,
        }
    }
}

/// Classifier output, iterated `All` first then hosts lexicographically.
/// Rows within a bucket are ordered by context, then test name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedBucket {
    buckets: BTreeMap<BucketKey, Vec<ClassifiedRow>>,
}

impl ClassifiedBucket {
    fn push(&mut self, key: BucketKey, row: ClassifiedRow) {
        self.buckets.entry(key).or_default().push(row);
    }

    pub fn get(&self, key: &BucketKey) -> Option<&[ClassifiedRow]> {
        self.buckets.get(key).map(Vec::as_slice)
    }

    /// Rows of tests that failed on every host and context
    pub fn universal(&self) -> &[ClassifiedRow] {
        self.get(&BucketKey::All).unwrap_or(&[])
    }

    /// Host buckets in host order
    pub fn host_buckets(&self) -> impl Iterator<Item = (&str, &[ClassifiedRow])> {
        self.buckets.iter().filter_map(|(key, rows)| match key {
            BucketKey::All => None,
            BucketKey::Host(name) => Some((name.as_str(), rows.as_slice())),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &[ClassifiedRow])> {
        self.buckets.iter().map(|(key, rows)| (key, rows.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &BucketKey> {
        self.buckets.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

impl Serialize for ClassifiedBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for (key, rows) in &self.buckets {
            map.serialize_entry(key, rows)?;
        }
        map.end()
    }
}

/// Classify every failing test of a result set
pub fn classify(set: &ResultSet) -> ClassifiedBucket {
    let grouping = Grouping::build(set);
    let host_total = grouping.host_count();
    let context_total = grouping.context_count();
    let mut classified = ClassifiedBucket::default();

    for (test_name, outcomes) in &grouping.tests {
        let (hosts, contexts) = distinct_spread(outcomes);
        let universal = host_total > 0
            && context_total > 0
            && hosts == host_total
            && contexts == context_total;

        if universal {
            // Outcomes are never empty for a grouped test
            if let Some(first) = outcomes.first() {
                classified.push(
                    BucketKey::All,
                    ClassifiedRow::new(&first.context, test_name, first.status),
                );
            }
        } else {
            for outcome in outcomes {
                classified.push(
                    BucketKey::host(&outcome.host),
                    ClassifiedRow::new(&outcome.context, test_name, outcome.status),
                );
            }
        }
    }

    for rows in classified.buckets.values_mut() {
        rows.sort_by(|a, b| {
            (a.context.as_str(), a.test_name.as_str()).cmp(&(b.context.as_str(), b.test_name.as_str()))
        });
    }

    debug!(
        "Classified {} ({} hosts, {} contexts): {} failing tests, {} universal",
        set.scope(),
        host_total,
        context_total,
        grouping.tests.len(),
        classified.universal().len()
    );

    classified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ResultTuple, Scope};
    use StatusCode::*;

    fn set(rows: &[(&str, &str, &str, StatusCode)]) -> ResultSet {
        ResultSet::new(
            Scope::new("run", "proj"),
            rows.iter()
                .map(|(h, c, t, s)| ResultTuple::new(h, c, t, *s))
                .collect(),
        )
    }

    #[test]
    fn test_partial_and_universal() {
        let classified = classify(&set(&[
            ("h1", "c1", "t1", Fail),
            ("h2", "c1", "t1", Fail),
            ("h1", "c1", "t2", Fail),
            ("h1", "c2", "t2", Fail),
            ("h2", "c1", "t2", Fail),
            ("h2", "c2", "t2", Fail),
        ]));

        assert_eq!(classified.universal(), &[ClassifiedRow::new("c1", "t2", Fail)]);
        assert_eq!(
            classified.get(&BucketKey::host("h1")).unwrap(),
            &[ClassifiedRow::new("c1", "t1", Fail)]
        );
        assert_eq!(
            classified.get(&BucketKey::host("h2")).unwrap(),
            &[ClassifiedRow::new("c1", "t1", Fail)]
        );
        let keys: Vec<&str> = classified.keys().map(BucketKey::as_str).collect();
        assert_eq!(keys, vec!["All", "h1", "h2"]);
    }

    #[test]
    fn test_passing_tests_are_omitted() {
        let classified = classify(&set(&[
            ("h1", "c1", "t1", Pass),
            ("h2", "c1", "t1", Pass),
        ]));
        assert!(classified.is_empty());
    }

    #[test]
    fn test_failing_on_one_of_two_hosts_is_partial() {
        let classified = classify(&set(&[
            ("h1", "c1", "t1", Error),
            ("h2", "c1", "t1", Pass),
        ]));
        assert!(classified.universal().is_empty());
        assert_eq!(
            classified.get(&BucketKey::host("h1")).unwrap(),
            &[ClassifiedRow::new("c1", "t1", Error)]
        );
        assert!(classified.get(&BucketKey::host("h2")).is_none());
    }

    #[test]
    fn test_single_host_single_context_failure_is_universal() {
        let classified = classify(&set(&[("h1", "c1", "t1", Missing)]));
        assert_eq!(classified.universal(), &[ClassifiedRow::new("c1", "t1", Missing)]);
        assert_eq!(classified.row_count(), 1);
    }

    #[test]
    fn test_duplicates_do_not_block_universal() {
        let classified = classify(&set(&[
            ("h1", "c1", "t1", Fail),
            ("h1", "c1", "t1", Fail),
        ]));
        assert_eq!(classified.universal().len(), 1);
    }

    #[test]
    fn test_partial_duplicates_are_emitted_verbatim() {
        let classified = classify(&set(&[
            ("h1", "c1", "t1", Fail),
            ("h1", "c1", "t1", Error),
            ("h2", "c2", "t2", Fail),
        ]));
        assert_eq!(
            classified.get(&BucketKey::host("h1")).unwrap(),
            &[
                ClassifiedRow::new("c1", "t1", Fail),
                ClassifiedRow::new("c1", "t1", Error),
            ]
        );
    }

    #[test]
    fn test_bucket_rows_sorted_by_context_then_test() {
        let classified = classify(&set(&[
            ("h1", "c2", "y", Fail),
            ("h2", "c1", "y", Pass),
            ("h2", "c2", "y", Fail),
            ("h2", "c1", "x", Error),
            ("h1", "c1", "x", Pass),
        ]));
        assert_eq!(
            classified.get(&BucketKey::host("h2")).unwrap(),
            &[
                ClassifiedRow::new("c1", "x", Error),
                ClassifiedRow::new("c2", "y", Fail),
            ]
        );
    }

    #[test]
    fn test_host_named_all_sorts_after_sentinel() {
        let classified = classify(&set(&[
            ("All", "c1", "t1", Fail),
            ("h1", "c1", "t2", Fail),
            ("h1", "c1", "t1", Pass),
            ("All", "c1", "t2", Pass),
        ]));
        let keys: Vec<BucketKey> = classified.keys().cloned().collect();
        assert_eq!(keys, vec![BucketKey::host("All"), BucketKey::host("h1")]);
        assert!(classified.universal().is_empty());
    }

    #[test]
    fn test_serializes_as_string_keyed_map() {
        let classified = classify(&set(&[("h1", "c1", "t1", Fail), ("h2", "c1", "t2", Fail)]));
        let json = serde_json::to_value(&classified).unwrap();
        assert_eq!(json["h1"][0]["test_name"], "t1");
        assert_eq!(json["h2"][0]["status"], "Fail");
    }
}
