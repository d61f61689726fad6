//! Grouping: host/context universes and per-test failure lists
//!
//! Passing results only contribute to the host universe; everything else in
//! here is built from non-passing rows.

use indexmap::IndexMap;
use std::collections::BTreeSet;

use crate::record::ResultSet;
use crate::status::StatusCode;

/// One non-passing observation of a test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub host: String,
    pub context: String,
    pub status: StatusCode,
}

/// Grouped view of a result set
#[derive(Debug, Clone, Default)]
pub struct Grouping {
    /// Distinct hosts over every result
    pub hosts: BTreeSet<String>,
    /// Distinct contexts over non-passing results
    pub contexts: BTreeSet<String>,
    /// test name → non-passing outcomes, in first-seen order
    pub tests: IndexMap<String, Vec<Outcome>>,
}

impl Grouping {
    pub fn build(set: &ResultSet) -> Self {
        let mut grouping = Grouping::default();

        for result in set.results() {
            if !grouping.hosts.contains(&result.host) {
                grouping.hosts.insert(result.host.clone());
            }
            if result.status.is_pass() {
                continue;
            }
            if !grouping.contexts.contains(&result.context) {
                grouping.contexts.insert(result.context.clone());
            }
            grouping
                .tests
                .entry(result.test_name.clone())
                .or_default()
                .push(Outcome {
                    host: result.host.clone(),
                    context: result.context.clone(),
                    status: result.status,
                });
        }

        grouping
    }

    /// `H`
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// `C`
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }
}

/// Number of distinct hosts and distinct contexts among a test's outcomes
pub fn distinct_spread(outcomes: &[Outcome]) -> (usize, usize) {
    let hosts: BTreeSet<&str> = outcomes.iter().map(|o| o.host.as_str()).collect();
    let contexts: BTreeSet<&str> = outcomes.iter().map(|o| o.context.as_str()).collect();
    (hosts.len(), contexts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ResultTuple, Scope};

    fn set(rows: &[(&str, &str, &str, StatusCode)]) -> ResultSet {
        ResultSet::new(
            Scope::new("run", "proj"),
            rows.iter()
                .map(|(h, c, t, s)| ResultTuple::new(h, c, t, *s))
                .collect(),
        )
    }

    #[test]
    fn test_hosts_include_passing_contexts_do_not() {
        let grouping = Grouping::build(&set(&[
            ("h1", "c1", "t1", StatusCode::Pass),
            ("h2", "c2", "t1", StatusCode::Pass),
            ("h2", "c3", "t2", StatusCode::Fail),
        ]));

        assert_eq!(grouping.host_count(), 2);
        assert_eq!(grouping.context_count(), 1);
        assert!(grouping.contexts.contains("c3"));
        assert_eq!(grouping.tests.len(), 1);
        assert!(grouping.tests.contains_key("t2"));
    }

    #[test]
    fn test_outcomes_keep_duplicates_in_order() {
        let grouping = Grouping::build(&set(&[
            ("h1", "c1", "t1", StatusCode::Fail),
            ("h1", "c1", "t1", StatusCode::Error),
            ("h2", "c1", "t1", StatusCode::Missing),
        ]));

        let outcomes = &grouping.tests["t1"];
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].status, StatusCode::Fail);
        assert_eq!(outcomes[1].status, StatusCode::Error);
        assert_eq!(outcomes[2].host, "h2");
        assert_eq!(distinct_spread(outcomes), (2, 1));
    }

    #[test]
    fn test_empty_set() {
        let grouping = Grouping::build(&set(&[]));
        assert_eq!(grouping.host_count(), 0);
        assert_eq!(grouping.context_count(), 0);
        assert!(grouping.tests.is_empty());
    }
}
