//! Per-run memoization of classifier and tally results
//!
//! Owned by whoever drives a reporting run and cleared when the next run
//! starts. Keys are the full scope, so two projects of the same test run
//! never share an entry.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::classifier::{classify, ClassifiedBucket};
use crate::record::{ResultSet, Scope};
use crate::tally::{tally, TallyTable};

#[derive(Debug, Default)]
pub struct ReportCache {
    classified: HashMap<Scope, Arc<ClassifiedBucket>>,
    tallies: HashMap<Scope, Arc<TallyTable>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry; call at the start of a reporting run
    pub fn clear(&mut self) {
        debug!(
            "Clearing report cache ({} classified, {} tallies)",
            self.classified.len(),
            self.tallies.len()
        );
        self.classified.clear();
        self.tallies.clear();
    }

    /// Classified bucket for a scope, loading and classifying on first use.
    /// A failed load is not cached.
    pub fn classified<E, F>(&mut self, scope: &Scope, load: F) -> Result<Arc<ClassifiedBucket>, E>
    where
        F: FnOnce(&Scope) -> Result<ResultSet, E>,
    {
        if let Some(hit) = self.classified.get(scope) {
            return Ok(Arc::clone(hit));
        }
        let set = load(scope)?;
        let bucket = Arc::new(classify(&set));
        self.classified.insert(scope.clone(), Arc::clone(&bucket));
        Ok(bucket)
    }

    /// Tally table for a scope, loading and tallying on first use
    pub fn tally<E, F>(&mut self, scope: &Scope, load: F) -> Result<Arc<TallyTable>, E>
    where
        F: FnOnce(&Scope) -> Result<ResultSet, E>,
    {
        if let Some(hit) = self.tallies.get(scope) {
            return Ok(Arc::clone(hit));
        }
        let set = load(scope)?;
        let table = Arc::new(tally(&set));
        self.tallies.insert(scope.clone(), Arc::clone(&table));
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.classified.len() + self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classified.is_empty() && self.tallies.is_empty()
    }
}
