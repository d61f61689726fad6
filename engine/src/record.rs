//! Result records and the per-scope result set the engine consumes

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, Result};
use crate::status::StatusCode;

/// One aggregation universe: a test run of a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Scope {
    pub test_run: String,
    pub project: String,
}

impl Scope {
    pub fn new(test_run: impl Into<String>, project: impl Into<String>) -> Self {
        Self {
            test_run: test_run.into(),
            project: project.into(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.test_run, self.project)
    }
}

/// A row as the store hands it over, status still unvalidated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResult {
    pub host: String,
    pub context: String,
    pub test_name: String,
    pub status: String,
}

impl RawResult {
    pub fn new(host: &str, context: &str, test_name: &str, status: &str) -> Self {
        Self {
            host: host.to_string(),
            context: context.to_string(),
            test_name: test_name.to_string(),
            status: status.to_string(),
        }
    }

    /// Validate the status code
    pub fn parse(self) -> Result<ResultTuple> {
        match StatusCode::from_code(&self.status) {
            Some(status) => Ok(ResultTuple {
                host: self.host,
                context: self.context,
                test_name: self.test_name,
                status,
            }),
            None => Err(EngineError::DataIntegrity {
                test_name: self.test_name,
                host: self.host,
                context: self.context,
                status: self.status,
            }),
        }
    }
}

/// A validated execution result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTuple {
    pub host: String,
    pub context: String,
    pub test_name: String,
    pub status: StatusCode,
}

impl ResultTuple {
    pub fn new(host: &str, context: &str, test_name: &str, status: StatusCode) -> Self {
        Self {
            host: host.to_string(),
            context: context.to_string(),
            test_name: test_name.to_string(),
            status,
        }
    }
}

/// All results of one scope, validated and in a stable order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    scope: Scope,
    results: Vec<ResultTuple>,
}

impl ResultSet {
    /// Build from validated tuples.
    ///
    /// Tuples are stably sorted by host, context, then test name, so the
    /// order the store returned them in does not leak into any report.
    pub fn new(scope: Scope, mut results: Vec<ResultTuple>) -> Self {
        results.sort_by(|a, b| {
            (&a.host, &a.context, &a.test_name).cmp(&(&b.host, &b.context, &b.test_name))
        });
        Self { scope, results }
    }

    /// Validate raw store rows. The first malformed status fails the whole scope.
    pub fn from_raw<I>(scope: Scope, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = RawResult>,
    {
        let results = rows
            .into_iter()
            .map(RawResult::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(scope, results))
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn results(&self) -> &[ResultTuple] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
