//! Result store: recorded test outcomes per test run and project

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use runreport_engine::{RawResult, ResultSet, Scope};

const DAILY_PREFIX: &str = "daily_";

pub struct ResultStore<'a> {
    conn: &'a Connection,
}

impl<'a> ResultStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record one result. The status is stored as given and only validated on load.
    pub fn record(
        &self,
        scope: &Scope,
        host: &str,
        context: &str,
        test_name: &str,
        status: &str,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO result_scalar (test_run, project, host, context, test_name, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![scope.test_run, scope.project, host, context, test_name, status],
        )?;
        Ok(())
    }

    /// Every result of a scope, ordered by host, context, test name
    pub fn results(&self, scope: &Scope) -> Result<Vec<RawResult>> {
        let mut stmt = self.conn.prepare(
            "SELECT host, context, test_name, status FROM result_scalar
             WHERE test_run = ?1 AND project = ?2
             ORDER BY host, context, test_name",
        )?;

        let rows = stmt
            .query_map(params![scope.test_run, scope.project], |row| {
                Ok(RawResult {
                    host: row.get(0)?,
                    context: row.get(1)?,
                    test_name: row.get(2)?,
                    status: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to read results for {scope}"))?;

        debug!("Loaded {} results for {scope}", rows.len());
        Ok(rows)
    }

    /// Load and validate a scope for the engine
    pub fn load(&self, scope: &Scope) -> Result<ResultSet> {
        let rows = self.results(scope)?;
        Ok(ResultSet::from_raw(scope.clone(), rows)?)
    }

    /// Resolve symbolic daily run names.
    ///
    /// `daily_latest` is the newest `daily_YYYY-MM-DD` run recorded,
    /// `daily_today` and `daily_yesterday` are computed from `today`. Any
    /// other name is returned unchanged.
    pub fn find_test_run(&self, name: &str, today: NaiveDate) -> Result<String> {
        match name {
            "daily_latest" => {
                let latest: Option<String> = self
                    .conn
                    .query_row(
                        "SELECT MAX(test_run) FROM result_scalar WHERE test_run GLOB 'daily_[0-9]*'",
                        [],
                        |row| row.get::<_, Option<String>>(0),
                    )
                    .optional()?
                    .flatten();
                latest.context("No daily test runs recorded")
            }
            "daily_today" => Ok(daily_name(today)),
            "daily_yesterday" => Ok(daily_name(today - Duration::days(1))),
            other => Ok(other.to_string()),
        }
    }
}

fn daily_name(date: NaiveDate) -> String {
    format!("{DAILY_PREFIX}{}", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use crate::store::Database;
    use chrono::NaiveDate;
    use runreport_engine::{EngineError, Scope, StatusCode};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    #[test]
    fn test_results_are_scoped_and_ordered() {
        let db = Database::open_in_memory().unwrap();
        let store = db.results();
        let scope = Scope::new("run1", "core");

        store.record(&scope, "h2", "c1", "a", "F").unwrap();
        store.record(&scope, "h1", "c2", "a", "P").unwrap();
        store.record(&scope, "h1", "c1", "b", "E").unwrap();
        store.record(&Scope::new("run1", "other"), "h1", "c1", "z", "F").unwrap();
        store.record(&Scope::new("run2", "core"), "h1", "c1", "z", "F").unwrap();

        let rows = store.results(&scope).unwrap();
        let keys: Vec<(&str, &str, &str)> = rows
            .iter()
            .map(|r| (r.host.as_str(), r.context.as_str(), r.test_name.as_str()))
            .collect();
        assert_eq!(keys, vec![("h1", "c1", "b"), ("h1", "c2", "a"), ("h2", "c1", "a")]);
    }

    #[test]
    fn test_load_validates_statuses() {
        let db = Database::open_in_memory().unwrap();
        let store = db.results();
        let scope = Scope::new("run1", "core");

        store.record(&scope, "h1", "c1", "a", "P").unwrap();
        let set = store.load(&scope).unwrap();
        assert_eq!(set.results()[0].status, StatusCode::Pass);

        store.record(&scope, "h1", "c1", "bad", "W").unwrap();
        let err = store.load(&scope).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::DataIntegrity { test_name, .. }) if test_name == "bad"
        ));
    }

    #[test]
    fn test_empty_scope_loads_empty() {
        let db = Database::open_in_memory().unwrap();
        let set = db.results().load(&Scope::new("none", "none")).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_find_daily_latest() {
        let db = Database::open_in_memory().unwrap();
        let store = db.results();
        for run in ["daily_2026-10-16", "daily_2026-10-17", "nightly", "daily_2026-09-30"] {
            store.record(&Scope::new(run, "core"), "h1", "c1", "a", "P").unwrap();
        }

        assert_eq!(
            store.find_test_run("daily_latest", today()).unwrap(),
            "daily_2026-10-17"
        );
    }

    #[test]
    fn test_find_daily_latest_without_runs_fails() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.results().find_test_run("daily_latest", today()).is_err());
    }

    #[test]
    fn test_find_relative_and_literal_runs() {
        let db = Database::open_in_memory().unwrap();
        let store = db.results();
        assert_eq!(
            store.find_test_run("daily_today", today()).unwrap(),
            "daily_2026-10-18"
        );
        assert_eq!(
            store.find_test_run("daily_yesterday", today()).unwrap(),
            "daily_2026-10-17"
        );
        assert_eq!(store.find_test_run("release_7", today()).unwrap(), "release_7");
    }
}
