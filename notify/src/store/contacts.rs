//! Contact store: tests each user is responsible for

use anyhow::Result;
use rusqlite::{params, Connection};

use runreport_engine::{RawResult, ResultTuple, Scope};

pub struct ContactStore<'a> {
    conn: &'a Connection,
}

impl<'a> ContactStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn add_contact(&self, project: &str, test_name: &str, username: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO contact (project, test_name, username) VALUES (?1, ?2, ?3)",
            params![project, test_name, username],
        )?;
        Ok(())
    }

    /// Non-passing results of the tests a user is a contact for.
    ///
    /// Contact entries may use SQL `GLOB` wildcards in the test name.
    pub fn failures_for(&self, username: &str, scope: &Scope) -> Result<Vec<ResultTuple>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT r.key_id, r.host, r.context, r.test_name, r.status
             FROM result_scalar r
             JOIN contact c ON c.project = r.project AND r.test_name GLOB c.test_name
             WHERE c.username = ?1 AND r.test_run = ?2 AND r.project = ?3 AND r.status <> 'P'
             ORDER BY r.test_name, r.host, r.context",
        )?;

        let rows = stmt
            .query_map(params![username, scope.test_run, scope.project], |row| {
                Ok(RawResult {
                    host: row.get(1)?,
                    context: row.get(2)?,
                    test_name: row.get(3)?,
                    status: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let tuples = rows
            .into_iter()
            .map(RawResult::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tuples)
    }
}

#[cfg(test)]
mod tests {
    use crate::store::Database;
    use runreport_engine::{Scope, StatusCode};

    #[test]
    fn test_failures_for_contact() {
        let db = Database::open_in_memory().unwrap();
        let scope = Scope::new("run1", "core");
        let results = db.results();
        results.record(&scope, "h1", "c1", "io/read", "F").unwrap();
        results.record(&scope, "h2", "c1", "io/read", "P").unwrap();
        results.record(&scope, "h1", "c1", "io/write", "E").unwrap();
        results.record(&scope, "h1", "c1", "net/ping", "F").unwrap();

        let contacts = db.contacts();
        contacts.add_contact("core", "io/*", "ann").unwrap();
        contacts.add_contact("other", "net/*", "ann").unwrap();

        let failures = contacts.failures_for("ann", &scope).unwrap();
        let names: Vec<(&str, StatusCode)> = failures
            .iter()
            .map(|r| (r.test_name.as_str(), r.status))
            .collect();
        assert_eq!(
            names,
            vec![("io/read", StatusCode::Fail), ("io/write", StatusCode::Error)]
        );

        assert!(contacts.failures_for("bob", &scope).unwrap().is_empty());
    }

    #[test]
    fn test_overlapping_contact_entries_do_not_duplicate() {
        let db = Database::open_in_memory().unwrap();
        let scope = Scope::new("run1", "core");
        db.results().record(&scope, "h1", "c1", "io/read", "F").unwrap();

        let contacts = db.contacts();
        contacts.add_contact("core", "io/*", "ann").unwrap();
        contacts.add_contact("core", "io/read", "ann").unwrap();

        assert_eq!(contacts.failures_for("ann", &scope).unwrap().len(), 1);
    }
}
