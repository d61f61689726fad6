//! SQLite-backed stores
//!
//! One database holds the recorded results, the user/email preferences and
//! the test contact list. Each store is a thin view over the shared
//! connection.

use anyhow::{Context, Result};
use rusqlite::Connection;

pub mod contacts;
pub mod prefs;
pub mod results;

pub use contacts::ContactStore;
pub use prefs::{AddPref, PreferenceStore, ProjectPref, ReportFormat};
pub use results::ResultStore;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS result_scalar (
        key_id INTEGER PRIMARY KEY AUTOINCREMENT,
        test_run TEXT NOT NULL,
        project TEXT NOT NULL,
        host TEXT NOT NULL,
        context TEXT NOT NULL,
        test_name TEXT NOT NULL,
        status TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS user_prefs (
        username TEXT PRIMARY KEY,
        email TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS user_email_pref (
        username TEXT NOT NULL,
        project TEXT NOT NULL,
        format TEXT NOT NULL,
        maxlines INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS contact (
        project TEXT NOT NULL,
        test_name TEXT NOT NULL,
        username TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_result_scope ON result_scalar(test_run, project);
    CREATE INDEX IF NOT EXISTS idx_email_pref_user ON user_email_pref(username);
    CREATE INDEX IF NOT EXISTS idx_contact_user ON contact(username, project);";

/// Shared database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(db_path: &str) -> Result<Self> {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database {db_path}"))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    #[cfg(test)]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .context("Failed to create runreport schema")?;
        Ok(Self { conn })
    }

    pub fn results(&self) -> ResultStore<'_> {
        ResultStore::new(&self.conn)
    }

    pub fn prefs(&self) -> PreferenceStore<'_> {
        PreferenceStore::new(&self.conn)
    }

    pub fn contacts(&self) -> ContactStore<'_> {
        ContactStore::new(&self.conn)
    }
}
