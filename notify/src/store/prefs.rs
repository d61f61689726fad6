//! Preference store: who gets which report for which project

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrefError {
    #[error("unknown report format '{0}' (expected one of n, c, f, s)")]
    UnknownFormat(String),
}

/// Report a user asked for on a project
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// `n`: nothing
    None,
    /// `c`: only tests the user is a contact for
    Contact,
    /// `f`/`F`: anomaly tables
    Anomaly,
    /// `s`/`S`: status summary
    Summary,
}

impl ReportFormat {
    pub fn code(self) -> &'static str {
        match self {
            ReportFormat::None => "n",
            ReportFormat::Contact => "c",
            ReportFormat::Anomaly => "f",
            ReportFormat::Summary => "s",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = PrefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" | "N" => Ok(ReportFormat::None),
            "c" => Ok(ReportFormat::Contact),
            "f" | "F" => Ok(ReportFormat::Anomaly),
            "s" | "S" => Ok(ReportFormat::Summary),
            other => Err(PrefError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One project entry of a user's preferences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPref {
    pub project: String,
    pub format: ReportFormat,
    /// Rows per anomaly table, 0 for no limit
    pub max_lines: usize,
}

/// Outcome of [`PreferenceStore::add_user_pref`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPref {
    AlreadyPresent,
    Committed,
}

pub struct PreferenceStore<'a> {
    conn: &'a Connection,
}

impl<'a> PreferenceStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a preference unless an identical one exists
    pub fn add_user_pref(
        &self,
        username: &str,
        project: &str,
        format: ReportFormat,
        max_lines: usize,
    ) -> Result<AddPref> {
        let max_lines = i64::try_from(max_lines).context("maxlines out of range")?;
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT username FROM user_email_pref
                 WHERE username = ?1 AND project = ?2 AND format = ?3 AND maxlines = ?4",
                params![username, project, format.code(), max_lines],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Ok(AddPref::AlreadyPresent);
        }

        self.conn.execute(
            "INSERT INTO user_email_pref (username, project, format, maxlines) VALUES (?1, ?2, ?3, ?4)",
            params![username, project, format.code(), max_lines],
        )?;
        Ok(AddPref::Committed)
    }

    /// A user's projects ordered by name, skipping `n` entries
    pub fn user_projects(&self, username: &str) -> Result<Vec<ProjectPref>> {
        let mut stmt = self.conn.prepare(
            "SELECT project, format, maxlines FROM user_email_pref
             WHERE username = ?1 ORDER BY project",
        )?;

        let rows = stmt
            .query_map(params![username], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut prefs = Vec::with_capacity(rows.len());
        for (project, format, max_lines) in rows {
            let format: ReportFormat = format
                .parse()
                .with_context(|| format!("Bad preference for {username} on {project}"))?;
            if format == ReportFormat::None {
                continue;
            }
            let max_lines = usize::try_from(max_lines).with_context(|| {
                format!("Bad maxlines {max_lines} for {username} on {project}")
            })?;
            prefs.push(ProjectPref {
                project,
                format,
                max_lines,
            });
        }
        Ok(prefs)
    }

    pub fn set_user_email(&self, username: &str, email: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO user_prefs (username, email) VALUES (?1, ?2)",
            params![username, email],
        )?;
        Ok(())
    }

    pub fn user_email(&self, username: &str) -> Result<Option<String>> {
        let email = self
            .conn
            .query_row(
                "SELECT email FROM user_prefs WHERE username = ?1",
                params![username],
                |row| row.get(0),
            )
            .optional()?;
        Ok(email)
    }

    /// Every (user, email) pair, ordered by user
    pub fn all_users(&self) -> Result<Vec<(String, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT username, email FROM user_prefs ORDER BY username")?;
        let users = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }
}
