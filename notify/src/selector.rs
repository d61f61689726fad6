//! Preference-driven selector: builds and sends each user's report
//!
//! For every project a user follows, the stored format decides which view
//! goes into the message:
//! - `c`: failures of tests the user is a contact for (section only when non-empty)
//! - `f`: universal and partial anomaly tables, capped per preference
//! - `s`: status summary table
//!
//! A scope with corrupt statuses costs only that section; the rest of the
//! run carries on.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{error, info, warn};

use runreport_engine::assembly::NO_ANOMALIES_MESSAGE;
use runreport_engine::{assemble, EngineError, ReportCache, Scope};

use crate::mailer::{Delivery, OutgoingMail};
use crate::report::{
    anomaly_tables, contact_table, summary_header, summary_table, PARTIAL_HEADING,
    UNIVERSAL_HEADING,
};
use crate::store::{Database, ProjectPref, ReportFormat};

/// Counters for one reporting run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct Notifier<'a, D> {
    db: &'a Database,
    delivery: D,
    cache: ReportCache,
    subject: String,
}

impl<'a, D: Delivery> Notifier<'a, D> {
    pub fn new(db: &'a Database, delivery: D, subject: &str) -> Self {
        Self {
            db,
            delivery,
            cache: ReportCache::new(),
            subject: subject.to_string(),
        }
    }

    #[cfg(test)]
    pub fn into_delivery(self) -> D {
        self.delivery
    }

    /// The message for one user, or `None` when there is nothing to tell them
    pub fn create_email(&mut self, username: &str, test_run: &str) -> Result<Option<String>> {
        let mut email = format!("Test report for {test_run}:\n\n");
        let mut send_notice = false;

        let projects = self.db.prefs().user_projects(username)?;
        for pref in projects {
            let scope = Scope::new(test_run, &pref.project);
            match pref.format {
                ReportFormat::None => continue,
                ReportFormat::Contact => {
                    match self.contact_section(username, &scope) {
                        Ok(Some(section)) => {
                            email.push_str(&project_header(&pref));
                            email.push_str(&section);
                            email.push('\n');
                            send_notice = true;
                        }
                        Ok(None) => {}
                        Err(e) => {
                            email.push_str(&project_header(&pref));
                            email.push_str(&unavailable(username, &scope, e)?);
                        }
                    }
                }
                ReportFormat::Anomaly => {
                    email.push_str(&project_header(&pref));
                    match self.anomaly_section(&scope, pref.max_lines) {
                        Ok((section, found)) => {
                            email.push_str(&section);
                            send_notice |= found;
                        }
                        Err(e) => email.push_str(&unavailable(username, &scope, e)?),
                    }
                }
                ReportFormat::Summary => {
                    email.push_str(&project_header(&pref));
                    match self.summary_section(&scope) {
                        Ok(section) => {
                            email.push_str(&section);
                            email.push('\n');
                            send_notice = true;
                        }
                        Err(e) => email.push_str(&unavailable(username, &scope, e)?),
                    }
                }
            }
        }

        Ok(send_notice.then_some(email))
    }

    fn contact_section(&self, username: &str, scope: &Scope) -> Result<Option<String>> {
        let failures = self.db.contacts().failures_for(username, scope)?;
        if failures.is_empty() {
            return Ok(None);
        }
        Ok(Some(contact_table(&failures).get_rst()))
    }

    /// Anomaly tables, plus whether any anomaly was found
    fn anomaly_section(&mut self, scope: &Scope, max_lines: usize) -> Result<(String, bool)> {
        let db = self.db;
        let results = db.results();
        let classified = self.cache.classified(scope, |s| results.load(s))?;
        let report = assemble(&classified, max_lines);
        let (universal, partial) = anomaly_tables(&report);

        let mut text = String::new();
        let mut found = false;
        if let Some(table) = universal {
            text.push_str(UNIVERSAL_HEADING);
            text.push('\n');
            text.push_str(&table.get_rst());
            text.push('\n');
            found = true;
        }
        if let Some(table) = partial {
            text.push_str(PARTIAL_HEADING);
            text.push('\n');
            text.push_str(&table.get_rst());
            text.push('\n');
            found = true;
        }
        if !found {
            text.push_str(NO_ANOMALIES_MESSAGE);
            text.push_str("\n\n");
        }
        Ok((text, found))
    }

    fn summary_section(&mut self, scope: &Scope) -> Result<String> {
        let db = self.db;
        let results = db.results();
        let tally = self.cache.tally(scope, |s| results.load(s))?;
        let mut text = summary_header(scope);
        text.push_str(&summary_table(&tally).get_rst());
        Ok(text)
    }

    /// Build and deliver reports for the named users, or for everyone when none are named
    pub fn run(&mut self, users: &[String], test_run: &str, today: NaiveDate) -> Result<RunSummary> {
        self.cache.clear();
        let test_run = self
            .db
            .results()
            .find_test_run(test_run, today)
            .with_context(|| format!("Cannot resolve test run '{test_run}'"))?;
        info!("Building reports for test run {test_run}");

        let recipients = self.recipients(users)?;
        let mut summary = RunSummary::default();

        for (username, address) in recipients {
            let body = match self.create_email(&username, &test_run) {
                Ok(Some(body)) => body,
                Ok(None) => {
                    info!("No email for {username}");
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    error!("Cannot build report for {username}: {e:#}");
                    summary.failed += 1;
                    continue;
                }
            };

            let mail = OutgoingMail {
                username: username.clone(),
                to: address,
                subject: format!("{}: {test_run}", self.subject),
                body,
            };
            match self.delivery.deliver(&mail) {
                Ok(()) => summary.sent += 1,
                Err(e) => {
                    error!("Failed to deliver report to {username}: {e:#}");
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Run {test_run} done: {} sent, {} skipped, {} failed",
            summary.sent, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    fn recipients(&self, users: &[String]) -> Result<Vec<(String, String)>> {
        let prefs = self.db.prefs();
        if users.is_empty() {
            return prefs.all_users();
        }

        let mut recipients = Vec::with_capacity(users.len());
        for user in users {
            match prefs.user_email(user)? {
                Some(email) => recipients.push((user.clone(), email)),
                None => warn!("No email address known for user {user}"),
            }
        }
        Ok(recipients)
    }
}

fn project_header(pref: &ProjectPref) -> String {
    format!("Project: {}\n\n", pref.project)
}

/// Note for a section that could not be built. Only data integrity problems
/// are absorbed; anything else aborts the run.
fn unavailable(username: &str, scope: &Scope, err: anyhow::Error) -> Result<String> {
    match err.downcast_ref::<EngineError>() {
        Some(integrity) => {
            warn!("Skipping {scope} for {username}: {integrity}");
            Ok(format!("Report unavailable: {integrity}\n\n"))
        }
        None => Err(err),
    }
}
