//! runreport: per-user test run reports
//!
//! Reads recorded results from SQLite, classifies and tallies them with
//! `runreport-engine`, and mails each user the views their preferences ask for.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use runreport_engine::{assemble, classify, tally, Scope, StatusCode};

mod config;
mod mailer;
mod report;
mod selector;
mod store;
mod table;

use report::{anomaly_tables, summary_header, summary_table, PARTIAL_HEADING, UNIVERSAL_HEADING};
use selector::Notifier;
use store::{AddPref, Database, ReportFormat};
use table::TextTable;

#[derive(Parser)]
#[command(name = "runreport", version, about = "Test run anomaly and summary reports")]
struct Cli {
    /// Configuration file (defaults to $RUNREPORT_CONFIG or /etc/runreport/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build and deliver reports for the named users, or everyone
    Notify {
        users: Vec<String>,
        #[arg(long)]
        test_run: Option<String>,
    },
    /// Subscribe a user to a project report
    AddPref {
        user: String,
        project: String,
        /// n, c, f or s
        format: ReportFormat,
        #[arg(long, default_value_t = 0)]
        maxlines: usize,
    },
    SetEmail { user: String, email: String },
    /// Make a user a contact for tests matching a pattern
    AddContact {
        user: String,
        project: String,
        /// Test name or GLOB pattern
        test_name: String,
    },
    /// Record one test outcome
    Record {
        #[arg(long)]
        test_run: String,
        #[arg(long)]
        project: String,
        host: String,
        context: String,
        test_name: String,
        status: String,
    },
    /// Print the anomaly tables for a project
    Anomalies {
        #[arg(long)]
        project: String,
        #[arg(long)]
        test_run: Option<String>,
        #[arg(long, default_value_t = 0)]
        max_lines: usize,
        #[arg(long, value_enum, default_value_t = Style::Rst)]
        style: Style,
        #[arg(long)]
        json: bool,
    },
    /// Print the status tally for a project
    Summary {
        #[arg(long)]
        project: String,
        #[arg(long)]
        test_run: Option<String>,
        #[arg(long, value_enum, default_value_t = Style::Rst)]
        style: Style,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Style {
    Rst,
    Text,
    Html,
}

impl Style {
    fn render(self, table: &TextTable) -> String {
        match self {
            Style::Rst => table.get_rst(),
            Style::Text => table.get_text(),
            Style::Html => table.get_html(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config(cli.config.as_deref())?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("Invalid log level in config")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let db = Database::open(&config.database.path)?;
    let today = chrono::Local::now().date_naive();
    let default_run = config.report.default_test_run.as_str();

    match cli.command {
        Command::Notify { users, test_run } => {
            let delivery = mailer::build_delivery(&config.mail)?;
            let mut notifier = Notifier::new(&db, delivery, &config.report.subject);
            notifier.run(&users, test_run.as_deref().unwrap_or(default_run), today)?;
        }
        Command::AddPref {
            user,
            project,
            format,
            maxlines,
        } => match db.prefs().add_user_pref(&user, &project, format, maxlines)? {
            AddPref::AlreadyPresent => println!("Already present"),
            AddPref::Committed => println!("Committed"),
        },
        Command::SetEmail { user, email } => {
            db.prefs().set_user_email(&user, &email)?;
            info!("Email for {user} set to {email}");
        }
        Command::AddContact {
            user,
            project,
            test_name,
        } => {
            db.contacts().add_contact(&project, &test_name, &user)?;
            info!("{user} is now a contact for {project}/{test_name}");
        }
        Command::Record {
            test_run,
            project,
            host,
            context,
            test_name,
            status,
        } => {
            let status = checked_status(&status)?;
            let scope = Scope::new(&test_run, &project);
            db.results()
                .record(&scope, &host, &context, &test_name, status.code())?;
        }
        Command::Anomalies {
            project,
            test_run,
            max_lines,
            style,
            json,
        } => {
            let scope = resolve_scope(&db, &project, test_run.as_deref(), default_run, today)?;
            let set = db.results().load(&scope)?;
            let report = assemble(&classify(&set), max_lines);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if report.is_empty() {
                println!("{}", runreport_engine::assembly::NO_ANOMALIES_MESSAGE);
            } else {
                let (universal, partial) = anomaly_tables(&report);
                if let Some(table) = universal {
                    println!("{UNIVERSAL_HEADING}\n{}", style.render(&table));
                }
                if let Some(table) = partial {
                    println!("{PARTIAL_HEADING}\n{}", style.render(&table));
                }
            }
        }
        Command::Summary {
            project,
            test_run,
            style,
            json,
        } => {
            let scope = resolve_scope(&db, &project, test_run.as_deref(), default_run, today)?;
            let counts = tally(&db.results().load(&scope)?);
            if json {
                println!("{}", serde_json::to_string_pretty(&counts.rows())?);
            } else {
                print!("{}", summary_header(&scope));
                print!("{}", style.render(&summary_table(&counts)));
            }
        }
    }

    Ok(())
}

fn resolve_scope(
    db: &Database,
    project: &str,
    test_run: Option<&str>,
    default_run: &str,
    today: chrono::NaiveDate,
) -> Result<Scope> {
    let name = test_run.unwrap_or(default_run);
    let run = db
        .results()
        .find_test_run(name, today)
        .with_context(|| format!("Cannot resolve test run '{name}'"))?;
    Ok(Scope::new(&run, project))
}

/// Reject status codes the engine would refuse to load
fn checked_status(code: &str) -> Result<StatusCode> {
    StatusCode::from_code(code)
        .with_context(|| format!("Unknown status '{code}' (expected one of P, F, E, D, M)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_status() {
        assert_eq!(checked_status("F").unwrap(), StatusCode::Fail);
        assert_eq!(checked_status("M").unwrap(), StatusCode::Missing);
        let err = checked_status("X").unwrap_err();
        assert!(err.to_string().contains("Unknown status 'X'"));
    }
}
