//! runreport configuration loading and parsing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/runreport/config.toml";

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct NotifyConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_test_run")]
    pub default_test_run: String,
    #[serde(default = "default_subject")]
    pub subject: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_test_run: default_test_run(),
            subject: default_subject(),
        }
    }
}

/// How rendered reports leave the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Stdout,
    Smtp,
    Sendmail,
    File,
}

#[derive(Debug, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub transport: TransportKind,
    /// When set, every message goes here instead of to its recipient
    #[serde(default)]
    pub redirect_to: String,
    #[serde(default = "default_from_address")]
    pub from_address: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    #[serde(default = "default_smtp_host")]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_true")]
    pub ssl: bool,
    #[serde(default = "default_spool_dir")]
    pub spool_dir: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            redirect_to: String::new(),
            from_address: default_from_address(),
            from_name: default_from_name(),
            host: default_smtp_host(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            ssl: true,
            spool_dir: default_spool_dir(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_db_path() -> String { "/var/lib/runreport/results.db".into() }
fn default_test_run() -> String { "daily_latest".into() }
fn default_subject() -> String { "Test report".into() }
fn default_from_address() -> String { "runreport@localhost".into() }
fn default_from_name() -> String { "runreport".into() }
fn default_smtp_host() -> String { "localhost".into() }
fn default_smtp_port() -> u16 { 587 }
fn default_true() -> bool { true }
fn default_spool_dir() -> String { "/var/spool/runreport".into() }
fn default_log_level() -> String { "info".into() }

/// Load configuration from an explicit path, `RUNREPORT_CONFIG`, or the default location
pub fn load_config(explicit: Option<&str>) -> Result<NotifyConfig> {
    let config_path = match explicit {
        Some(path) => path.to_string(),
        None => std::env::var("RUNREPORT_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()),
    };

    if Path::new(&config_path).exists() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config from {config_path}"))?;
        let config: NotifyConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {config_path}"))?;
        Ok(config)
    } else if explicit.is_some() {
        anyhow::bail!("Config file not found at {config_path}")
    } else {
        tracing::warn!("Config file not found at {config_path}, using defaults");
        Ok(NotifyConfig::default())
    }
}
