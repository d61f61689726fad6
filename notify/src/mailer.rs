//! Delivery channels for rendered reports
//!
//! `stdout` prints each message, the others hand a built message to a
//! lettre transport. `redirect_to` wraps any channel so every message lands
//! in one mailbox, with the intended recipient appended to the subject.

use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{FileTransport, Message, SendmailTransport, SmtpTransport, Transport};
use std::fmt::Display;
use std::io::Write;
use std::sync::Mutex;
use tracing::info;

use crate::config::{MailConfig, TransportKind};

/// A rendered report ready to go out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub username: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub trait Delivery {
    fn deliver(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Prints messages instead of sending them
pub struct StdoutDelivery<W: Write> {
    out: Mutex<W>,
}

impl<W: Write> StdoutDelivery<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> Result<W> {
        self.out
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Lock error: {e}"))
    }
}

impl<W: Write> Delivery for StdoutDelivery<W> {
    fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock error: {e}"))?;
        writeln!(out, "==========")?;
        writeln!(out, "USER: {} EMAIL: {}", mail.username, mail.to)?;
        writeln!(out, "SUBJECT: {}", mail.subject)?;
        writeln!(out, "MSG:")?;
        writeln!(out, "{}", mail.body)?;
        out.flush()?;
        Ok(())
    }
}

/// Sends through any lettre transport
pub struct LettreDelivery<T> {
    transport: T,
    from: Mailbox,
}

impl<T> LettreDelivery<T> {
    pub fn new(transport: T, from: Mailbox) -> Self {
        Self { transport, from }
    }
}

impl<T> Delivery for LettreDelivery<T>
where
    T: Transport,
    T::Error: Display,
{
    fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        let email = build_message(&self.from, mail)?;
        self.transport
            .send(&email)
            .map_err(|e| anyhow::anyhow!("Mail delivery to {} failed: {e}", mail.to))?;
        info!("Report for {} delivered to {}", mail.username, mail.to);
        Ok(())
    }
}

/// Sends every message to one address
pub struct RedirectDelivery<D> {
    inner: D,
    redirect_to: String,
}

impl<D: Delivery> RedirectDelivery<D> {
    pub fn new(inner: D, redirect_to: &str) -> Self {
        Self {
            inner,
            redirect_to: redirect_to.to_string(),
        }
    }
}

impl<D: Delivery> Delivery for RedirectDelivery<D> {
    fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        let redirected = OutgoingMail {
            username: mail.username.clone(),
            to: self.redirect_to.clone(),
            subject: format!("{} {}", mail.subject, mail.to),
            body: mail.body.clone(),
        };
        self.inner.deliver(&redirected)
    }
}

impl<D: Delivery + ?Sized> Delivery for Box<D> {
    fn deliver(&self, mail: &OutgoingMail) -> Result<()> {
        (**self).deliver(mail)
    }
}

fn build_message(from: &Mailbox, mail: &OutgoingMail) -> Result<Message> {
    Message::builder()
        .from(from.clone())
        .to(mail
            .to
            .parse()
            .with_context(|| format!("Invalid recipient address '{}'", mail.to))?)
        .subject(&mail.subject)
        .body(mail.body.clone())
        .context("Failed to build email message")
}

fn from_mailbox(config: &MailConfig) -> Result<Mailbox> {
    Ok(Mailbox::new(
        Some(config.from_name.clone()),
        config
            .from_address
            .parse()
            .context("Invalid from_address in mail config")?,
    ))
}

/// Build the configured delivery channel
pub fn build_delivery(config: &MailConfig) -> Result<Box<dyn Delivery>> {
    let delivery: Box<dyn Delivery> = match config.transport {
        TransportKind::Stdout => Box::new(StdoutDelivery::new(std::io::stdout())),
        TransportKind::Smtp => {
            let from = from_mailbox(config)?;
            let builder = if config.ssl && config.port == 465 {
                // Implicit TLS
                SmtpTransport::relay(&config.host).context("Failed to create SMTP relay")?
            } else {
                SmtpTransport::starttls_relay(&config.host)
                    .context("Failed to create STARTTLS relay")?
            };
            let builder = builder.port(config.port);
            let builder = if config.username.is_empty() {
                builder
            } else {
                builder.credentials(Credentials::new(
                    config.username.clone(),
                    config.password.clone(),
                ))
            };
            Box::new(LettreDelivery::new(builder.build(), from))
        }
        TransportKind::Sendmail => Box::new(LettreDelivery::new(
            SendmailTransport::new(),
            from_mailbox(config)?,
        )),
        TransportKind::File => {
            std::fs::create_dir_all(&config.spool_dir)
                .with_context(|| format!("Failed to create spool dir {}", config.spool_dir))?;
            Box::new(LettreDelivery::new(
                FileTransport::new(&config.spool_dir),
                from_mailbox(config)?,
            ))
        }
    };

    if config.redirect_to.is_empty() {
        Ok(delivery)
    } else {
        info!("Test mode: redirecting all reports to {}", config.redirect_to);
        Ok(Box::new(RedirectDelivery::new(delivery, &config.redirect_to)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn mail() -> OutgoingMail {
        OutgoingMail {
            username: "ann".into(),
            to: "ann@example.org".into(),
            subject: "Test report".into(),
            body: "Test report for run1:\n\nall quiet\n".into(),
        }
    }

    #[test]
    fn test_stdout_delivery_format() {
        let delivery = StdoutDelivery::new(Vec::new());
        delivery.deliver(&mail()).unwrap();
        let printed = String::from_utf8(delivery.into_inner().unwrap()).unwrap();
        assert!(printed.starts_with("==========\nUSER: ann EMAIL: ann@example.org\n"));
        assert!(printed.contains("MSG:\nTest report for run1:"));
    }

    #[test]
    fn test_redirect_rewrites_recipient_and_subject() {
        let delivery = RedirectDelivery::new(StdoutDelivery::new(Vec::new()), "qa@example.org");
        delivery.deliver(&mail()).unwrap();
        let printed = String::from_utf8(delivery.inner.into_inner().unwrap()).unwrap();
        assert!(printed.contains("EMAIL: qa@example.org"));
        assert!(printed.contains("SUBJECT: Test report ann@example.org"));
    }

    #[test]
    fn test_file_delivery_writes_message() {
        let dir = tempdir().unwrap();
        let config = MailConfig {
            transport: TransportKind::File,
            spool_dir: dir.path().to_str().unwrap().to_string(),
            ..MailConfig::default()
        };
        let delivery = build_delivery(&config).unwrap();
        delivery.deliver(&mail()).unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        let content = std::fs::read_to_string(&files[0]).unwrap();
        assert!(content.contains("all quiet"));
    }

    #[test]
    fn test_invalid_recipient_is_an_error() {
        let from: Mailbox = "runreport@localhost".parse().unwrap();
        let mut bad = mail();
        bad.to = "not an address".into();
        assert!(build_message(&from, &bad).is_err());
    }
}
