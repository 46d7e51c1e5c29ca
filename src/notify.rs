use std::io::Write;
use std::process::{Command, Stdio};

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use crate::config::NotifyConfig;
use crate::model::{Energy, fmt_value};

/// One written sample as reported to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub struct NotifiedEntry {
    pub sample: String,
    pub value: f64,
    pub updated: bool,
}

/// Description of one batch of writes sharing a source and comment.
#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub user: String,
    pub energy: Energy,
    pub entries: Vec<NotifiedEntry>,
    pub source: String,
    pub comments: String,
}

impl Notification {
    pub fn new(energy: Energy, source: &str, comments: &str) -> Self {
        Self {
            user: std::env::var("USER").unwrap_or_else(|_| "???".to_string()),
            energy,
            entries: Vec::new(),
            source: source.to_string(),
            comments: comments.to_string(),
        }
    }

    pub fn subject(&self) -> &'static str {
        "Cross section update"
    }

    pub fn body(&self) -> String {
        let mut samples = String::from("\n");
        for e in &self.entries {
            let tag = if e.updated { "UPDATED " } else { "NEW     " };
            samples.push_str(&format!("{}{} ---> {}\n", tag, e.sample, fmt_value(e.value)));
        }
        format!(
            "\nUser {} has made the following entries into the cross section database at energy {} TeV:\n{}\nSOURCE:\n\n{}\n\nCOMMENTS:\n\n{}\n",
            self.user, self.energy, samples, self.source, self.comments
        )
    }
}

/// Best-effort delivery. Implementations must never fail the caller.
pub trait Notifier {
    fn notify(&self, notification: &Notification);
}

/// Hands messages to a local `sendmail -t`.
pub struct SendmailNotifier {
    recipients: Vec<String>,
    command: String,
}

impl SendmailNotifier {
    pub fn new(cfg: &NotifyConfig) -> Self {
        Self {
            recipients: cfg.recipients.clone(),
            command: cfg.sendmail.clone(),
        }
    }

    pub fn message(&self, n: &Notification) -> String {
        format!(
            "Subject: {}\nTo: {}\nContent-Type: text/plain; charset=utf-8\n\n{}",
            n.subject(),
            self.recipients.join(","),
            n.body()
        )
    }

    fn send(&self, n: &Notification) -> Result<()> {
        let mut child = Command::new(&self.command)
            .arg("-t")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("spawn {}", self.command))?;

        {
            let mut stdin = child.stdin.take().context("open sendmail stdin")?;
            stdin
                .write_all(self.message(n).as_bytes())
                .context("write message")?;
        }

        let status = child.wait().context("wait for sendmail")?;
        if !status.success() {
            bail!("{} exited with {}", self.command, status);
        }
        Ok(())
    }
}

impl Notifier for SendmailNotifier {
    fn notify(&self, notification: &Notification) {
        if self.recipients.is_empty() || notification.entries.is_empty() {
            debug!("no notification recipients configured");
            return;
        }
        match self.send(notification) {
            Ok(()) => debug!(recipients = self.recipients.len(), "notification sent"),
            Err(err) => warn!("failed to send notification: {:#}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        let mut n = Notification::new(Energy::default(), "theory", "NLO");
        n.user = "alice".to_string();
        n.entries.push(NotifiedEntry {
            sample: "TTJets".to_string(),
            value: 831.76,
            updated: true,
        });
        n.entries.push(NotifiedEntry {
            sample: "WJets".to_string(),
            value: 0.0,
            updated: false,
        });
        n
    }

    #[test]
    fn body_lists_every_sample() {
        let body = notification().body();
        assert!(body.contains("User alice has made"));
        assert!(body.contains("energy 13 TeV"));
        assert!(body.contains("UPDATED TTJets ---> 831.76\n"));
        assert!(body.contains("NEW     WJets ---> 0.0\n"));
        assert!(body.contains("SOURCE:\n\ntheory"));
    }

    #[test]
    fn missing_sendmail_does_not_fail() {
        let notifier = SendmailNotifier::new(&NotifyConfig {
            recipients: vec!["a@b.c".to_string()],
            sendmail: "/nonexistent/sendmail-for-tests".to_string(),
        });
        notifier.notify(&notification());
    }

    #[test]
    fn message_carries_headers() {
        let notifier = SendmailNotifier::new(&NotifyConfig {
            recipients: vec!["a@b.c".to_string(), "d@e.f".to_string()],
            sendmail: "sendmail".to_string(),
        });
        let msg = notifier.message(&notification());
        assert!(msg.starts_with("Subject: Cross section update\nTo: a@b.c,d@e.f\n"));
    }
}
