use std::io::Write;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::error::XsecError;
use crate::model::{Energy, HistorySet, PendingChange};
use crate::notify::{NotifiedEntry, Notification, Notifier};
use crate::store::HistoryStore;

use super::display::Display;
use super::session::{ReviewOutcome, ReviewSession};

/// Per-key results of writing a confirmed change-set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommitReport {
    pub committed: Vec<PendingChange>,
    pub failed: Vec<(PendingChange, String)>,
}

impl CommitReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub outcome: ReviewOutcome,
    pub report: CommitReport,
}

impl RunSummary {
    /// Turns write failures into [`XsecError::CommitFailed`].
    pub fn into_result(self) -> Result<CommitReport> {
        if self.report.is_clean() {
            return Ok(self.report);
        }
        Err(XsecError::CommitFailed {
            failed: self.report.failed.len(),
            attempted: self.report.failed.len() + self.report.committed.len(),
        }
        .into())
    }
}

/// Drives one revert: picks samples, runs the review with the display held, then
/// writes what was confirmed once the display is gone.
pub struct SessionRunner<'a, S: HistoryStore, N: Notifier> {
    store: &'a S,
    notifier: &'a N,
    energy: Energy,
}

impl<'a, S: HistoryStore, N: Notifier> SessionRunner<'a, S, N> {
    pub fn new(store: &'a S, notifier: &'a N, energy: Energy) -> Self {
        Self {
            store,
            notifier,
            energy,
        }
    }

    /// Arguments are sample names, or `LIKE` patterns when `like` is set.
    pub fn resolve_keys(&self, args: &[String], like: bool) -> Result<Vec<String>> {
        if !like {
            return Ok(args.to_vec());
        }
        let keys = self.store.lookup_matching(args)?;
        if keys.is_empty() {
            return Err(XsecError::NoKeysMatched.into());
        }
        Ok(keys)
    }

    pub fn load_history(&self, keys: &[String]) -> Result<HistorySet> {
        let history = self.store.lookup_history(keys)?;
        if history.is_empty() {
            return Err(XsecError::NoHistoryFound(keys.to_vec()).into());
        }
        Ok(history)
    }

    /// Runs the review on a display from `acquire`. The display is dropped before the
    /// first write, also when the review fails.
    pub fn run<D, F, W>(&self, history: &HistorySet, acquire: F, out: &mut W) -> Result<RunSummary>
    where
        D: Display,
        F: FnOnce() -> Result<D>,
        W: Write,
    {
        let outcome = {
            let display = acquire()?;
            ReviewSession::new(display, history).run()
        }?;

        let report = match &outcome {
            ReviewOutcome::Confirmed(changes) => self.commit_all(changes, out)?,
            ReviewOutcome::Declined => {
                writeln!(out, "Changes not submitted.").context("write summary")?;
                CommitReport::default()
            }
            ReviewOutcome::Quit => {
                writeln!(out, "Revert attempt quit, nothing written.").context("write summary")?;
                CommitReport::default()
            }
            ReviewOutcome::Unchanged => {
                writeln!(out, "No changes selected.").context("write summary")?;
                CommitReport::default()
            }
        };

        Ok(RunSummary { outcome, report })
    }

    /// Writes each change on its own. A failure does not stop the remaining writes and
    /// does not undo earlier ones. The report is printed once every write was attempted.
    pub fn commit_all<W: Write>(&self, changes: &[PendingChange], out: &mut W) -> Result<CommitReport> {
        let mut report = CommitReport::default();
        let mut lines = Vec::with_capacity(changes.len());
        for change in changes {
            match self.store.commit(change) {
                Ok(()) => {
                    info!(key = %change.key, value = change.new_value, "committed");
                    lines.push(format!("Updated {}", change.summary_line()));
                    report.committed.push(change.clone());
                }
                Err(err) => {
                    warn!(key = %change.key, "commit failed: {:#}", err);
                    lines.push(format!("FAILED  {}: {:#}", change.summary_line(), err));
                    report.failed.push((change.clone(), format!("{:#}", err)));
                }
            }
        }
        self.notify(&report.committed);

        for line in &lines {
            writeln!(out, "{}", line).context("write summary")?;
        }
        Ok(report)
    }

    /// One message for everything that was written. Sources are listed once each and
    /// comments are prefixed with their sample.
    fn notify(&self, committed: &[PendingChange]) {
        if committed.is_empty() {
            return;
        }
        let mut sources: Vec<&str> = Vec::new();
        for c in committed {
            if !sources.contains(&c.new_source.as_str()) {
                sources.push(&c.new_source);
            }
        }
        let comments = committed
            .iter()
            .map(|c| format!("{}: {}", c.key, c.new_comment))
            .collect::<Vec<_>>()
            .join("\n");

        let mut n = Notification::new(self.energy, &sources.join(", "), &comments);
        n.entries = committed
            .iter()
            .map(|c| NotifiedEntry {
                sample: c.key.clone(),
                value: c.new_value,
                updated: true,
            })
            .collect();
        self.notifier.notify(&n);
    }
}
