#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Result, bail};
use time::OffsetDateTime;

use xsec::model::{HistoryEntry, HistorySet, PendingChange};
use xsec::notify::{Notification, Notifier};
use xsec::store::HistoryStore;

pub fn at(unix: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(unix).unwrap()
}

pub fn entry(value: f64, unix: i64, source: &str, comment: &str) -> HistoryEntry {
    HistoryEntry {
        value,
        updated_at: at(unix),
        source: source.to_string(),
        comment: comment.to_string(),
        uncertainty: None,
    }
}

/// In-memory backend that records writes and can be told to reject some keys.
#[derive(Default)]
pub struct FakeStore {
    pub history: HistorySet,
    pub reject: BTreeSet<String>,
    pub committed: RefCell<Vec<PendingChange>>,
    /// When set, commits fail unless the flag says the display is gone.
    pub display_released: Option<Rc<Cell<bool>>>,
}

impl FakeStore {
    pub fn new(history: HistorySet) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    pub fn rejecting(mut self, key: &str) -> Self {
        self.reject.insert(key.to_string());
        self
    }

    pub fn requiring_release(mut self, flag: Rc<Cell<bool>>) -> Self {
        self.display_released = Some(flag);
        self
    }

    pub fn committed(&self) -> Vec<PendingChange> {
        self.committed.borrow().clone()
    }
}

impl HistoryStore for FakeStore {
    fn lookup_history(&self, keys: &[String]) -> Result<HistorySet> {
        Ok(keys
            .iter()
            .filter_map(|k| self.history.get(k).map(|h| (k.clone(), h.to_vec())))
            .collect())
    }

    fn lookup_matching(&self, patterns: &[String]) -> Result<Vec<String>> {
        // Only the trailing-'%' form is needed here.
        let mut out = Vec::new();
        for key in self.history.keys() {
            let hit = patterns.iter().any(|p| match p.strip_suffix('%') {
                Some(prefix) => key.starts_with(prefix),
                None => key == p,
            });
            if hit {
                out.push(key.to_string());
            }
        }
        Ok(out)
    }

    fn commit(&self, change: &PendingChange) -> Result<()> {
        if let Some(flag) = &self.display_released
            && !flag.get()
        {
            bail!("display still held during commit");
        }
        if self.reject.contains(&change.key) {
            bail!("database is locked");
        }
        self.committed.borrow_mut().push(change.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<Notification>>,
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) {
        self.sent.borrow_mut().push(notification.clone());
    }
}

pub fn write_config(dir: &Path) -> Result<std::path::PathBuf> {
    let path = dir.join("config.toml");
    std::fs::write(&path, "database = \"xs.db\"\n")?;
    Ok(path)
}
