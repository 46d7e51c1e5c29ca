use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use time::OffsetDateTime;
use tracing::{debug, info};

use crate::error::XsecError;
use crate::model::{
    Energy, HistoryEntry, HistorySet, PendingChange, XsecRecord, fmt_ts_stored, now_utc,
    parse_ts_stored,
};

/// What the review workflow needs from a backend.
pub trait HistoryStore {
    /// Histories for the given samples. Samples without any history are left out.
    fn lookup_history(&self, keys: &[String]) -> Result<HistorySet>;

    /// Samples whose history matches any of the SQL `LIKE` patterns, deduplicated.
    fn lookup_matching(&self, patterns: &[String]) -> Result<Vec<String>>;

    /// Writes one change as the new current value plus a history copy.
    fn commit(&self, change: &PendingChange) -> Result<()>;
}

/// Which samples of a `put` already had a value before.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PutReport {
    pub updated: Vec<String>,
}

impl PutReport {
    pub fn is_update(&self, sample: &str) -> bool {
        self.updated.iter().any(|s| s == sample)
    }
}

/// One row of a listing, from either the current or the history table.
#[derive(Clone, Debug, PartialEq)]
pub struct ListedRow {
    pub sample: String,
    pub cross_section: f64,
    pub uncertainty: Option<f64>,
    pub last_updated: OffsetDateTime,
    pub source: String,
    pub comments: String,
    /// The sample has more than one history row.
    pub updated: bool,
}

/// Cross section tables for one energy partition, backed by SQLite.
pub struct XsecStore {
    conn: Connection,
    energy: Energy,
}

impl XsecStore {
    pub fn open(path: &Path, energy: Energy) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("create database directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open database {}", path.display()))?;
        debug!(path = %path.display(), %energy, "opened cross section database");
        let store = Self { conn, energy };
        store.ensure_tables(energy)?;
        Ok(store)
    }

    pub fn open_in_memory(energy: Energy) -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        let store = Self { conn, energy };
        store.ensure_tables(energy)?;
        Ok(store)
    }

    /// Creates the tables of every supported energy.
    pub fn init(path: &Path) -> Result<Vec<Energy>> {
        let store = Self::open(path, Energy::default())?;
        let energies: Vec<Energy> = Energy::all().collect();
        for energy in &energies {
            store.ensure_tables(*energy)?;
        }
        Ok(energies)
    }

    pub fn energy(&self) -> Energy {
        self.energy
    }

    fn ensure_tables(&self, energy: Energy) -> Result<()> {
        let cur = energy.current_table();
        let hist = energy.history_table();
        let schema = format!(
            "
            CREATE TABLE IF NOT EXISTS {cur} (
                sample TEXT PRIMARY KEY NOT NULL,
                cross_section REAL NOT NULL,
                uncertainty REAL,
                last_updated TEXT NOT NULL,
                source TEXT NOT NULL,
                comments TEXT NOT NULL DEFAULT ''
            );
            CREATE TABLE IF NOT EXISTS {hist} (
                sample TEXT NOT NULL,
                cross_section REAL NOT NULL,
                uncertainty REAL,
                last_updated TEXT NOT NULL,
                source TEXT NOT NULL,
                comments TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS {hist}_sample ON {hist} (sample, last_updated);
            "
        );
        self.conn
            .execute_batch(&schema)
            .with_context(|| format!("create tables for {} TeV", energy))?;
        Ok(())
    }

    /// Current values for the samples, in the order given.
    ///
    /// Fails with [`XsecError::NoMatchingDataset`] for an unknown sample and with
    /// [`XsecError::InvalidDataset`] when a sample has been invalidated.
    pub fn get_xsec(&self, samples: &[String]) -> Result<Vec<XsecRecord>> {
        let query = format!(
            "SELECT cross_section, uncertainty FROM {} WHERE sample = ?1",
            self.energy.current_table()
        );
        let mut stmt = self.conn.prepare(&query).context("prepare lookup")?;

        let mut out = Vec::with_capacity(samples.len());
        for sample in samples {
            let row: Option<(f64, Option<f64>)> = stmt
                .query_row(params![sample], |row| Ok((row.get(0)?, row.get(1)?)))
                .optional()
                .with_context(|| format!("look up {}", sample))?;
            let Some((cross_section, uncertainty)) = row else {
                return Err(XsecError::NoMatchingDataset {
                    sample: sample.clone(),
                    energy: self.energy.tev(),
                }
                .into());
            };
            out.push(XsecRecord {
                sample: sample.clone(),
                cross_section,
                uncertainty,
            });
        }

        if let Some(invalid) = out.iter().find(|r| r.cross_section == 0.0) {
            return Err(XsecError::InvalidDataset(invalid.sample.clone()).into());
        }
        Ok(out)
    }

    /// Inserts or replaces the current values and copies each into history with the
    /// same timestamp. All records are written in one transaction.
    pub fn put_xsec(&self, records: &[XsecRecord], source: &str, comments: &str) -> Result<PutReport> {
        validate_put(records, source)?;

        let cur = self.energy.current_table();
        let hist = self.energy.history_table();
        let replace = format!(
            "REPLACE INTO {cur} (sample, cross_section, uncertainty, last_updated, source, comments) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
        );
        let copy = format!(
            "INSERT INTO {hist} (sample, cross_section, uncertainty, last_updated, source, comments) \
             SELECT sample, cross_section, uncertainty, last_updated, source, comments \
             FROM {cur} WHERE sample = ?1"
        );
        let count = format!("SELECT COUNT(*) FROM {hist} WHERE sample = ?1");

        let now = fmt_ts_stored(now_utc());
        debug!(statement = %replace, records = records.len(), "about to execute");

        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin transaction")?;
        for r in records {
            tx.execute(
                &replace,
                params![r.sample, r.cross_section, r.uncertainty, now, source, comments],
            )
            .with_context(|| format!("write {}", r.sample))?;
        }

        let mut report = PutReport::default();
        for r in records {
            tx.execute(&copy, params![r.sample])
                .with_context(|| format!("copy {} into history", r.sample))?;
            let n: i64 = tx
                .query_row(&count, params![r.sample], |row| row.get(0))
                .with_context(|| format!("count history of {}", r.sample))?;
            if n > 1 && !report.is_update(&r.sample) {
                report.updated.push(r.sample.clone());
            }
        }
        tx.commit().context("commit transaction")?;

        info!(
            energy = %self.energy,
            records = records.len(),
            updated = report.updated.len(),
            "stored cross sections"
        );
        Ok(report)
    }

    /// Rows whose sample matches any `LIKE` pattern, all rows when `patterns` is
    /// empty. Ordered by sample, newest first within a sample.
    pub fn list(&self, patterns: &[String], history: bool) -> Result<Vec<ListedRow>> {
        let hist = self.energy.history_table();
        let table = if history {
            hist.clone()
        } else {
            self.energy.current_table()
        };

        let default = ["%".to_string()];
        let patterns = if patterns.is_empty() { &default[..] } else { patterns };
        let filter = (1..=patterns.len())
            .map(|i| format!("sample LIKE ?{i}"))
            .collect::<Vec<_>>()
            .join(" OR ");

        let mut updated = HashSet::new();
        {
            let mut stmt = self
                .conn
                .prepare(&format!(
                    "SELECT sample FROM {hist} GROUP BY sample HAVING COUNT(*) > 1"
                ))
                .context("prepare updated query")?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .context("query updated samples")?;
            for sample in rows {
                updated.insert(sample.context("read updated sample")?);
            }
        }

        let query = format!(
            "SELECT sample, cross_section, uncertainty, last_updated, source, comments \
             FROM {table} WHERE {filter} \
             ORDER BY sample ASC, last_updated DESC, rowid DESC"
        );
        let mut stmt = self.conn.prepare(&query).context("prepare listing")?;
        let rows = stmt
            .query_map(params_from_iter(patterns.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })
            .with_context(|| format!("list {}", table))?;

        let mut out = Vec::new();
        for row in rows {
            let (sample, cross_section, uncertainty, last_updated, source, comments) =
                row.context("read listing row")?;
            out.push(ListedRow {
                updated: updated.contains(&sample),
                sample,
                cross_section,
                uncertainty,
                last_updated: parse_ts_stored(&last_updated)?,
                source,
                comments,
            });
        }
        debug!(%table, rows = out.len(), "listed samples");
        Ok(out)
    }
}

fn validate_put(records: &[XsecRecord], source: &str) -> Result<(), XsecError> {
    if source.trim().is_empty() {
        return Err(XsecError::BadInput(
            "Source of cross sections recommended for proper documentation.".to_string(),
        ));
    }
    if records.is_empty() {
        return Err(XsecError::BadInput("No samples given".to_string()));
    }
    for r in records {
        if r.sample.trim().is_empty() {
            return Err(XsecError::BadInput("Empty sample name".to_string()));
        }
        if !r.cross_section.is_finite() {
            return Err(XsecError::BadInput(format!(
                "Cross section {} for {} is not a finite number",
                r.cross_section, r.sample
            )));
        }
        if r.cross_section < 0.0 {
            return Err(XsecError::BadInput(format!(
                "Negative cross section {} detected",
                r.cross_section
            )));
        }
        if let Some(u) = r.uncertainty
            && !(u.is_finite() && u >= 0.0)
        {
            return Err(XsecError::BadInput(format!(
                "Invalid uncertainty {} for {}",
                u, r.sample
            )));
        }
    }
    Ok(())
}

impl HistoryStore for XsecStore {
    fn lookup_history(&self, keys: &[String]) -> Result<HistorySet> {
        let query = format!(
            "SELECT cross_section, uncertainty, last_updated, source, comments \
             FROM {} WHERE sample = ?1 \
             ORDER BY last_updated DESC, rowid DESC",
            self.energy.history_table()
        );
        let mut stmt = self.conn.prepare(&query).context("prepare history query")?;

        let mut set = HistorySet::new();
        for key in keys {
            let rows = stmt
                .query_map(params![key], |row| {
                    Ok((
                        row.get::<_, f64>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })
                .with_context(|| format!("query history of {}", key))?;

            let mut history = Vec::new();
            for row in rows {
                let (value, uncertainty, updated_at, source, comment) =
                    row.with_context(|| format!("read history row of {}", key))?;
                history.push(HistoryEntry {
                    value,
                    updated_at: parse_ts_stored(&updated_at)?,
                    source,
                    comment,
                    uncertainty,
                });
            }
            debug!(key = %key, entries = history.len(), "loaded history");
            set.insert(key.clone(), history);
        }
        Ok(set)
    }

    fn lookup_matching(&self, patterns: &[String]) -> Result<Vec<String>> {
        let query = format!(
            "SELECT DISTINCT sample FROM {} WHERE sample LIKE ?1 ORDER BY sample",
            self.energy.history_table()
        );
        let mut stmt = self.conn.prepare(&query).context("prepare pattern query")?;

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for pattern in patterns {
            let rows = stmt
                .query_map(params![pattern], |row| row.get::<_, String>(0))
                .with_context(|| format!("match pattern {}", pattern))?;
            for sample in rows {
                let sample = sample.context("read matched sample")?;
                if seen.insert(sample.clone()) {
                    out.push(sample);
                }
            }
        }
        Ok(out)
    }

    fn commit(&self, change: &PendingChange) -> Result<()> {
        let record = XsecRecord {
            sample: change.key.clone(),
            cross_section: change.new_value,
            uncertainty: change.uncertainty,
        };
        self.put_xsec(&[record], &change.new_source, &change.new_comment)
            .with_context(|| format!("commit {}", change.key))?;
        Ok(())
    }
}
