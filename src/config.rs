//! Settings resolved before any command runs: the database location, the energy
//! partition and who gets notified about writes.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::XsecError;
use crate::model::Energy;

const PLACEHOLDER_RECIPIENT: &str = "email@example.com";

/// On-disk TOML layout.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// SQLite database file. Relative paths are resolved against the config file's directory.
    #[serde(default)]
    pub database: Option<PathBuf>,

    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub recipients: Vec<String>,

    /// Program invoked as `<sendmail> -t` with the message on stdin.
    #[serde(default = "default_sendmail")]
    pub sendmail: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            recipients: Vec::new(),
            sendmail: default_sendmail(),
        }
    }
}

fn default_sendmail() -> String {
    "sendmail".to_string()
}

/// Fully resolved settings.
#[derive(Clone, Debug)]
pub struct Config {
    pub database: PathBuf,
    pub energy: Energy,
    pub notify: NotifyConfig,
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("xsec").join("config.toml"))
    }

    pub fn default_database() -> PathBuf {
        dirs::data_dir()
            .map(|d| d.join("xsec"))
            .unwrap_or_default()
            .join("cross_sections.db")
    }

    /// Loads settings. A config file named explicitly must exist; the default one may be absent.
    pub fn load(explicit: Option<&Path>, energy: u32) -> Result<Self> {
        let energy = Energy::try_from(energy)?;

        let (path, file) = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(XsecError::BadInput(format!(
                        "Configuration file {} does not exist",
                        path.display()
                    ))
                    .into());
                }
                (Some(path.to_path_buf()), read_file_config(path)?)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => {
                    let file = read_file_config(&path)?;
                    (Some(path), file)
                }
                _ => (None, FileConfig::default()),
            },
        };

        Ok(Self::resolve(file, path.as_deref(), energy))
    }

    pub fn resolve(file: FileConfig, path: Option<&Path>, energy: Energy) -> Self {
        let database = match (file.database, path.and_then(Path::parent)) {
            (Some(db), Some(dir)) if db.is_relative() => dir.join(db),
            (Some(db), _) => db,
            (None, _) => Self::default_database(),
        };

        let mut notify = file.notify;
        notify
            .recipients
            .retain(|r| !r.trim().is_empty() && r.trim() != PLACEHOLDER_RECIPIENT);
        for r in &mut notify.recipients {
            *r = r.trim().to_string();
        }

        Self {
            database,
            energy,
            notify,
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let file: FileConfig =
        toml::from_str(&contents).with_context(|| format!("parse config {}", path.display()))?;
    Ok(file)
}
