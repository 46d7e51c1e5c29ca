use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::XsecError;

/// Centre-of-mass energy in TeV. Each energy is its own data partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Energy(u32);

impl Energy {
    pub const SUPPORTED: [u32; 4] = [7, 8, 13, 14];

    pub fn all() -> impl Iterator<Item = Energy> {
        Self::SUPPORTED.into_iter().map(Energy)
    }

    pub fn tev(self) -> u32 {
        self.0
    }

    /// Name of the table holding the live value per sample.
    pub fn current_table(self) -> String {
        format!("xs_{}TeV", self.0)
    }

    /// Name of the append-only history table.
    pub fn history_table(self) -> String {
        format!("xs_{}TeV_history", self.0)
    }
}

impl Default for Energy {
    fn default() -> Self {
        Energy(13)
    }
}

impl TryFrom<u32> for Energy {
    type Error = XsecError;

    fn try_from(tev: u32) -> Result<Self, Self::Error> {
        if Self::SUPPORTED.contains(&tev) {
            Ok(Energy(tev))
        } else {
            Err(XsecError::BadInput(format!("Invalid energy {}", tev)))
        }
    }
}

impl From<Energy> for u32 {
    fn from(e: Energy) -> u32 {
        e.0
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
