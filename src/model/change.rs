use serde::{Deserialize, Serialize};

/// A write decided during a review session, not yet committed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingChange {
    pub key: String,
    pub new_value: f64,
    pub new_source: String,
    pub new_comment: String,
    pub old_value: f64,
    /// Uncertainty restored together with a reverted value. Always `None` for invalidations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
}

impl PendingChange {
    pub fn summary_line(&self) -> String {
        format!(
            "{}: {} --> {}",
            self.key,
            fmt_value(self.old_value),
            fmt_value(self.new_value)
        )
    }
}

pub type ChangeSet = Vec<PendingChange>;

/// One sample's value as handed to the inserter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct XsecRecord {
    pub sample: String,
    pub cross_section: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uncertainty: Option<f64>,
}

/// Always keeps a decimal point so `10.0` does not print as `10`.
pub fn fmt_value(v: f64) -> String {
    format!("{:?}", v)
}
