use crate::model::{HistoryEntry, PendingChange, fmt_ts_ui};

pub const REVERT_SOURCE: &str = "Reverted by xsec revert";
pub const INVALIDATE_SOURCE: &str = "Invalidated by xsec revert";
pub const INVALIDATE_COMMENT: &str = "Dataset entry probably not valid. Set to 0.0.";

/// What a typed token means for one sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Choice {
    KeepCurrent,
    Invalidate,
    UseHistorical(usize),
    Quit,
    Invalid(String),
}

impl Choice {
    /// Parses a token against a history of `history_len` entries.
    ///
    /// Indices must be spelled exactly as they are listed, so `"01"` is not `1`.
    pub fn parse(token: &str, history_len: usize) -> Choice {
        match token {
            "" | "0" => Choice::KeepCurrent,
            "i" => Choice::Invalidate,
            "q" => Choice::Quit,
            t => match t.parse::<usize>() {
                Ok(idx) if idx > 0 && idx < history_len && idx.to_string() == t => {
                    Choice::UseHistorical(idx)
                }
                _ => Choice::Invalid(t.to_string()),
            },
        }
    }
}

/// Builds the write for a non-trivial choice. `history[0]` is the live entry.
///
/// Returns `None` for keep, quit and invalid tokens.
pub fn pending_change(key: &str, history: &[HistoryEntry], choice: &Choice) -> Option<PendingChange> {
    let current = history.first()?;
    let target = match choice {
        Choice::Invalidate => None,
        Choice::UseHistorical(idx) => Some(history.get(*idx)?),
        Choice::KeepCurrent | Choice::Quit | Choice::Invalid(_) => return None,
    };

    let change = match target {
        Some(entry) if !entry.is_invalidated() => PendingChange {
            key: key.to_string(),
            new_value: entry.value,
            new_source: REVERT_SOURCE.to_string(),
            new_comment: revert_comment(current, entry),
            old_value: current.value,
            uncertainty: entry.uncertainty,
        },
        _ => PendingChange {
            key: key.to_string(),
            new_value: 0.0,
            new_source: INVALIDATE_SOURCE.to_string(),
            new_comment: INVALIDATE_COMMENT.to_string(),
            old_value: current.value,
            uncertainty: None,
        },
    };
    Some(change)
}

fn revert_comment(current: &HistoryEntry, restored: &HistoryEntry) -> String {
    let mut comment = format!(
        "Reverted to match entry from {} by xsec revert",
        fmt_ts_ui(restored.updated_at)
    );
    if restored.source != current.source {
        comment.push_str(&format!(
            " (source: {} --> {})",
            current.source, restored.source
        ));
    }
    comment
}
