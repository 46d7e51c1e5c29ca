mod change;
mod energy;
mod history;
mod timestamp;

pub use self::change::{ChangeSet, PendingChange, XsecRecord, fmt_value};
pub use self::energy::Energy;
pub use self::history::{HistoryEntry, HistorySet};
pub use self::timestamp::{fmt_ts_stored, fmt_ts_ui, now_utc, parse_ts_stored};
