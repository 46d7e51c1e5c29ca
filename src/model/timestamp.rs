use std::sync::OnceLock;

use anyhow::{Context, Result};
use time::format_description::FormatItem;
use time::{OffsetDateTime, PrimitiveDateTime};

// Fixed-width so that text ordering in the database matches time ordering.
fn ts_stored_format() -> &'static [FormatItem<'static>] {
    static FMT: OnceLock<Vec<FormatItem<'static>>> = OnceLock::new();
    FMT.get_or_init(|| {
        time::format_description::parse(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]",
        )
        .expect("valid time format")
    })
}

fn ts_ui_format() -> &'static [FormatItem<'static>] {
    static FMT: OnceLock<Vec<FormatItem<'static>>> = OnceLock::new();
    FMT.get_or_init(|| {
        time::format_description::parse("[year]-[month]-[day] [hour]:[minute]:[second]")
            .expect("valid time format")
    })
}

pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}

pub fn fmt_ts_stored(ts: OffsetDateTime) -> String {
    ts.format(ts_stored_format())
        .unwrap_or_else(|_| "<time>".to_string())
}

/// Parses a stored UTC timestamp. Values without a fractional part are accepted too.
pub fn parse_ts_stored(raw: &str) -> Result<OffsetDateTime> {
    let dt = PrimitiveDateTime::parse(raw, ts_stored_format())
        .or_else(|_| PrimitiveDateTime::parse(raw, ts_ui_format()))
        .with_context(|| format!("parse timestamp {:?}", raw))?;
    Ok(dt.assume_utc())
}

pub fn fmt_ts_ui(ts: OffsetDateTime) -> String {
    ts.format(ts_ui_format())
        .unwrap_or_else(|_| "<time>".to_string())
}
