use anyhow::Result;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use tracing::debug;

use crate::model::{ChangeSet, HistoryEntry, HistorySet, fmt_ts_ui, fmt_value};

use super::choice::{Choice, pending_change};
use super::display::Display;
use super::editor::{Charset, InputEditor};
use super::paged_view::PagedView;

pub const SELECT_PROMPT: &str = "Select an option (default 0, the current entry): ";
pub const CONFIRM_PROMPT: &str = "Submit these changes? (y/n, default n): ";
pub const REVIEW_TITLE: &str = "Review submission";

// Indent of wrapped comment lines, lined up under the text after "Comments: ".
const COMMENT_INDENT: usize = 13;

/// How a review ended. Only `Confirmed` carries anything to write.
#[derive(Clone, Debug, PartialEq)]
pub enum ReviewOutcome {
    Confirmed(ChangeSet),
    /// Changes were picked but not confirmed with `y`.
    Declined,
    /// `q` was chosen; everything picked so far was dropped.
    Quit,
    /// Every sample was kept as is.
    Unchanged,
}

impl ReviewOutcome {
    pub fn into_changes(self) -> ChangeSet {
        match self {
            ReviewOutcome::Confirmed(changes) => changes,
            _ => ChangeSet::new(),
        }
    }
}

enum KeyStep {
    Next,
    Quit,
}

/// Walks every sample of a history set in sorted order and collects the changes the
/// user picks. Nothing is written here; the caller commits a confirmed outcome.
pub struct ReviewSession<'h, D: Display> {
    display: D,
    history: &'h HistorySet,
    view: PagedView,
    changes: ChangeSet,
}

impl<'h, D: Display> ReviewSession<'h, D> {
    pub fn new(display: D, history: &'h HistorySet) -> Self {
        Self {
            display,
            history,
            view: PagedView::default(),
            changes: ChangeSet::new(),
        }
    }

    pub fn run(mut self) -> Result<ReviewOutcome> {
        let history = self.history;
        for (key, entries) in history.iter() {
            match self.review_key(key, entries)? {
                KeyStep::Next => {}
                KeyStep::Quit => {
                    debug!(key, dropped = self.changes.len(), "review quit");
                    return Ok(ReviewOutcome::Quit);
                }
            }
        }

        if self.changes.is_empty() {
            return Ok(ReviewOutcome::Unchanged);
        }
        self.confirm()
    }

    fn review_key(&mut self, key: &str, entries: &[HistoryEntry]) -> Result<KeyStep> {
        let width = usize::from(self.display.viewport()?.width);
        self.view.render(history_lines(entries, width));

        let mut notice: Option<String> = None;
        loop {
            let token = InputEditor::new(&mut self.display, &mut self.view, key)
                .with_notice(notice.as_deref())
                .read_constrained(SELECT_PROMPT, Charset::Selection)?;

            let choice = Choice::parse(&token, entries.len());
            match choice {
                Choice::Quit => return Ok(KeyStep::Quit),
                Choice::KeepCurrent => return Ok(KeyStep::Next),
                Choice::Invalid(token) => {
                    notice = Some(format!("'{}' is not an option for {}", token, key));
                }
                Choice::Invalidate | Choice::UseHistorical(_) => {
                    if let Some(change) = pending_change(key, entries, &choice) {
                        debug!(change = %change.summary_line(), "change picked");
                        self.changes.push(change);
                    }
                    return Ok(KeyStep::Next);
                }
            }
        }
    }

    fn confirm(mut self) -> Result<ReviewOutcome> {
        self.view.render(
            self.changes
                .iter()
                .map(|c| Line::from(c.summary_line()))
                .collect(),
        );
        let answer = InputEditor::new(&mut self.display, &mut self.view, REVIEW_TITLE)
            .read_constrained(CONFIRM_PROMPT, Charset::Confirmation)?;

        if answer == "y" {
            Ok(ReviewOutcome::Confirmed(self.changes))
        } else {
            debug!(dropped = self.changes.len(), "submission declined");
            Ok(ReviewOutcome::Declined)
        }
    }
}

fn history_lines(entries: &[HistoryEntry], width: usize) -> Vec<Line<'static>> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let rule = "-".repeat(width.max(1));
    let comment_width = width.saturating_sub(COMMENT_INDENT).max(20);

    let mut lines = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        if index == 0 {
            lines.push(Line::from(""));
            lines.push(Line::styled("Current entry", bold));
        }
        lines.push(Line::from(vec![
            Span::styled(format!("{}:", index), bold),
            Span::raw(format!(
                " Cross Section: {}     Last Updated: {}",
                fmt_value(entry.value),
                fmt_ts_ui(entry.updated_at)
            )),
        ]));
        if let Some(u) = entry.uncertainty {
            lines.push(Line::from(format!("   Uncertainty: {}", fmt_value(u))));
        }
        lines.push(Line::from(format!("   Source: {}", entry.source)));
        for (i, chunk) in wrap_words(&entry.comment, comment_width).into_iter().enumerate() {
            if i == 0 {
                lines.push(Line::from(format!("   Comments: {}", chunk)));
            } else {
                lines.push(Line::from(format!("{}{}", " ".repeat(COMMENT_INDENT), chunk)));
            }
        }
        lines.push(Line::from(rule.clone()));
    }

    lines.push(Line::from(""));
    lines.push(Line::styled("i: Invalidate (set cross section to 0.0)", bold));
    lines.push(Line::styled("q: Quit revert attempt", bold));
    lines
}

fn wrap_words(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
            out.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() || out.is_empty() {
        out.push(line);
    }
    out
}
