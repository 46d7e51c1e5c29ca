//! Interactive review of a sample's history, with revert and invalidation.
//!
//! A [`ReviewSession`] walks samples in sorted order on a [`Display`], collecting a
//! change-set that is only handed out after an explicit `y`. The [`SessionRunner`]
//! owns the display for the interactive phase and writes afterwards.

mod choice;
mod display;
mod editor;
mod paged_view;
mod render;
mod runner;
mod scripted;
mod session;
mod terminal;

pub use self::choice::{Choice, INVALIDATE_COMMENT, INVALIDATE_SOURCE, REVERT_SOURCE, pending_change};
pub use self::display::{Display, InputEvent, Screen, Viewport};
pub use self::editor::{Charset, InputEditor};
pub use self::paged_view::{PagedView, ScrollDirection};
pub use self::runner::{CommitReport, RunSummary, SessionRunner};
pub use self::scripted::ScriptedDisplay;
pub use self::session::{CONFIRM_PROMPT, REVIEW_TITLE, ReviewOutcome, ReviewSession, SELECT_PROMPT};
pub use self::terminal::TerminalDisplay;
