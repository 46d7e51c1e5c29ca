mod common;

use std::cell::Cell;
use std::io::{self, Write};
use std::rc::Rc;

use anyhow::{Result, bail};

use xsec::error::{XsecError, exit_code_for};
use xsec::model::{Energy, HistorySet, fmt_ts_ui};
use xsec::review::{
    Display, INVALIDATE_SOURCE, InputEvent, REVERT_SOURCE, ReviewOutcome, Screen,
    ScriptedDisplay, SessionRunner, Viewport,
};

use common::{FakeStore, RecordingNotifier, at, entry};

const T1: i64 = 1_600_000_000;
const T2: i64 = 1_700_000_000;

fn single_key() -> HistorySet {
    let mut set = HistorySet::new();
    set.insert(
        "A",
        vec![entry(10.0, T2, "s2", "newer"), entry(5.0, T1, "s1", "older")],
    );
    set
}

fn two_keys() -> HistorySet {
    let mut set = single_key();
    set.insert("B", vec![entry(7.0, T2, "b2", ""), entry(3.0, T1, "b1", "")]);
    set
}

fn run_with(
    store: &FakeStore,
    notifier: &RecordingNotifier,
    answers: &[&str],
) -> Result<(xsec::review::RunSummary, String)> {
    let runner = SessionRunner::new(store, notifier, Energy::default());
    let keys: Vec<String> = store.history.keys().map(str::to_string).collect();
    let history = runner.load_history(&keys)?;
    let mut out = Vec::new();
    let summary = runner.run(&history, || ScriptedDisplay::from_answers(answers), &mut out)?;
    Ok((summary, String::from_utf8_lossy(&out).to_string()))
}

#[test]
fn revert_to_older_entry_is_written_after_confirmation() -> Result<()> {
    let store = FakeStore::new(single_key());
    let notifier = RecordingNotifier::default();

    let (summary, out) = run_with(&store, &notifier, &["1", "y"])?;
    assert!(matches!(summary.outcome, ReviewOutcome::Confirmed(_)));

    let committed = store.committed();
    assert_eq!(committed.len(), 1);
    let change = &committed[0];
    assert_eq!(change.key, "A");
    assert_eq!(change.new_value, 5.0);
    assert_eq!(change.new_source, REVERT_SOURCE);
    assert_eq!(change.old_value, 10.0);
    assert!(change.new_comment.contains(&fmt_ts_ui(at(T1))));
    assert!(change.new_comment.contains("(source: s2 --> s1)"));

    assert!(out.contains("Updated A: 10.0 --> 5.0"));
    assert_eq!(notifier.sent.borrow().len(), 1);
    assert!(summary.into_result()?.is_clean());
    Ok(())
}

#[test]
fn declined_invalidation_writes_nothing() -> Result<()> {
    let store = FakeStore::new(single_key());
    let notifier = RecordingNotifier::default();

    let (summary, out) = run_with(&store, &notifier, &["i", "n"])?;
    assert_eq!(summary.outcome, ReviewOutcome::Declined);
    assert!(store.committed().is_empty());
    assert!(notifier.sent.borrow().is_empty());
    assert!(out.contains("Changes not submitted."));
    Ok(())
}

#[test]
fn quit_on_first_key_never_reaches_second() -> Result<()> {
    let store = FakeStore::new(two_keys());
    let notifier = RecordingNotifier::default();
    let runner = SessionRunner::new(&store, &notifier, Energy::default());
    let history = runner.load_history(&["A".to_string(), "B".to_string()])?;

    let mut display = ScriptedDisplay::from_answers(&["q"])?;
    let mut out = Vec::new();
    let borrowed = &mut display;
    let summary = runner.run(&history, move || Ok(borrowed), &mut out)?;

    assert_eq!(summary.outcome, ReviewOutcome::Quit);
    assert!(store.committed().is_empty());
    assert_eq!(display.titles(), &["A".to_string()]);
    Ok(())
}

#[test]
fn one_failed_write_does_not_stop_the_others() -> Result<()> {
    let store = FakeStore::new(two_keys()).rejecting("A");
    let notifier = RecordingNotifier::default();

    let (summary, out) = run_with(&store, &notifier, &["i", "1", "y"])?;

    let committed = store.committed();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].key, "B");
    assert_eq!(committed[0].new_value, 3.0);

    assert_eq!(summary.report.failed.len(), 1);
    assert_eq!(summary.report.failed[0].0.key, "A");
    assert_eq!(summary.report.failed[0].0.new_source, INVALIDATE_SOURCE);
    assert!(out.contains("FAILED  A: 10.0 --> 0.0: database is locked"));

    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].entries[0].sample, "B");
    drop(sent);

    let err = summary.into_result().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<XsecError>(),
        Some(XsecError::CommitFailed { failed: 1, attempted: 2 })
    ));
    assert_eq!(exit_code_for(&err), 3);
    Ok(())
}

#[test]
fn keeping_everything_writes_nothing() -> Result<()> {
    let store = FakeStore::new(two_keys());
    let notifier = RecordingNotifier::default();

    let (summary, out) = run_with(&store, &notifier, &["", "0"])?;
    assert_eq!(summary.outcome, ReviewOutcome::Unchanged);
    assert!(store.committed().is_empty());
    assert!(out.contains("No changes selected."));
    Ok(())
}

#[test]
fn unknown_samples_have_no_history() -> Result<()> {
    let store = FakeStore::new(single_key());
    let notifier = RecordingNotifier::default();
    let runner = SessionRunner::new(&store, &notifier, Energy::default());

    let err = runner.load_history(&["Nope".to_string()]).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<XsecError>(),
        Some(XsecError::NoHistoryFound(keys)) if keys == &["Nope".to_string()]
    ));
    assert_eq!(exit_code_for(&err), 4);
    Ok(())
}

#[test]
fn like_patterns_must_match_something() -> Result<()> {
    let store = FakeStore::new(two_keys());
    let notifier = RecordingNotifier::default();
    let runner = SessionRunner::new(&store, &notifier, Energy::default());

    let keys = runner.resolve_keys(&["%".to_string()], true)?;
    assert_eq!(keys, vec!["A".to_string(), "B".to_string()]);

    let err = runner.resolve_keys(&["Z%".to_string()], true).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<XsecError>(),
        Some(XsecError::NoKeysMatched)
    ));
    assert_eq!(exit_code_for(&err), 1);

    // Plain names pass through untouched.
    let keys = runner.resolve_keys(&["Z".to_string()], false)?;
    assert_eq!(keys, vec!["Z".to_string()]);
    Ok(())
}

#[test]
fn one_notification_covers_all_written_changes() -> Result<()> {
    let store = FakeStore::new(two_keys());
    let notifier = RecordingNotifier::default();

    run_with(&store, &notifier, &["1", "i", "y"])?;
    assert_eq!(store.committed().len(), 2);

    let sent = notifier.sent.borrow();
    assert_eq!(sent.len(), 1);
    let samples: Vec<&str> = sent[0].entries.iter().map(|e| e.sample.as_str()).collect();
    assert_eq!(samples, vec!["A", "B"]);
    assert_eq!(
        sent[0].source,
        format!("{}, {}", REVERT_SOURCE, INVALIDATE_SOURCE)
    );
    assert!(sent[0].comments.starts_with("A: Reverted to match entry from"));
    Ok(())
}

/// Wraps a scripted display and records when it is dropped.
struct TrackedDisplay {
    inner: ScriptedDisplay,
    released: Rc<Cell<bool>>,
    fail_draw: bool,
}

impl TrackedDisplay {
    fn new(answers: &[&str], released: &Rc<Cell<bool>>) -> Result<Self> {
        Ok(Self {
            inner: ScriptedDisplay::from_answers(answers)?,
            released: Rc::clone(released),
            fail_draw: false,
        })
    }
}

impl Drop for TrackedDisplay {
    fn drop(&mut self) {
        self.released.set(true);
    }
}

impl Display for TrackedDisplay {
    fn viewport(&mut self) -> Result<Viewport> {
        self.inner.viewport()
    }

    fn draw(&mut self, screen: &Screen<'_>) -> Result<()> {
        if self.fail_draw {
            bail!("terminal went away");
        }
        self.inner.draw(screen)
    }

    fn next_event(&mut self) -> Result<InputEvent> {
        self.inner.next_event()
    }
}

#[test]
fn display_is_released_before_the_first_write() -> Result<()> {
    let released = Rc::new(Cell::new(false));
    let store = FakeStore::new(two_keys()).requiring_release(Rc::clone(&released));
    let notifier = RecordingNotifier::default();
    let runner = SessionRunner::new(&store, &notifier, Energy::default());
    let history = runner.load_history(&["A".to_string(), "B".to_string()])?;

    let mut out = Vec::new();
    let summary = runner.run(
        &history,
        || TrackedDisplay::new(&["1", "i", "y"], &released),
        &mut out,
    )?;

    assert!(released.get());
    assert!(summary.report.is_clean(), "{:?}", summary.report.failed);
    assert_eq!(store.committed().len(), 2);
    Ok(())
}

#[test]
fn display_is_released_when_drawing_fails() -> Result<()> {
    let released = Rc::new(Cell::new(false));
    let store = FakeStore::new(single_key());
    let notifier = RecordingNotifier::default();
    let runner = SessionRunner::new(&store, &notifier, Energy::default());
    let history = runner.load_history(&["A".to_string()])?;

    let mut out = Vec::new();
    let err = runner
        .run(
            &history,
            || {
                let mut display = TrackedDisplay::new(&["1", "y"], &released)?;
                display.fail_draw = true;
                Ok(display)
            },
            &mut out,
        )
        .unwrap_err();

    assert!(format!("{:#}", err).contains("terminal went away"));
    assert!(released.get());
    assert!(store.committed().is_empty());
    assert!(out.is_empty());
    Ok(())
}

/// Output sink that rejects every write.
struct BrokenPipe;

impl Write for BrokenPipe {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "stdout closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn unwritable_output_does_not_cut_the_batch_short() -> Result<()> {
    let store = FakeStore::new(two_keys());
    let notifier = RecordingNotifier::default();
    let runner = SessionRunner::new(&store, &notifier, Energy::default());
    let history = runner.load_history(&["A".to_string(), "B".to_string()])?;

    let result = runner.run(
        &history,
        || ScriptedDisplay::from_answers(&["1", "1", "y"]),
        &mut BrokenPipe,
    );

    assert!(result.is_err());
    assert_eq!(store.committed().len(), 2);
    assert_eq!(notifier.sent.borrow().len(), 1);
    Ok(())
}
