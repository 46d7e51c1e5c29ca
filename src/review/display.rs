use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::paged_view::PagedView;

/// Input events the review cares about, decoupled from the terminal library.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Char(char),
    Backspace,
    ScrollUp,
    ScrollDown,
    Submit,
    /// The screen changed size and must be drawn again.
    Redraw,
    Interrupt,
}

/// Space available to the paged view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

/// Everything shown in one frame.
#[derive(Clone, Copy, Debug)]
pub struct Screen<'a> {
    pub title: &'a str,
    pub view: &'a PagedView,
    pub prompt: &'a str,
    pub input: &'a str,
    pub notice: Option<&'a str>,
}

/// The screen plus its input source. Owned exclusively by one review at a time.
pub trait Display {
    fn viewport(&mut self) -> Result<Viewport>;

    fn draw(&mut self, screen: &Screen<'_>) -> Result<()>;

    /// Blocks until the next relevant event.
    fn next_event(&mut self) -> Result<InputEvent>;
}

impl<D: Display + ?Sized> Display for &mut D {
    fn viewport(&mut self) -> Result<Viewport> {
        (**self).viewport()
    }

    fn draw(&mut self, screen: &Screen<'_>) -> Result<()> {
        (**self).draw(screen)
    }

    fn next_event(&mut self) -> Result<InputEvent> {
        (**self).next_event()
    }
}

pub(super) fn map_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('d') => Some(InputEvent::Interrupt),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Enter => Some(InputEvent::Submit),
        KeyCode::Backspace | KeyCode::Delete => Some(InputEvent::Backspace),
        KeyCode::Up | KeyCode::PageUp => Some(InputEvent::ScrollUp),
        KeyCode::Down | KeyCode::PageDown => Some(InputEvent::ScrollDown),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::ALT) => {
            Some(InputEvent::Char(c))
        }
        _ => None,
    }
}
