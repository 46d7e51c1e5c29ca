use anyhow::Result;

use crate::error::XsecError;

use super::display::{Display, InputEvent, Screen};
use super::paged_view::{PagedView, ScrollDirection};

/// Characters a prompt accepts. Everything else is dropped on input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Charset {
    /// `0`-`9`, `i` and `q`, for picking an option.
    Selection,
    /// `y` and `n`.
    Confirmation,
}

impl Charset {
    pub fn accepts(self, c: char) -> bool {
        match self {
            Charset::Selection => c.is_ascii_digit() || c == 'i' || c == 'q',
            Charset::Confirmation => c == 'y' || c == 'n',
        }
    }
}

/// One-line editor that only appends and deletes at the end of its buffer.
///
/// Scroll keys move the paged view instead of touching the buffer.
pub struct InputEditor<'a, D: Display> {
    display: &'a mut D,
    view: &'a mut PagedView,
    title: &'a str,
    notice: Option<&'a str>,
    buf: String,
}

impl<'a, D: Display> InputEditor<'a, D> {
    pub fn new(display: &'a mut D, view: &'a mut PagedView, title: &'a str) -> Self {
        Self {
            display,
            view,
            title,
            notice: None,
            buf: String::new(),
        }
    }

    pub fn with_notice(mut self, notice: Option<&'a str>) -> Self {
        self.notice = notice;
        self
    }

    /// Reads until Enter and returns the buffer as typed, possibly empty.
    pub fn read_constrained(mut self, prompt: &str, charset: Charset) -> Result<String> {
        loop {
            self.redraw(prompt)?;
            match self.display.next_event()? {
                InputEvent::Char(c) => {
                    if charset.accepts(c) {
                        self.buf.push(c);
                    }
                }
                InputEvent::Backspace => {
                    self.buf.pop();
                }
                InputEvent::ScrollUp => self.scroll(ScrollDirection::Up),
                InputEvent::ScrollDown => self.scroll(ScrollDirection::Down),
                InputEvent::Redraw => {}
                InputEvent::Submit => return Ok(self.buf),
                InputEvent::Interrupt => return Err(XsecError::Interrupted.into()),
            }
        }
    }

    fn scroll(&mut self, direction: ScrollDirection) {
        let page = self.view.viewport_height();
        self.view.scroll(direction, page);
    }

    fn redraw(&mut self, prompt: &str) -> Result<()> {
        let viewport = self.display.viewport()?;
        self.view.set_viewport_height(usize::from(viewport.height));
        self.display.draw(&Screen {
            title: self.title,
            view: self.view,
            prompt,
            input: &self.buf,
            notice: self.notice,
        })
    }
}
