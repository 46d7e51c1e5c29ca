use std::collections::VecDeque;

use anyhow::{Context, Result, anyhow};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

use super::display::{Display, InputEvent, Screen, Viewport};
use super::render;

/// An off-screen display fed from a fixed list of events.
///
/// Used for non-interactive reviews (`--answers`) and in tests. Frames are drawn
/// into an in-memory buffer so the last one can be inspected.
pub struct ScriptedDisplay {
    terminal: Terminal<TestBackend>,
    events: VecDeque<InputEvent>,
    titles: Vec<String>,
}

impl ScriptedDisplay {
    pub fn new(width: u16, height: u16, events: impl IntoIterator<Item = InputEvent>) -> Result<Self> {
        let terminal =
            Terminal::new(TestBackend::new(width, height)).context("create off-screen terminal")?;
        Ok(Self {
            terminal,
            events: events.into_iter().collect(),
            titles: Vec::new(),
        })
    }

    /// Each answer is typed and followed by Enter.
    pub fn from_answers<S: AsRef<str>>(answers: &[S]) -> Result<Self> {
        let mut events = Vec::new();
        for answer in answers {
            events.extend(answer.as_ref().chars().map(InputEvent::Char));
            events.push(InputEvent::Submit);
        }
        Self::new(100, 40, events)
    }

    /// Titles of drawn screens in order, consecutive repeats collapsed.
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn remaining_events(&self) -> usize {
        self.events.len()
    }

    /// Text of the last drawn frame, one row per line, trailing blanks trimmed.
    pub fn rendered_text(&self) -> String {
        let buf = self.terminal.backend().buffer();
        let width = usize::from(buf.area.width.max(1));
        buf.content()
            .chunks(width)
            .map(|row| {
                row.iter()
                    .map(|cell| cell.symbol())
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Display for ScriptedDisplay {
    fn viewport(&mut self) -> Result<Viewport> {
        let size = self.terminal.size().context("query screen size")?;
        Ok(render::viewport_for(Rect::new(0, 0, size.width, size.height)))
    }

    fn draw(&mut self, screen: &Screen<'_>) -> Result<()> {
        if self.titles.last().map(String::as_str) != Some(screen.title) {
            self.titles.push(screen.title.to_string());
        }
        self.terminal
            .draw(|f| render::draw(f, screen))
            .context("draw")?;
        Ok(())
    }

    fn next_event(&mut self) -> Result<InputEvent> {
        self.events
            .pop_front()
            .ok_or_else(|| anyhow!("ran out of scripted answers"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_become_keystrokes() -> Result<()> {
        let mut d = ScriptedDisplay::from_answers(&["1", "", "y"])?;
        assert_eq!(d.next_event()?, InputEvent::Char('1'));
        assert_eq!(d.next_event()?, InputEvent::Submit);
        assert_eq!(d.next_event()?, InputEvent::Submit);
        assert_eq!(d.next_event()?, InputEvent::Char('y'));
        assert_eq!(d.next_event()?, InputEvent::Submit);
        assert!(d.next_event().is_err());
        Ok(())
    }
}
