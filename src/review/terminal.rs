use std::io::{self, IsTerminal, Stdout};
use std::sync::Once;

use anyhow::{Context, Result};
use crossterm::cursor::Show;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use tracing::debug;

use super::display::{Display, InputEvent, Screen, Viewport, map_key};
use super::render;

static PANIC_HOOK_INSTALLED: Once = Once::new();

fn install_panic_hook_once() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            restore();
            original_hook(panic_info);
        }));
    });
}

fn restore() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
}

/// The real terminal in raw mode on the alternate screen. Dropping it puts the
/// terminal back, on every exit path.
pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalDisplay {
    pub fn acquire() -> Result<Self> {
        if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
            anyhow::bail!("review requires an interactive terminal (TTY)");
        }
        install_panic_hook_once();

        enable_raw_mode().context("enable raw mode")?;
        if let Err(err) = execute!(io::stdout(), EnterAlternateScreen) {
            restore();
            return Err(err).context("enter alternate screen");
        }

        let terminal = match Terminal::new(CrosstermBackend::new(io::stdout())) {
            Ok(t) => t,
            Err(err) => {
                restore();
                return Err(err).context("create terminal");
            }
        };
        let mut display = Self { terminal };
        display.terminal.clear().ok();
        debug!("terminal acquired");
        Ok(display)
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        restore();
        self.terminal.show_cursor().ok();
        debug!("terminal released");
    }
}

impl Display for TerminalDisplay {
    fn viewport(&mut self) -> Result<Viewport> {
        let size = self.terminal.size().context("query terminal size")?;
        Ok(render::viewport_for(Rect::new(0, 0, size.width, size.height)))
    }

    fn draw(&mut self, screen: &Screen<'_>) -> Result<()> {
        self.terminal
            .draw(|f| render::draw(f, screen))
            .context("draw")?;
        Ok(())
    }

    fn next_event(&mut self) -> Result<InputEvent> {
        loop {
            match event::read().context("read event")? {
                Event::Key(k) => {
                    if let Some(ev) = map_key(k) {
                        return Ok(ev);
                    }
                }
                Event::Resize(..) => return Ok(InputEvent::Redraw),
                _ => {}
            }
        }
    }
}
