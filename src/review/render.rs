use std::rc::Rc;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::display::{Screen, Viewport};

fn split(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(area)
}

fn body_block(title: &str) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(Span::styled(
        format!(" {} ", title),
        Style::default().fg(Color::Black).bg(Color::White),
    ))
}

/// Inner size of the body for a screen of the given size.
pub(super) fn viewport_for(area: Rect) -> Viewport {
    let inner = body_block("").inner(split(area)[0]);
    Viewport {
        width: inner.width,
        height: inner.height,
    }
}

pub(super) fn draw(frame: &mut ratatui::Frame, screen: &Screen<'_>) {
    let chunks = split(frame.area());

    let block = body_block(screen.title);
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);
    frame.render_widget(Paragraph::new(screen.view.visible().to_vec()), inner);

    let status = match screen.notice {
        Some(notice) => Line::from(Span::styled(
            notice.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            screen.view.position_hint(),
            Style::default().fg(Color::Gray),
        )),
    };
    frame.render_widget(Paragraph::new(status), chunks[1]);

    let input_line = Line::from(vec![
        Span::styled(
            screen.prompt,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(screen.input),
    ]);
    frame.render_widget(
        Paragraph::new(input_line).block(Block::default().borders(Borders::ALL).title("Input")),
        chunks[2],
    );

    let typed = (screen.prompt.chars().count() + screen.input.chars().count()) as u16;
    let x = typed.min(chunks[2].width.saturating_sub(3));
    frame.set_cursor_position((chunks[2].x + 1 + x, chunks[2].y + 1));
}
