use ratatui::text::Line;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// A window over formatted lines that may be taller than the screen.
#[derive(Debug, Default)]
pub struct PagedView {
    lines: Vec<Line<'static>>,
    offset: usize,
    viewport_height: usize,
}

impl PagedView {
    pub fn new(viewport_height: usize) -> Self {
        Self {
            lines: Vec::new(),
            offset: 0,
            viewport_height,
        }
    }

    /// Replaces the content and scrolls back to the top.
    pub fn render(&mut self, lines: Vec<Line<'static>>) {
        self.lines = lines;
        self.offset = 0;
    }

    /// Updated before every draw so a resized terminal keeps the offset in range.
    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height;
        self.offset = self.offset.min(self.max_offset());
    }

    /// Up moves a full page, down moves half a page.
    pub fn scroll(&mut self, direction: ScrollDirection, page_size: usize) {
        match direction {
            ScrollDirection::Up => {
                self.offset = self.offset.saturating_sub(page_size.max(1));
            }
            ScrollDirection::Down => {
                let step = (page_size / 2).max(1);
                self.offset = (self.offset + step).min(self.max_offset());
            }
        }
    }

    pub fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.viewport_height)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn visible(&self) -> &[Line<'static>] {
        let end = (self.offset + self.viewport_height).min(self.lines.len());
        &self.lines[self.offset.min(end)..end]
    }

    /// Short position hint, empty when everything fits.
    pub fn position_hint(&self) -> String {
        if self.lines.len() <= self.viewport_height {
            return String::new();
        }
        let first = self.offset + 1;
        let last = (self.offset + self.viewport_height).min(self.lines.len());
        format!(
            "lines {}-{} of {} (Up/Down to scroll)",
            first,
            last,
            self.lines.len()
        )
    }
}
