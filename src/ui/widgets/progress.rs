//! Job progress bar widget.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Widget},
};
use unicode_width::UnicodeWidthStr;

/// Progress bar for an agent's reported completion.
pub struct ProgressBar<'a> {
    block: Option<Block<'a>>,
    /// The value (0.0-1.0) representing progress
    progress: f64,
    style: Style,
    empty_style: Style,
    symbol_filled: &'a str,
    symbol_empty: &'a str,
    label: Option<String>,
    show_percentage: bool,
}

impl<'a> Default for ProgressBar<'a> {
    fn default() -> Self {
        Self {
            block: None,
            progress: 0.0,
            style: Style::default().fg(Color::Green),
            empty_style: Style::default().fg(Color::DarkGray),
            symbol_filled: "█",
            symbol_empty: "░",
            label: None,
            show_percentage: false,
        }
    }
}

impl<'a> ProgressBar<'a> {
    /// Create a new progress bar with the given value (0.0-1.0)
    pub fn new(progress: f64) -> Self {
        Self {
            progress: progress.clamp(0.0, 1.0),
            ..Default::default()
        }
    }

    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn show_percentage(mut self, show: bool) -> Self {
        self.show_percentage = show;
        self
    }

    /// Textual bar for table cells, e.g. `[████░░░░] 50%`.
    pub fn inline(progress: f64, width: usize) -> String {
        let progress = progress.clamp(0.0, 1.0);
        let filled = (width as f64 * progress).round() as usize;
        format!(
            "[{}{}] {:.0}%",
            "█".repeat(filled),
            "░".repeat(width - filled),
            progress * 100.0
        )
    }
}

impl<'a> Widget for ProgressBar<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let render_area = if let Some(ref block) = self.block {
            let inner_area = block.inner(area);
            block.clone().render(area, buf);
            inner_area
        } else {
            area
        };

        if render_area.width < 1 || render_area.height < 1 {
            return;
        }

        let filled_width = ((render_area.width as f64) * self.progress).round() as u16;

        for y in render_area.top()..render_area.bottom() {
            for x in render_area.left()..render_area.left().saturating_add(filled_width) {
                buf.get_mut(x, y).set_symbol(self.symbol_filled).set_style(self.style);
            }
            for x in render_area.left().saturating_add(filled_width)..render_area.right() {
                buf.get_mut(x, y).set_symbol(self.symbol_empty).set_style(self.empty_style);
            }
        }

        let center_text = if self.show_percentage {
            format!("{:3.0}%", self.progress * 100.0)
        } else if let Some(label) = &self.label {
            label.clone()
        } else {
            return;
        };

        if center_text.width() as u16 >= render_area.width {
            return;
        }

        let text_x = render_area.left() + (render_area.width - center_text.width() as u16) / 2;
        let text_y = render_area.top();
        let text_style = if self.progress > 0.5 {
            Style::default().fg(Color::Black).bg(self.style.fg.unwrap_or(Color::Green))
        } else {
            Style::default().fg(Color::White)
        };

        for (i, c) in center_text.chars().enumerate() {
            let x = text_x + i as u16;
            if x < render_area.right() {
                buf.get_mut(x, text_y).set_char(c).set_style(text_style);
            }
        }
    }
}
