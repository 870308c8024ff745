//! Help overlay showing keyboard shortcuts.

use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::ui::{Theme, ViewState};

const GLOBAL_KEYS: &[(&str, &str)] = &[
    ("q", "Quit"),
    ("?", "Toggle this help screen"),
    ("l", "Agents list"),
    ("n", "Notification history"),
    ("p", "Pause / resume all monitoring"),
    ("c", "Dismiss toasts"),
];

const LIST_KEYS: &[(&str, &str)] = &[
    ("j/k", "Move selection"),
    ("Enter", "Agent details"),
    ("x", "Stop monitoring the selected agent"),
];

const DETAIL_KEYS: &[(&str, &str)] = &[
    ("Tab", "Switch between info and logs"),
    ("j/k", "Scroll logs"),
    ("g/G", "Jump to first line / follow new lines"),
    ("Esc", "Back to the list"),
];

/// Help overlay.
pub struct HelpView;

impl HelpView {
    pub fn render(frame: &mut Frame, area: Rect, theme: &Theme, current_view: &ViewState) {
        let popup_area = Self::centered_rect(60, 70, area);
        frame.render_widget(Clear, popup_area);

        let help_block = Block::default()
            .title("Agent Monitor Help")
            .borders(Borders::ALL)
            .style(theme.block_style);

        let mut help_text = section("Global Shortcuts", GLOBAL_KEYS, theme);
        match current_view {
            ViewState::JobsList => help_text.extend(section("Agents", LIST_KEYS, theme)),
            ViewState::JobInstance(_) => help_text.extend(section("Agent details", DETAIL_KEYS, theme)),
            ViewState::Notifications => {}
        }

        let help_widget = Paragraph::new(help_text)
            .block(help_block)
            .style(theme.normal_text)
            .alignment(Alignment::Left);

        frame.render_widget(help_widget, popup_area);
    }

    /// Helper function to create a centered rect using percentages
    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_width = r.width * percent_x / 100;
        let popup_height = r.height * percent_y / 100;

        Rect {
            x: r.x + (r.width - popup_width) / 2,
            y: r.y + (r.height - popup_height) / 2,
            width: popup_width,
            height: popup_height,
        }
    }
}

fn section<'a>(title: &'a str, keys: &'a [(&'a str, &'a str)], theme: &Theme) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(Span::styled(title, Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];
    lines.extend(keys.iter().map(|(key, description)| {
        Line::from(vec![
            Span::styled(format!("{key:>6}"), theme.key_style),
            Span::raw(" - "),
            Span::raw(*description),
        ])
    }));
    lines.push(Line::from(""));
    lines
}
