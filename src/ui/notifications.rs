//! Notification history and on-screen toasts.

use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratatui::Frame;

use crate::notification::Notification;
use crate::state::AppState;
use crate::ui::Theme;

const TOAST_WIDTH: u16 = 48;
const TOAST_HEIGHT: u16 = 4;

/// Full notification history, newest first.
pub struct NotificationsView;

impl NotificationsView {
    pub fn render(frame: &mut Frame, area: Rect, app_state: &AppState, theme: &Theme) {
        let block = Block::default()
            .title(format!("Notifications ({})", app_state.history.len()))
            .borders(Borders::ALL)
            .style(theme.block_style);

        if app_state.history.is_empty() {
            let empty = Paragraph::new("Nothing to report yet.")
                .style(theme.help_style)
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = app_state
            .history
            .iter()
            .rev()
            .map(|n| ListItem::new(history_line(n, theme)))
            .collect();

        let list = List::new(items).block(block).style(theme.normal_text);
        frame.render_widget(list, area);
    }
}

fn history_line<'a>(notification: &'a Notification, theme: &Theme) -> Line<'a> {
    let mut spans = vec![
        Span::styled(
            notification.created_at.format("%H:%M:%S ").to_string(),
            theme.label_style,
        ),
        Span::styled(
            format!("{:<8}", notification.category.as_str()),
            theme.category(notification.category),
        ),
    ];
    if let Some(job_id) = &notification.job_id {
        spans.push(Span::styled(format!("[{job_id}] "), theme.help_style));
    }
    spans.push(Span::styled(notification.title.as_str(), theme.header_style));
    spans.push(Span::raw(": "));
    spans.push(Span::raw(notification.message.as_str()));
    Line::from(spans)
}

/// Toasts stacked in the top-right corner.
pub struct ToastOverlay;

impl ToastOverlay {
    pub fn render(frame: &mut Frame, area: Rect, app_state: &AppState, theme: &Theme) {
        let width = TOAST_WIDTH.min(area.width);
        let mut y = area.y + 1;

        for toast in app_state.toasts.iter().rev() {
            if y + TOAST_HEIGHT > area.bottom().saturating_sub(1) {
                break;
            }
            let rect = Rect::new(area.right().saturating_sub(width + 1), y, width, TOAST_HEIGHT);
            let notification = &toast.notification;

            let block = Block::default()
                .title(Span::styled(
                    notification.title.as_str(),
                    theme.category(notification.category),
                ))
                .borders(Borders::ALL)
                .border_style(theme.category(notification.category));
            let body = Paragraph::new(notification.message.as_str())
                .style(theme.normal_text)
                .wrap(Wrap { trim: true })
                .block(block);

            frame.render_widget(Clear, rect);
            frame.render_widget(body, rect);
            y += TOAST_HEIGHT;
        }
    }
}
