//! Job detail view with status information and the agent's log.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Tabs, Wrap};
use ratatui::Frame;

use crate::state::{AppState, JobSummary, LogEntry};
use crate::ui::job_list::format_duration;
use crate::ui::widgets::ProgressBar;
use crate::ui::Theme;

/// Tab selection for job detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailTab {
    Info,
    Logs,
}

/// Job detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDetailView {
    job_id: String,
    current_tab: DetailTab,
    /// Scroll position in logs view
    log_scroll: u16,
    /// Keep the newest log line in view.
    follow: bool,
}

impl JobDetailView {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            current_tab: DetailTab::Info,
            log_scroll: 0,
            follow: true,
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn current_tab(&self) -> DetailTab {
        self.current_tab
    }

    /// Render the job detail view.
    pub fn render(&self, frame: &mut Frame, area: Rect, app_state: &AppState, theme: &Theme) {
        let Some(summary) = app_state.jobs.iter().find(|s| s.job.id == self.job_id) else {
            let error_text = Text::styled(format!("Agent {} is no longer monitored", self.job_id), theme.error_style);
            let error_widget = Paragraph::new(error_text).block(
                Block::default()
                    .title("Error")
                    .borders(Borders::ALL)
                    .style(theme.block_style),
            );
            frame.render_widget(error_widget, area);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4), // Header
                Constraint::Length(3), // Progress
                Constraint::Length(3), // Tabs
                Constraint::Min(3),    // Content
            ])
            .split(area);

        self.render_header(frame, chunks[0], summary, theme);
        self.render_progress(frame, chunks[1], summary, theme);
        self.render_tabs(frame, chunks[2], app_state, theme);

        match self.current_tab {
            DetailTab::Info => self.render_info_tab(frame, chunks[3], summary, app_state, theme),
            DetailTab::Logs => self.render_logs_tab(frame, chunks[3], &app_state.selected_logs, theme),
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, summary: &JobSummary, theme: &Theme) {
        let job = &summary.job;
        let header_text = vec![
            Line::from(vec![
                Span::styled("Agent: ", theme.label_style),
                Span::styled(job.id.as_str(), theme.value_style),
                Span::raw(" | "),
                Span::styled("Status: ", theme.label_style),
                Span::styled(job.status.as_str(), theme.job_status(job.status)),
            ]),
            Line::from(vec![
                Span::styled("Query: ", theme.label_style),
                Span::styled(job.query.as_str(), theme.value_style),
            ]),
        ];

        let header = Paragraph::new(header_text)
            .style(theme.normal_text)
            .block(Block::default().borders(Borders::ALL));

        frame.render_widget(header, area);
    }

    fn render_progress(&self, frame: &mut Frame, area: Rect, summary: &JobSummary, theme: &Theme) {
        let block = Block::default().title("Progress").borders(Borders::ALL);
        let bar = match summary.progress {
            Some(progress) => ProgressBar::new(progress).show_percentage(true),
            None => ProgressBar::new(0.0).label("no progress reported"),
        };
        frame.render_widget(bar.block(block).style(theme.job_status(summary.job.status)), area);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect, app_state: &AppState, theme: &Theme) {
        let titles = vec![
            Line::from("Info"),
            Line::from(format!("Logs ({})", app_state.selected_logs.len())),
        ];
        let selected_tab = match self.current_tab {
            DetailTab::Info => 0,
            DetailTab::Logs => 1,
        };

        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL))
            .style(theme.normal_text)
            .highlight_style(theme.selected_style)
            .select(selected_tab);

        frame.render_widget(tabs, area);
    }

    fn render_info_tab(
        &self,
        frame: &mut Frame,
        area: Rect,
        summary: &JobSummary,
        app_state: &AppState,
        theme: &Theme,
    ) {
        let block = Block::default()
            .title("Agent Information")
            .borders(Borders::ALL)
            .style(theme.block_style);

        let job = &summary.job;
        let status = app_state.selected_status.as_ref();
        let optional = |value: Option<u64>| value.map_or_else(|| "-".to_string(), |v| v.to_string());

        let mut info_text = vec![
            field("Created: ", job.created_at.to_rfc3339(), theme),
            field("Age: ", format_duration(&job.elapsed()), theme),
            field("Batch: ", job.batch_id.clone().unwrap_or_else(|| "-".to_string()), theme),
            field("Jobs found: ", job.jobs_found.to_string(), theme),
            field("Emails found: ", job.emails_found.to_string(), theme),
            field("Cities processed: ", optional(status.and_then(|s| s.processed_cities)), theme),
            field(
                "Companies processed: ",
                optional(status.and_then(|s| s.processed_companies)),
                theme,
            ),
            field("Started: ", status.and_then(|s| s.start_time.clone()).unwrap_or_else(|| "-".into()), theme),
            field("Ended: ", status.and_then(|s| s.end_time.clone()).unwrap_or_else(|| "-".into()), theme),
            Line::from(""),
            field(
                "Backend message: ",
                summary.status_message.clone().unwrap_or_else(|| "waiting for first poll".into()),
                theme,
            ),
        ];

        if let Some(error) = &summary.last_error {
            info_text.push(Line::from(vec![
                Span::styled("Last poll failed: ", theme.label_style),
                Span::styled(error.clone(), theme.error_style),
            ]));
        }

        let info = Paragraph::new(info_text)
            .style(theme.normal_text)
            .block(block)
            .wrap(Wrap { trim: true });

        frame.render_widget(info, area);
    }

    fn render_logs_tab(&self, frame: &mut Frame, area: Rect, logs: &[LogEntry], theme: &Theme) {
        let block = Block::default()
            .title("Agent Logs")
            .borders(Borders::ALL)
            .style(theme.block_style);

        if logs.is_empty() {
            let empty = Paragraph::new("No logs yet.").style(theme.help_style).block(block);
            frame.render_widget(empty, area);
            return;
        }

        let log_content: Vec<Line> = logs.iter().map(|entry| format_log_line(entry, theme)).collect();

        let visible = area.height.saturating_sub(2);
        let scroll = if self.follow {
            (log_content.len() as u16).saturating_sub(visible)
        } else {
            self.log_scroll
        };

        let logs_paragraph = Paragraph::new(log_content)
            .style(theme.normal_text)
            .block(block)
            .scroll((scroll, 0));

        frame.render_widget(logs_paragraph, area);
    }

    /// Handle keyboard input.
    pub fn handle_key_event(&mut self, key: KeyEvent, app_state: &AppState) {
        match key.code {
            KeyCode::Tab | KeyCode::Right => self.next_tab(),
            KeyCode::BackTab | KeyCode::Left => self.next_tab(),
            _ if self.current_tab == DetailTab::Logs => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.scroll_logs_up(app_state),
                KeyCode::Down | KeyCode::Char('j') => self.scroll_logs_down(app_state),
                KeyCode::Home | KeyCode::Char('g') => {
                    self.follow = false;
                    self.log_scroll = 0;
                }
                KeyCode::End | KeyCode::Char('G') => self.follow = true,
                _ => {}
            },
            _ => {}
        }
    }

    fn next_tab(&mut self) {
        self.current_tab = match self.current_tab {
            DetailTab::Info => DetailTab::Logs,
            DetailTab::Logs => DetailTab::Info,
        };
    }

    fn last_line(app_state: &AppState) -> u16 {
        app_state.selected_logs.len().saturating_sub(1) as u16
    }

    fn scroll_logs_up(&mut self, app_state: &AppState) {
        if self.follow {
            self.follow = false;
            self.log_scroll = Self::last_line(app_state);
        }
        self.log_scroll = self.log_scroll.saturating_sub(1);
    }

    fn scroll_logs_down(&mut self, app_state: &AppState) {
        if self.follow {
            return;
        }
        self.log_scroll = self.log_scroll.saturating_add(1);
        if self.log_scroll >= Self::last_line(app_state) {
            self.follow = true;
        }
    }
}

fn field<'a>(label: &'a str, value: String, theme: &Theme) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, theme.label_style),
        Span::styled(value, theme.value_style),
    ])
}

fn format_log_line<'a>(entry: &'a LogEntry, theme: &Theme) -> Line<'a> {
    let mut spans = vec![
        Span::styled(entry.timestamp.format("%H:%M:%S ").to_string(), theme.label_style),
        Span::styled(format!("{:<7} ", entry.level.as_str()), theme.log_level(entry.level)),
        Span::raw(entry.message.as_str()),
    ];
    if let Some(company) = &entry.company {
        spans.push(Span::styled(format!("  [{company}]"), theme.help_style));
    }
    if let Some(email) = &entry.email {
        spans.push(Span::styled(format!("  <{email}>"), theme.help_style));
    }
    Line::from(spans)
}
