//! Job list view showing every monitored agent.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::Frame;

use crate::state::{AppState, JobSummary};
use crate::ui::widgets::ProgressBar;
use crate::ui::Theme;

const PROGRESS_WIDTH: usize = 12;

/// Job list view.
pub struct JobListView;

impl JobListView {
    /// Render the job list view.
    pub fn render(frame: &mut Frame, area: Rect, app_state: &AppState, theme: &Theme) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Min(3),    // Job table
            ])
            .split(area);

        Self::render_header(frame, chunks[0], app_state, theme);
        Self::render_jobs_table(frame, chunks[1], app_state, theme);
    }

    fn render_header(frame: &mut Frame, area: Rect, app_state: &AppState, theme: &Theme) {
        let title = format!(
            "Agents ({} total, {} polling)",
            app_state.jobs.len(),
            app_state.active_job_count()
        );

        let header_text = Line::from(vec![
            Span::styled(title, theme.header_style),
            Span::raw(" | "),
            Span::styled("Enter: details  x: stop monitoring  p: pause all", theme.help_style),
        ]);

        let header = Paragraph::new(header_text)
            .style(theme.normal_text)
            .block(Block::default().borders(Borders::BOTTOM));

        frame.render_widget(header, area);
    }

    fn render_jobs_table(frame: &mut Frame, area: Rect, app_state: &AppState, theme: &Theme) {
        let header_cells = ["ID", "Query", "Status", "Progress", "Jobs", "Emails", "Age", "Monitor"]
            .iter()
            .map(|h| Cell::from(*h).style(theme.header_style));
        let header = Row::new(header_cells).style(theme.header_style);

        let rows = app_state.jobs.iter().map(|summary| format_job_row(summary, theme));

        let table = Table::new(
            rows,
            [
                Constraint::Length(10),
                Constraint::Percentage(30),
                Constraint::Length(11),
                Constraint::Length(PROGRESS_WIDTH as u16 + 8),
                Constraint::Length(6),
                Constraint::Length(7),
                Constraint::Length(8),
                Constraint::Length(10),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).style(theme.block_style))
        .highlight_style(theme.selected_style);

        let mut table_state = TableState::default();
        table_state.select(app_state.selected_index());
        frame.render_stateful_widget(table, area, &mut table_state);
    }
}

/// Format a duration as a human-readable string.
pub(crate) fn format_duration(duration: &chrono::Duration) -> String {
    let seconds = duration.num_seconds().max(0);
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    }
}

fn monitor_label(summary: &JobSummary) -> &'static str {
    if summary.last_error.is_some() {
        "retrying"
    } else if summary.polling {
        "polling"
    } else if summary.job.is_active() {
        "paused"
    } else {
        "stopped"
    }
}

fn format_job_row<'a>(summary: &'a JobSummary, theme: &Theme) -> Row<'a> {
    let job = &summary.job;
    let progress = match summary.progress {
        Some(progress) => ProgressBar::inline(progress, PROGRESS_WIDTH),
        None => "-".to_string(),
    };
    let monitor_style = if summary.last_error.is_some() {
        theme.warning_style
    } else {
        theme.label_style
    };

    Row::new(vec![
        Cell::from(job.id.as_str()),
        Cell::from(job.query.as_str()),
        Cell::from(job.status.as_str()).style(theme.job_status(job.status)),
        Cell::from(progress),
        Cell::from(job.jobs_found.to_string()),
        Cell::from(job.emails_found.to_string()),
        Cell::from(format_duration(&job.elapsed())),
        Cell::from(monitor_label(summary)).style(monitor_style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Job, JobStatus};
    use rstest::rstest;

    #[rstest]
    #[case(42, "42s")]
    #[case(125, "2m 5s")]
    #[case(7380, "2h 3m")]
    fn durations(#[case] seconds: i64, #[case] expected: &str) {
        assert_eq!(format_duration(&chrono::Duration::seconds(seconds)), expected);
    }

    #[rstest]
    #[case(JobStatus::Running, true, None, "polling")]
    #[case(JobStatus::Running, false, None, "paused")]
    #[case(JobStatus::Completed, false, None, "stopped")]
    #[case(JobStatus::Running, true, Some("timeout"), "retrying")]
    fn monitor_labels(
        #[case] status: JobStatus,
        #[case] polling: bool,
        #[case] error: Option<&str>,
        #[case] expected: &str,
    ) {
        let summary = JobSummary {
            job: Job::new("j1", "q", status),
            polling,
            last_error: error.map(str::to_string),
            status_message: None,
            progress: None,
            log_count: 0,
        };
        assert_eq!(monitor_label(&summary), expected);
    }
}
