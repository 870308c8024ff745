//! UI components for the agent dashboard.
//!
//! A small state machine of views (agent list, agent details, notification
//! history) with a help overlay, toasts and a status line drawn on top.

pub mod help;
pub mod job_detail;
pub mod job_list;
pub mod notifications;
pub mod theme;
pub mod widgets;

pub use help::HelpView;
pub use job_detail::JobDetailView;
pub use job_list::JobListView;
pub use notifications::{NotificationsView, ToastOverlay};
pub use theme::Theme;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::state::{AppState, Temporality};

/// What the application has to do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    Quit,
    ToggleHelp,
    /// Flip the global monitoring switch.
    ToggleMonitoring,
    /// Details of this job were opened.
    SelectJob(String),
    /// Stop monitoring this job.
    UnregisterJob(String),
    Other,
}

/// Available views in the application.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    JobsList,
    JobInstance(JobDetailView),
    Notifications,
}

/// Main UI controller.
pub struct Ui {
    state: ViewState,
    show_help: bool,
    theme: Theme,
}

impl Ui {
    pub fn new() -> Self {
        Self {
            state: ViewState::JobsList,
            show_help: false,
            theme: Theme::default(),
        }
    }

    pub fn current_view(&self) -> &ViewState {
        &self.state
    }

    /// Job whose details are on screen.
    pub fn detail_job_id(&self) -> Option<&str> {
        match &self.state {
            ViewState::JobInstance(view) => Some(view.job_id()),
            _ => None,
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn is_help_shown(&self) -> bool {
        self.show_help
    }

    pub fn navigate_to(&mut self, view: ViewState) {
        self.state = view;
    }

    /// Handle keyboard input.
    pub fn handle_key_event(&mut self, key: KeyEvent, app_state: &mut AppState) -> UpdateKind {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return UpdateKind::Quit,
            KeyCode::Char('q') => return UpdateKind::Quit,
            KeyCode::F(1) | KeyCode::Char('?') => return UpdateKind::ToggleHelp,
            KeyCode::Char('p') => return UpdateKind::ToggleMonitoring,
            KeyCode::Char('c') => {
                app_state.dismiss_toasts();
                return UpdateKind::Other;
            }
            KeyCode::Char('l') => {
                self.state = ViewState::JobsList;
                return UpdateKind::Other;
            }
            KeyCode::Char('n') => {
                self.state = ViewState::Notifications;
                return UpdateKind::Other;
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return UpdateKind::Other;
            }
            _ => {}
        }

        if key.code == KeyCode::Esc {
            self.state = ViewState::JobsList;
            return UpdateKind::Other;
        }

        match &mut self.state {
            ViewState::JobsList => {}
            ViewState::JobInstance(view) => {
                view.handle_key_event(key, app_state);
                return UpdateKind::Other;
            }
            ViewState::Notifications => return UpdateKind::Other,
        }

        self.handle_jobs_list_input(key, app_state)
    }

    fn handle_jobs_list_input(&mut self, key: KeyEvent, app_state: &mut AppState) -> UpdateKind {
        match key.code {
            KeyCode::Enter => {
                if let Some(job_id) = app_state.selected_job_id.clone() {
                    self.state = ViewState::JobInstance(JobDetailView::new(job_id.clone()));
                    return UpdateKind::SelectJob(job_id);
                }
            }
            KeyCode::Char('x') | KeyCode::Delete => {
                if let Some(job_id) = app_state.selected_job_id.clone() {
                    return UpdateKind::UnregisterJob(job_id);
                }
            }
            KeyCode::Down | KeyCode::Char('j') => app_state.select_next_job(),
            KeyCode::Up | KeyCode::Char('k') => app_state.select_prev_job(),
            _ => {}
        }
        UpdateKind::Other
    }

    /// Render the UI.
    pub fn render(&self, frame: &mut Frame, app_state: &AppState) {
        let full = frame.size();
        if full.height < 2 {
            return;
        }
        let area = Rect::new(full.x, full.y, full.width, full.height - 1);

        match &self.state {
            ViewState::JobsList => JobListView::render(frame, area, app_state, &self.theme),
            ViewState::JobInstance(view) => view.render(frame, area, app_state, &self.theme),
            ViewState::Notifications => NotificationsView::render(frame, area, app_state, &self.theme),
        }

        ToastOverlay::render(frame, area, app_state, &self.theme);

        if self.show_help {
            HelpView::render(frame, area, &self.theme, &self.state);
        }

        self.render_status_line(frame, full, app_state);
    }

    fn render_status_line(&self, frame: &mut Frame, area: Rect, app_state: &AppState) {
        let status_area = Rect::new(area.x, area.bottom() - 1, area.width, 1);

        let (status, status_style) = match app_state.temporality {
            Temporality::Live => ("LIVE", self.theme.status_live),
            Temporality::Paused => ("PAUSED", self.theme.status_paused),
        };

        let status_text = format!(
            "{} | Agents: {}/{} polling | Notifications: {} | Press ? for help",
            status,
            app_state.active_job_count(),
            app_state.jobs.len(),
            app_state.history.len()
        );

        frame.render_widget(Paragraph::new(status_text).style(status_style), status_area);
    }
}

impl Default for Ui {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Job, JobStatus, JobSummary};
    use pretty_assertions::assert_eq;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn state_with_jobs(ids: &[&str]) -> AppState {
        let mut state = AppState::new();
        state.set_jobs(
            ids.iter()
                .map(|id| JobSummary {
                    job: Job::new(*id, "accountants", JobStatus::Running),
                    polling: true,
                    last_error: None,
                    status_message: Some("Scraping".into()),
                    progress: Some(0.3),
                    log_count: 0,
                })
                .collect(),
        );
        state
    }

    #[test]
    fn enter_opens_details_and_esc_goes_back() {
        let mut ui = Ui::new();
        let mut state = state_with_jobs(&["a1", "a2"]);

        assert_eq!(ui.handle_key_event(key(KeyCode::Down), &mut state), UpdateKind::Other);
        assert_eq!(
            ui.handle_key_event(key(KeyCode::Enter), &mut state),
            UpdateKind::SelectJob("a2".into())
        );
        assert_eq!(ui.detail_job_id(), Some("a2"));

        ui.handle_key_event(key(KeyCode::Esc), &mut state);
        assert_eq!(ui.current_view(), &ViewState::JobsList);
    }

    #[test]
    fn global_keys() {
        let mut ui = Ui::new();
        let mut state = state_with_jobs(&["a1"]);

        assert_eq!(ui.handle_key_event(key(KeyCode::Char('p')), &mut state), UpdateKind::ToggleMonitoring);
        assert_eq!(
            ui.handle_key_event(key(KeyCode::Char('x')), &mut state),
            UpdateKind::UnregisterJob("a1".into())
        );
        ui.handle_key_event(key(KeyCode::Char('n')), &mut state);
        assert_eq!(ui.current_view(), &ViewState::Notifications);
        assert_eq!(ui.handle_key_event(key(KeyCode::Char('q')), &mut state), UpdateKind::Quit);
    }

    #[test]
    fn every_view_renders_on_a_small_terminal() {
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        let mut state = state_with_jobs(&["a1"]);
        state.push_notification(crate::notification::Notification::success("Agent completed", "done"));
        let mut ui = Ui::new();

        for view in [
            ViewState::JobsList,
            ViewState::JobInstance(JobDetailView::new("a1")),
            ViewState::JobInstance(JobDetailView::new("gone")),
            ViewState::Notifications,
        ] {
            ui.navigate_to(view);
            ui.toggle_help();
            terminal.draw(|frame| ui.render(frame, &state)).unwrap();
        }
    }
}
