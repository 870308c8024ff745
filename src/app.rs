//! Application state and logic.
//!
//! This module wires the agent monitor, the notification stream, UI
//! components and terminal events together.

use std::time::{Duration, Instant};

use color_eyre::Result;
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::event::{Event, EventHandler, DEFAULT_TICK_RATE};
use crate::monitor::AgentMonitor;
use crate::notification::Notification;
use crate::state::{AppState, Temporality};
use crate::ui::{Ui, UpdateKind};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub tick_rate_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: DEFAULT_TICK_RATE.as_millis() as u64,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.tick_rate_ms)
    }
}

enum Step {
    Input(Option<Event>),
    Notification(Notification),
}

/// Main application.
pub struct App {
    /// Application state
    state: AppState,
    /// Application configuration
    config: AppConfig,
    /// Agent monitor
    monitor: AgentMonitor,
    /// Notifications produced by the monitor
    notifications: mpsc::Receiver<Notification>,
    /// Current view controller
    ui: Ui,
    /// Should the application exit?
    should_quit: bool,
}

impl App {
    /// Creates a new application instance.
    pub fn new(config: AppConfig, monitor: AgentMonitor, notifications: mpsc::Receiver<Notification>) -> Self {
        Self {
            state: AppState::new(),
            config,
            monitor,
            notifications,
            ui: Ui::new(),
            should_quit: false,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn monitor(&self) -> &AgentMonitor {
        &self.monitor
    }

    /// Runs the application main loop until the user quits, then stops
    /// every poller.
    pub async fn run(&mut self, terminal: &mut Terminal<impl Backend>, events: &mut EventHandler) -> Result<()> {
        self.refresh().await;

        while !self.should_quit {
            terminal.draw(|frame| self.ui.render(frame, &self.state))?;

            let step = tokio::select! {
                event = events.next() => Step::Input(event),
                Some(notification) = self.notifications.recv() => Step::Notification(notification),
            };

            match step {
                Step::Input(Some(event)) => self.handle_event(event).await,
                Step::Input(None) => self.should_quit = true,
                Step::Notification(notification) => {
                    self.state.push_notification(notification);
                    self.drain_notifications();
                }
            }

            self.refresh().await;
        }

        self.shutdown().await;
        Ok(())
    }

    /// Stop the monitor. Pending notifications are dropped.
    pub async fn shutdown(&mut self) {
        self.notifications.close();
        self.monitor.shutdown().await;
        info!("dashboard closed");
    }

    fn drain_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            self.state.push_notification(notification);
        }
    }

    /// Pull the latest monitor state into the dashboard.
    async fn refresh(&mut self) {
        let summaries = self.monitor.summaries().await;
        for summary in &summaries {
            let Some(error) = &summary.last_error else {
                continue;
            };
            let was_failing = self
                .state
                .jobs
                .iter()
                .any(|s| s.job.id == summary.job.id && s.last_error.is_some());
            if !was_failing {
                self.state.push_notification(
                    Notification::warning("Agent unreachable", error.clone()).for_job(&summary.job.id),
                );
            }
        }
        self.state.set_jobs(summaries);
        self.state.temporality = Temporality::from_enabled(self.monitor.is_enabled().await);

        let focused = self
            .ui
            .detail_job_id()
            .map(str::to_string)
            .or_else(|| self.state.selected_job_id.clone());
        match focused {
            Some(job_id) => {
                let logs = self.monitor.logs(&job_id).await.unwrap_or_default();
                let status = self.monitor.status(&job_id).await;
                self.state.set_details(logs, status);
            }
            None => self.state.set_details(Vec::new(), None),
        }

        self.state.expire_toasts(Instant::now());
    }

    /// Handles input and other events.
    async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                let update = self.ui.handle_key_event(key, &mut self.state);
                self.apply(update).await;
            }
            Event::Tick => self.state.animation_frame = self.state.animation_frame.wrapping_add(1),
            Event::Resize(width, height) => debug!(width, height, "terminal resized"),
        }
    }

    async fn apply(&mut self, update: UpdateKind) {
        match update {
            UpdateKind::Quit => self.should_quit = true,
            UpdateKind::ToggleHelp => self.ui.toggle_help(),
            UpdateKind::ToggleMonitoring => {
                let enabled = !self.monitor.is_enabled().await;
                self.monitor.set_enabled(enabled).await;
                let message = if enabled {
                    "Monitoring resumed"
                } else {
                    "Monitoring paused"
                };
                self.state.push_notification(Notification::info("Monitoring", message));
            }
            UpdateKind::SelectJob(job_id) => self.state.selected_job_id = Some(job_id),
            UpdateKind::UnregisterJob(job_id) => {
                self.monitor.unregister(&job_id).await;
                self.state.push_notification(
                    Notification::info("Agent removed", format!("Stopped monitoring {job_id}")).for_job(&job_id),
                );
            }
            UpdateKind::Other => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockAgentBackend;
    use crate::error::BackendError;
    use crate::monitor::{MonitorCallbacks, MonitorConfig};
    use crate::notification::Category;
    use crate::state::{Job, JobStatus};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn paused_app() -> App {
        let config = MonitorConfig {
            enabled: false,
            ..MonitorConfig::default()
        };
        let (monitor, rx) = AgentMonitor::new(Arc::new(MockAgentBackend::new()), config, MonitorCallbacks::default());
        App::new(AppConfig::default(), monitor, rx)
    }

    #[tokio::test]
    async fn refresh_mirrors_the_monitor() {
        let mut app = paused_app();
        app.monitor.register(Job::new("a1", "dentists", JobStatus::Running)).await;
        app.monitor.register(Job::new("a2", "bakers", JobStatus::Running)).await;

        app.refresh().await;

        assert_eq!(app.state.jobs.len(), 2);
        assert_eq!(app.state.selected_job_id.as_deref(), Some("a1"));
        assert_eq!(app.state.temporality, Temporality::Paused);
        assert_eq!(app.state.active_job_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_job_raises_one_warning() {
        let mut backend = MockAgentBackend::new();
        backend.expect_fetch_status().returning(|id| {
            Err(BackendError::Status {
                url: format!("http://backend/status/{id}"),
                status: 503,
            })
        });
        backend.expect_fetch_logs().returning(|_| Ok(Vec::new()));
        let (monitor, rx) = AgentMonitor::new(Arc::new(backend), MonitorConfig::default(), MonitorCallbacks::default());
        let mut app = App::new(AppConfig::default(), monitor, rx);

        app.monitor.register(Job::new("a1", "dentists", JobStatus::Running)).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        app.refresh().await;
        app.refresh().await;

        let warnings: Vec<&Notification> = app
            .state
            .history
            .iter()
            .filter(|n| n.category == Category::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].title, "Agent unreachable");
        assert_eq!(warnings[0].job_id.as_deref(), Some("a1"));

        app.shutdown().await;
    }

    #[tokio::test]
    async fn unregister_removes_the_job_and_reports_it() {
        let mut app = paused_app();
        app.monitor.register(Job::new("a1", "dentists", JobStatus::Running)).await;

        app.apply(UpdateKind::UnregisterJob("a1".into())).await;
        app.refresh().await;

        assert!(app.state.jobs.is_empty());
        assert_eq!(app.state.selected_job_id, None);
        assert_eq!(app.state.history.back().map(|n| n.title.as_str()), Some("Agent removed"));
    }

    #[tokio::test]
    async fn toggling_monitoring_flips_the_switch() {
        let mut app = paused_app();

        app.apply(UpdateKind::ToggleMonitoring).await;
        assert!(app.monitor.is_enabled().await);
        app.apply(UpdateKind::ToggleMonitoring).await;
        assert!(!app.monitor.is_enabled().await);

        app.refresh().await;
        assert_eq!(app.state.temporality, Temporality::Paused);
        assert_eq!(app.state.history.len(), 2);
    }
}
