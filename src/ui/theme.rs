//! UI theme definition.

use ratatui::style::{Color, Modifier, Style};

use crate::notification::Category;
use crate::state::{JobStatus, LogLevel};

/// Theme for the application UI.
#[derive(Debug, Clone)]
pub struct Theme {
    // Basic styles
    pub normal_text: Style,
    pub selected_style: Style,
    pub block_style: Style,
    pub header_style: Style,
    pub label_style: Style,
    pub value_style: Style,

    // Status styles
    pub error_style: Style,
    pub help_style: Style,
    pub status_live: Style,
    pub status_paused: Style,

    // Key styles
    pub key_style: Style,

    // Job status styles
    pub running_style: Style,
    pub processing_style: Style,
    pub paused_style: Style,
    pub completed_style: Style,
    pub failed_style: Style,

    // Log level and notification styles
    pub info_style: Style,
    pub success_style: Style,
    pub warning_style: Style,
}

impl Theme {
    pub fn job_status(&self, status: JobStatus) -> Style {
        match status {
            JobStatus::Running => self.running_style,
            JobStatus::Processing => self.processing_style,
            JobStatus::Paused => self.paused_style,
            JobStatus::Completed => self.completed_style,
            JobStatus::Failed => self.failed_style,
        }
    }

    pub fn log_level(&self, level: LogLevel) -> Style {
        match level {
            LogLevel::Info => self.info_style,
            LogLevel::Success => self.success_style,
            LogLevel::Warning => self.warning_style,
            LogLevel::Error => self.error_style,
        }
    }

    pub fn category(&self, category: Category) -> Style {
        match category {
            Category::Info => self.info_style,
            Category::Success => self.success_style,
            Category::Warning => self.warning_style,
            Category::Error => self.error_style,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            // Basic styles
            normal_text: Style::default().fg(Color::White),
            selected_style: Style::default().fg(Color::Black).bg(Color::White),
            block_style: Style::default(),
            header_style: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            label_style: Style::default().fg(Color::Gray),
            value_style: Style::default().fg(Color::White),

            // Status styles
            error_style: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            help_style: Style::default().fg(Color::Gray),
            status_live: Style::default().fg(Color::Green),
            status_paused: Style::default().fg(Color::Yellow),

            // Key styles
            key_style: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),

            // Job status styles
            running_style: Style::default().fg(Color::Yellow),
            processing_style: Style::default().fg(Color::Cyan),
            paused_style: Style::default().fg(Color::Gray),
            completed_style: Style::default().fg(Color::Green),
            failed_style: Style::default().fg(Color::Red),

            info_style: Style::default().fg(Color::Blue),
            success_style: Style::default().fg(Color::Green),
            warning_style: Style::default().fg(Color::Yellow),
        }
    }
}
