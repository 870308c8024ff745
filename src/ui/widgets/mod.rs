//! Custom widgets for the agent dashboard.

pub mod progress;

pub use progress::ProgressBar;
