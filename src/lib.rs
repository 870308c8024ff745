//! Agent monitor library
//!
//! Polls remote lead-generation agents, turns new log lines and status
//! transitions into notifications, and renders them in a terminal dashboard.

pub mod api;
pub mod app;
pub mod cli;
pub mod error;
pub mod event;
pub mod monitor;
pub mod notification;
pub mod state;
pub mod ui;
