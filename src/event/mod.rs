//! Event handling for the agent dashboard.
//!
//! Terminal input and a steady UI tick are merged into one stream of
//! [`Event`]s by the [`EventHandler`].

pub mod handler;

pub use handler::EventHandler;

use std::time::Duration;

use crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind};

/// Default UI tick interval.
pub const DEFAULT_TICK_RATE: Duration = Duration::from_millis(250);

/// Application events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Keyboard input event
    Key(KeyEvent),
    /// Terminal resize event
    Resize(u16, u16),
    /// Regular tick event for refreshes and animations
    Tick,
}

impl Event {
    /// Map a terminal event, dropping the ones the dashboard ignores.
    pub fn from_terminal(event: CrosstermEvent) -> Option<Self> {
        match event {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Event::Key(key)),
            CrosstermEvent::Resize(width, height) => Some(Event::Resize(width, height)),
            _ => None,
        }
    }
}
