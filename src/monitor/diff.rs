//! Change detection between a stored registry row and a fresh poll.

use crate::state::{JobStatus, LogEntry, MonitorEntry, StatusSnapshot};

/// A fact derived from one tick. Never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// Entries strictly newer than anything previously seen, in arrival order.
    LogsAppended { entries: Vec<LogEntry> },
    StatusChanged { old: JobStatus, new: StatusSnapshot },
}

/// Compare a fresh poll with the stored row.
///
/// Logs come before the status change they lead up to. The first poll of a
/// job only seeds the stored snapshot and never yields a status change. A log
/// sequence shorter than the stored one yields nothing.
pub fn diff(old: &MonitorEntry, status: &StatusSnapshot, logs: &[LogEntry]) -> Vec<MonitorEvent> {
    let mut events = Vec::with_capacity(2);

    let seen = old.last_log_count();
    if logs.len() > seen {
        events.push(MonitorEvent::LogsAppended {
            entries: logs[seen..].to_vec(),
        });
    }

    if let Some(previous) = &old.last_status {
        if previous.status != status.status {
            events.push(MonitorEvent::StatusChanged {
                old: previous.status,
                new: status.clone(),
            });
        }
    }

    events
}
