//! The audit log queue (SPEC_FULL.md supplemental item 2). Every state
//! transition enqueues a line; a background task in `tourney_server`
//! flushes the queue to the Notifier's audit channel every
//! `log_batch_minutes`, grounded on
//! `original_source/database.py`'s `db_queue_log`/`db_flush_logs` and on
//! squire_core's `main.rs` `tokio::spawn` + `interval` background-task
//! pattern for the driver (which lives in `tourney_server`, not here).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::identifiers::EventId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLine {
    pub event_id: EventId,
    pub at: DateTime<Utc>,
    pub message: String,
}

/// An in-process queue of not-yet-flushed audit lines. `Store`
/// implementations are free to back this with a persistent table instead;
/// this in-memory version is what the in-process reference `Store` in
/// `tourney_server` uses.
#[derive(Default)]
pub struct AuditQueue {
    lines: Mutex<Vec<AuditLine>>,
}

impl AuditQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, line: AuditLine) {
        self.lines.lock().unwrap().push(line);
    }

    /// Drains every queued line. Called by the flush driver on its
    /// `log_batch_minutes` tick.
    pub fn drain(&self) -> Vec<AuditLine> {
        std::mem::take(&mut *self.lines.lock().unwrap())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_the_queue() {
        let q = AuditQueue::new();
        q.enqueue(AuditLine {
            event_id: EventId::new_random(),
            at: DateTime::from_timestamp(0, 0).unwrap(),
            message: "line one".into(),
        });
        assert_eq!(q.drain().len(), 1);
        assert_eq!(q.drain().len(), 0);
    }
}
