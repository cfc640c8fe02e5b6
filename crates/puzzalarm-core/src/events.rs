//! Events pushed to external observers.
//!
//! Every state change the manager makes produces an [`Event`]. Observers
//! (UI, watch companion, the CLI) subscribe to an [`EventBus`] and react; the
//! core never waits for acknowledgment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::alarm::{AlarmId, PuzzleType};
use crate::signals::SleepState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    AlarmAdded {
        alarm_id: AlarmId,
        at: DateTime<Utc>,
    },
    AlarmUpdated {
        alarm_id: AlarmId,
        at: DateTime<Utc>,
    },
    AlarmDeleted {
        alarm_id: AlarmId,
        at: DateTime<Utc>,
    },
    AlarmToggled {
        alarm_id: AlarmId,
        is_enabled: bool,
        at: DateTime<Utc>,
    },
    /// The alarm fired. Observers present the puzzle selected by
    /// `puzzle_type`, if any.
    AlarmTriggered {
        alarm_id: AlarmId,
        puzzle_type: Option<PuzzleType>,
        at: DateTime<Utc>,
    },
    AlarmSnoozed {
        alarm_id: AlarmId,
        at: DateTime<Utc>,
    },
    AlarmDismissed {
        alarm_id: AlarmId,
        puzzle_completion_secs: Option<f64>,
        at: DateTime<Utc>,
    },
    SleepStateChanged {
        from: SleepState,
        to: SleepState,
        timestamp: DateTime<Utc>,
    },
    PuzzleCompleted {
        puzzle_type: PuzzleType,
        elapsed_secs: f64,
        at: DateTime<Utc>,
    },
    PuzzleExpired {
        puzzle_type: PuzzleType,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Alarm the event refers to, if any.
    pub fn alarm_id(&self) -> Option<AlarmId> {
        match self {
            Event::AlarmAdded { alarm_id, .. }
            | Event::AlarmUpdated { alarm_id, .. }
            | Event::AlarmDeleted { alarm_id, .. }
            | Event::AlarmToggled { alarm_id, .. }
            | Event::AlarmTriggered { alarm_id, .. }
            | Event::AlarmSnoozed { alarm_id, .. }
            | Event::AlarmDismissed { alarm_id, .. } => Some(*alarm_id),
            _ => None,
        }
    }
}

const DEFAULT_CAPACITY: usize = 64;

/// Broadcast channel for [`Event`]s.
///
/// Cloning the bus shares the same channel. Emitting with no subscribers is
/// fine; the event is dropped. Slow subscribers that fall more than the
/// channel capacity behind see `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: Event) {
        tracing::debug!(?event, "emit");
        // Err only means nobody is listening.
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Drain everything currently queued on `rx` without blocking.
pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => out.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    out
}
