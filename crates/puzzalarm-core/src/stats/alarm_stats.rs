use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alarm::AlarmId;

/// A biometric observation recorded against an alarm, typically the user
/// drifting back to sleep after dismissing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepDetectionEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub heart_rate: Option<f64>,
    #[serde(default)]
    pub movement: Option<f64>,
    #[serde(default)]
    pub fell_asleep_again: bool,
    #[serde(default)]
    pub time_to_fall_asleep_secs: Option<f64>,
}

impl SleepDetectionEvent {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            heart_rate: None,
            movement: None,
            fell_asleep_again: false,
            time_to_fall_asleep_secs: None,
        }
    }
}

/// Per-alarm usage statistics.
///
/// `average_snooze_count` and `average_puzzle_completion_time` are derived
/// and recomputed after every mutation; both are 0 while their denominator
/// is 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmStatistics {
    pub alarm_id: AlarmId,
    #[serde(default)]
    pub total_triggers: u64,
    #[serde(default)]
    pub total_snoozes: u64,
    #[serde(default)]
    pub average_snooze_count: f64,
    /// Seconds from trigger to puzzle completion, one entry per dismissal.
    #[serde(default)]
    pub puzzle_completion_times: Vec<f64>,
    #[serde(default)]
    pub average_puzzle_completion_time: f64,
    #[serde(default)]
    pub sleep_detection_events: Vec<SleepDetectionEvent>,
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,
}

impl AlarmStatistics {
    pub fn new(alarm_id: AlarmId) -> Self {
        Self {
            alarm_id,
            total_triggers: 0,
            total_snoozes: 0,
            average_snooze_count: 0.0,
            puzzle_completion_times: Vec::new(),
            average_puzzle_completion_time: 0.0,
            sleep_detection_events: Vec::new(),
            last_triggered: None,
        }
    }

    pub fn record_trigger(&mut self, at: DateTime<Utc>) {
        self.total_triggers += 1;
        self.last_triggered = Some(at);
        self.recompute();
    }

    pub fn record_snooze(&mut self) {
        self.total_snoozes += 1;
        self.recompute();
    }

    /// Record a completion time. Non-finite durations are dropped: they
    /// would not survive a JSON round trip.
    pub fn record_puzzle_completion(&mut self, secs: f64) -> bool {
        if !secs.is_finite() {
            return false;
        }
        self.puzzle_completion_times.push(secs.max(0.0));
        self.recompute();
        true
    }

    pub fn record_sleep_detection(&mut self, event: SleepDetectionEvent) {
        self.sleep_detection_events.push(event);
    }

    /// Number of recorded events where the user fell back asleep.
    pub fn fell_asleep_again_count(&self) -> usize {
        self.sleep_detection_events
            .iter()
            .filter(|e| e.fell_asleep_again)
            .count()
    }

    fn recompute(&mut self) {
        self.average_snooze_count = if self.total_triggers == 0 {
            0.0
        } else {
            self.total_snoozes as f64 / self.total_triggers as f64
        };
        self.average_puzzle_completion_time = if self.puzzle_completion_times.is_empty() {
            0.0
        } else {
            self.puzzle_completion_times.iter().sum::<f64>()
                / self.puzzle_completion_times.len() as f64
        };
    }
}
