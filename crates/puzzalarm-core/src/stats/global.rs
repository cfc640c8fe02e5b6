use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alarm_stats::{AlarmStatistics, SleepDetectionEvent};
use crate::alarm::{Alarm, AlarmId, PuzzleType};

/// Aggregate statistics across every alarm on this installation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalStatistics {
    #[serde(default)]
    pub total_alarms_created: u64,
    #[serde(default)]
    pub total_alarms_triggered: u64,
    #[serde(default)]
    pub total_snoozes: u64,
    #[serde(default)]
    pub most_used_puzzle_type: Option<PuzzleType>,
    /// Longest uninterrupted asleep period observed, in minutes.
    #[serde(default)]
    pub longest_sleep_streak_mins: u64,
    /// Triggers per puzzle type; `most_used_puzzle_type` is derived from it.
    #[serde(default)]
    pub puzzle_type_usage: BTreeMap<PuzzleType, u64>,
    #[serde(default)]
    pub alarm_statistics: HashMap<AlarmId, AlarmStatistics>,
}

impl GlobalStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_alarm(&mut self, alarm: &Alarm) {
        self.total_alarms_created += 1;
        self.alarm_statistics
            .insert(alarm.id, AlarmStatistics::new(alarm.id));
    }

    pub fn remove_alarm(&mut self, alarm_id: AlarmId) -> Option<AlarmStatistics> {
        self.alarm_statistics.remove(&alarm_id)
    }

    pub fn get(&self, alarm_id: AlarmId) -> Option<&AlarmStatistics> {
        self.alarm_statistics.get(&alarm_id)
    }

    pub fn record_alarm_trigger(
        &mut self,
        alarm_id: AlarmId,
        puzzle_type: Option<PuzzleType>,
        at: DateTime<Utc>,
    ) {
        self.total_alarms_triggered += 1;
        if let Some(kind) = puzzle_type {
            *self.puzzle_type_usage.entry(kind).or_insert(0) += 1;
            self.most_used_puzzle_type = self.compute_most_used();
        }
        self.alarm_statistics
            .entry(alarm_id)
            .or_insert_with(|| AlarmStatistics::new(alarm_id))
            .record_trigger(at);
    }

    pub fn record_snooze(&mut self, alarm_id: AlarmId) {
        self.total_snoozes += 1;
        if let Some(stats) = self.alarm_statistics.get_mut(&alarm_id) {
            stats.record_snooze();
        }
    }

    pub fn record_puzzle_completion(&mut self, alarm_id: AlarmId, secs: f64) {
        if let Some(stats) = self.alarm_statistics.get_mut(&alarm_id) {
            stats.record_puzzle_completion(secs);
        }
    }

    pub fn record_sleep_detection(&mut self, alarm_id: AlarmId, event: SleepDetectionEvent) {
        if let Some(stats) = self.alarm_statistics.get_mut(&alarm_id) {
            stats.record_sleep_detection(event);
        }
    }

    pub fn record_sleep_streak(&mut self, minutes: u64) {
        self.longest_sleep_streak_mins = self.longest_sleep_streak_mins.max(minutes);
    }

    /// Ties go to the type declared first in [`PuzzleType::ALL`].
    fn compute_most_used(&self) -> Option<PuzzleType> {
        let mut best: Option<(PuzzleType, u64)> = None;
        for kind in PuzzleType::ALL {
            let count = self.puzzle_type_usage.get(&kind).copied().unwrap_or(0);
            if count == 0 {
                continue;
            }
            match best {
                Some((_, top)) if top >= count => {}
                _ => best = Some((kind, count)),
            }
        }
        best.map(|(kind, _)| kind)
    }
}
