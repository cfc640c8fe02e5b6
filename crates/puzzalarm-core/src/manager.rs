//! Alarm manager.
//!
//! Owns the alarm list and the statistics aggregate. Every mutation is
//! persisted through the injected [`Store`], mirrored to the
//! [`NotificationScheduler`], and announced on the [`EventBus`].
//!
//! ## Failure semantics
//!
//! - Unknown alarm ids are silent no-ops.
//! - Unreadable persisted state falls back to empty state (logged at `warn`).
//! - Save failures are logged and swallowed.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::alarm::{Alarm, AlarmId};
use crate::events::{Event, EventBus};
use crate::notify::NotificationScheduler;
use crate::puzzle::ActivePuzzle;
use crate::signals::{HeartRateSample, SleepState, SleepStateChange};
use crate::stats::{AlarmStatistics, GlobalStatistics, SleepDetectionEvent};
use crate::storage::{AlarmConfig, Store};

/// Store key holding the JSON alarm list.
pub const ALARMS_KEY: &str = "savedAlarms";
/// Store key holding the JSON statistics aggregate.
pub const STATISTICS_KEY: &str = "globalStatistics";

pub struct AlarmManager {
    alarms: Vec<Alarm>,
    statistics: GlobalStatistics,
    store: Box<dyn Store>,
    scheduler: Box<dyn NotificationScheduler>,
    events: EventBus,
    config: AlarmConfig,
    /// Most recent trigger, for the fall-back-asleep check.
    last_trigger: Option<(AlarmId, DateTime<Utc>)>,
    /// Start of the current asleep streak.
    asleep_since: Option<DateTime<Utc>>,
    /// Latest heart-rate reading, attached to sleep detection records.
    heart_rate: Option<HeartRateSample>,
}

impl AlarmManager {
    /// Build a manager and load any persisted state from `store`.
    pub fn new(store: Box<dyn Store>, scheduler: Box<dyn NotificationScheduler>) -> Self {
        let alarms: Vec<Alarm> = load_or_default(store.as_ref(), ALARMS_KEY);
        let statistics: GlobalStatistics = load_or_default(store.as_ref(), STATISTICS_KEY);
        tracing::debug!(alarms = alarms.len(), "alarm manager loaded");
        Self {
            alarms,
            statistics,
            store,
            scheduler,
            events: EventBus::new(),
            config: AlarmConfig::default(),
            last_trigger: None,
            asleep_since: None,
            heart_rate: None,
        }
    }

    /// Emit on `events` instead of a private bus.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn with_config(mut self, config: AlarmConfig) -> Self {
        self.config = config;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Alarms in insertion order.
    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    pub fn alarm(&self, alarm_id: AlarmId) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.id == alarm_id)
    }

    pub fn enabled_alarms(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.iter().filter(|a| a.is_enabled)
    }

    pub fn statistics(&self) -> &GlobalStatistics {
        &self.statistics
    }

    pub fn alarm_statistics(&self, alarm_id: AlarmId) -> Option<&AlarmStatistics> {
        self.statistics.get(alarm_id)
    }

    pub fn config(&self) -> &AlarmConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Fresh puzzle for the alarm's configured type, or `None` when the alarm
    /// is unknown or has no puzzle.
    pub fn puzzle_for(&self, alarm_id: AlarmId) -> Option<ActivePuzzle> {
        let alarm = self.alarm(alarm_id)?;
        let kind = alarm.puzzle_type?;
        Some(ActivePuzzle::new(kind, &alarm.puzzle_settings))
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn add_alarm(&mut self, alarm: Alarm) {
        tracing::info!(alarm_id = %alarm.id, time = %alarm.time.format("%H:%M"), "alarm added");
        self.statistics.add_alarm(&alarm);
        if alarm.is_enabled || !self.config.gate_schedule_on_enabled {
            self.scheduler.schedule(&alarm);
        }
        let alarm_id = alarm.id;
        self.alarms.push(alarm);
        self.save_alarms();
        self.save_statistics();
        self.events.emit(Event::AlarmAdded {
            alarm_id,
            at: Utc::now(),
        });
    }

    /// Replace the stored alarm with the same id.
    pub fn update_alarm(&mut self, alarm: Alarm) {
        let Some(slot) = self.alarms.iter_mut().find(|a| a.id == alarm.id) else {
            tracing::debug!(alarm_id = %alarm.id, "update of unknown alarm ignored");
            return;
        };
        *slot = alarm;
        let alarm = &*slot;

        self.scheduler.cancel(alarm.id);
        if alarm.is_enabled {
            self.scheduler.schedule(alarm);
        }
        let alarm_id = alarm.id;
        self.save_alarms();
        self.events.emit(Event::AlarmUpdated {
            alarm_id,
            at: Utc::now(),
        });
    }

    pub fn delete_alarm(&mut self, alarm_id: AlarmId) {
        let Some(index) = self.alarms.iter().position(|a| a.id == alarm_id) else {
            return;
        };
        self.alarms.remove(index);
        self.statistics.remove_alarm(alarm_id);
        if matches!(self.last_trigger, Some((id, _)) if id == alarm_id) {
            self.last_trigger = None;
        }
        self.scheduler.cancel(alarm_id);
        self.save_alarms();
        self.save_statistics();
        tracing::info!(alarm_id = %alarm_id, "alarm deleted");
        self.events.emit(Event::AlarmDeleted {
            alarm_id,
            at: Utc::now(),
        });
    }

    pub fn toggle_alarm(&mut self, alarm_id: AlarmId) {
        let Some(alarm) = self.alarms.iter_mut().find(|a| a.id == alarm_id) else {
            return;
        };
        alarm.is_enabled = !alarm.is_enabled;
        let is_enabled = alarm.is_enabled;
        if is_enabled {
            self.scheduler.schedule(alarm);
        } else {
            self.scheduler.cancel(alarm_id);
        }
        self.save_alarms();
        self.events.emit(Event::AlarmToggled {
            alarm_id,
            is_enabled,
            at: Utc::now(),
        });
    }

    /// Record that the alarm fired. The host presents the puzzle, see
    /// [`AlarmManager::puzzle_for`].
    pub fn trigger_alarm(&mut self, alarm_id: AlarmId) {
        self.trigger_alarm_at(alarm_id, Utc::now());
    }

    pub fn trigger_alarm_at(&mut self, alarm_id: AlarmId, at: DateTime<Utc>) {
        let Some(puzzle_type) = self.alarm(alarm_id).map(|a| a.puzzle_type) else {
            return;
        };
        self.statistics
            .record_alarm_trigger(alarm_id, puzzle_type, at);
        self.last_trigger = Some((alarm_id, at));
        self.save_statistics();
        tracing::info!(alarm_id = %alarm_id, ?puzzle_type, "alarm triggered");
        self.events.emit(Event::AlarmTriggered {
            alarm_id,
            puzzle_type,
            at,
        });
    }

    /// Record a snooze. Re-arming for later is the scheduler's business.
    pub fn snooze_alarm(&mut self, alarm_id: AlarmId) {
        if self.alarm(alarm_id).is_none() {
            return;
        }
        self.statistics.record_snooze(alarm_id);
        self.save_statistics();
        self.events.emit(Event::AlarmSnoozed {
            alarm_id,
            at: Utc::now(),
        });
    }

    /// Record a dismissal. A non-finite completion time is treated as absent.
    pub fn dismiss_alarm(&mut self, alarm_id: AlarmId, puzzle_completion_secs: Option<f64>) {
        if self.alarm(alarm_id).is_none() {
            return;
        }
        let puzzle_completion_secs = puzzle_completion_secs.filter(|secs| secs.is_finite());
        if let Some(secs) = puzzle_completion_secs {
            self.statistics.record_puzzle_completion(alarm_id, secs);
        }
        self.save_statistics();
        tracing::info!(alarm_id = %alarm_id, ?puzzle_completion_secs, "alarm dismissed");
        self.events.emit(Event::AlarmDismissed {
            alarm_id,
            puzzle_completion_secs,
            at: Utc::now(),
        });
    }

    /// Feed a heart-rate reading. Only the latest one is kept; readings that
    /// are not a positive finite bpm are ignored.
    pub fn record_heart_rate(&mut self, sample: HeartRateSample) {
        if !sample.bpm.is_finite() || sample.bpm <= 0.0 {
            tracing::debug!(bpm = sample.bpm, "heart rate sample ignored");
            return;
        }
        self.heart_rate = Some(sample);
    }

    pub fn latest_heart_rate(&self) -> Option<HeartRateSample> {
        self.heart_rate
    }

    /// Feed a sleep-state transition from a biometric source.
    ///
    /// Tracks asleep streaks into [`GlobalStatistics::longest_sleep_streak_mins`].
    /// Falling asleep within `fall_asleep_window_mins` of a trigger records a
    /// [`SleepDetectionEvent`] on that alarm and fires it again.
    pub fn handle_sleep_change(&mut self, change: SleepStateChange) {
        let SleepStateChange {
            from,
            to,
            timestamp,
        } = change;
        tracing::debug!(?from, ?to, "sleep state changed");
        self.events.emit(Event::SleepStateChanged {
            from,
            to,
            timestamp,
        });

        if to != SleepState::Asleep {
            if let Some(since) = self.asleep_since.take() {
                let minutes = (timestamp - since).num_minutes().max(0) as u64;
                if minutes > self.statistics.longest_sleep_streak_mins {
                    self.statistics.record_sleep_streak(minutes);
                    self.save_statistics();
                }
            }
            return;
        }
        if self.asleep_since.is_some() {
            return;
        }
        self.asleep_since = Some(timestamp);

        let Some((alarm_id, triggered_at)) = self.last_trigger else {
            return;
        };
        let since_trigger = timestamp - triggered_at;
        let window = ChronoDuration::minutes(i64::from(self.config.fall_asleep_window_mins));
        if since_trigger < ChronoDuration::zero() || since_trigger > window {
            return;
        }

        tracing::info!(alarm_id = %alarm_id, "fell back asleep after alarm");
        let mut event = SleepDetectionEvent::new(timestamp);
        event.fell_asleep_again = true;
        event.time_to_fall_asleep_secs = Some(since_trigger.num_milliseconds() as f64 / 1000.0);
        event.heart_rate = self.heart_rate.map(|sample| sample.bpm);
        self.statistics.record_sleep_detection(alarm_id, event);
        self.trigger_alarm_at(alarm_id, timestamp);
    }

    // ── Persistence ──────────────────────────────────────────────────

    fn save_alarms(&self) {
        save_json(self.store.as_ref(), ALARMS_KEY, &self.alarms);
    }

    fn save_statistics(&self) {
        save_json(self.store.as_ref(), STATISTICS_KEY, &self.statistics);
    }
}

fn load_or_default<T: DeserializeOwned + Default>(store: &dyn Store, key: &str) -> T {
    match store.load(key) {
        Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "stored data unreadable, starting empty");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to load, starting empty");
            T::default()
        }
    }
}

fn save_json<T: Serialize + ?Sized>(store: &dyn Store, key: &str, value: &T) {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to encode");
            return;
        }
    };
    if let Err(e) = store.save(key, &bytes) {
        tracing::warn!(key, error = %e, "failed to save");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::{PuzzleSettings, PuzzleType, Weekday};
    use crate::error::{Result, StorageError};
    use crate::events::drain;
    use crate::notify::{NullScheduler, RecordingScheduler, SchedulerCall};
    use crate::puzzle::Puzzle;
    use crate::storage::MemoryStore;
    use chrono::{NaiveTime, TimeZone};

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn ts(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    fn manager_with(store: MemoryStore, scheduler: RecordingScheduler) -> AlarmManager {
        AlarmManager::new(Box::new(store), Box::new(scheduler))
    }

    fn manager() -> AlarmManager {
        AlarmManager::new(Box::new(MemoryStore::new()), Box::new(NullScheduler))
    }

    struct FailingStore;

    impl Store for FailingStore {
        fn save(&self, _key: &str, _bytes: &[u8]) -> Result<()> {
            Err(StorageError::Locked.into())
        }

        fn load(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(StorageError::QueryFailed("boom".into()).into())
        }
    }

    #[test]
    fn add_then_delete_leaves_no_trace() {
        let mut mgr = manager();
        let alarm = Alarm::new(at(7, 0));
        let id = alarm.id;
        mgr.add_alarm(alarm);
        assert!(mgr.alarm(id).is_some());
        assert!(mgr.alarm_statistics(id).is_some());

        mgr.delete_alarm(id);
        assert!(mgr.alarm(id).is_none());
        assert!(mgr.alarm_statistics(id).is_none());
        assert_eq!(mgr.statistics().total_alarms_created, 1);
    }

    #[test]
    fn alarms_keep_insertion_order() {
        let mut mgr = manager();
        let late = Alarm::new(at(9, 0));
        let early = Alarm::new(at(6, 0));
        let ids = [late.id, early.id];
        mgr.add_alarm(late);
        mgr.add_alarm(early);
        let got: Vec<AlarmId> = mgr.alarms().iter().map(|a| a.id).collect();
        assert_eq!(got, ids);
    }

    #[test]
    fn toggle_twice_is_identity() {
        let recorder = RecordingScheduler::new();
        let mut mgr = manager_with(MemoryStore::new(), recorder.clone());
        let alarm = Alarm::new(at(7, 0));
        let id = alarm.id;
        mgr.add_alarm(alarm);
        recorder.clear();

        mgr.toggle_alarm(id);
        assert!(!mgr.alarm(id).unwrap().is_enabled);
        mgr.toggle_alarm(id);
        assert!(mgr.alarm(id).unwrap().is_enabled);
        assert_eq!(
            recorder.calls(),
            vec![SchedulerCall::Cancel(id), SchedulerCall::Schedule(id)]
        );
    }

    #[test]
    fn disabled_alarm_is_not_scheduled_on_add() {
        let recorder = RecordingScheduler::new();
        let mut mgr = manager_with(MemoryStore::new(), recorder.clone());
        mgr.add_alarm(Alarm::new(at(7, 0)).with_enabled(false));
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn ungated_config_schedules_disabled_alarm() {
        let recorder = RecordingScheduler::new();
        let mut mgr = manager_with(MemoryStore::new(), recorder.clone()).with_config(AlarmConfig {
            gate_schedule_on_enabled: false,
            ..AlarmConfig::default()
        });
        let alarm = Alarm::new(at(7, 0)).with_enabled(false);
        let id = alarm.id;
        mgr.add_alarm(alarm);
        assert_eq!(recorder.calls(), vec![SchedulerCall::Schedule(id)]);
    }

    #[test]
    fn update_reschedules_only_when_enabled() {
        let recorder = RecordingScheduler::new();
        let mut mgr = manager_with(MemoryStore::new(), recorder.clone());
        let alarm = Alarm::new(at(7, 0));
        let id = alarm.id;
        mgr.add_alarm(alarm.clone());
        recorder.clear();

        mgr.update_alarm(alarm.clone().with_label("Gym"));
        assert_eq!(mgr.alarm(id).unwrap().label, "Gym");
        assert_eq!(
            recorder.calls(),
            vec![SchedulerCall::Cancel(id), SchedulerCall::Schedule(id)]
        );

        recorder.clear();
        mgr.update_alarm(alarm.with_enabled(false));
        assert_eq!(recorder.calls(), vec![SchedulerCall::Cancel(id)]);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let recorder = RecordingScheduler::new();
        let store = MemoryStore::new();
        let mut mgr = manager_with(store.clone(), recorder.clone());
        let mut rx = mgr.subscribe();
        let ghost = AlarmId::new();

        mgr.update_alarm(Alarm::new(at(7, 0)));
        mgr.delete_alarm(ghost);
        mgr.toggle_alarm(ghost);
        mgr.trigger_alarm(ghost);
        mgr.snooze_alarm(ghost);
        mgr.dismiss_alarm(ghost, Some(10.0));

        assert!(mgr.alarms().is_empty());
        assert_eq!(mgr.statistics(), &GlobalStatistics::default());
        assert!(recorder.calls().is_empty());
        assert!(store.keys().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn trigger_snooze_dismiss_update_statistics() {
        let mut mgr = manager();
        let alarm = Alarm::new(at(7, 0)).with_puzzle(PuzzleType::Water, PuzzleSettings::default());
        let id = alarm.id;
        mgr.add_alarm(alarm);

        mgr.trigger_alarm(id);
        mgr.snooze_alarm(id);
        mgr.snooze_alarm(id);
        mgr.trigger_alarm(id);
        mgr.dismiss_alarm(id, Some(30.0));
        mgr.dismiss_alarm(id, None);

        let stats = mgr.alarm_statistics(id).unwrap();
        assert_eq!(stats.total_triggers, 2);
        assert_eq!(stats.total_snoozes, 2);
        assert_eq!(stats.average_snooze_count, 1.0);
        assert_eq!(stats.puzzle_completion_times, vec![30.0]);
        assert!(stats.last_triggered.is_some());

        let global = mgr.statistics();
        assert_eq!(global.total_alarms_triggered, 2);
        assert_eq!(global.total_snoozes, 2);
        assert_eq!(global.most_used_puzzle_type, Some(PuzzleType::Water));
    }

    #[test]
    fn events_follow_operations() {
        let mut mgr = manager();
        let mut rx = mgr.subscribe();
        let alarm = Alarm::new(at(7, 0)).with_puzzle(PuzzleType::Math, PuzzleSettings::default());
        let id = alarm.id;

        mgr.add_alarm(alarm);
        mgr.trigger_alarm(id);
        mgr.snooze_alarm(id);
        mgr.dismiss_alarm(id, Some(12.5));
        mgr.toggle_alarm(id);
        mgr.delete_alarm(id);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 6);
        assert!(matches!(events[0], Event::AlarmAdded { .. }));
        assert!(matches!(
            events[1],
            Event::AlarmTriggered { puzzle_type: Some(PuzzleType::Math), .. }
        ));
        assert!(matches!(events[2], Event::AlarmSnoozed { .. }));
        assert!(matches!(
            events[3],
            Event::AlarmDismissed { puzzle_completion_secs: Some(s), .. } if s == 12.5
        ));
        assert!(matches!(events[4], Event::AlarmToggled { is_enabled: false, .. }));
        assert!(matches!(events[5], Event::AlarmDeleted { .. }));
        assert!(events.iter().all(|e| e.alarm_id() == Some(id)));
    }

    #[test]
    fn state_survives_reload() {
        let store = MemoryStore::new();
        let alarm = Alarm::new(at(6, 30))
            .with_label("Run")
            .with_repeat_days([Weekday::Monday, Weekday::Thursday]);
        let id = alarm.id;
        {
            let mut mgr = manager_with(store.clone(), RecordingScheduler::new());
            mgr.add_alarm(alarm.clone());
            mgr.trigger_alarm(id);
        }
        assert_eq!(store.keys(), vec![STATISTICS_KEY.to_string(), ALARMS_KEY.to_string()]);

        let mgr = manager_with(store, RecordingScheduler::new());
        assert_eq!(mgr.alarms(), &[alarm]);
        assert_eq!(mgr.alarm_statistics(id).unwrap().total_triggers, 1);
    }

    #[test]
    fn non_finite_completion_time_does_not_poison_reload() {
        let store = MemoryStore::new();
        let alarm = Alarm::new(at(7, 0));
        let id = alarm.id;
        {
            let mut mgr = manager_with(store.clone(), RecordingScheduler::new());
            let mut rx = mgr.subscribe();
            mgr.add_alarm(alarm);
            mgr.trigger_alarm(id);
            mgr.trigger_alarm(id);
            mgr.dismiss_alarm(id, Some(f64::INFINITY));
            mgr.dismiss_alarm(id, Some(f64::NAN));
            let dismissals: Vec<_> = drain(&mut rx)
                .into_iter()
                .filter(|e| matches!(e, Event::AlarmDismissed { .. }))
                .collect();
            assert_eq!(dismissals.len(), 2);
            assert!(dismissals.iter().all(|e| matches!(
                e,
                Event::AlarmDismissed { puzzle_completion_secs: None, .. }
            )));
        }

        let mgr = manager_with(store, RecordingScheduler::new());
        let stats = mgr.alarm_statistics(id).unwrap();
        assert_eq!(stats.total_triggers, 2);
        assert!(stats.puzzle_completion_times.is_empty());
        assert_eq!(stats.average_puzzle_completion_time, 0.0);
        assert_eq!(mgr.statistics().total_alarms_triggered, 2);
    }

    #[test]
    fn corrupt_store_falls_back_to_empty() {
        let store = MemoryStore::new();
        store.save(ALARMS_KEY, b"not json").unwrap();
        store.save(STATISTICS_KEY, b"{\"total_snoozes\": \"many\"}").unwrap();
        let mgr = manager_with(store, RecordingScheduler::new());
        assert!(mgr.alarms().is_empty());
        assert_eq!(mgr.statistics(), &GlobalStatistics::default());
    }

    #[test]
    fn failing_store_is_tolerated() {
        let mut mgr = AlarmManager::new(Box::new(FailingStore), Box::new(NullScheduler));
        let alarm = Alarm::new(at(7, 0));
        let id = alarm.id;
        mgr.add_alarm(alarm);
        mgr.trigger_alarm(id);
        assert_eq!(mgr.alarm_statistics(id).unwrap().total_triggers, 1);
    }

    #[test]
    fn puzzle_for_builds_configured_variant() {
        let mut mgr = manager();
        let settings = PuzzleSettings {
            math_problem_count: 2,
            ..PuzzleSettings::default()
        };
        let with_puzzle = Alarm::new(at(7, 0)).with_puzzle(PuzzleType::Math, settings);
        let plain = Alarm::new(at(8, 0));
        let (puzzle_id, plain_id) = (with_puzzle.id, plain.id);
        mgr.add_alarm(with_puzzle);
        mgr.add_alarm(plain);

        let mut puzzle = mgr.puzzle_for(puzzle_id).unwrap();
        assert_eq!(puzzle.kind(), PuzzleType::Math);
        assert_eq!(puzzle.as_math_mut().unwrap().correct_answers(), 0);
        assert!(mgr.puzzle_for(plain_id).is_none());
        assert!(mgr.puzzle_for(AlarmId::new()).is_none());
    }

    #[test]
    fn falling_asleep_after_trigger_retriggers() {
        let mut mgr = manager();
        let alarm = Alarm::new(at(7, 0));
        let id = alarm.id;
        mgr.add_alarm(alarm);
        mgr.trigger_alarm_at(id, ts(7, 0));
        let mut rx = mgr.subscribe();

        mgr.handle_sleep_change(SleepStateChange::new(
            SleepState::Awake,
            SleepState::Asleep,
            ts(7, 10),
        ));

        let stats = mgr.alarm_statistics(id).unwrap();
        assert_eq!(stats.total_triggers, 2);
        assert_eq!(stats.fell_asleep_again_count(), 1);
        assert_eq!(
            stats.sleep_detection_events[0].time_to_fall_asleep_secs,
            Some(600.0)
        );
        let events = drain(&mut rx);
        assert!(matches!(events[0], Event::SleepStateChanged { .. }));
        assert!(matches!(events[1], Event::AlarmTriggered { .. }));
    }

    #[test]
    fn sleep_detection_carries_latest_heart_rate() {
        let mut mgr = manager();
        let alarm = Alarm::new(at(7, 0));
        let id = alarm.id;
        mgr.add_alarm(alarm);
        mgr.trigger_alarm_at(id, ts(7, 0));

        mgr.record_heart_rate(HeartRateSample { bpm: 64.0, at: ts(7, 2) });
        mgr.record_heart_rate(HeartRateSample { bpm: 58.0, at: ts(7, 4) });
        mgr.record_heart_rate(HeartRateSample { bpm: f64::NAN, at: ts(7, 5) });
        mgr.record_heart_rate(HeartRateSample { bpm: 0.0, at: ts(7, 5) });
        assert_eq!(mgr.latest_heart_rate().map(|s| s.bpm), Some(58.0));

        mgr.handle_sleep_change(SleepStateChange::new(
            SleepState::Drowsy,
            SleepState::Asleep,
            ts(7, 6),
        ));

        let stats = mgr.alarm_statistics(id).unwrap();
        assert_eq!(stats.sleep_detection_events[0].heart_rate, Some(58.0));
    }

    #[test]
    fn sleep_detection_without_heart_rate_leaves_it_empty() {
        let mut mgr = manager();
        let alarm = Alarm::new(at(7, 0));
        let id = alarm.id;
        mgr.add_alarm(alarm);
        mgr.trigger_alarm_at(id, ts(7, 0));
        mgr.handle_sleep_change(SleepStateChange::new(
            SleepState::Awake,
            SleepState::Asleep,
            ts(7, 3),
        ));
        assert_eq!(mgr.alarm_statistics(id).unwrap().sleep_detection_events[0].heart_rate, None);
    }

    #[test]
    fn falling_asleep_outside_window_is_ignored() {
        let mut mgr = manager();
        let alarm = Alarm::new(at(7, 0));
        let id = alarm.id;
        mgr.add_alarm(alarm);
        mgr.trigger_alarm_at(id, ts(7, 0));

        mgr.handle_sleep_change(SleepStateChange::new(
            SleepState::Drowsy,
            SleepState::Asleep,
            ts(7, 45),
        ));

        let stats = mgr.alarm_statistics(id).unwrap();
        assert_eq!(stats.total_triggers, 1);
        assert!(stats.sleep_detection_events.is_empty());
    }

    #[test]
    fn longest_sleep_streak_tracks_maximum() {
        let mut mgr = manager();
        let asleep = |from, h, m| SleepStateChange::new(from, SleepState::Asleep, ts(h, m));
        let awake = |h, m| SleepStateChange::new(SleepState::Asleep, SleepState::Awake, ts(h, m));

        mgr.handle_sleep_change(asleep(SleepState::Awake, 1, 0));
        mgr.handle_sleep_change(awake(3, 30));
        assert_eq!(mgr.statistics().longest_sleep_streak_mins, 150);

        mgr.handle_sleep_change(asleep(SleepState::Drowsy, 4, 0));
        // Repeated asleep readings do not restart the streak.
        mgr.handle_sleep_change(asleep(SleepState::Asleep, 4, 30));
        mgr.handle_sleep_change(awake(5, 0));
        assert_eq!(mgr.statistics().longest_sleep_streak_mins, 150);
    }
}
