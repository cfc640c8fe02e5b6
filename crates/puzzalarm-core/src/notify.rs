//! Hooks into the platform's alarm delivery.
//!
//! The manager tells a [`NotificationScheduler`] when an alarm should be
//! (re)armed or withdrawn. Computing the actual fire times and repeating per
//! weekday is the scheduler's job.

use std::sync::{Arc, Mutex};

use crate::alarm::{Alarm, AlarmId};

/// Something that can arm and disarm platform notifications for alarms.
pub trait NotificationScheduler: Send + Sync {
    /// Arm notifications for `alarm`, replacing any earlier ones.
    fn schedule(&self, alarm: &Alarm);

    /// Withdraw every pending notification for `alarm_id`.
    fn cancel(&self, alarm_id: AlarmId);
}

impl<S: NotificationScheduler + ?Sized> NotificationScheduler for Box<S> {
    fn schedule(&self, alarm: &Alarm) {
        (**self).schedule(alarm)
    }

    fn cancel(&self, alarm_id: AlarmId) {
        (**self).cancel(alarm_id)
    }
}

/// Discards every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullScheduler;

impl NotificationScheduler for NullScheduler {
    fn schedule(&self, _alarm: &Alarm) {}

    fn cancel(&self, _alarm_id: AlarmId) {}
}

/// Writes requests to the `tracing` log. Used by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogScheduler;

impl NotificationScheduler for LogScheduler {
    fn schedule(&self, alarm: &Alarm) {
        for request in request_ids(alarm) {
            tracing::info!(
                request = %request,
                time = %alarm.time.format("%H:%M"),
                label = %alarm.label,
                "schedule notification"
            );
        }
    }

    fn cancel(&self, alarm_id: AlarmId) {
        tracing::info!(alarm_id = %alarm_id, "cancel notifications");
    }
}

/// Notification request identifiers for an alarm: one per repeat day
/// (`{id}-{Mon}`), or the bare id for a one-time alarm.
pub fn request_ids(alarm: &Alarm) -> Vec<String> {
    if alarm.is_one_time() {
        return vec![alarm.id.to_string()];
    }
    alarm
        .sorted_repeat_days()
        .into_iter()
        .map(|day| format!("{}-{}", alarm.id, day.abbreviation()))
        .collect()
}

/// A request seen by [`RecordingScheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCall {
    Schedule(AlarmId),
    Cancel(AlarmId),
}

/// Remembers every call in order. Clones share the same log, so a test can
/// keep one handle and give the other to the manager.
#[derive(Debug, Clone, Default)]
pub struct RecordingScheduler {
    calls: Arc<Mutex<Vec<SchedulerCall>>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SchedulerCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn push(&self, call: SchedulerCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl NotificationScheduler for RecordingScheduler {
    fn schedule(&self, alarm: &Alarm) {
        self.push(SchedulerCall::Schedule(alarm.id));
    }

    fn cancel(&self, alarm_id: AlarmId) {
        self.push(SchedulerCall::Cancel(alarm_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alarm::Weekday;
    use chrono::NaiveTime;

    fn seven_am() -> NaiveTime {
        NaiveTime::from_hms_opt(7, 0, 0).unwrap()
    }

    #[test]
    fn request_ids_per_weekday() {
        let alarm = Alarm::new(seven_am()).with_repeat_days([Weekday::Friday, Weekday::Monday]);
        let ids = request_ids(&alarm);
        assert_eq!(
            ids,
            vec![format!("{}-Mon", alarm.id), format!("{}-Fri", alarm.id)]
        );
    }

    #[test]
    fn request_id_for_one_time_alarm() {
        let alarm = Alarm::new(seven_am());
        assert_eq!(request_ids(&alarm), vec![alarm.id.to_string()]);
    }

    #[test]
    fn recording_scheduler_shares_log_across_clones() {
        let recorder = RecordingScheduler::new();
        let boxed: Box<dyn NotificationScheduler> = Box::new(recorder.clone());
        let alarm = Alarm::new(seven_am());

        boxed.schedule(&alarm);
        boxed.cancel(alarm.id);

        assert_eq!(
            recorder.calls(),
            vec![SchedulerCall::Schedule(alarm.id), SchedulerCall::Cancel(alarm.id)]
        );
        recorder.clear();
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn null_and_log_schedulers_accept_anything() {
        let alarm = Alarm::new(seven_am()).with_repeat_days(Weekday::ALL);
        NullScheduler.schedule(&alarm);
        NullScheduler.cancel(alarm.id);
        LogScheduler.schedule(&alarm);
        LogScheduler.cancel(alarm.id);
    }
}
