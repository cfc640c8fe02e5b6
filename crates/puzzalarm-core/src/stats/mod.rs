//! Usage statistics.
//!
//! One [`AlarmStatistics`] per alarm, aggregated under a single
//! [`GlobalStatistics`] that the manager persists as a whole.

mod alarm_stats;
mod global;

pub use alarm_stats::{AlarmStatistics, SleepDetectionEvent};
pub use global::GlobalStatistics;
