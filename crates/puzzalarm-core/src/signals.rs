//! Value types produced by external sensor sources.
//!
//! The core never polls a sensor. Hosts feed these values in: tilt vectors go
//! to the motion puzzles, sleep transitions go to
//! [`AlarmManager::handle_sleep_change`](crate::manager::AlarmManager::handle_sleep_change)
//! and heart-rate readings to
//! [`AlarmManager::record_heart_rate`](crate::manager::AlarmManager::record_heart_rate).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sleep state reported by a biometric signal source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepState {
    #[default]
    Awake,
    Drowsy,
    Asleep,
}

impl SleepState {
    pub fn display_name(self) -> &'static str {
        match self {
            SleepState::Awake => "Awake",
            SleepState::Drowsy => "Drowsy",
            SleepState::Asleep => "Asleep",
        }
    }
}

/// A transition between two sleep states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SleepStateChange {
    pub from: SleepState,
    pub to: SleepState,
    pub timestamp: DateTime<Utc>,
}

impl SleepStateChange {
    pub fn new(from: SleepState, to: SleepState, timestamp: DateTime<Utc>) -> Self {
        Self { from, to, timestamp }
    }
}

/// Heart-rate sample in beats per minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub bpm: f64,
    pub at: DateTime<Utc>,
}

/// Device tilt, each axis normalized to [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TiltVector {
    pub x: f64,
    pub y: f64,
}

impl TiltVector {
    /// Build a tilt vector, clamping each axis to [-1, 1]. A NaN axis reads
    /// as level.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: axis(x),
            y: axis(y),
        }
    }
}

fn axis(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(-1.0, 1.0)
    }
}
