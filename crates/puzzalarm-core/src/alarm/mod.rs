//! Alarm data model.
//!
//! An [`Alarm`] is a scheduled wake event with its configuration and an
//! optional puzzle gate. Alarms carry no behaviour of their own; the
//! [`AlarmManager`](crate::manager::AlarmManager) owns their lifecycle.

mod model;
mod settings;

pub use model::{Alarm, AlarmId, VibrationPattern, Weekday};
pub use settings::{MathDifficulty, MazeDifficulty, PuzzleSettings, PuzzleType};
