//! # PuzzAlarm Core Library
//!
//! This library provides the core logic for PuzzAlarm, an alarm clock that
//! must be dismissed by solving a puzzle. All operations are available via a
//! standalone CLI binary; platform front ends are thin layers over the same
//! core.
//!
//! ## Architecture
//!
//! - **Alarm Manager**: owns alarms and usage statistics, persists through a
//!   [`Store`] and hands scheduling to a [`NotificationScheduler`]
//! - **Puzzles**: math, marble maze and water pouring, each a state machine
//!   that requires the caller to periodically invoke `advance()`
//! - **Storage**: SQLite key-value blobs and TOML-based configuration
//! - **Events**: broadcast channel that observers subscribe to
//!
//! ## Key Components
//!
//! - [`AlarmManager`]: alarm CRUD, trigger/snooze/dismiss, sleep tracking
//! - [`ActivePuzzle`]: the puzzle selected by an alarm's [`PuzzleType`]
//! - [`SqliteStore`]: on-disk persistence
//! - [`Config`]: application configuration management

pub mod alarm;
pub mod error;
pub mod events;
pub mod manager;
pub mod notify;
pub mod puzzle;
pub mod signals;
pub mod stats;
pub mod storage;

pub use alarm::{
    Alarm, AlarmId, MathDifficulty, MazeDifficulty, PuzzleSettings, PuzzleType,
    VibrationPattern, Weekday,
};
pub use error::{ConfigError, CoreError, StorageError};
pub use events::{Event, EventBus};
pub use manager::AlarmManager;
pub use notify::{LogScheduler, NotificationScheduler, NullScheduler, RecordingScheduler};
pub use puzzle::{ActivePuzzle, Puzzle, PuzzleSnapshot, PuzzleState};
pub use signals::{HeartRateSample, SleepState, SleepStateChange, TiltVector};
pub use stats::{AlarmStatistics, GlobalStatistics, SleepDetectionEvent};
pub use storage::{Config, MemoryStore, SqliteStore, Store};
