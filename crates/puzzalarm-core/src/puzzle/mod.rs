//! Puzzle engine.
//!
//! Every puzzle is a small state machine driven by its owner:
//!
//! ```text
//! Idle --start()--> Running --win condition--> Completed
//!                      |
//!                      +--countdown hits zero--> Expired
//! reset(): any state --> Idle (fresh content, counters cleared)
//! ```
//!
//! There are no internal threads or timers. Hosts call `advance(dt)` from
//! their own loop (once a second is enough for the countdown; the water
//! puzzle wants ~10 Hz while pouring) and forward user input through the
//! variant-specific methods.
//!
//! ## Usage
//!
//! ```ignore
//! let mut puzzle = ActivePuzzle::new(PuzzleType::Math, &alarm.puzzle_settings);
//! puzzle.start();
//! // In a loop:
//! if let Some(PuzzleState::Expired) = puzzle.advance(Duration::from_secs(1)) {
//!     // re-present the alarm
//! }
//! ```

mod countdown;
pub mod math;
pub mod maze;
pub mod water;

use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};

pub use countdown::Countdown;
pub use math::{MathOperation, MathProblem, MathPuzzle};
pub use maze::{BallPosition, MarbleMazePuzzle, Maze, MazeCell, MazeGenerator};
pub use water::{WaterCup, WaterPuzzle};

use crate::alarm::{PuzzleSettings, PuzzleType};
use crate::events::Event;
use crate::signals::TiltVector;

/// RNG used for puzzle content. Seedable so tests and replays are
/// deterministic.
pub type PuzzleRng = Mcg128Xsl64;

pub(crate) fn make_rng(seed: Option<u64>) -> PuzzleRng {
    match seed {
        Some(seed) => PuzzleRng::seed_from_u64(seed),
        None => PuzzleRng::from_entropy(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PuzzleState {
    /// Constructed or reset, not started.
    Idle,
    /// Countdown active, accepting input.
    Running,
    /// Win condition met. Terminal until `reset()`.
    Completed,
    /// Countdown reached zero first. Terminal until `reset()`.
    Expired,
}

impl PuzzleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PuzzleState::Completed | PuzzleState::Expired)
    }
}

/// Units completed versus units required (problems, mazes, pours).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundCounter {
    completed: u32,
    required: u32,
}

impl RoundCounter {
    /// A requirement of zero is treated as one.
    pub fn new(required: u32) -> Self {
        Self {
            completed: 0,
            required: required.max(1),
        }
    }

    /// Record one unit. Returns `true` if the requirement is now met.
    pub fn bump(&mut self) -> bool {
        self.completed = self.completed.saturating_add(1);
        self.is_met()
    }

    pub fn clear(&mut self) {
        self.completed = 0;
    }

    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn required(&self) -> u32 {
        self.required
    }

    pub fn is_met(&self) -> bool {
        self.completed >= self.required
    }

    /// Always within [0, 1].
    pub fn fraction(&self) -> f64 {
        (self.completed as f64 / self.required as f64).min(1.0)
    }
}

/// The contract shared by all puzzle variants.
pub trait Puzzle {
    fn kind(&self) -> PuzzleType;

    fn state(&self) -> PuzzleState;

    /// Idle -> Running. A running puzzle ignores the call; a finished one is
    /// reset and started again.
    fn start(&mut self);

    /// Back to Idle with counters cleared and fresh content. Stops any
    /// in-flight pour so a stale tick cannot touch the next round.
    fn reset(&mut self);

    /// Evaluate the win condition. Returns `true` only on the call that
    /// moves the puzzle from Running to Completed.
    fn check_completion(&mut self) -> bool;

    /// Feed elapsed wall-clock time. Returns the new state if this call
    /// finished the puzzle.
    fn advance(&mut self, dt: Duration) -> Option<PuzzleState>;

    /// Completed units over required units, in [0, 1].
    fn progress(&self) -> f64;

    fn time_remaining(&self) -> Duration;

    /// Running time since `start()`.
    fn elapsed(&self) -> Duration;

    fn snapshot(&self) -> PuzzleSnapshot;

    fn is_completed(&self) -> bool {
        self.state() == PuzzleState::Completed
    }

    fn is_expired(&self) -> bool {
        self.state() == PuzzleState::Expired
    }
}

/// Serializable view of a puzzle for observers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PuzzleSnapshot {
    pub puzzle_type: PuzzleType,
    pub state: PuzzleState,
    pub progress: f64,
    pub time_remaining_secs: f64,
    pub elapsed_secs: f64,
    pub detail: PuzzleDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PuzzleDetail {
    Math {
        question: Option<String>,
        solved: u32,
        required: u32,
    },
    Maze {
        size: usize,
        ball: BallPosition,
        completed: u32,
        required: u32,
    },
    Water {
        source_level: f64,
        target_level: f64,
        goal_level: f64,
        is_pouring: bool,
        completed: u32,
        required: u32,
    },
}

/// One live puzzle, selected by the alarm's [`PuzzleType`].
#[derive(Debug, Clone)]
pub enum ActivePuzzle {
    Math(MathPuzzle),
    Maze(MarbleMazePuzzle),
    Water(WaterPuzzle),
}

macro_rules! delegate {
    ($self:ident, $p:ident => $body:expr) => {
        match $self {
            ActivePuzzle::Math($p) => $body,
            ActivePuzzle::Maze($p) => $body,
            ActivePuzzle::Water($p) => $body,
        }
    };
}

impl ActivePuzzle {
    pub fn new(kind: PuzzleType, settings: &PuzzleSettings) -> Self {
        Self::build(kind, settings, None)
    }

    pub fn with_seed(kind: PuzzleType, settings: &PuzzleSettings, seed: u64) -> Self {
        Self::build(kind, settings, Some(seed))
    }

    fn build(kind: PuzzleType, settings: &PuzzleSettings, seed: Option<u64>) -> Self {
        match kind {
            PuzzleType::Math => ActivePuzzle::Math(MathPuzzle::build(settings.clone(), seed)),
            PuzzleType::MarbleMaze => {
                ActivePuzzle::Maze(MarbleMazePuzzle::build(settings.clone(), seed))
            }
            PuzzleType::Water => ActivePuzzle::Water(WaterPuzzle::build(settings.clone(), seed)),
        }
    }

    /// Route a tilt reading to the motion puzzles. Math ignores it.
    pub fn apply_tilt(&mut self, tilt: TiltVector) {
        match self {
            ActivePuzzle::Math(_) => {}
            ActivePuzzle::Maze(p) => {
                p.apply_tilt(tilt);
            }
            ActivePuzzle::Water(p) => p.apply_tilt(tilt),
        }
    }

    /// Observer event for a terminal state, `None` while the puzzle is
    /// still idle or running.
    pub fn outcome_event(&self) -> Option<Event> {
        let puzzle_type = self.kind();
        let at = chrono::Utc::now();
        match self.state() {
            PuzzleState::Completed => Some(Event::PuzzleCompleted {
                puzzle_type,
                elapsed_secs: self.elapsed().as_secs_f64(),
                at,
            }),
            PuzzleState::Expired => Some(Event::PuzzleExpired { puzzle_type, at }),
            PuzzleState::Idle | PuzzleState::Running => None,
        }
    }

    pub fn as_math_mut(&mut self) -> Option<&mut MathPuzzle> {
        match self {
            ActivePuzzle::Math(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_maze_mut(&mut self) -> Option<&mut MarbleMazePuzzle> {
        match self {
            ActivePuzzle::Maze(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_water_mut(&mut self) -> Option<&mut WaterPuzzle> {
        match self {
            ActivePuzzle::Water(p) => Some(p),
            _ => None,
        }
    }
}

impl Puzzle for ActivePuzzle {
    fn kind(&self) -> PuzzleType {
        delegate!(self, p => p.kind())
    }

    fn state(&self) -> PuzzleState {
        delegate!(self, p => p.state())
    }

    fn start(&mut self) {
        delegate!(self, p => p.start())
    }

    fn reset(&mut self) {
        delegate!(self, p => p.reset())
    }

    fn check_completion(&mut self) -> bool {
        delegate!(self, p => p.check_completion())
    }

    fn advance(&mut self, dt: Duration) -> Option<PuzzleState> {
        delegate!(self, p => p.advance(dt))
    }

    fn progress(&self) -> f64 {
        delegate!(self, p => p.progress())
    }

    fn time_remaining(&self) -> Duration {
        delegate!(self, p => p.time_remaining())
    }

    fn elapsed(&self) -> Duration {
        delegate!(self, p => p.elapsed())
    }

    fn snapshot(&self) -> PuzzleSnapshot {
        delegate!(self, p => p.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_counter_never_exceeds_one() {
        let mut rounds = RoundCounter::new(2);
        assert_eq!(rounds.fraction(), 0.0);
        assert!(!rounds.bump());
        assert_eq!(rounds.fraction(), 0.5);
        assert!(rounds.bump());
        rounds.bump();
        assert_eq!(rounds.fraction(), 1.0);
    }

    #[test]
    fn zero_requirement_means_one() {
        let rounds = RoundCounter::new(0);
        assert_eq!(rounds.required(), 1);
    }

    #[test]
    fn active_puzzle_dispatches_by_tag() {
        let settings = PuzzleSettings::default();
        for kind in PuzzleType::ALL {
            let mut puzzle = ActivePuzzle::with_seed(kind, &settings, 7);
            assert_eq!(puzzle.kind(), kind);
            assert_eq!(puzzle.state(), PuzzleState::Idle);
            puzzle.start();
            assert_eq!(puzzle.state(), PuzzleState::Running);
            assert_eq!(puzzle.snapshot().puzzle_type, kind);
        }
    }

    #[test]
    fn every_variant_expires_when_time_runs_out() {
        let settings = PuzzleSettings {
            math_time_limit_secs: 3,
            maze_time_limit_secs: 3,
            water_time_limit_secs: 3,
            ..PuzzleSettings::default()
        };
        for kind in PuzzleType::ALL {
            let mut puzzle = ActivePuzzle::with_seed(kind, &settings, 11);
            puzzle.start();
            assert_eq!(puzzle.advance(Duration::from_secs(1)), None);
            assert_eq!(puzzle.advance(Duration::from_secs(2)), Some(PuzzleState::Expired));
            assert!(puzzle.is_expired());
            assert!(puzzle.time_remaining().is_zero());
            // Terminal: further ticks do nothing.
            assert_eq!(puzzle.advance(Duration::from_secs(1)), None);
            assert!(!puzzle.check_completion());
        }
    }

    #[test]
    fn reset_from_any_state_returns_to_idle() {
        let settings = PuzzleSettings {
            water_time_limit_secs: 1,
            ..PuzzleSettings::default()
        };
        let mut puzzle = ActivePuzzle::with_seed(PuzzleType::Water, &settings, 3);
        puzzle.reset();
        assert_eq!(puzzle.state(), PuzzleState::Idle);
        puzzle.start();
        puzzle.advance(Duration::from_secs(2));
        assert!(puzzle.is_expired());
        puzzle.reset();
        assert_eq!(puzzle.state(), PuzzleState::Idle);
        assert_eq!(puzzle.progress(), 0.0);
        assert_eq!(puzzle.time_remaining(), Duration::from_secs(1));
    }

    #[test]
    fn outcome_event_only_for_terminal_states() {
        let settings = PuzzleSettings {
            maze_time_limit_secs: 2,
            ..PuzzleSettings::default()
        };
        let mut puzzle = ActivePuzzle::with_seed(PuzzleType::MarbleMaze, &settings, 5);
        assert!(puzzle.outcome_event().is_none());
        puzzle.start();
        assert!(puzzle.outcome_event().is_none());
        puzzle.advance(Duration::from_secs(2));
        assert!(matches!(
            puzzle.outcome_event(),
            Some(Event::PuzzleExpired { puzzle_type: PuzzleType::MarbleMaze, .. })
        ));
    }

    #[test]
    fn snapshot_serializes_with_detail_tag() {
        let puzzle = ActivePuzzle::with_seed(PuzzleType::Water, &PuzzleSettings::default(), 1);
        let json = serde_json::to_value(puzzle.snapshot()).unwrap();
        assert_eq!(json["state"], "idle");
        assert_eq!(json["detail"]["kind"], "water");
    }
}
