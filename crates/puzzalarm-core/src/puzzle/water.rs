//! Water pouring: tilt to pour from a full cup into an empty one and stop
//! within tolerance of a random target level.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{make_rng, Countdown, Puzzle, PuzzleDetail, PuzzleRng, PuzzleSnapshot, PuzzleState, RoundCounter};
use crate::alarm::{PuzzleSettings, PuzzleType};
use crate::signals::TiltVector;

/// Level moved from source to target per pour tick.
pub const POUR_RATE: f64 = 0.02;
/// Pour tick period while pouring.
pub const POUR_INTERVAL: Duration = Duration::from_millis(100);
/// Allowed distance between the target cup level and the goal.
pub const TOLERANCE: f64 = 0.05;
/// Tilt on either axis above which the source cup pours.
pub const TILT_THRESHOLD: f64 = 0.3;
pub const MIN_GOAL: f64 = 0.2;
pub const MAX_GOAL: f64 = 0.8;
/// Levels this close to empty or full count as empty or full.
const LEVEL_EPSILON: f64 = 1e-9;

/// A cup holding a water level in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaterCup {
    level: f64,
}

impl WaterCup {
    pub const CAPACITY: f64 = 1.0;

    /// A NaN level makes an empty cup.
    pub fn new(level: f64) -> Self {
        let level = if level.is_nan() { 0.0 } else { level };
        Self {
            level: level.clamp(0.0, Self::CAPACITY),
        }
    }

    pub fn empty() -> Self {
        Self::new(0.0)
    }

    pub fn full() -> Self {
        Self::new(Self::CAPACITY)
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Add up to `amount`; returns what actually went in.
    pub fn add_water(&mut self, amount: f64) -> f64 {
        let before = self.level;
        self.level = (self.level + amount.max(0.0)).min(Self::CAPACITY);
        self.level - before
    }

    /// Remove up to `amount`; returns what actually came out.
    pub fn remove_water(&mut self, amount: f64) -> f64 {
        let before = self.level;
        self.level = (self.level - amount.max(0.0)).max(0.0);
        before - self.level
    }

    pub fn is_empty(&self) -> bool {
        self.level <= LEVEL_EPSILON
    }

    pub fn is_full(&self) -> bool {
        self.level >= Self::CAPACITY - LEVEL_EPSILON
    }
}

/// Water pouring puzzle.
#[derive(Debug, Clone)]
pub struct WaterPuzzle {
    state: PuzzleState,
    countdown: Countdown,
    rounds: RoundCounter,
    source: WaterCup,
    target: WaterCup,
    goal: f64,
    is_pouring: bool,
    /// Pour time not yet converted into whole ticks.
    pour_carry: Duration,
    rng: PuzzleRng,
}

impl WaterPuzzle {
    pub fn new(settings: PuzzleSettings) -> Self {
        Self::build(settings, None)
    }

    pub fn with_seed(settings: PuzzleSettings, seed: u64) -> Self {
        Self::build(settings, Some(seed))
    }

    pub(crate) fn build(settings: PuzzleSettings, seed: Option<u64>) -> Self {
        let mut puzzle = Self {
            state: PuzzleState::Idle,
            countdown: Countdown::from_secs(settings.water_time_limit_secs),
            rounds: RoundCounter::new(settings.water_completion_count),
            source: WaterCup::full(),
            target: WaterCup::empty(),
            goal: MIN_GOAL,
            is_pouring: false,
            pour_carry: Duration::ZERO,
            rng: make_rng(seed),
        };
        puzzle.draw_goal();
        puzzle
    }

    pub fn source(&self) -> &WaterCup {
        &self.source
    }

    pub fn target(&self) -> &WaterCup {
        &self.target
    }

    /// Level the target cup must reach.
    pub fn target_level(&self) -> f64 {
        self.goal
    }

    /// Override the goal for the current round, clamped to
    /// [`MIN_GOAL`, `MAX_GOAL`]. For hosts that supply their own targets.
    /// A NaN level keeps the current goal.
    pub fn set_target_level(&mut self, level: f64) {
        if level.is_nan() {
            return;
        }
        self.goal = level.clamp(MIN_GOAL, MAX_GOAL);
    }

    pub fn is_pouring(&self) -> bool {
        self.is_pouring
    }

    pub fn completed_pours(&self) -> u32 {
        self.rounds.completed()
    }

    /// Begin pouring. Ignored unless running, or if there is nothing to pour
    /// or no room left.
    pub fn start_pouring(&mut self) {
        if self.state != PuzzleState::Running
            || self.is_pouring
            || self.source.is_empty()
            || self.target.is_full()
        {
            return;
        }
        self.is_pouring = true;
        self.pour_carry = Duration::ZERO;
    }

    /// Stop pouring and evaluate the result. Returns `true` if this completed
    /// the puzzle.
    pub fn stop_pouring(&mut self) -> bool {
        self.is_pouring = false;
        self.pour_carry = Duration::ZERO;
        self.check_completion()
    }

    /// Move one tick's worth of water. Pouring stops by itself once the
    /// source is empty or the target is full. Returns the amount moved.
    pub fn pour_tick(&mut self) -> f64 {
        if !self.is_pouring || self.state != PuzzleState::Running {
            return 0.0;
        }
        if self.source.is_empty() || self.target.is_full() {
            self.stop_pouring();
            return 0.0;
        }
        let amount = POUR_RATE
            .min(self.source.level())
            .min(WaterCup::CAPACITY - self.target.level());
        let moved = self.source.remove_water(amount);
        self.target.add_water(moved);
        moved
    }

    /// Apply one accelerometer reading: pour while either axis is past
    /// [`TILT_THRESHOLD`].
    pub fn apply_tilt(&mut self, tilt: TiltVector) {
        let should_pour = tilt.x > TILT_THRESHOLD || tilt.y > TILT_THRESHOLD;
        if should_pour && !self.source.is_empty() && !self.is_pouring {
            self.start_pouring();
        } else if (!should_pour || self.source.is_empty()) && self.is_pouring {
            self.stop_pouring();
        }
    }

    fn within_tolerance(&self) -> bool {
        (self.target.level() - self.goal).abs() <= TOLERANCE
    }

    fn draw_goal(&mut self) {
        self.goal = self.rng.gen_range(MIN_GOAL..=MAX_GOAL);
    }

    fn new_round(&mut self) {
        self.is_pouring = false;
        self.pour_carry = Duration::ZERO;
        self.source = WaterCup::full();
        self.target = WaterCup::empty();
        self.draw_goal();
    }
}

impl Puzzle for WaterPuzzle {
    fn kind(&self) -> PuzzleType {
        PuzzleType::Water
    }

    fn state(&self) -> PuzzleState {
        self.state
    }

    fn start(&mut self) {
        match self.state {
            PuzzleState::Running => return,
            PuzzleState::Completed | PuzzleState::Expired => self.reset(),
            PuzzleState::Idle => {}
        }
        self.state = PuzzleState::Running;
        self.countdown.start();
        if self.countdown.is_exhausted() {
            self.state = PuzzleState::Expired;
        }
    }

    fn reset(&mut self) {
        // Pour first: nothing pending may spill into the next round.
        self.is_pouring = false;
        self.pour_carry = Duration::ZERO;
        self.countdown.reset();
        self.state = PuzzleState::Idle;
        self.rounds.clear();
        self.new_round();
    }

    fn check_completion(&mut self) -> bool {
        if self.state != PuzzleState::Running || !self.within_tolerance() {
            return false;
        }
        if self.rounds.bump() {
            self.state = PuzzleState::Completed;
            self.is_pouring = false;
            self.countdown.stop();
            tracing::info!(
                pours = self.rounds.completed(),
                level = self.target.level(),
                goal = self.goal,
                "water puzzle completed"
            );
            return true;
        }
        tracing::debug!(
            completed = self.rounds.completed(),
            required = self.rounds.required(),
            "water round finished"
        );
        self.new_round();
        false
    }

    fn advance(&mut self, dt: Duration) -> Option<PuzzleState> {
        if self.state != PuzzleState::Running {
            return None;
        }
        if self.countdown.advance(dt) {
            self.state = PuzzleState::Expired;
            self.is_pouring = false;
            tracing::info!("water puzzle expired");
            return Some(PuzzleState::Expired);
        }
        if self.is_pouring {
            self.pour_carry += dt;
            while self.pour_carry >= POUR_INTERVAL && self.is_pouring {
                self.pour_carry -= POUR_INTERVAL;
                self.pour_tick();
            }
        }
        (self.state == PuzzleState::Completed).then_some(PuzzleState::Completed)
    }

    fn progress(&self) -> f64 {
        self.rounds.fraction()
    }

    fn time_remaining(&self) -> Duration {
        self.countdown.remaining()
    }

    fn elapsed(&self) -> Duration {
        self.countdown.elapsed()
    }

    fn snapshot(&self) -> PuzzleSnapshot {
        PuzzleSnapshot {
            puzzle_type: PuzzleType::Water,
            state: self.state,
            progress: self.progress(),
            time_remaining_secs: self.time_remaining().as_secs_f64(),
            elapsed_secs: self.elapsed().as_secs_f64(),
            detail: PuzzleDetail::Water {
                source_level: self.source.level(),
                target_level: self.target.level(),
                goal_level: self.goal,
                is_pouring: self.is_pouring,
                completed: self.rounds.completed(),
                required: self.rounds.required(),
            },
        }
    }
}
