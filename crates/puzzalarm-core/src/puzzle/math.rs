//! Arithmetic puzzle: solve N problems before the countdown runs out.

use std::ops::RangeInclusive;
use std::time::Duration;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{make_rng, Countdown, Puzzle, PuzzleDetail, PuzzleRng, PuzzleSnapshot, PuzzleState, RoundCounter};
use crate::alarm::{MathDifficulty, PuzzleSettings, PuzzleType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathOperation {
    Addition,
    Subtraction,
    Multiplication,
    Division,
}

impl MathOperation {
    pub const ALL: [MathOperation; 4] = [
        MathOperation::Addition,
        MathOperation::Subtraction,
        MathOperation::Multiplication,
        MathOperation::Division,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            MathOperation::Addition => "+",
            MathOperation::Subtraction => "-",
            MathOperation::Multiplication => "×",
            MathOperation::Division => "÷",
        }
    }
}

impl MathDifficulty {
    /// Inclusive range both operands are drawn from.
    pub fn operand_range(self) -> RangeInclusive<i64> {
        match self {
            MathDifficulty::Easy => 1..=10,
            MathDifficulty::Medium => 1..=25,
            MathDifficulty::Hard => 1..=50,
            MathDifficulty::Expert => 1..=100,
        }
    }

    pub fn operations(self) -> &'static [MathOperation] {
        const EASY: &[MathOperation] = &[MathOperation::Addition, MathOperation::Subtraction];
        const MEDIUM: &[MathOperation] = &[
            MathOperation::Addition,
            MathOperation::Subtraction,
            MathOperation::Multiplication,
        ];
        match self {
            MathDifficulty::Easy => EASY,
            MathDifficulty::Medium => MEDIUM,
            MathDifficulty::Hard | MathDifficulty::Expert => &MathOperation::ALL,
        }
    }
}

/// A single arithmetic question.
///
/// For division, `operand1` is the dividend `a * b`, `operand2` is `a` and the
/// answer is `b`, so the result is always a whole number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathProblem {
    pub operand1: i64,
    pub operand2: i64,
    pub operation: MathOperation,
    pub correct_answer: i64,
}

impl MathProblem {
    pub fn generate<R: Rng + ?Sized>(difficulty: MathDifficulty, rng: &mut R) -> Self {
        let range = difficulty.operand_range();
        let a = rng.gen_range(range.clone());
        let b = rng.gen_range(range);
        let operation = *difficulty
            .operations()
            .choose(rng)
            .unwrap_or(&MathOperation::Addition);

        match operation {
            MathOperation::Addition => Self::new(a, b, operation, a + b),
            MathOperation::Subtraction => Self::new(a, b, operation, a - b),
            MathOperation::Multiplication => Self::new(a, b, operation, a * b),
            MathOperation::Division => Self::new(a * b, a, operation, b),
        }
    }

    fn new(operand1: i64, operand2: i64, operation: MathOperation, correct_answer: i64) -> Self {
        Self {
            operand1,
            operand2,
            operation,
            correct_answer,
        }
    }

    pub fn question_text(&self) -> String {
        format!("{} {} {} = ?", self.operand1, self.operation.symbol(), self.operand2)
    }
}

/// Arithmetic puzzle.
#[derive(Debug, Clone)]
pub struct MathPuzzle {
    settings: PuzzleSettings,
    state: PuzzleState,
    countdown: Countdown,
    solved: RoundCounter,
    wrong_answers: u32,
    current_problem: Option<MathProblem>,
    rng: PuzzleRng,
}

impl MathPuzzle {
    pub fn new(settings: PuzzleSettings) -> Self {
        Self::build(settings, None)
    }

    pub fn with_seed(settings: PuzzleSettings, seed: u64) -> Self {
        Self::build(settings, Some(seed))
    }

    pub(crate) fn build(settings: PuzzleSettings, seed: Option<u64>) -> Self {
        Self {
            countdown: Countdown::from_secs(settings.math_time_limit_secs),
            solved: RoundCounter::new(settings.math_problem_count),
            settings,
            state: PuzzleState::Idle,
            wrong_answers: 0,
            current_problem: None,
            rng: make_rng(seed),
        }
    }

    pub fn current_problem(&self) -> Option<&MathProblem> {
        self.current_problem.as_ref()
    }

    pub fn correct_answers(&self) -> u32 {
        self.solved.completed()
    }

    pub fn wrong_answers(&self) -> u32 {
        self.wrong_answers
    }

    /// Submit an answer to the current problem. Returns whether it was
    /// correct. A wrong answer swaps in a new problem without costing
    /// progress; input is ignored unless the puzzle is running.
    pub fn submit_answer(&mut self, answer: i64) -> bool {
        if self.state != PuzzleState::Running {
            return false;
        }
        let Some(problem) = self.current_problem.as_ref() else {
            return false;
        };

        if answer == problem.correct_answer {
            self.solved.bump();
            if !self.check_completion() {
                self.next_problem();
            }
            true
        } else {
            self.wrong_answers += 1;
            self.next_problem();
            false
        }
    }

    /// Like [`submit_answer`](Self::submit_answer) for raw text input.
    /// Anything that does not parse as an integer counts as wrong.
    pub fn submit_text(&mut self, input: &str) -> bool {
        match input.trim().parse::<i64>() {
            Ok(answer) => self.submit_answer(answer),
            Err(_) => {
                if self.state == PuzzleState::Running {
                    self.wrong_answers += 1;
                    self.next_problem();
                }
                false
            }
        }
    }

    fn next_problem(&mut self) {
        self.current_problem = Some(MathProblem::generate(
            self.settings.math_difficulty,
            &mut self.rng,
        ));
    }
}

impl Puzzle for MathPuzzle {
    fn kind(&self) -> PuzzleType {
        PuzzleType::Math
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
        if self.current_problem.is_none() {
            self.next_problem();
        }
        self.state = PuzzleState::Running;
        self.countdown.start();
        if self.countdown.is_exhausted() {
            self.state = PuzzleState::Expired;
        }
    }

    fn reset(&mut self) {
        self.countdown.reset();
        self.state = PuzzleState::Idle;
        self.solved.clear();
        self.wrong_answers = 0;
        self.next_problem();
    }

    fn check_completion(&mut self) -> bool {
        if self.state != PuzzleState::Running || !self.solved.is_met() {
            return false;
        }
        self.state = PuzzleState::Completed;
        self.countdown.stop();
        self.current_problem = None;
        tracing::info!(
            solved = self.solved.completed(),
            wrong = self.wrong_answers,
            elapsed_secs = self.countdown.elapsed().as_secs_f64(),
            "math puzzle completed"
        );
        true
    }

    fn advance(&mut self, dt: Duration) -> Option<PuzzleState> {
        if self.state != PuzzleState::Running {
            return None;
        }
        if self.countdown.advance(dt) {
            self.state = PuzzleState::Expired;
            tracing::info!(at = %Utc::now(), "math puzzle expired");
            return Some(PuzzleState::Expired);
        }
        None
    }

    fn progress(&self) -> f64 {
        self.solved.fraction()
    }

    fn time_remaining(&self) -> Duration {
        self.countdown.remaining()
    }

    fn elapsed(&self) -> Duration {
        self.countdown.elapsed()
    }

    fn snapshot(&self) -> PuzzleSnapshot {
        PuzzleSnapshot {
            puzzle_type: PuzzleType::Math,
            state: self.state,
            progress: self.progress(),
            time_remaining_secs: self.time_remaining().as_secs_f64(),
            elapsed_secs: self.elapsed().as_secs_f64(),
            detail: PuzzleDetail::Math {
                question: self.current_problem.as_ref().map(MathProblem::question_text),
                solved: self.solved.completed(),
                required: self.solved.required(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn settings(count: u32) -> PuzzleSettings {
        PuzzleSettings {
            math_difficulty: MathDifficulty::Easy,
            math_problem_count: count,
            math_time_limit_secs: 60,
            ..PuzzleSettings::default()
        }
    }

    #[test]
    fn two_correct_answers_complete_the_puzzle() {
        let mut puzzle = MathPuzzle::with_seed(settings(2), 42);
        puzzle.start();
        assert!(!puzzle.is_completed());
        assert_eq!(puzzle.correct_answers(), 0);

        let answer = puzzle.current_problem().unwrap().correct_answer;
        assert!(puzzle.submit_answer(answer));
        assert_eq!(puzzle.correct_answers(), 1);
        assert_eq!(puzzle.progress(), 0.5);
        assert!(puzzle.current_problem().is_some());

        let answer = puzzle.current_problem().unwrap().correct_answer;
        assert!(puzzle.submit_answer(answer));
        assert_eq!(puzzle.correct_answers(), 2);
        assert!(puzzle.is_completed());
        assert_eq!(puzzle.progress(), 1.0);
        assert!(puzzle.current_problem().is_none());
        // Already completed: no second transition.
        assert!(!puzzle.check_completion());
    }

    #[test]
    fn wrong_answer_replaces_problem_without_penalty() {
        let mut puzzle = MathPuzzle::with_seed(settings(3), 9);
        puzzle.start();
        let wrong = puzzle.current_problem().unwrap().correct_answer + 1;
        assert!(!puzzle.submit_answer(wrong));
        assert_eq!(puzzle.correct_answers(), 0);
        assert_eq!(puzzle.wrong_answers(), 1);
        assert!(puzzle.current_problem().is_some());
        assert_eq!(puzzle.state(), PuzzleState::Running);
    }

    #[test]
    fn non_numeric_input_counts_as_wrong() {
        let mut puzzle = MathPuzzle::with_seed(settings(1), 5);
        puzzle.start();
        assert!(!puzzle.submit_text("seven"));
        assert_eq!(puzzle.wrong_answers(), 1);
        let answer = puzzle.current_problem().unwrap().correct_answer;
        assert!(puzzle.submit_text(&format!("  {answer}\n")));
        assert!(puzzle.is_completed());
    }

    #[test]
    fn answers_ignored_before_start_and_after_expiry() {
        let mut puzzle = MathPuzzle::with_seed(settings(1), 1);
        assert!(!puzzle.submit_answer(0));
        puzzle.start();
        puzzle.advance(Duration::from_secs(60));
        assert!(puzzle.is_expired());
        assert!(puzzle.current_problem().is_some());
        let answer = puzzle.current_problem().unwrap().correct_answer;
        assert!(!puzzle.submit_answer(answer));
        assert!(!puzzle.is_completed());
    }

    #[test]
    fn restart_after_completion_clears_progress() {
        let mut puzzle = MathPuzzle::with_seed(settings(1), 2);
        puzzle.start();
        let answer = puzzle.current_problem().unwrap().correct_answer;
        puzzle.submit_answer(answer);
        assert!(puzzle.is_completed());
        puzzle.start();
        assert_eq!(puzzle.state(), PuzzleState::Running);
        assert_eq!(puzzle.progress(), 0.0);
        assert_eq!(puzzle.time_remaining(), Duration::from_secs(60));
    }

    #[test]
    fn question_text_uses_symbols() {
        let p = MathProblem {
            operand1: 12,
            operand2: 3,
            operation: MathOperation::Division,
            correct_answer: 4,
        };
        assert_eq!(p.question_text(), "12 ÷ 3 = ?");
    }

    #[test]
    fn easy_uses_only_add_and_subtract() {
        let mut rng = PuzzleRng::seed_from_u64(99);
        for _ in 0..500 {
            let p = MathProblem::generate(MathDifficulty::Easy, &mut rng);
            assert!(matches!(
                p.operation,
                MathOperation::Addition | MathOperation::Subtraction
            ));
        }
    }

    proptest! {
        #[test]
        fn easy_operands_stay_in_range(seed in any::<u64>()) {
            let mut rng = PuzzleRng::seed_from_u64(seed);
            let p = MathProblem::generate(MathDifficulty::Easy, &mut rng);
            prop_assert!((1..=10).contains(&p.operand1));
            prop_assert!((1..=10).contains(&p.operand2));
        }

        #[test]
        fn answers_are_consistent(seed in any::<u64>(), tier in 0usize..4) {
            let difficulty = MathDifficulty::ALL[tier];
            let mut rng = PuzzleRng::seed_from_u64(seed);
            let p = MathProblem::generate(difficulty, &mut rng);
            let expected = match p.operation {
                MathOperation::Addition => p.operand1 + p.operand2,
                MathOperation::Subtraction => p.operand1 - p.operand2,
                MathOperation::Multiplication => p.operand1 * p.operand2,
                MathOperation::Division => {
                    prop_assert_eq!(p.correct_answer * p.operand2, p.operand1);
                    p.operand1 / p.operand2
                }
            };
            prop_assert_eq!(p.correct_answer, expected);
            prop_assert!(difficulty.operations().contains(&p.operation));
        }
    }
}
