//! Marble maze: tilt the device to roll a ball from the top-left corner to
//! the bottom-right corner of a randomly generated grid.

use std::collections::VecDeque;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{make_rng, Countdown, Puzzle, PuzzleDetail, PuzzleRng, PuzzleSnapshot, PuzzleState, RoundCounter};
use crate::alarm::{MazeDifficulty, PuzzleSettings, PuzzleType};
use crate::signals::TiltVector;

/// Ball displacement per unit of tilt per reading.
pub const TILT_SENSITIVITY: f64 = 0.02;

impl MazeDifficulty {
    /// Side length of the square grid.
    pub fn maze_size(self) -> usize {
        match self {
            MazeDifficulty::Easy => 8,
            MazeDifficulty::Medium => 12,
            MazeDifficulty::Hard => 16,
            MazeDifficulty::Expert => 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MazeCell {
    Path,
    Wall,
    Start,
    End,
}

impl MazeCell {
    pub fn is_wall(self) -> bool {
        self == MazeCell::Wall
    }
}

/// Square grid, indexed `[row][col]`. Start is (0, 0), end is
/// (size - 1, size - 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    size: usize,
    cells: Vec<Vec<MazeCell>>,
}

impl Maze {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn rows(&self) -> &[Vec<MazeCell>] {
        &self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<MazeCell> {
        self.cells.get(row).and_then(|r| r.get(col)).copied()
    }

    pub fn start(&self) -> (usize, usize) {
        (0, 0)
    }

    pub fn end(&self) -> (usize, usize) {
        (self.size - 1, self.size - 1)
    }

    /// Grid cell under a normalized position. Coordinates are truncated
    /// after scaling; 1.0 maps onto the last row/column.
    pub fn cell_at(&self, pos: BallPosition) -> (usize, usize) {
        let scale = |v: f64| ((v * self.size as f64) as usize).min(self.size - 1);
        (scale(pos.y), scale(pos.x))
    }

    /// Whether start and end are connected through non-wall cells
    /// (4-neighbourhood).
    pub fn has_path(&self) -> bool {
        self.solve().is_some()
    }

    /// Shortest start-to-end route as a list of cells, both ends included.
    pub fn solve(&self) -> Option<Vec<(usize, usize)>> {
        self.route_from(self.start())
    }

    /// Shortest route from `from` to the end cell (BFS, 4-neighbourhood).
    pub fn route_from(&self, from: (usize, usize)) -> Option<Vec<(usize, usize)>> {
        if !self.cell(from.0, from.1).is_some_and(|c| !c.is_wall()) {
            return None;
        }
        let mut prev: Vec<Vec<Option<(usize, usize)>>> = vec![vec![None; self.size]; self.size];
        let mut queue = VecDeque::from([from]);
        prev[from.0][from.1] = Some(from);
        while let Some((row, col)) = queue.pop_front() {
            if (row, col) == self.end() {
                let mut route = vec![(row, col)];
                let mut at = (row, col);
                while at != from {
                    at = prev[at.0][at.1]?;
                    route.push(at);
                }
                route.reverse();
                return Some(route);
            }
            let neighbours = [
                (row.wrapping_sub(1), col),
                (row + 1, col),
                (row, col.wrapping_sub(1)),
                (row, col + 1),
            ];
            for (r, c) in neighbours {
                match self.cell(r, c) {
                    Some(cell) if !cell.is_wall() && prev[r][c].is_none() => {
                        prev[r][c] = Some((row, col));
                        queue.push_back((r, c));
                    }
                    _ => {}
                }
            }
        }
        None
    }

    /// Centre of a grid cell in normalized coordinates.
    pub fn cell_centre(&self, row: usize, col: usize) -> BallPosition {
        let n = self.size as f64;
        BallPosition {
            x: (col as f64 + 0.5) / n,
            y: (row as f64 + 0.5) / n,
        }
    }

    /// ASCII rendering: `#` wall, `.` path, `S` start, `E` end, `o` ball.
    pub fn render(&self, ball: Option<BallPosition>) -> String {
        let ball_cell = ball.map(|b| self.cell_at(b));
        let mut out = String::with_capacity(self.size * (self.size + 1));
        for (r, row) in self.cells.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let ch = if ball_cell == Some((r, c)) {
                    'o'
                } else {
                    match cell {
                        MazeCell::Wall => '#',
                        MazeCell::Path => '.',
                        MazeCell::Start => 'S',
                        MazeCell::End => 'E',
                    }
                };
                out.push(ch);
            }
            out.push('\n');
        }
        out
    }
}

/// Maze generation.
pub struct MazeGenerator;

impl MazeGenerator {
    /// Build a `size` x `size` maze with at least one route from start to end.
    ///
    /// A monotone right/down random walk carves the guaranteed route, then
    /// `size² / 4` random cells are opened for alternatives. Start and end
    /// are stamped last so the sprinkling cannot erase them. Sizes below 2
    /// are raised to 2.
    pub fn generate<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Maze {
        let size = size.max(2);
        let mut cells = vec![vec![MazeCell::Wall; size]; size];

        let (mut row, mut col) = (0, 0);
        while row < size - 1 || col < size - 1 {
            cells[row][col] = MazeCell::Path;
            if row == size - 1 {
                col += 1;
            } else if col == size - 1 {
                row += 1;
            } else if rng.gen_bool(0.5) {
                col += 1;
            } else {
                row += 1;
            }
        }

        for _ in 0..(size * size / 4) {
            let r = rng.gen_range(0..size);
            let c = rng.gen_range(0..size);
            if (r, c) != (0, 0) && (r, c) != (size - 1, size - 1) {
                cells[r][c] = MazeCell::Path;
            }
        }

        cells[0][0] = MazeCell::Start;
        cells[size - 1][size - 1] = MazeCell::End;

        Maze { size, cells }
    }
}

/// Normalized ball position, both axes in [0, 1]. `x` runs along columns,
/// `y` along rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallPosition {
    pub x: f64,
    pub y: f64,
}

impl BallPosition {
    /// Centre of the start cell.
    fn start_of(maze: &Maze) -> Self {
        let (row, col) = maze.start();
        maze.cell_centre(row, col)
    }
}

/// Marble maze puzzle.
#[derive(Debug, Clone)]
pub struct MarbleMazePuzzle {
    settings: PuzzleSettings,
    state: PuzzleState,
    countdown: Countdown,
    rounds: RoundCounter,
    maze: Maze,
    ball: BallPosition,
    rng: PuzzleRng,
}

impl MarbleMazePuzzle {
    pub fn new(settings: PuzzleSettings) -> Self {
        Self::build(settings, None)
    }

    pub fn with_seed(settings: PuzzleSettings, seed: u64) -> Self {
        Self::build(settings, Some(seed))
    }

    pub(crate) fn build(settings: PuzzleSettings, seed: Option<u64>) -> Self {
        let mut rng = make_rng(seed);
        let maze = MazeGenerator::generate(settings.maze_difficulty.maze_size(), &mut rng);
        let ball = BallPosition::start_of(&maze);
        Self {
            countdown: Countdown::from_secs(settings.maze_time_limit_secs),
            rounds: RoundCounter::new(settings.maze_completion_count),
            settings,
            state: PuzzleState::Idle,
            maze,
            ball,
            rng,
        }
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn ball_position(&self) -> BallPosition {
        self.ball
    }

    pub fn ball_cell(&self) -> (usize, usize) {
        self.maze.cell_at(self.ball)
    }

    pub fn completed_mazes(&self) -> u32 {
        self.rounds.completed()
    }

    /// Nudge the ball by a normalized delta. The result is clamped to the
    /// board; moves landing on a wall are rejected and the ball stays put.
    /// Non-finite deltas are rejected. Returns whether the move was accepted.
    pub fn move_ball(&mut self, dx: f64, dy: f64) -> bool {
        if self.state != PuzzleState::Running || !dx.is_finite() || !dy.is_finite() {
            return false;
        }
        let candidate = BallPosition {
            x: (self.ball.x + dx).clamp(0.0, 1.0),
            y: (self.ball.y + dy).clamp(0.0, 1.0),
        };
        let (row, col) = self.maze.cell_at(candidate);
        match self.maze.cell(row, col) {
            Some(cell) if !cell.is_wall() => {
                self.ball = candidate;
                true
            }
            _ => false,
        }
    }

    /// Apply one accelerometer reading: scale by [`TILT_SENSITIVITY`], invert
    /// Y (screen rows grow downwards), move, then check for the goal.
    /// Returns `true` if this reading completed the puzzle.
    pub fn apply_tilt(&mut self, tilt: TiltVector) -> bool {
        if self.move_ball(tilt.x * TILT_SENSITIVITY, -tilt.y * TILT_SENSITIVITY) {
            return self.check_completion();
        }
        false
    }

    /// Unit tilt that rolls the ball towards the next cell on the shortest
    /// route to the end. `None` once the ball is in the end cell.
    pub fn hint_tilt(&self) -> Option<TiltVector> {
        let route = self.maze.route_from(self.ball_cell())?;
        let &(row, col) = route.get(1)?;
        let target = self.maze.cell_centre(row, col);
        let dx = target.x - self.ball.x;
        let dy = target.y - self.ball.y;
        if dx.abs() > dy.abs() {
            Some(TiltVector::new(dx.signum(), 0.0))
        } else {
            Some(TiltVector::new(0.0, -dy.signum()))
        }
    }

    fn new_round(&mut self) {
        self.maze = MazeGenerator::generate(self.settings.maze_difficulty.maze_size(), &mut self.rng);
        self.ball = BallPosition::start_of(&self.maze);
    }
}

impl Puzzle for MarbleMazePuzzle {
    fn kind(&self) -> PuzzleType {
        PuzzleType::MarbleMaze
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
        self.countdown.reset();
        self.state = PuzzleState::Idle;
        self.rounds.clear();
        self.new_round();
    }

    fn check_completion(&mut self) -> bool {
        if self.state != PuzzleState::Running || self.ball_cell() != self.maze.end() {
            return false;
        }
        if self.rounds.bump() {
            self.state = PuzzleState::Completed;
            self.countdown.stop();
            tracing::info!(
                mazes = self.rounds.completed(),
                elapsed_secs = self.countdown.elapsed().as_secs_f64(),
                "maze puzzle completed"
            );
            return true;
        }
        tracing::debug!(
            completed = self.rounds.completed(),
            required = self.rounds.required(),
            "maze round finished"
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
            tracing::info!("maze puzzle expired");
            return Some(PuzzleState::Expired);
        }
        None
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
            puzzle_type: PuzzleType::MarbleMaze,
            state: self.state,
            progress: self.progress(),
            time_remaining_secs: self.time_remaining().as_secs_f64(),
            elapsed_secs: self.elapsed().as_secs_f64(),
            detail: PuzzleDetail::Maze {
                size: self.maze.size(),
                ball: self.ball,
                completed: self.rounds.completed(),
                required: self.rounds.required(),
            },
        }
    }
}
