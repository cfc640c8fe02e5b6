use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use clap::{Args, Subcommand};
use puzzalarm_core::{
    ActivePuzzle, AlarmId, AlarmManager, Config, MathDifficulty, MazeDifficulty, Puzzle,
    PuzzleSettings, PuzzleState, PuzzleType, TiltVector,
};

use crate::common::{open_manager, print_events, resolve_alarm, CliResult};

#[derive(Subcommand)]
pub enum PuzzleAction {
    /// Answer arithmetic questions read from stdin
    Math {
        #[command(flatten)]
        common: PuzzleArgs,
        /// Difficulty (easy, medium, hard, expert)
        #[arg(long)]
        difficulty: Option<MathDifficulty>,
        /// Problems to solve
        #[arg(long)]
        count: Option<u32>,
        /// Time limit in seconds
        #[arg(long)]
        time_limit: Option<u64>,
    },
    /// Roll the marble with an automatic solver
    Maze {
        #[command(flatten)]
        common: PuzzleArgs,
        /// Difficulty (easy, medium, hard, expert)
        #[arg(long)]
        difficulty: Option<MazeDifficulty>,
        /// Mazes to finish
        #[arg(long)]
        count: Option<u32>,
        /// Print each maze before solving it
        #[arg(long)]
        render: bool,
    },
    /// Pour water with an automatic solver
    Water {
        #[command(flatten)]
        common: PuzzleArgs,
        /// Pours to land
        #[arg(long)]
        count: Option<u32>,
        /// Goal level for the first pour (0.2 - 0.8)
        #[arg(long)]
        target: Option<f64>,
    },
}

#[derive(Args)]
pub struct PuzzleArgs {
    /// Use this alarm's puzzle settings and dismiss it on success
    #[arg(long)]
    alarm: Option<String>,
    /// Seed for reproducible puzzles
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated tick length for the automatic solvers
    #[arg(long)]
    tick_ms: Option<u64>,
}

/// Puzzle session bound to an optional alarm.
struct Session {
    manager: Option<(AlarmManager, AlarmId)>,
    settings: PuzzleSettings,
    seed: Option<u64>,
    tick: Duration,
}

impl Session {
    fn open(args: &PuzzleArgs, config: &Config) -> CliResult<Self> {
        let tick_ms = args.tick_ms.unwrap_or(config.simulation.tick_ms).max(1);
        let mut session = Session {
            manager: None,
            settings: config.puzzle.clone(),
            seed: args.seed,
            tick: Duration::from_millis(tick_ms),
        };
        if let Some(input) = &args.alarm {
            let mgr = open_manager(config)?;
            let id = resolve_alarm(&mgr, input)?;
            if let Some(alarm) = mgr.alarm(id) {
                session.settings = alarm.puzzle_settings.clone();
            }
            session.manager = Some((mgr, id));
        }
        Ok(session)
    }

    fn build(&self, kind: PuzzleType) -> ActivePuzzle {
        match self.seed {
            Some(seed) => ActivePuzzle::with_seed(kind, &self.settings, seed),
            None => ActivePuzzle::new(kind, &self.settings),
        }
    }

    /// Print the outcome and dismiss the bound alarm on success.
    fn finish(self, puzzle: &ActivePuzzle) -> CliResult {
        if let Some(event) = puzzle.outcome_event() {
            println!("{}", serde_json::to_string(&event)?);
        }
        println!("{}", serde_json::to_string_pretty(&puzzle.snapshot())?);

        if !puzzle.is_completed() {
            return Err(format!("puzzle not completed ({:?})", puzzle.state()).into());
        }
        if let Some((mut mgr, id)) = self.manager {
            let mut rx = mgr.subscribe();
            mgr.dismiss_alarm(id, Some(puzzle.elapsed().as_secs_f64()));
            println!("Alarm dismissed: {id}");
            print_events(&mut rx)?;
        }
        Ok(())
    }
}

pub fn run(action: PuzzleAction, config: &Config) -> CliResult {
    match action {
        PuzzleAction::Math {
            common,
            difficulty,
            count,
            time_limit,
        } => {
            let mut session = Session::open(&common, config)?;
            if let Some(difficulty) = difficulty {
                session.settings.math_difficulty = difficulty;
            }
            if let Some(count) = count {
                session.settings.math_problem_count = count;
            }
            if let Some(secs) = time_limit {
                session.settings.math_time_limit_secs = secs;
            }
            let puzzle = play_math(&session)?;
            session.finish(&puzzle)
        }
        PuzzleAction::Maze {
            common,
            difficulty,
            count,
            render,
        } => {
            let mut session = Session::open(&common, config)?;
            if let Some(difficulty) = difficulty {
                session.settings.maze_difficulty = difficulty;
            }
            if let Some(count) = count {
                session.settings.maze_completion_count = count;
            }
            let puzzle = solve_maze(&session, render);
            session.finish(&puzzle)
        }
        PuzzleAction::Water {
            common,
            count,
            target,
        } => {
            let mut session = Session::open(&common, config)?;
            if let Some(count) = count {
                session.settings.water_completion_count = count;
            }
            let puzzle = solve_water(&session, target);
            session.finish(&puzzle)
        }
    }
}

/// Question on stdout, answer from stdin, until done, timed out or EOF.
fn play_math(session: &Session) -> CliResult<ActivePuzzle> {
    let mut puzzle = session.build(PuzzleType::Math);
    puzzle.start();

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = std::io::stdout();
    let mut last = Instant::now();

    while puzzle.state() == PuzzleState::Running {
        let Some(question) = puzzle
            .as_math_mut()
            .and_then(|m| m.current_problem().map(|p| p.question_text()))
        else {
            break;
        };
        writeln!(stdout, "{question}")?;
        stdout.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        let now = Instant::now();
        if puzzle.advance(now - last) == Some(PuzzleState::Expired) {
            writeln!(stdout, "time's up")?;
            break;
        }
        last = now;

        if let Some(math) = puzzle.as_math_mut() {
            let verdict = if math.submit_text(&line) { "correct" } else { "wrong" };
            writeln!(stdout, "{verdict}")?;
        }
    }
    Ok(puzzle)
}

fn solve_maze(session: &Session, render: bool) -> ActivePuzzle {
    let mut puzzle = session.build(PuzzleType::MarbleMaze);
    puzzle.start();
    let mut shown = None;

    while puzzle.state() == PuzzleState::Running {
        let Some(maze) = puzzle.as_maze_mut() else {
            break;
        };
        if render && shown != Some(maze.completed_mazes()) {
            println!("{}", maze.maze().render(Some(maze.ball_position())));
            shown = Some(maze.completed_mazes());
        }
        match maze.hint_tilt() {
            Some(tilt) => puzzle.apply_tilt(tilt),
            None => {
                puzzle.check_completion();
            }
        }
        puzzle.advance(session.tick);
    }
    puzzle
}

fn solve_water(session: &Session, target: Option<f64>) -> ActivePuzzle {
    let mut puzzle = session.build(PuzzleType::Water);
    if let (Some(level), Some(water)) = (target, puzzle.as_water_mut()) {
        water.set_target_level(level);
    }
    puzzle.start();
    let pour = TiltVector::new(1.0, 0.0);

    while puzzle.state() == PuzzleState::Running {
        if puzzle.as_water_mut().is_some_and(|w| !w.is_pouring()) {
            puzzle.apply_tilt(pour);
        }
        puzzle.advance(session.tick);
        // Stop as soon as the level is in tolerance.
        puzzle.check_completion();
    }
    puzzle
}
