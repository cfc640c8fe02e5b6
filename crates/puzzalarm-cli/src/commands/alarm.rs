use std::str::FromStr;

use chrono::NaiveTime;
use clap::{Args, Subcommand};
use puzzalarm_core::{
    Alarm, Config, MathDifficulty, MazeDifficulty, PuzzleType, VibrationPattern, Weekday,
};

use crate::common::{open_manager, parse_time, print_events, resolve_alarm, short_id, CliResult};

#[derive(Subcommand)]
pub enum AlarmAction {
    /// Create an alarm
    Add {
        /// Time of day (HH:MM)
        #[arg(value_parser = parse_time)]
        time: NaiveTime,
        #[command(flatten)]
        fields: AlarmFields,
    },
    /// List alarms
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one alarm as JSON
    Show {
        /// Alarm ID or unique prefix
        id: String,
    },
    /// Change an existing alarm
    Edit {
        /// Alarm ID or unique prefix
        id: String,
        /// New time of day (HH:MM)
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
        #[command(flatten)]
        fields: AlarmFields,
    },
    /// Delete an alarm
    Delete {
        /// Alarm ID or unique prefix
        id: String,
    },
    /// Enable a disabled alarm or disable an enabled one
    Toggle {
        /// Alarm ID or unique prefix
        id: String,
    },
    /// Fire an alarm now
    Trigger {
        /// Alarm ID or unique prefix
        id: String,
    },
    /// Record a snooze
    Snooze {
        /// Alarm ID or unique prefix
        id: String,
    },
    /// Dismiss a triggered alarm
    Dismiss {
        /// Alarm ID or unique prefix
        id: String,
        /// Seconds the puzzle took, if one was solved
        #[arg(long)]
        completion_secs: Option<f64>,
    },
}

/// Options shared by `add` and `edit`. Unset options keep the current value.
#[derive(Args)]
pub struct AlarmFields {
    /// Label shown when the alarm fires
    #[arg(long)]
    label: Option<String>,
    /// Sound name
    #[arg(long)]
    sound: Option<String>,
    /// Vibration pattern (none, standard, gentle, strong, custom)
    #[arg(long)]
    vibration: Option<VibrationPattern>,
    /// Repeat days, comma separated (e.g. mon,wed,fri); "once" clears them
    #[arg(long, value_delimiter = ',')]
    repeat: Option<Vec<RepeatDay>>,
    /// Puzzle gate (math, maze, water, none)
    #[arg(long)]
    puzzle: Option<PuzzleChoice>,
    /// Math difficulty (easy, medium, hard, expert)
    #[arg(long)]
    math_difficulty: Option<MathDifficulty>,
    /// Number of math problems to solve
    #[arg(long)]
    problems: Option<u32>,
    /// Maze difficulty (easy, medium, hard, expert)
    #[arg(long)]
    maze_difficulty: Option<MazeDifficulty>,
    /// Number of mazes to finish
    #[arg(long)]
    mazes: Option<u32>,
    /// Number of pours to land
    #[arg(long)]
    pours: Option<u32>,
    /// Create or leave the alarm disabled
    #[arg(long)]
    disabled: bool,
    /// Silent mode (vibration only)
    #[arg(long)]
    silent: Option<bool>,
    /// Gradually increase volume
    #[arg(long)]
    gradual: Option<bool>,
    /// Allow snoozing
    #[arg(long)]
    snooze: Option<bool>,
}

#[derive(Clone)]
pub struct PuzzleChoice(Option<PuzzleType>);

impl FromStr for PuzzleChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("none") {
            return Ok(PuzzleChoice(None));
        }
        s.parse().map(|kind| PuzzleChoice(Some(kind)))
    }
}

/// A weekday, or `once` for no repetition.
#[derive(Clone)]
pub struct RepeatDay(Option<Weekday>);

impl FromStr for RepeatDay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("once") {
            return Ok(RepeatDay(None));
        }
        s.parse().map(|day| RepeatDay(Some(day)))
    }
}

impl AlarmFields {
    fn apply(self, mut alarm: Alarm) -> Alarm {
        if let Some(label) = self.label {
            alarm.label = label;
        }
        if let Some(sound) = self.sound {
            alarm.sound_name = sound;
        }
        if let Some(vibration) = self.vibration {
            alarm.vibration_pattern = vibration;
        }
        if let Some(days) = self.repeat {
            alarm.repeat_days = days.into_iter().filter_map(|d| d.0).collect();
        }
        if let Some(PuzzleChoice(kind)) = self.puzzle {
            alarm.puzzle_type = kind;
        }
        let settings = &mut alarm.puzzle_settings;
        if let Some(difficulty) = self.math_difficulty {
            settings.math_difficulty = difficulty;
        }
        if let Some(count) = self.problems {
            settings.math_problem_count = count;
        }
        if let Some(difficulty) = self.maze_difficulty {
            settings.maze_difficulty = difficulty;
        }
        if let Some(count) = self.mazes {
            settings.maze_completion_count = count;
        }
        if let Some(count) = self.pours {
            settings.water_completion_count = count;
        }
        if self.disabled {
            alarm.is_enabled = false;
        }
        if let Some(silent) = self.silent {
            alarm.is_silent_mode = silent;
        }
        if let Some(gradual) = self.gradual {
            alarm.is_gradual_wakeup = gradual;
        }
        if let Some(snooze) = self.snooze {
            alarm.is_snooze_enabled = snooze;
        }
        alarm
    }
}

fn puzzle_label(alarm: &Alarm) -> &'static str {
    alarm.puzzle_type.map_or("-", PuzzleType::display_name)
}

pub fn run(action: AlarmAction, config: &Config) -> CliResult {
    let mut mgr = open_manager(config)?;
    let mut rx = mgr.subscribe();

    match action {
        AlarmAction::Add { time, fields } => {
            let mut alarm = Alarm::new(time);
            alarm.puzzle_settings = config.puzzle.clone();
            let alarm = fields.apply(alarm);
            let id = alarm.id;
            mgr.add_alarm(alarm);
            println!("Alarm created: {id}");
            if let Some(alarm) = mgr.alarm(id) {
                println!("{}", serde_json::to_string_pretty(alarm)?);
            }
            print_events(&mut rx)?;
        }
        AlarmAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(mgr.alarms())?);
            } else if mgr.alarms().is_empty() {
                println!("No alarms");
            } else {
                for alarm in mgr.alarms() {
                    println!(
                        "{}  {}  {:<3}  {:<12}  {:<11}  {}",
                        short_id(alarm.id),
                        alarm.time.format("%H:%M"),
                        if alarm.is_enabled { "on" } else { "off" },
                        alarm.repeat_summary(),
                        puzzle_label(alarm),
                        alarm.label,
                    );
                }
            }
        }
        AlarmAction::Show { id } => {
            let id = resolve_alarm(&mgr, &id)?;
            if let Some(alarm) = mgr.alarm(id) {
                println!("{}", serde_json::to_string_pretty(alarm)?);
            }
        }
        AlarmAction::Edit { id, time, fields } => {
            let id = resolve_alarm(&mgr, &id)?;
            let Some(current) = mgr.alarm(id).cloned() else {
                return Err(format!("alarm not found: {id}").into());
            };
            let mut alarm = fields.apply(current);
            if let Some(time) = time {
                alarm.time = time;
            }
            mgr.update_alarm(alarm);
            println!("Alarm updated:");
            if let Some(alarm) = mgr.alarm(id) {
                println!("{}", serde_json::to_string_pretty(alarm)?);
            }
            print_events(&mut rx)?;
        }
        AlarmAction::Delete { id } => {
            let id = resolve_alarm(&mgr, &id)?;
            mgr.delete_alarm(id);
            println!("Alarm deleted: {id}");
            print_events(&mut rx)?;
        }
        AlarmAction::Toggle { id } => {
            let id = resolve_alarm(&mgr, &id)?;
            mgr.toggle_alarm(id);
            print_events(&mut rx)?;
        }
        AlarmAction::Trigger { id } => {
            let id = resolve_alarm(&mgr, &id)?;
            mgr.trigger_alarm(id);
            print_events(&mut rx)?;
        }
        AlarmAction::Snooze { id } => {
            let id = resolve_alarm(&mgr, &id)?;
            mgr.snooze_alarm(id);
            print_events(&mut rx)?;
            tracing::info!(minutes = config.alarm.snooze_minutes, "snoozed");
        }
        AlarmAction::Dismiss {
            id,
            completion_secs,
        } => {
            let id = resolve_alarm(&mgr, &id)?;
            mgr.dismiss_alarm(id, completion_secs);
            print_events(&mut rx)?;
        }
    }
    Ok(())
}
