use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Types of puzzles an alarm can be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PuzzleType {
    Math,
    MarbleMaze,
    Water,
}

impl PuzzleType {
    pub const ALL: [PuzzleType; 3] = [PuzzleType::Math, PuzzleType::MarbleMaze, PuzzleType::Water];

    pub fn display_name(self) -> &'static str {
        match self {
            PuzzleType::Math => "Math",
            PuzzleType::MarbleMaze => "Marble Maze",
            PuzzleType::Water => "Water",
        }
    }
}

impl FromStr for PuzzleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "math" => Ok(PuzzleType::Math),
            "marblemaze" | "maze" => Ok(PuzzleType::MarbleMaze),
            "water" => Ok(PuzzleType::Water),
            _ => Err(format!("unknown puzzle type: {s}")),
        }
    }
}

macro_rules! difficulty_enum {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub enum $name {
            Easy,
            #[default]
            Medium,
            Hard,
            Expert,
        }

        impl $name {
            pub const ALL: [$name; 4] = [$name::Easy, $name::Medium, $name::Hard, $name::Expert];

            pub fn display_name(self) -> &'static str {
                match self {
                    $name::Easy => "Easy",
                    $name::Medium => "Medium",
                    $name::Hard => "Hard",
                    $name::Expert => "Expert",
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .into_iter()
                    .find(|d| d.display_name().eq_ignore_ascii_case(s.trim()))
                    .ok_or_else(|| format!("unknown difficulty: {s}"))
            }
        }
    };
}

difficulty_enum!(
    /// Difficulty tiers for math puzzles.
    MathDifficulty
);
difficulty_enum!(
    /// Difficulty tiers for the marble maze.
    MazeDifficulty
);

fn default_problem_count() -> u32 {
    3
}
fn default_math_time_limit() -> u64 {
    60
}
fn default_one() -> u32 {
    1
}
fn default_motion_time_limit() -> u64 {
    300
}

/// Per-puzzle tuning carried by an alarm and copied into each puzzle it
/// spawns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleSettings {
    #[serde(default)]
    pub math_difficulty: MathDifficulty,
    #[serde(default = "default_problem_count")]
    pub math_problem_count: u32,
    #[serde(default = "default_math_time_limit")]
    pub math_time_limit_secs: u64,
    #[serde(default)]
    pub maze_difficulty: MazeDifficulty,
    #[serde(default = "default_one")]
    pub maze_completion_count: u32,
    #[serde(default = "default_motion_time_limit")]
    pub maze_time_limit_secs: u64,
    #[serde(default = "default_one")]
    pub water_completion_count: u32,
    #[serde(default = "default_motion_time_limit")]
    pub water_time_limit_secs: u64,
}

impl Default for PuzzleSettings {
    fn default() -> Self {
        Self {
            math_difficulty: MathDifficulty::Medium,
            math_problem_count: default_problem_count(),
            math_time_limit_secs: default_math_time_limit(),
            maze_difficulty: MazeDifficulty::Medium,
            maze_completion_count: default_one(),
            maze_time_limit_secs: default_motion_time_limit(),
            water_completion_count: default_one(),
            water_time_limit_secs: default_motion_time_limit(),
        }
    }
}
