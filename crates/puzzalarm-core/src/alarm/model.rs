use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::settings::{PuzzleSettings, PuzzleType};

/// Identifier assigned to an alarm at creation. Never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmId(pub Uuid);

impl AlarmId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AlarmId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlarmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AlarmId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

/// Days of the week for recurring alarms.
///
/// Declaration order is Monday first, so a `BTreeSet<Weekday>` iterates in
/// display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "Mon")]
    Monday,
    #[serde(rename = "Tue")]
    Tuesday,
    #[serde(rename = "Wed")]
    Wednesday,
    #[serde(rename = "Thu")]
    Thursday,
    #[serde(rename = "Fri")]
    Friday,
    #[serde(rename = "Sat")]
    Saturday,
    #[serde(rename = "Sun")]
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn abbreviation(self) -> &'static str {
        match self {
            Weekday::Monday => "Mon",
            Weekday::Tuesday => "Tue",
            Weekday::Wednesday => "Wed",
            Weekday::Thursday => "Thu",
            Weekday::Friday => "Fri",
            Weekday::Saturday => "Sat",
            Weekday::Sunday => "Sun",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, Weekday::Saturday | Weekday::Sunday)
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl FromStr for Weekday {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Weekday::ALL
            .into_iter()
            .find(|d| {
                d.abbreviation().to_ascii_lowercase() == needle
                    || d.full_name().to_ascii_lowercase() == needle
            })
            .ok_or_else(|| format!("unknown weekday: {s}"))
    }
}

/// Vibration patterns for alarms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VibrationPattern {
    None,
    #[default]
    Standard,
    Gentle,
    Strong,
    Custom,
}

impl VibrationPattern {
    pub const ALL: [VibrationPattern; 5] = [
        VibrationPattern::None,
        VibrationPattern::Standard,
        VibrationPattern::Gentle,
        VibrationPattern::Strong,
        VibrationPattern::Custom,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            VibrationPattern::None => "None",
            VibrationPattern::Standard => "Standard",
            VibrationPattern::Gentle => "Gentle",
            VibrationPattern::Strong => "Strong",
            VibrationPattern::Custom => "Custom",
        }
    }
}

impl FromStr for VibrationPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VibrationPattern::ALL
            .into_iter()
            .find(|v| v.display_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown vibration pattern: {s}"))
    }
}

fn default_true() -> bool {
    true
}

fn default_label() -> String {
    "Alarm".into()
}

fn default_sound() -> String {
    "default".into()
}

/// An alarm with all its configuration options.
///
/// Fields added after the first release carry `#[serde(default)]` so blobs
/// written by older builds still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    /// Time of day the alarm fires, in local time.
    pub time: NaiveTime,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default = "default_sound")]
    pub sound_name: String,
    #[serde(default)]
    pub vibration_pattern: VibrationPattern,
    #[serde(default)]
    pub is_silent_mode: bool,
    #[serde(default)]
    pub is_gradual_wakeup: bool,
    #[serde(default = "default_true")]
    pub is_snooze_enabled: bool,
    /// Empty means one-time.
    #[serde(default)]
    pub repeat_days: BTreeSet<Weekday>,
    #[serde(default)]
    pub puzzle_type: Option<PuzzleType>,
    #[serde(default)]
    pub puzzle_settings: PuzzleSettings,
}

impl Alarm {
    /// Create an enabled one-time alarm at `time` with a fresh id.
    pub fn new(time: NaiveTime) -> Self {
        Self {
            id: AlarmId::new(),
            time,
            is_enabled: true,
            label: default_label(),
            sound_name: default_sound(),
            vibration_pattern: VibrationPattern::Standard,
            is_silent_mode: false,
            is_gradual_wakeup: false,
            is_snooze_enabled: true,
            repeat_days: BTreeSet::new(),
            puzzle_type: None,
            puzzle_settings: PuzzleSettings::default(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.is_enabled = enabled;
        self
    }

    pub fn with_sound(mut self, sound_name: impl Into<String>) -> Self {
        self.sound_name = sound_name.into();
        self
    }

    pub fn with_vibration(mut self, pattern: VibrationPattern) -> Self {
        self.vibration_pattern = pattern;
        self
    }

    pub fn with_repeat_days(mut self, days: impl IntoIterator<Item = Weekday>) -> Self {
        self.repeat_days = days.into_iter().collect();
        self
    }

    pub fn with_puzzle(mut self, kind: PuzzleType, settings: PuzzleSettings) -> Self {
        self.puzzle_type = Some(kind);
        self.puzzle_settings = settings;
        self
    }

    pub fn is_one_time(&self) -> bool {
        self.repeat_days.is_empty()
    }

    pub fn is_daily(&self) -> bool {
        self.repeat_days.len() == Weekday::ALL.len()
    }

    /// Repeat days sorted Monday through Sunday.
    pub fn sorted_repeat_days(&self) -> Vec<Weekday> {
        self.repeat_days.iter().copied().collect()
    }

    /// Short human-readable summary of the repeat pattern.
    pub fn repeat_summary(&self) -> String {
        if self.is_one_time() {
            return "Once".into();
        }
        if self.is_daily() {
            return "Every day".into();
        }
        let weekdays = self.repeat_days.iter().all(|d| !d.is_weekend());
        let weekends = self.repeat_days.iter().all(|d| d.is_weekend());
        if weekdays && self.repeat_days.len() == 5 {
            return "Weekdays".into();
        }
        if weekends && self.repeat_days.len() == 2 {
            return "Weekends".into();
        }
        self.repeat_days
            .iter()
            .map(|d| d.abbreviation())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seven() -> NaiveTime {
        NaiveTime::from_hms_opt(7, 0, 0).unwrap()
    }

    #[test]
    fn new_alarm_has_original_defaults() {
        let alarm = Alarm::new(seven()).with_label("Test Alarm");
        assert_eq!(alarm.label, "Test Alarm");
        assert!(alarm.is_enabled);
        assert_eq!(alarm.sound_name, "default");
        assert_eq!(alarm.vibration_pattern, VibrationPattern::Standard);
        assert!(!alarm.is_silent_mode);
        assert!(!alarm.is_gradual_wakeup);
        assert!(alarm.is_snooze_enabled);
        assert!(alarm.is_one_time());
        assert!(alarm.puzzle_type.is_none());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(Alarm::new(seven()).id, Alarm::new(seven()).id);
    }

    #[test]
    fn repeat_days_display_monday_first() {
        let alarm = Alarm::new(seven()).with_repeat_days([
            Weekday::Sunday,
            Weekday::Wednesday,
            Weekday::Monday,
            Weekday::Wednesday,
        ]);
        assert_eq!(
            alarm.sorted_repeat_days(),
            vec![Weekday::Monday, Weekday::Wednesday, Weekday::Sunday]
        );
        assert_eq!(alarm.repeat_summary(), "Mon Wed Sun");
    }

    #[test]
    fn daily_and_grouped_summaries() {
        let daily = Alarm::new(seven()).with_repeat_days(Weekday::ALL);
        assert!(daily.is_daily());
        assert_eq!(daily.repeat_summary(), "Every day");

        let work = Alarm::new(seven()).with_repeat_days(Weekday::ALL.into_iter().take(5));
        assert_eq!(work.repeat_summary(), "Weekdays");

        let weekend = Alarm::new(seven()).with_repeat_days([Weekday::Saturday, Weekday::Sunday]);
        assert_eq!(weekend.repeat_summary(), "Weekends");
    }

    #[test]
    fn weekday_names() {
        assert_eq!(Weekday::Monday.full_name(), "Monday");
        assert_eq!(Weekday::Friday.abbreviation(), "Fri");
        assert_eq!("thursday".parse::<Weekday>().unwrap(), Weekday::Thursday);
        assert_eq!("SAT".parse::<Weekday>().unwrap(), Weekday::Saturday);
        assert!("funday".parse::<Weekday>().is_err());
    }

    #[test]
    fn vibration_patterns() {
        assert_eq!(VibrationPattern::ALL.len(), 5);
        assert_eq!("gentle".parse::<VibrationPattern>().unwrap(), VibrationPattern::Gentle);
    }

    #[test]
    fn serialized_weekdays_use_abbreviations() {
        let alarm = Alarm::new(seven()).with_repeat_days([Weekday::Tuesday]);
        let json = serde_json::to_value(&alarm).unwrap();
        assert_eq!(json["repeat_days"], serde_json::json!(["Tue"]));
        assert_eq!(json["time"], "07:00:00");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let json = r#"{"id":"5c4cf4a4-3b9e-4a7e-9a49-4a3f1c2b9d10","time":"06:30:00"}"#;
        let alarm: Alarm = serde_json::from_str(json).unwrap();
        assert!(alarm.is_enabled);
        assert!(alarm.is_snooze_enabled);
        assert_eq!(alarm.label, "Alarm");
        assert!(alarm.repeat_days.is_empty());
    }
}
