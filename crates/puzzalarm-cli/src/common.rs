//! Helpers shared by the subcommands.

use chrono::NaiveTime;
use puzzalarm_core::events::drain;
use puzzalarm_core::{AlarmId, AlarmManager, Config, Event, LogScheduler, SqliteStore};
use tokio::sync::broadcast;

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Manager over the on-disk store, scheduling through the log.
pub fn open_manager(config: &Config) -> CliResult<AlarmManager> {
    let store = SqliteStore::open()?;
    Ok(AlarmManager::new(Box::new(store), Box::new(LogScheduler)).with_config(config.alarm.clone()))
}

/// Resolve a full id or an unambiguous prefix of one.
pub fn resolve_alarm(mgr: &AlarmManager, input: &str) -> CliResult<AlarmId> {
    if let Ok(id) = input.parse::<AlarmId>() {
        if mgr.alarm(id).is_some() {
            return Ok(id);
        }
        return Err(format!("alarm not found: {input}").into());
    }

    let needle = input.to_ascii_lowercase();
    let mut matches = mgr
        .alarms()
        .iter()
        .filter(|a| a.id.to_string().starts_with(&needle));
    match (matches.next(), matches.next()) {
        (Some(alarm), None) if !needle.is_empty() => Ok(alarm.id),
        (Some(_), Some(_)) => Err(format!("ambiguous alarm id: {input}").into()),
        _ => Err(format!("alarm not found: {input}").into()),
    }
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time(input: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(input, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(input, "%H:%M:%S"))
        .map_err(|_| format!("invalid time '{input}', expected HH:MM"))
}

/// Print every event queued on `rx` as one JSON object per line.
pub fn print_events(rx: &mut broadcast::Receiver<Event>) -> CliResult {
    for event in drain(rx) {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

pub fn short_id(id: AlarmId) -> String {
    id.to_string().chars().take(8).collect()
}
