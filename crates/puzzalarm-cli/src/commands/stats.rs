use clap::Args;
use puzzalarm_core::Config;

use crate::common::{open_manager, resolve_alarm, CliResult};

#[derive(Args)]
pub struct StatsArgs {
    /// Only this alarm (ID or unique prefix)
    #[arg(long)]
    alarm: Option<String>,
}

pub fn run(args: StatsArgs, config: &Config) -> CliResult {
    let mgr = open_manager(config)?;

    match args.alarm {
        Some(input) => {
            let id = resolve_alarm(&mgr, &input)?;
            match mgr.alarm_statistics(id) {
                Some(stats) => println!("{}", serde_json::to_string_pretty(stats)?),
                None => println!("No statistics for alarm: {id}"),
            }
        }
        None => {
            println!("{}", serde_json::to_string_pretty(mgr.statistics())?);
        }
    }
    Ok(())
}
