//! `recur` CLI: evaluate recurrence rules, interval overlaps, bookable slots
//! and schedule conflicts from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Does a biweekly Monday/Thursday rule starting 2025-01-06 fire on a date?
//! recur matches --frequency biweekly --rule '{"days":["monday","thursday"]}' \
//!     --start 2025-01-06 --date 2025-01-20
//!
//! # Next three quarterly dates after a date
//! recur next --frequency quarterly --rule '{"days_of_month":[15]}' \
//!     --start 2025-02-15 --from 2025-03-01 --count 3
//!
//! # Overnight-aware overlap check with a 15 minute buffer
//! recur overlap 22:00 02:00 01:00 01:30 --buffer 15
//!
//! # Bookable hour slots for schedules read from a file
//! recur slots --date 2025-01-10 --slot-minutes 60 -i schedules.json
//!
//! # Conflicting pairs among schedules piped on stdin
//! cat schedules.json | recur conflicts
//! ```
//!
//! Every command prints JSON. Logs go to stderr; set `--log-level` or
//! `RUST_LOG` to see them.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Weekday};
use clap::{Parser, Subcommand};
use recurrence_engine::conflict::is_schedule_active_on;
use recurrence_engine::interval::{duration_minutes, is_overnight, periods_overlap_with_buffer};
use recurrence_engine::slots::bookable_slots_with;
use recurrence_engine::transport::{from_stored_with, ConfigMap};
use recurrence_engine::{
    find_all_conflicts, next_bookable_slot, EngineConfig, FrequencyRule, Schedule,
    ScheduleRecord, ScheduleType, TimeOfDay,
};
use serde_json::{json, Value};
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "recur",
    version,
    about = "Recurrence rules, overnight intervals and scheduling conflicts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON file with engine settings
    #[arg(long, global = true)]
    config: Option<String>,

    /// First day of the week used when anchoring weekly rules
    #[arg(long, global = true)]
    week_start: Option<String>,

    /// Minutes of padding around occupied periods
    #[arg(long, global = true)]
    buffer: Option<u32>,

    /// Days inspected when two open-ended schedules are checked for conflicts
    #[arg(long, global = true)]
    horizon_days: Option<u32>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a rule produces a date
    Matches {
        /// Frequency identifier, e.g. "weekly" or "every_3_weeks"
        #[arg(long)]
        frequency: String,

        /// Rule configuration as a JSON object
        #[arg(long, default_value = "{}")]
        rule: String,

        /// Date to test
        #[arg(long)]
        date: NaiveDate,

        /// Schedule start date; anchors the rule and rejects earlier dates
        #[arg(long)]
        start: Option<NaiveDate>,
    },
    /// List the next occurrences of a rule after a date
    Next {
        /// Frequency identifier, e.g. "monthly" or "every_4_months"
        #[arg(long)]
        frequency: String,

        /// Rule configuration as a JSON object
        #[arg(long, default_value = "{}")]
        rule: String,

        /// Occurrences are strictly after this date
        #[arg(long)]
        from: NaiveDate,

        /// Schedule start date used to anchor the rule
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Number of occurrences to list
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
    /// Check whether two time-of-day intervals overlap
    Overlap {
        start1: TimeOfDay,
        end1: TimeOfDay,
        start2: TimeOfDay,
        end2: TimeOfDay,
    },
    /// Partition availability into slots and mark the booked ones
    Slots {
        /// Input file with a JSON array of schedules (default: stdin)
        #[arg(short, long)]
        input: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,

        #[arg(long)]
        date: NaiveDate,

        #[arg(long)]
        slot_minutes: u32,
    },
    /// Find the first free slot on or after a date
    NextSlot {
        /// Input file with a JSON array of schedules (default: stdin)
        #[arg(short, long)]
        input: Option<String>,

        #[arg(long)]
        from: NaiveDate,

        #[arg(long)]
        slot_minutes: u32,
    },
    /// Report every conflicting pair of schedules
    Conflicts {
        /// Input file with a JSON array of schedules (default: stdin)
        #[arg(short, long)]
        input: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = load_config(&cli)?;
    debug!(?config, "engine settings");

    match cli.command {
        Commands::Matches {
            frequency,
            rule,
            date,
            start,
        } => {
            let rule = parse_rule(&frequency, &rule, &config)?;
            let matches = match start {
                Some(start) => is_schedule_active_on(&rule_schedule(start, rule), date),
                None => rule.should_create_instance(date),
            };
            print_json(&json!({
                "frequency": frequency,
                "date": date,
                "matches": matches,
            }))?;
        }
        Commands::Next {
            frequency,
            rule,
            from,
            start,
            count,
        } => {
            let mut rule = parse_rule(&frequency, &rule, &config)?;
            if let Some(start) = start {
                rule = rule.anchored(start);
            }
            let occurrences = next_occurrences(&rule, from, count);
            print_json(&json!({
                "frequency": frequency,
                "rrule": rule.to_rrule(),
                "occurrences": occurrences,
            }))?;
        }
        Commands::Overlap {
            start1,
            end1,
            start2,
            end2,
        } => {
            let overlaps =
                periods_overlap_with_buffer(start1, end1, start2, end2, i64::from(config.buffer_minutes));
            print_json(&json!({
                "overlaps": overlaps,
                "buffer_minutes": config.buffer_minutes,
                "first": interval_summary(start1, end1),
                "second": interval_summary(start2, end2),
            }))?;
        }
        Commands::Slots {
            input,
            output,
            date,
            slot_minutes,
        } => {
            let schedules = read_schedules(input.as_deref(), &config)?;
            let slots = bookable_slots_with(&schedules, date, slot_minutes, &config)
                .context("Failed to generate slots")?;
            let rendered = serde_json::to_string_pretty(&slots).context("Failed to serialize slots")?;
            write_output(output.as_deref(), &format!("{rendered}\n"))?;
        }
        Commands::NextSlot {
            input,
            from,
            slot_minutes,
        } => {
            let schedules = read_schedules(input.as_deref(), &config)?;
            let found = next_bookable_slot(&schedules, from, slot_minutes, &config)
                .context("Failed to search for a slot")?;
            let value = match found {
                Some((date, slot)) => json!({ "date": date, "slot": slot }),
                None => Value::Null,
            };
            print_json(&value)?;
        }
        Commands::Conflicts { input, output } => {
            let schedules = read_schedules(input.as_deref(), &config)?;
            let conflicts = find_all_conflicts(&schedules, &config);
            let rendered = serde_json::to_string_pretty(&conflicts)
                .context("Failed to serialize conflicts")?;
            write_output(output.as_deref(), &format!("{rendered}\n"))?;
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();
}

/// Defaults, then the `--config` file, then individual flags.
fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match cli.config.as_deref() {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        }
        None => EngineConfig::default(),
    };

    if let Some(name) = cli.week_start.as_deref() {
        config.week_start = match name.parse::<Weekday>() {
            Ok(day) => day,
            Err(_) => bail!("Unknown week start: '{}'", name),
        };
    }
    if let Some(buffer) = cli.buffer {
        config.buffer_minutes = buffer;
    }
    if let Some(days) = cli.horizon_days {
        config.conflict_horizon_days = days;
    }

    config.validate().context("Invalid engine settings")?;
    Ok(config)
}

fn parse_rule(frequency: &str, rule: &str, config: &EngineConfig) -> Result<FrequencyRule> {
    let map: ConfigMap =
        serde_json::from_str(rule).context("Rule configuration must be a JSON object")?;
    from_stored_with(frequency, &map, config)
        .with_context(|| format!("Invalid '{}' rule", frequency))
}

/// A throwaway recurring schedule so membership can be checked relative to
/// `start`.
fn rule_schedule(start: NaiveDate, rule: FrequencyRule) -> Schedule {
    Schedule::new("cli", "cli", ScheduleType::Custom, start).recurring(rule)
}

fn next_occurrences(rule: &FrequencyRule, from: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut found = Vec::with_capacity(count);
    let mut current = from;
    while found.len() < count {
        match rule.next_occurrence(current) {
            Some(next) => {
                found.push(next);
                current = next;
            }
            None => break,
        }
    }
    found
}

fn interval_summary(start: TimeOfDay, end: TimeOfDay) -> Value {
    json!({
        "start": start,
        "end": end,
        "overnight": is_overnight(start, end),
        "duration_minutes": duration_minutes(start, end),
    })
}

fn read_schedules(path: Option<&str>, config: &EngineConfig) -> Result<Vec<Schedule>> {
    let input = read_input(path)?;
    let records: Vec<ScheduleRecord> =
        serde_json::from_str(&input).context("Failed to parse schedules")?;
    records
        .into_iter()
        .map(|record| {
            let id = record.id.clone();
            record
                .into_schedule(config)
                .with_context(|| format!("Invalid schedule '{}'", id))
        })
        .collect()
}

fn print_json(value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", rendered);
    Ok(())
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
