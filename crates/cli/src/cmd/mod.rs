pub mod calendar;
pub mod release;

use chrono::{Duration, Local, NaiveDateTime};
use publish_core::config::types::ResolvedConfig;
use publish_core::discovery::{DiscoverOptions, discover};
use publish_core::smartdates::{DateContext, Temporal};
use publish_core::tree::{UnbuiltArtifact, Universe};
use tracing::error;

use crate::DiscoverArgs;

/// Discover the input tree, with flags taking precedence over config values.
/// Exits on failure.
pub(crate) fn discover_input(
    rc: &ResolvedConfig,
    args: &DiscoverArgs,
) -> Universe<UnbuiltArtifact> {
    let skip_directories = if args.skip_directories.is_empty() {
        rc.skip_directories.clone()
    } else {
        args.skip_directories.clone()
    };

    let mut date_context = DateContext::new();
    if let Some(start) = args.start_of_week_one.or(rc.start_of_week_one) {
        date_context = date_context.with_start_of_week_one(start);
    }

    let options = DiscoverOptions { skip_directories, date_context };
    match discover(&args.input, &options) {
        Ok(universe) => universe,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

/// The time to run as. Exits when `--now` cannot be parsed.
pub(crate) fn resolve_now(now: Option<&str>) -> NaiveDateTime {
    match parse_now(now, Local::now().naive_local()) {
        Ok(t) => t,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    }
}

/// `--now` is either a whole number of days from `current` or a date/datetime.
fn parse_now(now: Option<&str>, current: NaiveDateTime) -> Result<NaiveDateTime, String> {
    let Some(s) = now else {
        return Ok(current);
    };

    if let Ok(days) = s.trim().parse::<i64>() {
        return Duration::try_days(days)
            .and_then(|d| current.checked_add_signed(d))
            .ok_or_else(|| format!("--now offset of {days} days is out of range"));
    }

    match Temporal::parse(s.trim()) {
        Some(Temporal::DateTime(dt)) => Ok(dt),
        Some(Temporal::Date(d)) => Ok(d.and_time(chrono::NaiveTime::MIN)),
        None => Err(format!("--now expects a number of days or a datetime, got '{s}'")),
    }
}
