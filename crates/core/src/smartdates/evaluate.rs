//! Evaluation of a single rule against an environment.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use super::errors::ResolutionError;
use super::types::{DateContext, DeltaUnit, Rule, Temporal};

/// Values visible to rules while a batch is being resolved.
pub type Environment = BTreeMap<String, Temporal>;

/// Compute the concrete value of `rule`.
///
/// Every referent must already be in `env`; ordering the batch is the
/// caller's job.
pub fn evaluate(
    rule: &Rule,
    env: &Environment,
    context: &DateContext,
) -> Result<Temporal, ResolutionError> {
    match rule {
        Rule::Literal(value) => Ok(*value),

        Rule::DirectReference { referent, time } => Ok(lookup(env, referent)?.overlay(*time)),

        Rule::DeltaReference { referent, amount, unit, direction, time } => {
            let base = lookup(env, referent)?;
            let amount = i64::from(*amount) * direction.sign();
            match unit {
                DeltaUnit::Days => {
                    let shifted =
                        base.checked_add_days(amount).ok_or(ResolutionError::OutOfRange)?;
                    Ok(shifted.overlay(*time))
                }
                DeltaUnit::Hours => {
                    let Temporal::DateTime(dt) = base else {
                        return Err(ResolutionError::HoursDeltaOnDate(referent.clone()));
                    };
                    if time.is_some() {
                        return Err(ResolutionError::HoursDeltaWithTime);
                    }
                    Duration::try_hours(amount)
                        .and_then(|delta| dt.checked_add_signed(delta))
                        .map(Temporal::DateTime)
                        .ok_or(ResolutionError::OutOfRange)
                }
            }
        }

        Rule::FirstAvailableReference { referent, weekdays, direction, time } => {
            if weekdays.is_empty() {
                return Err(ResolutionError::NoWeekdays(referent.clone()));
            }
            let base = lookup(env, referent)?;
            let step = direction.sign();

            let mut candidate = base;
            for _ in 0..7 {
                candidate = candidate.checked_add_days(step).ok_or(ResolutionError::OutOfRange)?;
                if weekdays.contains(&candidate.date().weekday()) {
                    return Ok(candidate.overlay(*time));
                }
            }
            // Seven consecutive days cover every weekday.
            Err(ResolutionError::OutOfRange)
        }

        Rule::WeekReference { week_number, weekday, time } => {
            let start = context.start_of_week_one.ok_or(ResolutionError::MissingWeekAnchor)?;
            let day = week_day(start, *week_number, *weekday)?;
            Ok(Temporal::Date(day).overlay(*time))
        }
    }
}

fn lookup(env: &Environment, referent: &str) -> Result<Temporal, ResolutionError> {
    env.get(referent)
        .copied()
        .ok_or_else(|| ResolutionError::UnknownReference(referent.to_string()))
}

/// The first `weekday` on or after the start of week `week_number`.
fn week_day(
    start_of_week_one: NaiveDate,
    week_number: u32,
    weekday: Weekday,
) -> Result<NaiveDate, ResolutionError> {
    let week_start = Duration::try_weeks(i64::from(week_number.saturating_sub(1)))
        .and_then(|offset| start_of_week_one.checked_add_signed(offset))
        .ok_or(ResolutionError::OutOfRange)?;

    week_start
        .iter_days()
        .take(7)
        .find(|d| d.weekday() == weekday)
        .ok_or(ResolutionError::OutOfRange)
}
