//! Smart date string parser.
//!
//! Grammars are tried in the order of [`GRAMMARS`]; the first one that matches
//! wins. A grammar either declines (`Ok(None)`), produces a rule, or rejects a
//! string it recognised but found invalid (an unknown weekday, say).

use std::sync::LazyLock;

use chrono::{NaiveTime, Weekday};
use regex::Regex;

use super::errors::ParseError;
use super::types::{DeltaUnit, Direction, RawDate, Rule};

type Grammar = fn(&str, Option<NaiveTime>) -> Result<Option<Rule>, ParseError>;

/// Grammars in priority order.
const GRAMMARS: [Grammar; 4] = [parse_direct, parse_delta, parse_first_available, parse_week];

static TIME_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i) at (\d{2}):(\d{2}):(\d{2})$").expect("valid regex")
});

static DIRECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z0-9_.]+)$").expect("valid regex"));

static DELTA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d+) (day|hour)s? (before|after) ([A-Za-z0-9_.]+)$")
        .expect("valid regex")
});

static FIRST_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^first\s+([A-Za-z0-9_ ]+?)\s+(before|after)\s+([A-Za-z0-9_.]+)$")
        .expect("valid regex")
});

static WEEK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([A-Za-z0-9_]+) of week (\d+)$").expect("valid regex")
});

/// Parse one batch entry into a rule.
pub fn parse(raw: &RawDate) -> Result<Rule, ParseError> {
    match raw {
        RawDate::Value(value) => Ok(Rule::Literal(*value)),
        RawDate::Expr(s) => parse_expr(s),
    }
}

/// Parse a smart date string.
///
/// Field names are kept exactly as written; every other word is matched
/// case-insensitively.
pub fn parse_expr(input: &str) -> Result<Rule, ParseError> {
    let (body, time) = split_time(input)?;

    for grammar in GRAMMARS {
        if let Some(rule) = grammar(body, time)? {
            return Ok(rule);
        }
    }

    Err(ParseError::NoMatch(input.to_string()))
}

/// Strip a trailing ` at HH:MM:SS`, returning the rest and the parsed time.
fn split_time(s: &str) -> Result<(&str, Option<NaiveTime>), ParseError> {
    let Some(caps) = TIME_SUFFIX_RE.captures(s) else {
        return Ok((s, None));
    };

    let raw = format!("{}:{}:{}", &caps[1], &caps[2], &caps[3]);
    let component = |i: usize| {
        caps[i].parse::<u32>().map_err(|_| ParseError::InvalidTime(raw.clone()))
    };
    let time = NaiveTime::from_hms_opt(component(1)?, component(2)?, component(3)?)
        .ok_or_else(|| ParseError::InvalidTime(raw.clone()))?;

    let start = caps.get(0).map_or(s.len(), |m| m.start());
    Ok((&s[..start], Some(time)))
}

fn parse_direct(s: &str, time: Option<NaiveTime>) -> Result<Option<Rule>, ParseError> {
    Ok(DIRECT_RE
        .captures(s)
        .map(|caps| Rule::DirectReference { referent: caps[1].to_string(), time }))
}

fn parse_delta(s: &str, time: Option<NaiveTime>) -> Result<Option<Rule>, ParseError> {
    let Some(caps) = DELTA_RE.captures(s) else {
        return Ok(None);
    };

    let amount: u32 =
        caps[1].parse().map_err(|_| ParseError::InvalidNumber(caps[1].to_string()))?;

    let unit = if caps[2].eq_ignore_ascii_case("hour") {
        DeltaUnit::Hours
    } else {
        DeltaUnit::Days
    };

    Ok(Some(Rule::DeltaReference {
        referent: caps[4].to_string(),
        amount,
        unit,
        direction: parse_direction(&caps[3]),
        time,
    }))
}

fn parse_first_available(
    s: &str,
    time: Option<NaiveTime>,
) -> Result<Option<Rule>, ParseError> {
    let s = s.replace(',', " ");
    let Some(caps) = FIRST_RE.captures(&s) else {
        return Ok(None);
    };

    let mut weekdays = Vec::new();
    for word in caps[1].split_whitespace().filter(|w| !w.eq_ignore_ascii_case("or")) {
        let weekday = parse_weekday(word)?;
        if !weekdays.contains(&weekday) {
            weekdays.push(weekday);
        }
    }

    if weekdays.is_empty() {
        return Ok(None);
    }

    Ok(Some(Rule::FirstAvailableReference {
        referent: caps[3].to_string(),
        weekdays,
        direction: parse_direction(&caps[2]),
        time,
    }))
}

fn parse_week(s: &str, time: Option<NaiveTime>) -> Result<Option<Rule>, ParseError> {
    let Some(caps) = WEEK_RE.captures(s) else {
        return Ok(None);
    };

    let weekday = parse_weekday(&caps[1])?;
    let week_number: u32 = caps[2]
        .parse()
        .map_err(|_| ParseError::InvalidWeekNumber(caps[2].to_string()))?;
    if week_number == 0 {
        return Err(ParseError::InvalidWeekNumber(caps[2].to_string()));
    }

    Ok(Some(Rule::WeekReference { week_number, weekday, time }))
}

fn parse_direction(s: &str) -> Direction {
    if s.eq_ignore_ascii_case("before") {
        Direction::Before
    } else {
        Direction::After
    }
}

/// Full English weekday names only, any case.
fn parse_weekday(s: &str) -> Result<Weekday, ParseError> {
    match s.to_lowercase().as_str() {
        "monday" => Ok(Weekday::Mon),
        "tuesday" => Ok(Weekday::Tue),
        "wednesday" => Ok(Weekday::Wed),
        "thursday" => Ok(Weekday::Thu),
        "friday" => Ok(Weekday::Fri),
        "saturday" => Ok(Weekday::Sat),
        "sunday" => Ok(Weekday::Sun),
        _ => Err(ParseError::InvalidWeekday(s.to_string())),
    }
}
