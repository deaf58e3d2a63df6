//! Values, rules and context used by the smart-date engine.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Prefix under which the previous publication's metadata is visible.
pub const PREVIOUS_PREFIX: &str = "previous.metadata.";

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A concrete date or datetime.
///
/// The two are kept apart: arithmetic never changes one into the other, only
/// combining with an explicit time of day promotes a date to a datetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Temporal {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Temporal {
    /// The calendar day, dropping any time of day.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(d) => *d,
            Self::DateTime(dt) => dt.date(),
        }
    }

    pub fn is_datetime(&self) -> bool {
        matches!(self, Self::DateTime(_))
    }

    /// Combine with a time of day, overwriting any existing one.
    pub fn with_time(&self, time: NaiveTime) -> Self {
        Self::DateTime(self.date().and_time(time))
    }

    /// Apply an optional time-of-day overlay.
    pub fn overlay(self, time: Option<NaiveTime>) -> Self {
        match time {
            Some(t) => self.with_time(t),
            None => self,
        }
    }

    /// Shift by whole days, keeping the date/datetime kind.
    pub fn checked_add_days(&self, days: i64) -> Option<Self> {
        let delta = Duration::try_days(days)?;
        match self {
            Self::Date(d) => d.checked_add_signed(delta).map(Self::Date),
            Self::DateTime(dt) => dt.checked_add_signed(delta).map(Self::DateTime),
        }
    }

    /// Parse `YYYY-MM-DD` as a date, or `YYYY-MM-DD HH:MM:SS` (space or `T`
    /// separated) as a datetime.
    pub fn parse(s: &str) -> Option<Self> {
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Self::DateTime(dt));
            }
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT).ok().map(Self::Date)
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<NaiveDate> for Temporal {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveDateTime> for Temporal {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl Serialize for Temporal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Temporal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("not a date or datetime: {s}")))
    }
}

/// One entry of a batch: either an expression still to be parsed or a value
/// that is already concrete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDate {
    Expr(String),
    Value(Temporal),
}

impl From<&str> for RawDate {
    fn from(s: &str) -> Self {
        Self::Expr(s.to_string())
    }
}

impl From<String> for RawDate {
    fn from(s: String) -> Self {
        Self::Expr(s)
    }
}

impl From<Temporal> for RawDate {
    fn from(t: Temporal) -> Self {
        Self::Value(t)
    }
}

impl From<NaiveDate> for RawDate {
    fn from(d: NaiveDate) -> Self {
        Self::Value(Temporal::Date(d))
    }
}

impl From<NaiveDateTime> for RawDate {
    fn from(dt: NaiveDateTime) -> Self {
        Self::Value(Temporal::DateTime(dt))
    }
}

/// Direction of a relative expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

impl Direction {
    pub fn sign(self) -> i64 {
        match self {
            Self::Before => -1,
            Self::After => 1,
        }
    }
}

/// Units for delta references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaUnit {
    Days,
    Hours,
}

/// A parsed smart date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Already a concrete value.
    Literal(Temporal),
    /// `due`, `due at 23:59:00`
    DirectReference { referent: String, time: Option<NaiveTime> },
    /// `7 days before due`
    DeltaReference {
        referent: String,
        amount: u32,
        unit: DeltaUnit,
        direction: Direction,
        time: Option<NaiveTime>,
    },
    /// `first monday or friday after due`; never the referent's own day.
    FirstAvailableReference {
        referent: String,
        weekdays: Vec<Weekday>,
        direction: Direction,
        time: Option<NaiveTime>,
    },
    /// `tuesday of week 2`, counted from the start of week one.
    WeekReference { week_number: u32, weekday: Weekday, time: Option<NaiveTime> },
}

impl Rule {
    /// The field this rule depends on, if any.
    pub fn referent(&self) -> Option<&str> {
        match self {
            Self::DirectReference { referent, .. }
            | Self::DeltaReference { referent, .. }
            | Self::FirstAvailableReference { referent, .. } => Some(referent),
            Self::Literal(_) | Self::WeekReference { .. } => None,
        }
    }
}

/// Everything known before a batch is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateContext {
    /// Values that rules may refer to by name.
    pub known: BTreeMap<String, Temporal>,
    /// First day of week one, needed by week references.
    pub start_of_week_one: Option<NaiveDate>,
    /// Resolved metadata of the previous publication, exposed under
    /// `previous.metadata.<name>`.
    pub previous: Option<BTreeMap<String, Temporal>>,
}

impl DateContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known(mut self, known: BTreeMap<String, Temporal>) -> Self {
        self.known = known;
        self
    }

    pub fn with_start_of_week_one(mut self, start: NaiveDate) -> Self {
        self.start_of_week_one = Some(start);
        self
    }

    pub fn with_previous(mut self, previous: BTreeMap<String, Temporal>) -> Self {
        self.previous = Some(previous);
        self
    }
}
