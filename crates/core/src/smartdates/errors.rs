//! Error types for smart-date parsing, ordering and evaluation.

use thiserror::Error;

/// A smart date string that matches no grammar, or matches one but carries
/// an invalid part.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("the smart date string is invalid: {0}")]
    NoMatch(String),

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("invalid day of week: {0}")]
    InvalidWeekday(String),

    #[error("invalid number in smart date: {0}")]
    InvalidNumber(String),

    #[error("invalid week number: {0} (weeks are numbered from 1)")]
    InvalidWeekNumber(String),
}

/// The references between the fields of a batch form a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cycle detected in smart date references at '{field}'")]
pub struct CycleError {
    pub field: String,
}

/// A well-formed rule that cannot be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("reference of an unknown field: {0}")]
    UnknownReference(String),

    #[error("start date of week one was not provided")]
    MissingWeekAnchor,

    #[error("cannot use hours delta in reference to a date (must be a datetime): {0}")]
    HoursDeltaOnDate(String),

    #[error("cannot use hours delta and specify an exact time")]
    HoursDeltaWithTime,

    #[error("no weekdays given for first available reference to {0}")]
    NoWeekdays(String),

    #[error("date out of range")]
    OutOfRange,
}

/// Any failure while resolving a batch. The whole batch fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmartDateError {
    #[error("cannot parse '{field}': {source}")]
    Parse {
        field: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("cannot resolve '{field}': {source}")]
    Resolution {
        field: String,
        #[source]
        source: ResolutionError,
    },
}
