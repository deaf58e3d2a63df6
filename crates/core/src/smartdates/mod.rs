//! Smart dates: date expressions written relative to other fields.
//!
//! Supports expressions like:
//! - `due` (direct reference)
//! - `7 days before due`, `3 hours after metadata.due` (delta reference)
//! - `first monday or wednesday after previous.metadata.released` (first available)
//! - `tuesday of week 02` (day of a numbered week)
//!
//! Any of these may end with ` at HH:MM:SS`, which pins the time of day and
//! turns the result into a datetime.
//!
//! A batch of expressions is resolved together with [`resolve`]: every entry is
//! parsed into a [`Rule`], the rules are ordered so that referenced fields are
//! resolved first, and each rule is then evaluated against the growing
//! environment of known values.

pub mod errors;
pub mod evaluate;
pub mod graph;
pub mod parser;
pub mod resolve;
pub mod types;

pub use errors::{CycleError, ParseError, ResolutionError, SmartDateError};
pub use evaluate::{Environment, evaluate};
pub use graph::sort;
pub use parser::{parse, parse_expr};
pub use resolve::resolve;
pub use types::{DateContext, DeltaUnit, Direction, PREVIOUS_PREFIX, RawDate, Rule, Temporal};
