use std::collections::BTreeMap;

use super::errors::SmartDateError;
use super::evaluate::{Environment, evaluate};
use super::graph::sort;
use super::parser::parse;
use super::types::{DateContext, PREVIOUS_PREFIX, RawDate, Rule, Temporal};

/// Resolve a batch of smart dates into concrete values.
///
/// Fields may refer to each other, to `context.known`, and to the previous
/// publication as `previous.metadata.<name>`. The result holds exactly the
/// keys of `batch`. Any failure aborts the whole batch.
pub fn resolve(
    batch: &BTreeMap<String, RawDate>,
    context: &DateContext,
) -> Result<BTreeMap<String, Temporal>, SmartDateError> {
    let mut env: Environment = context.known.clone();
    if let Some(previous) = &context.previous {
        for (name, value) in previous {
            env.insert(format!("{PREVIOUS_PREFIX}{name}"), *value);
        }
    }

    let rules = batch
        .iter()
        .map(|(field, raw)| {
            parse(raw)
                .map(|rule| (field.clone(), rule))
                .map_err(|source| SmartDateError::Parse { field: field.clone(), source })
        })
        .collect::<Result<BTreeMap<String, Rule>, _>>()?;

    let order = sort(&rules)?;

    let mut resolved = BTreeMap::new();
    for field in order {
        let value = evaluate(&rules[&field], &env, context)
            .map_err(|source| SmartDateError::Resolution { field: field.clone(), source })?;
        env.insert(field.clone(), value);
        resolved.insert(field, value);
    }

    Ok(resolved)
}
