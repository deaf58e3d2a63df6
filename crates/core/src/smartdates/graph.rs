//! Dependency ordering for a batch of rules.

use std::collections::{BTreeMap, HashMap};

use super::errors::CycleError;
use super::types::Rule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

/// Order the batch keys so that every field comes after the batch fields it
/// refers to.
///
/// References to names outside the batch are not edges; they are looked up in
/// the environment at evaluation time. Keys are visited in map order, so the
/// result is the same for the same batch.
pub fn sort(rules: &BTreeMap<String, Rule>) -> Result<Vec<String>, CycleError> {
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(rules.len());
    let mut order = Vec::with_capacity(rules.len());

    for key in rules.keys() {
        visit(key, rules, &mut marks, &mut order)?;
    }

    Ok(order)
}

fn visit<'a>(
    key: &'a str,
    rules: &'a BTreeMap<String, Rule>,
    marks: &mut HashMap<&'a str, Mark>,
    order: &mut Vec<String>,
) -> Result<(), CycleError> {
    match marks.get(key) {
        Some(Mark::Done) => return Ok(()),
        Some(Mark::OnStack) => return Err(CycleError { field: key.to_string() }),
        None => {}
    }

    marks.insert(key, Mark::OnStack);

    if let Some(referent) = rules.get(key).and_then(Rule::referent)
        && let Some((dep, _)) = rules.get_key_value(referent)
    {
        visit(dep, rules, marks, order)?;
    }

    marks.insert(key, Mark::Done);
    order.push(key.to_string());
    Ok(())
}
