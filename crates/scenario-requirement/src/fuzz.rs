//! Fuzzer
//!
//! Expands a [`StaticRequirement`] into the Cartesian product of its
//! dimensions. Dimensions are visited in key order with the first dimension
//! varying slowest; values inside a dimension keep their spec order. An empty
//! set anywhere vetoes the whole expansion.

use crate::error::RequirementError;
use crate::requirement::{ConcreteRequirement, StaticRequirement};
use crate::spec::Spec;
use serde_json::{Map, Value};

/// Expand a static requirement into its concrete variants
///
/// # Errors
/// Returns [`RequirementError::MalformedRange`] if a range cannot be enumerated
pub fn fuzz(requirement: &StaticRequirement) -> Result<Vec<ConcreteRequirement>, RequirementError> {
    let dimensions = requirement
        .iter()
        .map(|(name, spec)| Ok((name.clone(), fuzz_spec(spec)?)))
        .collect::<Result<Vec<_>, RequirementError>>()?;

    Ok(cartesian(dimensions)
        .into_iter()
        .map(|combo| combo.into_iter().collect())
        .collect())
}

/// Expand a single spec into its literal values
///
/// # Errors
/// Returns [`RequirementError::MalformedRange`] if a range cannot be enumerated
pub fn fuzz_spec(spec: &Spec) -> Result<Vec<Value>, RequirementError> {
    match spec {
        Spec::Literal(value) => Ok(vec![value.clone()]),
        Spec::OneOf(alternatives) => {
            let mut values = Vec::new();
            for alternative in alternatives {
                values.extend(fuzz_spec(alternative)?);
            }
            Ok(values)
        }
        Spec::Range(range) => Ok(range.values()?.into_iter().map(Value::from).collect()),
        Spec::Object(fields) => {
            let fields = fields
                .iter()
                .map(|(name, spec)| Ok((name.clone(), fuzz_spec(spec)?)))
                .collect::<Result<Vec<_>, RequirementError>>()?;
            Ok(cartesian(fields)
                .into_iter()
                .map(|combo| Value::Object(combo.into_iter().collect::<Map<_, _>>()))
                .collect())
        }
    }
}

/// Number of variants [`fuzz`] would produce, without materialising them
///
/// Saturates at `usize::MAX`.
///
/// # Errors
/// Returns [`RequirementError::MalformedRange`] if a range cannot be enumerated
pub fn cardinality(requirement: &StaticRequirement) -> Result<usize, RequirementError> {
    requirement
        .iter()
        .try_fold(1usize, |acc, (_, spec)| Ok(acc.saturating_mul(spec_cardinality(spec)?)))
}

fn spec_cardinality(spec: &Spec) -> Result<usize, RequirementError> {
    match spec {
        Spec::Literal(_) => Ok(1),
        Spec::OneOf(alternatives) => alternatives
            .iter()
            .try_fold(0usize, |acc, s| Ok(acc.saturating_add(spec_cardinality(s)?))),
        Spec::Range(range) => range.len(),
        Spec::Object(fields) => fields
            .values()
            .try_fold(1usize, |acc, s| Ok(acc.saturating_mul(spec_cardinality(s)?))),
    }
}

/// Cartesian product of named value lists, first list varying slowest
///
/// No lists yields one empty combination; any empty list yields none.
fn cartesian(dimensions: Vec<(String, Vec<Value>)>) -> Vec<Vec<(String, Value)>> {
    let mut combos: Vec<Vec<(String, Value)>> = vec![Vec::new()];
    for (name, values) in dimensions {
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for prefix in &combos {
            for value in &values {
                let mut combo = prefix.clone();
                combo.push((name.clone(), value.clone()));
                next.push(combo);
            }
        }
        combos = next;
    }
    combos
}
