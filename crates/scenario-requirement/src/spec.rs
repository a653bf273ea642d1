//! Value specs
//!
//! A requirement dimension holds a [`ValueSpec`]: either a static [`Spec`]
//! (a literal, a finite set, an integer range, or a nested object of specs)
//! or a context-dependent resolver producing a static [`Spec`].

use crate::error::{RequirementError, ResolveError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Integer range `start..end` stepping by `step`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntRange {
    /// Inclusive start
    pub start: i64,
    /// Exclusive end
    pub end: i64,
    /// Distance between consecutive values
    pub step: u64,
}

impl IntRange {
    /// Create a unit-step range
    #[inline]
    #[must_use]
    pub fn new(start: i64, end: i64) -> Self {
        Self {
            start,
            end,
            step: 1,
        }
    }

    /// With step
    #[inline]
    #[must_use]
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    /// Number of values, or an error if the range is not enumerable
    pub fn len(&self) -> Result<usize, RequirementError> {
        if self.step == 0 {
            return Err(self.malformed());
        }
        if self.start >= self.end {
            return Ok(0);
        }
        let span = (i128::from(self.end) - i128::from(self.start)) as u128;
        let step = u128::from(self.step);
        usize::try_from(span.div_ceil(step)).map_err(|_| self.malformed())
    }

    /// Check if the range enumerates nothing
    #[inline]
    pub fn is_empty(&self) -> Result<bool, RequirementError> {
        self.len().map(|n| n == 0)
    }

    /// Enumerate values in ascending order
    pub fn values(&self) -> Result<Vec<i64>, RequirementError> {
        let len = self.len()?;
        let step = i128::from(self.step);
        (0..len)
            .map(|i| {
                let v = i128::from(self.start) + step * i as i128;
                i64::try_from(v).map_err(|_| self.malformed())
            })
            .collect()
    }

    fn malformed(&self) -> RequirementError {
        RequirementError::MalformedRange {
            start: self.start,
            end: self.end,
            step: self.step,
        }
    }
}

/// Static value spec, free of any context dependency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spec {
    /// Exactly this value
    Literal(Value),
    /// Any of these alternatives, in order
    OneOf(Vec<Spec>),
    /// Every integer in the range
    Range(IntRange),
    /// Object whose fields are fuzzed independently
    Object(BTreeMap<String, Spec>),
}

impl Spec {
    /// Literal spec
    #[inline]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Set of literal alternatives
    pub fn one_of<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::OneOf(values.into_iter().map(|v| Self::Literal(v.into())).collect())
    }

    /// Unit-step integer range
    #[inline]
    #[must_use]
    pub fn range(start: i64, end: i64) -> Self {
        Self::Range(IntRange::new(start, end))
    }

    /// Object spec from `(field, spec)` pairs
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Spec)>,
        K: Into<String>,
    {
        Self::Object(fields.into_iter().map(|(k, s)| (k.into(), s)).collect())
    }

    /// Interpret a JSON document as a spec
    ///
    /// Arrays become alternatives and objects are fuzzed field by field;
    /// everything else is a literal. Use [`Spec::Literal`] directly for a
    /// literal array.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::OneOf(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => {
                Self::Object(map.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect())
            }
            other => Self::Literal(other),
        }
    }

    /// Check if this spec contributes exactly one value without fuzzing
    #[must_use]
    pub fn is_literal(&self) -> bool {
        match self {
            Self::Literal(_) => true,
            Self::Object(fields) => fields.values().all(Self::is_literal),
            Self::OneOf(_) | Self::Range(_) => false,
        }
    }
}

impl From<Value> for Spec {
    fn from(value: Value) -> Self {
        Self::Literal(value)
    }
}

/// Context-dependent resolver for a dimension
pub type Resolver<C> = Arc<dyn Fn(&C) -> Result<Spec, ResolveError> + Send + Sync>;

/// Value spec of one requirement dimension
pub enum ValueSpec<C> {
    /// Already static
    Static(Spec),
    /// Computed from the context before fuzzing
    Dynamic(Resolver<C>),
}

impl<C> ValueSpec<C> {
    /// Wrap a resolver function
    pub fn dynamic<F>(resolver: F) -> Self
    where
        F: Fn(&C) -> Result<Spec, ResolveError> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(resolver))
    }

    /// Resolve against a context
    ///
    /// # Errors
    /// Returns the resolver's error for dynamic specs
    pub fn resolve(&self, context: &C) -> Result<Spec, ResolveError> {
        match self {
            Self::Static(spec) => Ok(spec.clone()),
            Self::Dynamic(resolver) => resolver(context),
        }
    }

    /// Check if resolution needs a context
    #[inline]
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl<C> Clone for ValueSpec<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(spec) => Self::Static(spec.clone()),
            Self::Dynamic(resolver) => Self::Dynamic(Arc::clone(resolver)),
        }
    }
}

impl<C> fmt::Debug for ValueSpec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(spec) => f.debug_tuple("Static").field(spec).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl<C> From<Spec> for ValueSpec<C> {
    fn from(spec: Spec) -> Self {
        Self::Static(spec)
    }
}

impl<C> From<Value> for ValueSpec<C> {
    fn from(value: Value) -> Self {
        Self::Static(Spec::from_json(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn range_len_and_values() {
        let range = IntRange::new(0, 10).with_step(3);
        assert_eq!(range.len().unwrap(), 4);
        assert_eq!(range.values().unwrap(), vec![0, 3, 6, 9]);
    }

    #[test]
    fn range_reversed_is_empty() {
        let range = IntRange::new(5, 5);
        assert!(range.is_empty().unwrap());
        assert!(IntRange::new(7, 2).values().unwrap().is_empty());
    }

    #[test]
    fn range_zero_step_is_malformed() {
        let range = IntRange::new(0, 3).with_step(0);
        assert!(matches!(
            range.values(),
            Err(RequirementError::MalformedRange { step: 0, .. })
        ));
    }

    #[test]
    fn from_json_arrays_become_alternatives() {
        let spec = Spec::from_json(json!({"base": ["USDC", "WETH"], "decimals": 6}));
        let Spec::Object(fields) = spec else {
            panic!("expected object spec");
        };
        assert!(matches!(fields["base"], Spec::OneOf(ref alts) if alts.len() == 2));
        assert_eq!(fields["decimals"], Spec::literal(6));
    }

    #[test]
    fn literal_detection_recurses_into_objects() {
        assert!(Spec::from_json(json!({"a": {"b": 1}})).is_literal());
        assert!(!Spec::object([("a", Spec::range(0, 2))]).is_literal());
    }

    #[test]
    fn dynamic_spec_resolves_against_context() {
        let spec: ValueSpec<u64> = ValueSpec::dynamic(|ctx: &u64| Ok(Spec::literal(*ctx * 2)));
        assert!(spec.is_dynamic());
        assert_eq!(spec.resolve(&21).unwrap(), Spec::literal(42));
    }

    #[test]
    fn dynamic_spec_propagates_failure() {
        let spec: ValueSpec<()> = ValueSpec::dynamic(|_: &()| Err(ResolveError::missing("governor")));
        assert_eq!(spec.resolve(&()), Err(ResolveError::missing("governor")));
    }
}
