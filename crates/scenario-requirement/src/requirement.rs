//! Requirement types
//!
//! - [`Requirement`]: dimension name → [`ValueSpec`], possibly dynamic
//! - [`StaticRequirement`]: every dynamic spec resolved
//! - [`ConcreteRequirement`]: every dimension reduced to one literal

use crate::error::RequirementError;
use crate::spec::{Spec, ValueSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Declarative description of the state a scenario needs
///
/// Dimensions are kept in key order, so the order in which they were added
/// never changes what the requirement means or how it is fuzzed.
pub struct Requirement<C> {
    dimensions: BTreeMap<String, ValueSpec<C>>,
}

impl<C> Requirement<C> {
    /// Empty requirement
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            dimensions: BTreeMap::new(),
        }
    }

    /// Start building a requirement
    #[inline]
    #[must_use]
    pub fn builder() -> RequirementBuilder<C> {
        RequirementBuilder::new()
    }

    /// Build a fully static requirement from a JSON object
    ///
    /// Each top-level key becomes a dimension interpreted with
    /// [`Spec::from_json`].
    ///
    /// # Errors
    /// Returns [`RequirementError::NotAnObject`] for any other document
    pub fn from_json(value: Value) -> Result<Self, RequirementError> {
        match value {
            Value::Object(map) => Ok(Self {
                dimensions: map
                    .into_iter()
                    .map(|(k, v)| (k, ValueSpec::Static(Spec::from_json(v))))
                    .collect(),
            }),
            other => Err(RequirementError::NotAnObject {
                found: other.to_string(),
            }),
        }
    }

    /// Look up a dimension
    #[inline]
    #[must_use]
    pub fn get(&self, dimension: &str) -> Option<&ValueSpec<C>> {
        self.dimensions.get(dimension)
    }

    /// Check if a dimension is present
    #[inline]
    #[must_use]
    pub fn contains(&self, dimension: &str) -> bool {
        self.dimensions.contains_key(dimension)
    }

    /// Dimension names in key order
    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.dimensions.keys().map(String::as_str)
    }

    /// Number of dimensions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    /// Check if the requirement has no dimensions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Resolve every dimension against a context
    ///
    /// # Errors
    /// Returns [`RequirementError::Resolution`] for the first failing resolver
    pub fn resolve(&self, context: &C) -> Result<StaticRequirement, RequirementError> {
        self.resolve_where(context, |_| true)
    }

    /// Resolve only the named dimensions that are present
    ///
    /// Used by constraints that own a subset of the vocabulary.
    ///
    /// # Errors
    /// Returns [`RequirementError::Resolution`] for the first failing resolver
    pub fn resolve_dimensions(
        &self,
        context: &C,
        owned: &[&str],
    ) -> Result<StaticRequirement, RequirementError> {
        self.resolve_where(context, |name| owned.contains(&name))
    }

    fn resolve_where(
        &self,
        context: &C,
        keep: impl Fn(&str) -> bool,
    ) -> Result<StaticRequirement, RequirementError> {
        let mut resolved = BTreeMap::new();
        for (name, spec) in self.dimensions.iter().filter(|(name, _)| keep(name)) {
            let spec = spec
                .resolve(context)
                .map_err(|source| RequirementError::Resolution {
                    dimension: name.clone(),
                    source,
                })?;
            resolved.insert(name.clone(), spec);
        }
        Ok(StaticRequirement(resolved))
    }
}

impl<C> Clone for Requirement<C> {
    fn clone(&self) -> Self {
        Self {
            dimensions: self.dimensions.clone(),
        }
    }
}

impl<C> Default for Requirement<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C> fmt::Debug for Requirement<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.dimensions.iter()).finish()
    }
}

/// Builder for [`Requirement`]
pub struct RequirementBuilder<C> {
    dimensions: BTreeMap<String, ValueSpec<C>>,
    error: Option<RequirementError>,
}

impl<C> RequirementBuilder<C> {
    /// Create new builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            dimensions: BTreeMap::new(),
            error: None,
        }
    }

    /// Add a dimension; a repeated name replaces the earlier spec
    #[must_use]
    pub fn with(mut self, dimension: impl Into<String>, spec: impl Into<ValueSpec<C>>) -> Self {
        let dimension = dimension.into();
        if dimension.is_empty() {
            self.error.get_or_insert(RequirementError::EmptyDimension);
        } else {
            self.dimensions.insert(dimension, spec.into());
        }
        self
    }

    /// Add a context-dependent dimension
    #[must_use]
    pub fn with_dynamic<F>(self, dimension: impl Into<String>, resolver: F) -> Self
    where
        F: Fn(&C) -> Result<Spec, crate::ResolveError> + Send + Sync + 'static,
    {
        self.with(dimension, ValueSpec::dynamic(resolver))
    }

    /// Finish building
    ///
    /// # Errors
    /// Returns [`RequirementError::EmptyDimension`] if any dimension name was empty
    pub fn build(self) -> Result<Requirement<C>, RequirementError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(Requirement {
                dimensions: self.dimensions,
            }),
        }
    }
}

impl<C> Default for RequirementBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Requirement with every dynamic spec resolved
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StaticRequirement(pub BTreeMap<String, Spec>);

impl StaticRequirement {
    /// Look up a dimension
    #[inline]
    #[must_use]
    pub fn get(&self, dimension: &str) -> Option<&Spec> {
        self.0.get(dimension)
    }

    /// Iterate dimensions in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Spec)> {
        self.0.iter()
    }

    /// Check if the requirement has no dimensions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Spec)> for StaticRequirement {
    fn from_iter<I: IntoIterator<Item = (String, Spec)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Requirement whose every dimension is a single literal value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConcreteRequirement(pub BTreeMap<String, Value>);

impl ConcreteRequirement {
    /// Look up a dimension
    #[inline]
    #[must_use]
    pub fn get(&self, dimension: &str) -> Option<&Value> {
        self.0.get(dimension)
    }

    /// Check if a dimension is present
    #[inline]
    #[must_use]
    pub fn contains(&self, dimension: &str) -> bool {
        self.0.contains_key(dimension)
    }

    /// Iterate dimensions in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Check if the requirement has no dimensions
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as a JSON object
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone().into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for ConcreteRequirement {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ConcreteRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
