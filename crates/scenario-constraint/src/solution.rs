//! Solutions and solve results
//!
//! A [`Solution`] is one atomic context transition. A constraint answers a
//! requirement with a [`Solve`]: either it has nothing to do, or it returns
//! one [`Variant`] per concrete expansion of the dimensions it owns.

use futures::future::BoxFuture;
use scenario_context::ContextError;
use scenario_requirement::ConcreteRequirement;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type ApplyFn<C> = Arc<dyn Fn(C) -> BoxFuture<'static, Result<C, ContextError>> + Send + Sync>;

/// One named, asynchronous context transition
///
/// Carries no mutable state; everything it needs is captured when built.
pub struct Solution<C> {
    name: String,
    touches: Vec<String>,
    apply: ApplyFn<C>,
}

impl<C> Solution<C> {
    /// Create a solution from an async transition
    pub fn new<F, Fut>(name: impl Into<String>, apply: F) -> Self
    where
        C: 'static,
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<C, ContextError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            touches: Vec::new(),
            apply: Arc::new(move |ctx| -> BoxFuture<'static, Result<C, ContextError>> {
                Box::pin(apply(ctx))
            }),
        }
    }

    /// Declare a state key this solution mutates
    #[must_use]
    pub fn touching(mut self, key: impl Into<String>) -> Self {
        self.touches.push(key.into());
        self
    }

    /// Solution name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// State keys this solution mutates
    #[inline]
    #[must_use]
    pub fn touches(&self) -> &[String] {
        &self.touches
    }

    /// Apply to a context, yielding the context to use afterwards
    ///
    /// # Errors
    /// Returns whatever the underlying system reports
    pub async fn apply(&self, context: C) -> Result<C, ContextError> {
        (self.apply)(context).await
    }
}

impl<C> Clone for Solution<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            touches: self.touches.clone(),
            apply: Arc::clone(&self.apply),
        }
    }
}

impl<C> fmt::Debug for Solution<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Solution")
            .field("name", &self.name)
            .field("touches", &self.touches)
            .finish_non_exhaustive()
    }
}

/// Solutions realising one concrete expansion of a constraint's dimensions
///
/// An empty solution list means the constraint applies but needs no steps.
pub struct Variant<C> {
    /// Concrete values of the dimensions this variant realises
    pub requirement: ConcreteRequirement,
    /// Ordered steps
    pub solutions: Vec<Solution<C>>,
}

impl<C> Variant<C> {
    /// Create variant
    #[inline]
    #[must_use]
    pub fn new(requirement: ConcreteRequirement, solutions: Vec<Solution<C>>) -> Self {
        Self {
            requirement,
            solutions,
        }
    }
}

impl<C> Clone for Variant<C> {
    fn clone(&self) -> Self {
        Self {
            requirement: self.requirement.clone(),
            solutions: self.solutions.clone(),
        }
    }
}

impl<C> fmt::Debug for Variant<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("requirement", &self.requirement)
            .field("solutions", &self.solutions)
            .finish()
    }
}

/// Answer of a constraint to a requirement
pub enum Solve<C> {
    /// None of the constraint's dimensions are present
    NotApplicable,
    /// One entry per concrete expansion; empty when a dimension expanded
    /// to nothing
    Variants(Vec<Variant<C>>),
}

impl<C> Solve<C> {
    /// Check if the constraint applies
    #[inline]
    #[must_use]
    pub fn is_applicable(&self) -> bool {
        matches!(self, Self::Variants(_))
    }

    /// Variants, or `None` when not applicable
    #[inline]
    #[must_use]
    pub fn into_variants(self) -> Option<Vec<Variant<C>>> {
        match self {
            Self::NotApplicable => None,
            Self::Variants(variants) => Some(variants),
        }
    }
}

impl<C> fmt::Debug for Solve<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => f.write_str("NotApplicable"),
            Self::Variants(variants) => f.debug_tuple("Variants").field(variants).finish(),
        }
    }
}
