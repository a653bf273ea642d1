//! Constraint trait
//!
//! Provides the [`Constraint`] trait for pluggable requirement resolvers.
//! A constraint owns a fixed set of requirement dimensions and ignores the
//! rest, so several constraints can each solve a disjoint part of one
//! requirement.

use crate::error::{CheckError, SolveError};
use crate::solution::{Solution, Solve, Variant};
use async_trait::async_trait;
use scenario_context::Context;
use scenario_requirement::{fuzz, ConcreteRequirement, Requirement};
use std::fmt;

/// Resolver for a fixed vocabulary of requirement dimensions
#[async_trait]
pub trait Constraint<C: Context>: Send + Sync + fmt::Debug {
    /// Constraint name (for logging and reports)
    fn name(&self) -> &'static str;

    /// Requirement dimensions this constraint understands
    fn dimensions(&self) -> &'static [&'static str];

    /// Compile the owned dimensions of a requirement into solutions
    ///
    /// Returns [`Solve::NotApplicable`] exactly when the requirement holds
    /// none of [`Constraint::dimensions`].
    ///
    /// # Errors
    /// - [`SolveError::Requirement`] if resolution or fuzzing fails
    /// - [`SolveError::InvalidValue`] if a concrete value is malformed
    async fn solve(&self, requirement: &Requirement<C>, context: &C) -> Result<Solve<C>, SolveError>;

    /// Verify a context satisfies a concrete variant this constraint produced
    ///
    /// # Errors
    /// Returns [`CheckError::Unsatisfied`] on mismatch
    async fn check(&self, requirement: &ConcreteRequirement, context: &C) -> Result<(), CheckError>;
}

/// Resolve and fuzz the owned dimensions, building solutions per variant
///
/// Returns [`Solve::NotApplicable`] when none of `owned` is present. The
/// builder is called once per concrete variant, in fuzz order.
///
/// # Errors
/// Returns the first resolution, fuzzing or builder failure
pub fn solve_variants<C, F>(
    requirement: &Requirement<C>,
    context: &C,
    owned: &[&str],
    mut build: F,
) -> Result<Solve<C>, SolveError>
where
    F: FnMut(&ConcreteRequirement) -> Result<Vec<Solution<C>>, SolveError>,
{
    if !owned.iter().any(|dimension| requirement.contains(dimension)) {
        return Ok(Solve::NotApplicable);
    }

    let resolved = requirement.resolve_dimensions(context, owned)?;
    let variants = fuzz(&resolved)?
        .into_iter()
        .map(|concrete| -> Result<_, SolveError> {
            let solutions = build(&concrete)?;
            Ok(Variant::new(concrete, solutions))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Solve::Variants(variants))
}
