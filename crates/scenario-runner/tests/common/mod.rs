//! Shared fixtures for runner integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use scenario_constraint::{
    default_constraints, solve_variants, CheckError, Constraint, Solution, Solve, SolveError,
};
use scenario_context::{ContextError, PriceOracle, PRICE_SCALE};
use scenario_requirement::{ConcreteRequirement, Requirement};
use scenario_runner::Runner;
use scenario_test_utils::{forking_world, SimContext, SimWorld};
use serde_json::Value;
use std::sync::Arc;

/// Runner with the built-in constraints over a forking world
pub fn runner() -> Runner<SimWorld> {
    Runner::new(forking_world(), default_constraints())
}

pub fn requirement(value: Value) -> Requirement<SimContext> {
    Requirement::from_json(value).unwrap()
}

/// Pins the base asset price through its own `forcePrice` dimension,
/// overlapping with the `prices` constraint
#[derive(Debug, Clone, Copy, Default)]
pub struct ForcedBasePrice;

#[async_trait]
impl Constraint<SimContext> for ForcedBasePrice {
    fn name(&self) -> &'static str {
        "force_price"
    }

    fn dimensions(&self) -> &'static [&'static str] {
        &["forcePrice"]
    }

    async fn solve(
        &self,
        requirement: &Requirement<SimContext>,
        context: &SimContext,
    ) -> Result<Solve<SimContext>, SolveError> {
        solve_variants(requirement, context, &["forcePrice"], |variant| {
            let whole = variant
                .get("forcePrice")
                .and_then(Value::as_u64)
                .ok_or_else(|| SolveError::invalid("forcePrice", "expected a whole price"))?;
            let price = u128::from(whole) * PRICE_SCALE;
            let solution = Solution::new("force USDC price", move |ctx: SimContext| async move {
                ctx.set_price("USDC", price).await
            })
            .touching("price.USDC");
            Ok(vec![solution])
        })
    }

    async fn check(
        &self,
        _requirement: &ConcreteRequirement,
        _context: &SimContext,
    ) -> Result<(), CheckError> {
        Ok(())
    }
}

/// Panics in the phase named by its `explode` dimension:
/// `"solve"`, `"apply"` or `"check"`
#[derive(Debug, Clone, Copy, Default)]
pub struct Exploding;

fn explodes_in(requirement: &ConcreteRequirement, phase: &str) -> bool {
    requirement.get("explode").and_then(Value::as_str) == Some(phase)
}

#[async_trait]
impl Constraint<SimContext> for Exploding {
    fn name(&self) -> &'static str {
        "exploding"
    }

    fn dimensions(&self) -> &'static [&'static str] {
        &["explode"]
    }

    async fn solve(
        &self,
        requirement: &Requirement<SimContext>,
        context: &SimContext,
    ) -> Result<Solve<SimContext>, SolveError> {
        solve_variants(requirement, context, &["explode"], |variant| {
            assert!(!explodes_in(variant, "solve"), "exploded while solving");
            let on_apply = explodes_in(variant, "apply");
            let solution = Solution::new("explode", move |ctx: SimContext| async move {
                assert!(!on_apply, "exploded while applying");
                Ok::<_, ContextError>(ctx)
            });
            Ok(vec![solution])
        })
    }

    async fn check(
        &self,
        requirement: &ConcreteRequirement,
        _context: &SimContext,
    ) -> Result<(), CheckError> {
        assert!(!explodes_in(requirement, "check"), "exploded while checking");
        Ok(())
    }
}

/// Built-in constraints plus [`ForcedBasePrice`] registered last
pub fn runner_with_forced_price() -> Runner<SimWorld> {
    runner().with_constraint(Arc::new(ForcedBasePrice))
}

pub async fn passes(_: SimContext) -> anyhow::Result<()> {
    Ok(())
}

pub async fn fails(_: SimContext) -> anyhow::Result<()> {
    anyhow::bail!("assertion failed")
}

pub async fn panics(_: SimContext) -> anyhow::Result<()> {
    panic!("unexpected state")
}
