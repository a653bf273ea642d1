//! Oracle prices
//!
//! `prices` maps asset aliases to whole-unit prices, e.g.
//! `{"$base": 1, "$asset0": 3000}`. Each price is one solution.

use crate::constraint::{solve_variants, Constraint};
use crate::error::{CheckError, SolveError};
use crate::solution::{Solution, Solve};
use async_trait::async_trait;
use scenario_context::{Configuration, Context, PriceOracle, PRICE_SCALE};
use scenario_requirement::{ConcreteRequirement, Requirement};
use serde_json::{Map, Value};

const DIMENSION: &str = "prices";

/// Solves the `prices` dimension
#[derive(Debug, Clone, Copy, Default)]
pub struct PriceConstraint;

impl PriceConstraint {
    /// Create constraint
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Scale a whole-unit price to oracle precision
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn scale_price(asset: &str, value: &Value) -> Result<u128, SolveError> {
    let invalid = || {
        SolveError::invalid(
            DIMENSION,
            format!("price of {asset} must be a non-negative number, got {value}"),
        )
    };
    if let Some(whole) = value.as_u64() {
        return u128::from(whole).checked_mul(PRICE_SCALE).ok_or_else(invalid);
    }
    match value.as_f64() {
        Some(price) if price.is_finite() && price >= 0.0 => {
            Ok((price * PRICE_SCALE as f64).round() as u128)
        }
        _ => Err(invalid()),
    }
}

fn price_map(value: Option<&Value>) -> Result<&Map<String, Value>, SolveError> {
    value
        .and_then(Value::as_object)
        .ok_or_else(|| SolveError::invalid(DIMENSION, "expected an object of asset prices"))
}

/// Resolved `(symbol, scaled price)` pairs in alias key order
fn targets(
    variant: &ConcreteRequirement,
    configuration: &Configuration,
) -> Result<Vec<(String, u128)>, SolveError> {
    price_map(variant.get(DIMENSION))?
        .iter()
        .map(|(alias, value)| -> Result<_, SolveError> {
            let symbol = configuration.resolve_asset(alias)?;
            Ok((symbol, scale_price(alias, value)?))
        })
        .collect()
}

#[async_trait]
impl<C: PriceOracle> Constraint<C> for PriceConstraint {
    fn name(&self) -> &'static str {
        "prices"
    }

    fn dimensions(&self) -> &'static [&'static str] {
        &[DIMENSION]
    }

    async fn solve(&self, requirement: &Requirement<C>, context: &C) -> Result<Solve<C>, SolveError> {
        let configuration = context.configuration();
        solve_variants(requirement, context, &[DIMENSION], |variant| {
            let solutions = targets(variant, &configuration)?
                .into_iter()
                .map(|(symbol, price)| {
                    let name = format!("price: {symbol} = {price}");
                    let touched = format!("price.{symbol}");
                    Solution::new(name, move |ctx: C| {
                        let symbol = symbol.clone();
                        async move { ctx.set_price(&symbol, price).await }
                    })
                    .touching(touched)
                })
                .collect();
            Ok(solutions)
        })
    }

    async fn check(&self, requirement: &ConcreteRequirement, context: &C) -> Result<(), CheckError> {
        if !requirement.contains(DIMENSION) {
            return Ok(());
        }
        for (symbol, expected) in targets(requirement, &context.configuration())? {
            let actual = context.price(&symbol).await?;
            if actual != expected {
                return Err(CheckError::unsatisfied(DIMENSION, symbol, expected, actual));
            }
        }
        Ok(())
    }
}
