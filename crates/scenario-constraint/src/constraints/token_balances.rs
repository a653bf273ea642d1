//! Wallet balances
//!
//! `tokenBalances` maps actor aliases to asset conditions, e.g.
//! `{"$comet": {"$base": ">= 1000"}}`. Amounts are whole tokens, scaled by
//! the asset's decimals. Each solution reads the wallet when it runs and
//! moves it to the nearest balance satisfying its condition.

use crate::amount::AmountCondition;
use crate::constraint::{solve_variants, Constraint};
use crate::error::{CheckError, SolveError};
use crate::solution::{Solution, Solve};
use async_trait::async_trait;
use scenario_context::{ContextError, TokenLedger};
use scenario_requirement::{ConcreteRequirement, Requirement};
use serde_json::Value;

const DIMENSION: &str = "tokenBalances";

/// One wallet condition with aliases resolved and amounts scaled
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    account: String,
    asset: String,
    condition: AmountCondition,
}

fn targets<C: TokenLedger>(
    variant: &ConcreteRequirement,
    context: &C,
) -> Result<Vec<Target>, SolveError> {
    let actors = variant
        .get(DIMENSION)
        .and_then(Value::as_object)
        .ok_or_else(|| SolveError::invalid(DIMENSION, "expected an object of actor balances"))?;
    let configuration = context.configuration();

    let mut targets = Vec::new();
    for (actor, assets) in actors {
        let account = context.account(actor)?;
        let assets = assets.as_object().ok_or_else(|| {
            SolveError::invalid(DIMENSION, format!("balances of {actor} must be an object"))
        })?;
        for (alias, raw) in assets {
            let asset = configuration.resolve_asset(alias)?;
            let unit = configuration.scale_amount(&asset, 1)?;
            let condition = AmountCondition::parse(raw)
                .ok_or_else(|| {
                    SolveError::invalid(
                        DIMENSION,
                        format!("bad amount condition for {actor}.{alias}: {raw}"),
                    )
                })?
                .scaled(unit)
                .ok_or_else(|| {
                    SolveError::invalid(DIMENSION, format!("amount overflow for {actor}.{alias}"))
                })?;
            targets.push(Target {
                account: account.clone(),
                asset,
                condition,
            });
        }
    }
    Ok(targets)
}

fn solution<C: TokenLedger>(target: Target) -> Solution<C> {
    let name = format!("balance: {} {} {}", target.account, target.asset, target.condition);
    let touched = format!("balance.{}.{}", target.account, target.asset);
    Solution::new(name, move |ctx: C| {
        let Target {
            account,
            asset,
            condition,
        } = target.clone();
        async move {
            let current = ctx.balance_of(&account, &asset).await?;
            let wanted = condition.target(current).ok_or_else(|| {
                ContextError::rejected(format!("no balance of {asset} satisfies {condition}"))
            })?;
            if wanted == current {
                return Ok(ctx);
            }
            tracing::debug!(%account, %asset, from = %current, to = %wanted, "adjusting balance");
            ctx.set_balance(&account, &asset, wanted).await
        }
    })
    .touching(touched)
}

/// Solves the `tokenBalances` dimension
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenBalanceConstraint;

impl TokenBalanceConstraint {
    /// Create constraint
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<C: TokenLedger> Constraint<C> for TokenBalanceConstraint {
    fn name(&self) -> &'static str {
        "tokenBalances"
    }

    fn dimensions(&self) -> &'static [&'static str] {
        &[DIMENSION]
    }

    async fn solve(&self, requirement: &Requirement<C>, context: &C) -> Result<Solve<C>, SolveError> {
        solve_variants(requirement, context, &[DIMENSION], |variant| {
            Ok(targets(variant, context)?.into_iter().map(solution).collect())
        })
    }

    async fn check(&self, requirement: &ConcreteRequirement, context: &C) -> Result<(), CheckError> {
        if !requirement.contains(DIMENSION) {
            return Ok(());
        }
        for target in targets(requirement, context)? {
            let balance = context.balance_of(&target.account, &target.asset).await?;
            if !target.condition.satisfied_by(balance) {
                return Err(CheckError::unsatisfied(
                    DIMENSION,
                    format!("{}.{}", target.account, target.asset),
                    target.condition,
                    balance,
                ));
            }
        }
        Ok(())
    }
}
