//! Built-in constraints
//!
//! | dimension       | constraint                 | capability      |
//! |-----------------|----------------------------|-----------------|
//! | `upgrade`       | [`UpgradeConstraint`]      | `Context`       |
//! | `prices`        | [`PriceConstraint`]        | `PriceOracle`   |
//! | `tokenBalances` | [`TokenBalanceConstraint`] | `TokenLedger`   |
//! | `pause`         | [`PauseConstraint`]        | `PauseGuardian` |

mod pause;
mod prices;
mod token_balances;
mod upgrade;

pub use pause::PauseConstraint;
pub use prices::PriceConstraint;
pub use token_balances::TokenBalanceConstraint;
pub use upgrade::UpgradeConstraint;

use crate::constraint::Constraint;
use scenario_context::{PauseGuardian, PriceOracle, TokenLedger};
use std::sync::Arc;

/// Built-in constraints in their standard order
///
/// Upgrades come first so later steps see the upgraded deployment.
#[must_use]
pub fn default_constraints<C>() -> Vec<Arc<dyn Constraint<C>>>
where
    C: PriceOracle + TokenLedger + PauseGuardian,
{
    vec![
        Arc::new(UpgradeConstraint::new()),
        Arc::new(PriceConstraint::new()),
        Arc::new(TokenBalanceConstraint::new()),
        Arc::new(PauseConstraint::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Solve;
    use scenario_context::Context;
    use scenario_requirement::Requirement;
    use scenario_test_utils::{lending_market, SimContext};
    use serde_json::json;

    #[test]
    fn standard_order() {
        let names: Vec<_> = default_constraints::<SimContext>()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, ["upgrade", "prices", "tokenBalances", "pause"]);
    }

    #[test]
    fn dimensions_are_disjoint() {
        let constraints = default_constraints::<SimContext>();
        let mut seen = Vec::new();
        for constraint in &constraints {
            for dimension in constraint.dimensions() {
                assert!(!seen.contains(dimension), "{dimension} owned twice");
                seen.push(*dimension);
            }
        }
    }

    #[tokio::test]
    async fn only_owners_apply() {
        let ctx = SimContext::standalone(lending_market());
        let req = Requirement::<SimContext>::from_json(json!({
            "prices": {"$base": 1},
            "tokenBalances": {"$comet": {"$base": ">= 1000"}},
        }))
        .unwrap();

        let mut applicable = Vec::new();
        for constraint in default_constraints::<SimContext>() {
            if let Solve::Variants(variants) = constraint.solve(&req, &ctx).await.unwrap() {
                assert_eq!(variants.len(), 1);
                applicable.push(constraint.name());
            }
        }
        assert_eq!(applicable, ["prices", "tokenBalances"]);
        assert_eq!(ctx.configuration(), lending_market().configuration().clone());
    }
}
