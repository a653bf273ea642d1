//! Every execution leaves the world as it found it

mod common;

use common::{fails, panics, passes, requirement};
use pretty_assertions::assert_eq;
use scenario_constraint::default_constraints;
use scenario_context::{PauseGuardian, PriceOracle, TokenLedger, PRICE_SCALE};
use scenario_runner::{Runner, RunnerConfig, ScenarioOptions, ScenarioRegistry};
use scenario_test_utils::{lending_market, units, SimContext, SimWorld, COLLATERAL_SYMBOL};
use serde_json::json;

async fn supply_granted_weth(ctx: SimContext) -> anyhow::Result<()> {
    ctx.supply("albert", COLLATERAL_SYMBOL, units(COLLATERAL_SYMBOL, 5))?;
    Ok(())
}

async fn expect_clean_market(ctx: SimContext) -> anyhow::Result<()> {
    anyhow::ensure!(ctx.deployment() == 0, "upgrade leaked");
    anyhow::ensure!(
        ctx.price(COLLATERAL_SYMBOL).await? == 3000 * PRICE_SCALE,
        "price leaked"
    );
    anyhow::ensure!(ctx.balance_of("albert", COLLATERAL_SYMBOL).await? == 0, "balance leaked");
    anyhow::ensure!(ctx.collateral_balance_of("albert", COLLATERAL_SYMBOL) == 0, "supply leaked");
    anyhow::ensure!(!ctx.pause_flags().await?.withdraw_paused, "pause leaked");
    Ok(())
}

fn shared_runner() -> Runner<SimWorld> {
    Runner::new(SimWorld::shared(lending_market()), default_constraints())
        .with_config(RunnerConfig::default().with_max_concurrency(1))
}

#[tokio::test]
async fn shared_world_is_restored_after_each_execution() {
    let runner = shared_runner();
    let mut registry = ScenarioRegistry::new();
    registry
        .scenario(
            "mutates everything",
            requirement(json!({
                "upgrade": {"governor": "multisig"},
                "prices": {"$asset0": 1500},
                "tokenBalances": {"albert": {"$asset0": 5}},
                "pause": {"withdrawPaused": true},
            })),
            ScenarioOptions::new(),
            supply_granted_weth,
        )
        .scenario(
            "observes a clean market",
            requirement(json!({})),
            ScenarioOptions::new(),
            expect_clean_market,
        );

    let report = runner.run(&registry).await;
    assert!(report.is_success(), "{:#}", report.to_json());
    assert_eq!(runner.world().state(), lending_market());
    assert_eq!(runner.world().restores(), runner.world().contexts_issued());
}

#[tokio::test]
async fn world_is_restored_after_failures() {
    let runner = shared_runner();
    let mut registry = ScenarioRegistry::new();
    registry
        .scenario(
            "body fails",
            requirement(json!({"tokenBalances": {"albert": {"$base": 10}}})),
            ScenarioOptions::new(),
            fails,
        )
        .scenario(
            "body panics",
            requirement(json!({"pause": {"all": true}})),
            ScenarioOptions::new(),
            panics,
        )
        .scenario(
            "setup fails midway",
            requirement(json!({
                "prices": {"$base": 2},
                "tokenBalances": {"albert": {"$base": "< 0"}},
            })),
            ScenarioOptions::new(),
            passes,
        );

    let report = runner.run(&registry).await;
    assert_eq!(report.summary().failed, 2);
    assert_eq!(report.summary().setup_failures, 1);
    assert_eq!(runner.world().state(), lending_market());
    assert_eq!(runner.world().restores(), runner.world().contexts_issued());
}
