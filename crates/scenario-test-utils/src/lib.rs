//! Testing utilities for the scenario workspace
//!
//! An in-memory lending market implementing the context contracts, and
//! fixtures for building one.

#![allow(missing_docs)]

mod ledger;
mod world;

pub use ledger::{LedgerState, SimContext, COMET_ACCOUNT, COMET_ALIAS};
pub use world::SimWorld;

use scenario_context::Configuration;
use serde_json::json;

pub const BASE_SYMBOL: &str = "USDC";
pub const COLLATERAL_SYMBOL: &str = "WETH";

/// USDC base market with WETH and COMP collateral
pub fn market_configuration() -> Configuration {
    Configuration::from_json(json!({
        "baseToken": "USDC",
        "assets": ["WETH", "COMP"],
        "decimals": {"USDC": 6, "WETH": 18, "COMP": 18},
        "borrowCollateralFactors": {"WETH": 8000, "COMP": 6500},
        "governor": "timelock",
    }))
    .unwrap()
}

/// Fresh market with WETH at 3000 and COMP at 50
pub fn lending_market() -> LedgerState {
    LedgerState::new(market_configuration())
        .with_price("WETH", 3000)
        .with_price("COMP", 50)
}

/// Whole tokens to base units for a market asset
pub fn units(symbol: &str, whole: u128) -> u128 {
    market_configuration()
        .scale_amount(symbol, whole)
        .unwrap()
}

/// Forking world over [`lending_market`]
pub fn forking_world() -> SimWorld {
    SimWorld::forking(lending_market())
}
