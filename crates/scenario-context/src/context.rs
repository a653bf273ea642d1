//! Context, snapshot and world contracts
//!
//! A [`Context`] is a handle to one running instance of the protocol. It is
//! owned by a single scenario execution. Mutating operations consume the
//! handle and return the context to use from then on, even when the
//! underlying transport is stateful.

use crate::configuration::Configuration;
use crate::error::ContextError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Handle to one running instance of the system under test
#[async_trait]
pub trait Context: Clone + Send + Sync + 'static {
    /// Current deployment configuration
    fn configuration(&self) -> Configuration;

    /// Redeploy with a new configuration
    ///
    /// # Errors
    /// Returns [`ContextError::Rejected`] if the system refuses the upgrade
    async fn upgrade(self, configuration: Configuration) -> Result<Self, ContextError>;

    /// Capture the current state
    ///
    /// # Errors
    /// Returns [`ContextError::Snapshot`] if the state cannot be captured
    async fn snapshot(&self) -> Result<Box<dyn Restorer>, ContextError>;
}

/// Restores the state captured by [`Context::snapshot`]
///
/// Restoring re-arms the restorer, so calling it again later in the same
/// execution returns to the same state.
#[async_trait]
pub trait Restorer: Send + Sync {
    /// Return to the captured state
    ///
    /// # Errors
    /// Returns [`ContextError::Snapshot`] if the state cannot be restored
    async fn restore(&self) -> Result<(), ContextError>;
}

/// Source of isolated contexts
///
/// The world is the only thing shared between concurrent executions.
#[async_trait]
pub trait World: Send + Sync {
    /// Context type handed to executions
    type Context: Context;

    /// Obtain a context for one execution
    ///
    /// # Errors
    /// Returns [`ContextError::Transport`] if no context can be obtained
    async fn context(&self) -> Result<Self::Context, ContextError>;
}

/// Price feed control
#[async_trait]
pub trait PriceOracle: Context {
    /// Price of an asset, scaled by [`PRICE_SCALE`]
    ///
    /// # Errors
    /// Returns [`ContextError::UnknownAsset`] if the asset has no feed
    async fn price(&self, asset: &str) -> Result<u128, ContextError>;

    /// Override the price of an asset
    ///
    /// # Errors
    /// Returns [`ContextError::UnknownAsset`] if the asset has no feed
    async fn set_price(self, asset: &str, price: u128) -> Result<Self, ContextError>;
}

/// Price feed decimals
pub const PRICE_SCALE: u128 = 100_000_000;

/// Token wallet control
#[async_trait]
pub trait TokenLedger: Context {
    /// Map an account alias (`$comet`, actor names) to an account
    ///
    /// # Errors
    /// Returns [`ContextError::UnknownAlias`] for an unmapped alias
    fn account(&self, alias: &str) -> Result<String, ContextError>;

    /// Wallet balance in base units
    ///
    /// # Errors
    /// Returns [`ContextError::UnknownAsset`] for an unlisted asset
    async fn balance_of(&self, account: &str, asset: &str) -> Result<u128, ContextError>;

    /// Force a wallet balance, sourcing or burning tokens as needed
    ///
    /// # Errors
    /// Returns [`ContextError::UnknownAsset`] for an unlisted asset
    async fn set_balance(self, account: &str, asset: &str, amount: u128) -> Result<Self, ContextError>;
}

/// Pause guardian control
#[async_trait]
pub trait PauseGuardian: Context {
    /// Current pause flags
    ///
    /// # Errors
    /// Returns [`ContextError::Transport`] if the flags cannot be read
    async fn pause_flags(&self) -> Result<PauseFlags, ContextError>;

    /// Replace the pause flags
    ///
    /// # Errors
    /// Returns [`ContextError::Rejected`] if the system refuses
    async fn set_pause_flags(self, flags: PauseFlags) -> Result<Self, ContextError>;
}

/// Protocol pause flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseFlags {
    /// Supplies rejected
    pub supply_paused: bool,
    /// Transfers rejected
    pub transfer_paused: bool,
    /// Withdrawals and borrows rejected
    pub withdraw_paused: bool,
    /// Liquidations rejected
    pub absorb_paused: bool,
    /// Collateral purchases rejected
    pub buy_paused: bool,
}

impl PauseFlags {
    /// Every flag set to `paused`
    #[inline]
    #[must_use]
    pub fn all(paused: bool) -> Self {
        Self {
            supply_paused: paused,
            transfer_paused: paused,
            withdraw_paused: paused,
            absorb_paused: paused,
            buy_paused: paused,
        }
    }

    /// Flag names with their values, in a fixed order
    #[must_use]
    pub fn entries(&self) -> [(&'static str, bool); 5] {
        [
            ("supplyPaused", self.supply_paused),
            ("transferPaused", self.transfer_paused),
            ("withdrawPaused", self.withdraw_paused),
            ("absorbPaused", self.absorb_paused),
            ("buyPaused", self.buy_paused),
        ]
    }

    /// Set a flag by name; returns `false` for an unknown name
    pub fn set(&mut self, name: &str, paused: bool) -> bool {
        let slot = match name {
            "supplyPaused" => &mut self.supply_paused,
            "transferPaused" => &mut self.transfer_paused,
            "withdrawPaused" => &mut self.withdraw_paused,
            "absorbPaused" => &mut self.absorb_paused,
            "buyPaused" => &mut self.buy_paused,
            _ => return false,
        };
        *slot = paused;
        true
    }
}
