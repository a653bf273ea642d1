//! Scenario Context
//!
//! Contracts for the live protocol instance scenarios run against. The
//! instance itself lives outside this workspace; it is consumed through:
//!
//! - [`Context`]: configuration, upgrade and snapshot of one instance
//! - [`Restorer`]: re-armable state restore
//! - [`World`]: source of isolated contexts
//! - [`PriceOracle`], [`TokenLedger`], [`PauseGuardian`]: protocol controls
//!   used by constraints
//! - [`Configuration`]: deployment configuration with right-biased merge

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod configuration;
mod context;
mod error;

pub use configuration::{Configuration, ASSET_ALIAS_PREFIX, BASE_ALIAS};
pub use context::{
    Context, PauseFlags, PauseGuardian, PriceOracle, Restorer, TokenLedger, World, PRICE_SCALE,
};
pub use error::ContextError;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
