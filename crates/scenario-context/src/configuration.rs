//! Deployment configuration
//!
//! A JSON object describing one deployment of the protocol. Upgrades are
//! expressed as partial configurations merged over the current one.
//!
//! Well-known keys:
//! - `baseToken`: symbol of the borrowable asset
//! - `assets`: array of collateral asset symbols
//! - `decimals`: object mapping asset symbol → token decimals
//! - `borrowCollateralFactors`: object mapping collateral symbol → factor in bps

use crate::error::ContextError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Alias for the base asset
pub const BASE_ALIAS: &str = "$base";

/// Prefix for collateral aliases (`$asset0`, `$asset1`, ...)
pub const ASSET_ALIAS_PREFIX: &str = "$asset";

/// Deployment configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configuration(Map<String, Value>);

impl Configuration {
    /// Create empty configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value
    ///
    /// # Errors
    /// Returns [`ContextError::Rejected`] if the value is not an object
    pub fn from_json(value: Value) -> Result<Self, ContextError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ContextError::rejected(format!(
                "configuration must be an object, got {other}"
            ))),
        }
    }

    /// Get a top-level field
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set a top-level field
    #[inline]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Top-level keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Right-biased shallow merge
    ///
    /// Every top-level key of `delta` replaces the same key of `self`;
    /// nested objects are replaced whole, not merged.
    #[must_use]
    pub fn merge(&self, delta: &Configuration) -> Self {
        let mut merged = self.0.clone();
        for (key, value) in &delta.0 {
            merged.insert(key.clone(), value.clone());
        }
        Self(merged)
    }

    /// Symbol of the base asset
    #[must_use]
    pub fn base_token(&self) -> Option<&str> {
        self.get("baseToken").and_then(Value::as_str)
    }

    /// Collateral asset symbols in listing order
    #[must_use]
    pub fn assets(&self) -> Vec<&str> {
        self.get("assets")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Token decimals of an asset
    #[must_use]
    pub fn decimals(&self, symbol: &str) -> Option<u32> {
        self.get("decimals")
            .and_then(|d| d.get(symbol))
            .and_then(Value::as_u64)
            .and_then(|d| u32::try_from(d).ok())
    }

    /// Borrow collateral factor of a collateral asset, in basis points
    #[must_use]
    pub fn borrow_collateral_factor_bps(&self, symbol: &str) -> Option<u64> {
        self.get("borrowCollateralFactors")
            .and_then(|f| f.get(symbol))
            .and_then(Value::as_u64)
    }

    /// Map an asset alias to a listed symbol
    ///
    /// `$base` is the base token and `$assetN` the N-th collateral; any
    /// name without a `$` is taken as a symbol.
    ///
    /// # Errors
    /// Returns [`ContextError::UnknownAlias`] for an alias the configuration
    /// cannot satisfy
    pub fn resolve_asset(&self, alias: &str) -> Result<String, ContextError> {
        if alias == BASE_ALIAS {
            return self
                .base_token()
                .map(str::to_string)
                .ok_or_else(|| ContextError::UnknownAlias(alias.to_string()));
        }
        if let Some(index) = alias.strip_prefix(ASSET_ALIAS_PREFIX) {
            return index
                .parse::<usize>()
                .ok()
                .and_then(|i| self.assets().get(i).map(|s| (*s).to_string()))
                .ok_or_else(|| ContextError::UnknownAlias(alias.to_string()));
        }
        if alias.starts_with('$') {
            return Err(ContextError::UnknownAlias(alias.to_string()));
        }
        Ok(alias.to_string())
    }

    /// Scale a whole-token amount by the asset's decimals
    ///
    /// # Errors
    /// Returns [`ContextError::UnknownAsset`] if the asset has no decimals
    /// listed, or [`ContextError::Rejected`] on overflow
    pub fn scale_amount(&self, symbol: &str, whole: u128) -> Result<u128, ContextError> {
        let decimals = self
            .decimals(symbol)
            .ok_or_else(|| ContextError::UnknownAsset(symbol.to_string()))?;
        10u128
            .checked_pow(decimals)
            .and_then(|unit| unit.checked_mul(whole))
            .ok_or_else(|| ContextError::rejected(format!("amount overflow for {symbol}")))
    }

    /// Render as a JSON object
    #[inline]
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl TryFrom<Value> for Configuration {
    type Error = ContextError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}
