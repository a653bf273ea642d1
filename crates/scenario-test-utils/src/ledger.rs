//! Simulated lending market
//!
//! One base asset that can be supplied and borrowed, plus collateral assets
//! that can be supplied and borrowed against. Balances are kept in base
//! units; prices use [`PRICE_SCALE`].

use async_trait::async_trait;
use parking_lot::Mutex;
use scenario_context::{
    Configuration, Context, ContextError, PauseFlags, PauseGuardian, PriceOracle, Restorer,
    TokenLedger, PRICE_SCALE,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Account holding the protocol's own tokens
pub const COMET_ACCOUNT: &str = "comet";

/// Alias resolving to [`COMET_ACCOUNT`]
pub const COMET_ALIAS: &str = "$comet";

/// Full state of one simulated deployment
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerState {
    configuration: Configuration,
    deployment: u64,
    prices: BTreeMap<String, u128>,
    wallets: BTreeMap<(String, String), u128>,
    principal: BTreeMap<String, i128>,
    collateral: BTreeMap<(String, String), u128>,
    pause: PauseFlags,
}

impl LedgerState {
    /// Fresh deployment of a configuration, every listed asset priced at 1
    #[must_use]
    pub fn new(configuration: Configuration) -> Self {
        let prices = listed_assets(&configuration)
            .into_iter()
            .map(|symbol| (symbol, PRICE_SCALE))
            .collect();
        Self {
            configuration,
            deployment: 0,
            prices,
            wallets: BTreeMap::new(),
            principal: BTreeMap::new(),
            collateral: BTreeMap::new(),
            pause: PauseFlags::default(),
        }
    }

    /// With a whole-unit price
    #[must_use]
    pub fn with_price(mut self, symbol: &str, whole: u128) -> Self {
        self.prices.insert(symbol.to_string(), whole * PRICE_SCALE);
        self
    }

    /// With a wallet balance in base units
    #[must_use]
    pub fn with_balance(mut self, account: &str, symbol: &str, amount: u128) -> Self {
        self.wallets
            .insert((account.to_string(), symbol.to_string()), amount);
        self
    }

    /// Deployment configuration
    #[inline]
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Number of upgrades applied
    #[inline]
    #[must_use]
    pub fn deployment(&self) -> u64 {
        self.deployment
    }

    fn ensure_listed(&self, symbol: &str) -> Result<(), ContextError> {
        if listed_assets(&self.configuration).iter().any(|s| s == symbol) {
            Ok(())
        } else {
            Err(ContextError::UnknownAsset(symbol.to_string()))
        }
    }

    fn base(&self) -> Result<String, ContextError> {
        self.configuration
            .base_token()
            .map(str::to_string)
            .ok_or_else(|| ContextError::rejected("no base token configured"))
    }

    fn wallet(&self, account: &str, symbol: &str) -> u128 {
        self.wallets
            .get(&(account.to_string(), symbol.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn set_wallet(&mut self, account: &str, symbol: &str, amount: u128) {
        self.wallets
            .insert((account.to_string(), symbol.to_string()), amount);
    }

    fn debit_wallet(&mut self, account: &str, symbol: &str, amount: u128) -> Result<(), ContextError> {
        let balance = self.wallet(account, symbol);
        let remaining = balance.checked_sub(amount).ok_or_else(|| {
            ContextError::rejected(format!(
                "{account} holds {balance} {symbol}, needs {amount}"
            ))
        })?;
        self.set_wallet(account, symbol, remaining);
        Ok(())
    }

    fn credit_wallet(&mut self, account: &str, symbol: &str, amount: u128) -> Result<(), ContextError> {
        let balance = self
            .wallet(account, symbol)
            .checked_add(amount)
            .ok_or_else(|| ContextError::rejected("wallet overflow"))?;
        self.set_wallet(account, symbol, balance);
        Ok(())
    }

    /// Value of an amount in price-scale units
    fn value_of(&self, symbol: &str, amount: u128) -> Result<u128, ContextError> {
        let price = self
            .prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ContextError::UnknownAsset(symbol.to_string()))?;
        let unit = self.configuration.scale_amount(symbol, 1)?;
        amount
            .checked_mul(price)
            .map(|v| v / unit)
            .ok_or_else(|| ContextError::rejected("value overflow"))
    }

    fn borrow_capacity(&self, account: &str) -> Result<u128, ContextError> {
        let mut capacity = 0u128;
        for ((holder, symbol), amount) in &self.collateral {
            if holder != account {
                continue;
            }
            let factor = self
                .configuration
                .borrow_collateral_factor_bps(symbol)
                .unwrap_or(0);
            capacity += self.value_of(symbol, *amount)? * u128::from(factor) / 10_000;
        }
        Ok(capacity)
    }

    fn supply(&mut self, account: &str, symbol: &str, amount: u128) -> Result<(), ContextError> {
        if self.pause.supply_paused {
            return Err(ContextError::rejected("supply paused"));
        }
        self.ensure_listed(symbol)?;
        self.debit_wallet(account, symbol, amount)?;
        self.credit_wallet(COMET_ACCOUNT, symbol, amount)?;

        if symbol == self.base()? {
            let delta = i128::try_from(amount).map_err(|_| ContextError::rejected("amount overflow"))?;
            *self.principal.entry(account.to_string()).or_insert(0) += delta;
        } else {
            *self
                .collateral
                .entry((account.to_string(), symbol.to_string()))
                .or_insert(0) += amount;
        }
        Ok(())
    }

    fn withdraw(&mut self, account: &str, symbol: &str, amount: u128) -> Result<(), ContextError> {
        if self.pause.withdraw_paused {
            return Err(ContextError::rejected("withdraw paused"));
        }
        self.ensure_listed(symbol)?;

        if symbol == self.base()? {
            let delta = i128::try_from(amount).map_err(|_| ContextError::rejected("amount overflow"))?;
            let after = self.principal.get(account).copied().unwrap_or(0) - delta;
            if after < 0 {
                let debt = self.value_of(symbol, after.unsigned_abs())?;
                if debt > self.borrow_capacity(account)? {
                    return Err(ContextError::rejected(format!("{account} is undercollateralized")));
                }
            }
            self.debit_wallet(COMET_ACCOUNT, symbol, amount)?;
            self.principal.insert(account.to_string(), after);
        } else {
            let key = (account.to_string(), symbol.to_string());
            let held = self.collateral.get(&key).copied().unwrap_or(0);
            let remaining = held
                .checked_sub(amount)
                .ok_or_else(|| ContextError::rejected(format!("{account} has {held} {symbol} supplied")))?;
            self.collateral.insert(key, remaining);
            self.debit_wallet(COMET_ACCOUNT, symbol, amount)?;
        }
        self.credit_wallet(account, symbol, amount)
    }
}

/// Base token plus collateral assets
fn listed_assets(configuration: &Configuration) -> Vec<String> {
    configuration
        .base_token()
        .into_iter()
        .chain(configuration.assets())
        .map(str::to_string)
        .collect()
}

/// Reject configurations listing assets without decimals
fn validate_configuration(configuration: &Configuration) -> Result<(), ContextError> {
    for symbol in listed_assets(configuration) {
        if configuration.decimals(&symbol).is_none() {
            return Err(ContextError::rejected(format!(
                "asset {symbol} is listed without decimals"
            )));
        }
    }
    Ok(())
}

/// Context over a simulated deployment
#[derive(Debug, Clone)]
pub struct SimContext {
    ledger: Arc<Mutex<LedgerState>>,
    restores: Arc<AtomicUsize>,
}

impl SimContext {
    pub(crate) fn new(ledger: Arc<Mutex<LedgerState>>, restores: Arc<AtomicUsize>) -> Self {
        Self { ledger, restores }
    }

    /// Standalone context over a private ledger
    #[must_use]
    pub fn standalone(state: LedgerState) -> Self {
        Self::new(Arc::new(Mutex::new(state)), Arc::new(AtomicUsize::new(0)))
    }

    /// Copy of the whole ledger state
    #[must_use]
    pub fn state(&self) -> LedgerState {
        self.ledger.lock().clone()
    }

    /// Number of upgrades applied to this deployment
    #[must_use]
    pub fn deployment(&self) -> u64 {
        self.ledger.lock().deployment
    }

    /// Supply tokens from an account's wallet
    ///
    /// # Errors
    /// Returns [`ContextError::Rejected`] if paused or the wallet is short
    pub fn supply(self, account: &str, asset: &str, amount: u128) -> Result<Self, ContextError> {
        self.ledger.lock().supply(account, asset, amount)?;
        tracing::debug!(account, asset, amount = %amount, "supplied");
        Ok(self)
    }

    /// Withdraw collateral or base, borrowing base past zero
    ///
    /// # Errors
    /// Returns [`ContextError::Rejected`] if paused, undercollateralized or
    /// the protocol lacks liquidity
    pub fn withdraw(self, account: &str, asset: &str, amount: u128) -> Result<Self, ContextError> {
        self.ledger.lock().withdraw(account, asset, amount)?;
        tracing::debug!(account, asset, amount = %amount, "withdrew");
        Ok(self)
    }

    /// Signed base balance; negative while borrowing
    #[must_use]
    pub fn base_balance_of(&self, account: &str) -> i128 {
        self.ledger.lock().principal.get(account).copied().unwrap_or(0)
    }

    /// Supplied collateral of one asset
    #[must_use]
    pub fn collateral_balance_of(&self, account: &str, asset: &str) -> u128 {
        self.ledger
            .lock()
            .collateral
            .get(&(account.to_string(), asset.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Context for SimContext {
    fn configuration(&self) -> Configuration {
        self.ledger.lock().configuration.clone()
    }

    async fn upgrade(self, configuration: Configuration) -> Result<Self, ContextError> {
        validate_configuration(&configuration)?;
        {
            let mut ledger = self.ledger.lock();
            for symbol in listed_assets(&configuration) {
                ledger.prices.entry(symbol).or_insert(PRICE_SCALE);
            }
            ledger.configuration = configuration;
            ledger.deployment += 1;
            tracing::debug!(deployment = ledger.deployment, "redeployed");
        }
        Ok(self)
    }

    async fn snapshot(&self) -> Result<Box<dyn Restorer>, ContextError> {
        Ok(Box::new(SimRestorer {
            ledger: Arc::clone(&self.ledger),
            saved: self.state(),
            restores: Arc::clone(&self.restores),
        }))
    }
}

#[async_trait]
impl PriceOracle for SimContext {
    async fn price(&self, asset: &str) -> Result<u128, ContextError> {
        self.ledger
            .lock()
            .prices
            .get(asset)
            .copied()
            .ok_or_else(|| ContextError::UnknownAsset(asset.to_string()))
    }

    async fn set_price(self, asset: &str, price: u128) -> Result<Self, ContextError> {
        {
            let mut ledger = self.ledger.lock();
            ledger.ensure_listed(asset)?;
            ledger.prices.insert(asset.to_string(), price);
        }
        Ok(self)
    }
}

#[async_trait]
impl TokenLedger for SimContext {
    fn account(&self, alias: &str) -> Result<String, ContextError> {
        match alias {
            COMET_ALIAS => Ok(COMET_ACCOUNT.to_string()),
            a if a.starts_with('$') => Err(ContextError::UnknownAlias(a.to_string())),
            a => Ok(a.to_string()),
        }
    }

    async fn balance_of(&self, account: &str, asset: &str) -> Result<u128, ContextError> {
        let ledger = self.ledger.lock();
        ledger.ensure_listed(asset)?;
        Ok(ledger.wallet(account, asset))
    }

    async fn set_balance(self, account: &str, asset: &str, amount: u128) -> Result<Self, ContextError> {
        {
            let mut ledger = self.ledger.lock();
            ledger.ensure_listed(asset)?;
            ledger.set_wallet(account, asset, amount);
        }
        Ok(self)
    }
}

#[async_trait]
impl PauseGuardian for SimContext {
    async fn pause_flags(&self) -> Result<PauseFlags, ContextError> {
        Ok(self.ledger.lock().pause)
    }

    async fn set_pause_flags(self, flags: PauseFlags) -> Result<Self, ContextError> {
        self.ledger.lock().pause = flags;
        Ok(self)
    }
}

/// Writes a saved state back into its ledger
struct SimRestorer {
    ledger: Arc<Mutex<LedgerState>>,
    saved: LedgerState,
    restores: Arc<AtomicUsize>,
}

#[async_trait]
impl Restorer for SimRestorer {
    async fn restore(&self) -> Result<(), ContextError> {
        *self.ledger.lock() = self.saved.clone();
        self.restores.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
