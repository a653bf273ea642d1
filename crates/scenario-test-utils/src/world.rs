//! Simulated worlds
//!
//! A forking world hands every execution its own copy of a baseline ledger.
//! A shared world hands out handles to one ledger, the way a single local
//! chain node does; isolation then depends entirely on snapshot and restore,
//! so it must only be driven by one execution at a time.

use crate::ledger::{LedgerState, SimContext};
use async_trait::async_trait;
use parking_lot::Mutex;
use scenario_context::{ContextError, World};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
enum Mode {
    Forking(LedgerState),
    Shared(Arc<Mutex<LedgerState>>),
}

/// [`World`] over simulated ledgers
#[derive(Debug)]
pub struct SimWorld {
    mode: Mode,
    issued: AtomicUsize,
    restores: Arc<AtomicUsize>,
}

impl SimWorld {
    /// Every context is a private copy of `baseline`
    #[must_use]
    pub fn forking(baseline: LedgerState) -> Self {
        Self::with_mode(Mode::Forking(baseline))
    }

    /// Every context shares one ledger
    #[must_use]
    pub fn shared(state: LedgerState) -> Self {
        Self::with_mode(Mode::Shared(Arc::new(Mutex::new(state))))
    }

    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            issued: AtomicUsize::new(0),
            restores: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Contexts handed out so far
    #[must_use]
    pub fn contexts_issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    /// Restores performed by restorers of this world's contexts
    #[must_use]
    pub fn restores(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }

    /// Current state of a shared ledger, or the baseline of a forking world
    #[must_use]
    pub fn state(&self) -> LedgerState {
        match &self.mode {
            Mode::Forking(baseline) => baseline.clone(),
            Mode::Shared(ledger) => ledger.lock().clone(),
        }
    }
}

#[async_trait]
impl World for SimWorld {
    type Context = SimContext;

    async fn context(&self) -> Result<SimContext, ContextError> {
        let ledger = match &self.mode {
            Mode::Forking(baseline) => Arc::new(Mutex::new(baseline.clone())),
            Mode::Shared(ledger) => Arc::clone(ledger),
        };
        let issued = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(issued, "context issued");
        Ok(SimContext::new(ledger, Arc::clone(&self.restores)))
    }
}
