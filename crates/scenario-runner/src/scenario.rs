//! Scenario registration
//!
//! A [`Scenario`] pairs a requirement template with an async body. Scenarios
//! are collected in a [`ScenarioRegistry`] and handed to the runner; building
//! one performs no I/O.

use futures::future::BoxFuture;
use scenario_requirement::Requirement;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Scenario body over the prepared context
pub type Body<C> = Arc<dyn Fn(C) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Admission filter over a fresh context
pub type Filter<C> = Arc<dyn Fn(C) -> BoxFuture<'static, anyhow::Result<bool>> + Send + Sync>;

/// How a scenario takes part in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Runs unless some scenario is [`Mode::Only`]
    #[default]
    Normal,
    /// Runs; when any scenario is `Only`, the others are left out
    Only,
    /// Reported as skipped without touching the world
    Skip,
}

/// Per-scenario options
pub struct ScenarioOptions<C> {
    filter: Option<Filter<C>>,
    mode: Mode,
}

impl<C> ScenarioOptions<C> {
    /// Default options: no filter, [`Mode::Normal`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            filter: None,
            mode: Mode::Normal,
        }
    }

    /// With an admission filter; `false` skips the scenario
    #[must_use]
    pub fn with_filter<F, Fut>(mut self, filter: F) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
    {
        self.filter = Some(Arc::new(move |ctx| -> BoxFuture<'static, anyhow::Result<bool>> {
            Box::pin(filter(ctx))
        }));
        self
    }

    /// With mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Admission filter, if any
    #[inline]
    #[must_use]
    pub fn filter(&self) -> Option<&Filter<C>> {
        self.filter.as_ref()
    }

    /// Mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }
}

impl<C> Default for ScenarioOptions<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for ScenarioOptions<C> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            mode: self.mode,
        }
    }
}

impl<C> fmt::Debug for ScenarioOptions<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioOptions")
            .field("filter", &self.filter.is_some())
            .field("mode", &self.mode)
            .finish()
    }
}

/// Named requirement template with a body
pub struct Scenario<C> {
    name: String,
    requirement: Requirement<C>,
    options: ScenarioOptions<C>,
    body: Body<C>,
}

impl<C> Scenario<C> {
    /// Create scenario
    pub fn new<F, Fut>(
        name: impl Into<String>,
        requirement: Requirement<C>,
        options: ScenarioOptions<C>,
        body: F,
    ) -> Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            requirement,
            options,
            body: Arc::new(move |ctx| -> BoxFuture<'static, anyhow::Result<()>> {
                Box::pin(body(ctx))
            }),
        }
    }

    /// Scenario name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requirement template
    #[inline]
    #[must_use]
    pub fn requirement(&self) -> &Requirement<C> {
        &self.requirement
    }

    /// Options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ScenarioOptions<C> {
        &self.options
    }

    /// Body
    #[inline]
    #[must_use]
    pub fn body(&self) -> &Body<C> {
        &self.body
    }
}

impl<C> fmt::Debug for Scenario<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("requirement", &self.requirement)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Ordered collection of scenarios for one run
pub struct ScenarioRegistry<C> {
    scenarios: Vec<Scenario<C>>,
}

impl<C> ScenarioRegistry<C> {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            scenarios: Vec::new(),
        }
    }

    /// Register a scenario
    pub fn scenario<F, Fut>(
        &mut self,
        name: impl Into<String>,
        requirement: Requirement<C>,
        options: ScenarioOptions<C>,
        body: F,
    ) -> &mut Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.add(Scenario::new(name, requirement, options, body))
    }

    /// Register a scenario in [`Mode::Only`]
    pub fn only<F, Fut>(&mut self, name: impl Into<String>, requirement: Requirement<C>, body: F) -> &mut Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let options = ScenarioOptions::new().with_mode(Mode::Only);
        self.scenario(name, requirement, options, body)
    }

    /// Register a scenario in [`Mode::Skip`]
    pub fn skip<F, Fut>(&mut self, name: impl Into<String>, requirement: Requirement<C>, body: F) -> &mut Self
    where
        F: Fn(C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let options = ScenarioOptions::new().with_mode(Mode::Skip);
        self.scenario(name, requirement, options, body)
    }

    /// Register a prebuilt scenario
    pub fn add(&mut self, scenario: Scenario<C>) -> &mut Self {
        self.scenarios.push(scenario);
        self
    }

    /// Number of registered scenarios
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Check if nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Scenarios in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Scenario<C>> {
        self.scenarios.iter()
    }

    /// Scenarios taking part in a run, in registration order
    ///
    /// When any scenario is [`Mode::Only`], only those and the
    /// [`Mode::Skip`] ones are selected.
    #[must_use]
    pub fn selected(&self) -> Vec<&Scenario<C>> {
        let focused = self.scenarios.iter().any(|s| s.options.mode == Mode::Only);
        self.scenarios
            .iter()
            .filter(|s| !focused || s.options.mode != Mode::Normal)
            .collect()
    }
}

impl<C> Default for ScenarioRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for ScenarioRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.scenarios.iter().map(|s| &s.name)).finish()
    }
}
