//! Scenario runner
//!
//! For each selected scenario the runner takes a context from the world,
//! evaluates the admission filter, and lets every constraint solve the
//! requirement against it. The executions of a scenario are the Cartesian
//! product of the applicable constraints' variants, first constraint
//! varying slowest. Each execution then gets its own fresh context,
//! snapshots it, applies its solutions left to right, optionally checks the
//! post-conditions, runs the body, and restores the snapshot.
//!
//! Executions run through a bounded pool. Reports come back in
//! registration order, then variant order, whatever order they finish in.

use crate::config::RunnerConfig;
use crate::error::ScenarioError;
use crate::report::{Conflict, ExecutionId, ExecutionReport, Outcome, RunReport};
use crate::scenario::{Mode, Scenario, ScenarioRegistry};
use crate::state::{Lifecycle, Stage};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use scenario_constraint::{Constraint, Solve, Variant};
use scenario_context::{Context, Restorer, World};
use scenario_requirement::{cardinality, ConcreteRequirement, Requirement};
use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use ulid::Ulid;

/// Position of a report: scenario index, then variant index
type Order = (usize, usize);

/// One chosen variant of one applicable constraint
struct Step<C> {
    constraint: Arc<dyn Constraint<C>>,
    variant: Variant<C>,
}

impl<C> Clone for Step<C> {
    fn clone(&self) -> Self {
        Self {
            constraint: Arc::clone(&self.constraint),
            variant: self.variant.clone(),
        }
    }
}

/// A solved execution waiting for a context
struct Plan<'s, C> {
    order: Order,
    id: ExecutionId,
    scenario: &'s Scenario<C>,
    steps: Vec<Step<C>>,
    lifecycle: Lifecycle,
}

/// Result of filtering and solving one scenario
enum Planned<'s, C> {
    Executions(Vec<Plan<'s, C>>),
    Finished(Order, ExecutionReport),
}

/// What the admission stage decided
enum Admission<C> {
    Skipped,
    Solved(Vec<Vec<Step<C>>>),
}

/// Runs registered scenarios against a world
pub struct Runner<W: World> {
    world: Arc<W>,
    constraints: Vec<Arc<dyn Constraint<W::Context>>>,
    config: RunnerConfig,
}

impl<W: World> Runner<W> {
    /// Create runner; `constraints` solve in the given order
    #[must_use]
    pub fn new(world: W, constraints: Vec<Arc<dyn Constraint<W::Context>>>) -> Self {
        Self {
            world: Arc::new(world),
            constraints,
            config: RunnerConfig::default(),
        }
    }

    /// With configuration
    #[inline]
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an extra constraint after the existing ones
    #[must_use]
    pub fn with_constraint(mut self, constraint: Arc<dyn Constraint<W::Context>>) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// World executions draw contexts from
    #[inline]
    #[must_use]
    pub fn world(&self) -> &W {
        &self.world
    }

    /// Names of the registered constraints, in solve order
    #[must_use]
    pub fn constraint_names(&self) -> Vec<&'static str> {
        self.constraints.iter().map(|c| c.name()).collect()
    }

    /// Run every selected scenario of a registry
    pub async fn run(&self, registry: &ScenarioRegistry<W::Context>) -> RunReport {
        let run_id = Ulid::new();
        let started_at = Utc::now();
        let clock = Instant::now();
        let concurrency = self.config.max_concurrency.max(1);
        let selected = registry.selected();
        tracing::info!(%run_id, scenarios = selected.len(), concurrency, "starting scenario run");

        let planned: Vec<Planned<'_, W::Context>> = stream::iter(selected.into_iter().enumerate())
            .map(|(index, scenario)| self.plan(index, scenario))
            .buffered(concurrency)
            .collect()
            .await;

        let mut reports = Vec::new();
        let mut plans = Vec::new();
        for entry in planned {
            match entry {
                Planned::Executions(executions) => plans.extend(executions),
                Planned::Finished(order, report) => reports.push((order, report)),
            }
        }

        let executed: Vec<(Order, ExecutionReport)> = stream::iter(plans)
            .map(|plan| self.execute(plan))
            .buffer_unordered(concurrency)
            .collect()
            .await;
        reports.extend(executed);
        reports.sort_by_key(|(order, _)| *order);

        let report = RunReport {
            run_id,
            started_at,
            duration_ms: elapsed_ms(clock),
            executions: reports.into_iter().map(|(_, report)| report).collect(),
        };
        let summary = report.summary();
        tracing::info!(
            %run_id,
            total = summary.total,
            passed = summary.passed,
            skipped = summary.skipped,
            setup_failures = summary.setup_failures,
            failed = summary.failed,
            "scenario run finished"
        );
        report
    }

    /// Filter and solve one scenario on a throwaway context
    async fn plan<'s>(
        &self,
        index: usize,
        scenario: &'s Scenario<W::Context>,
    ) -> Planned<'s, W::Context> {
        let clock = Instant::now();
        let mut lifecycle = Lifecycle::new();
        let finish = |lifecycle: Lifecycle, outcome: Outcome| {
            let report = ExecutionReport {
                id: ExecutionId::single(scenario.name()),
                requirement: ConcreteRequirement::default(),
                outcome,
                conflicts: Vec::new(),
                solutions_applied: 0,
                stages: lifecycle.into_stages(),
                duration_ms: elapsed_ms(clock),
            };
            log_outcome(&report);
            Planned::Finished((index, 0), report)
        };

        if scenario.options().mode() == Mode::Skip {
            lifecycle.advance(Stage::Skipped);
            return finish(lifecycle, Outcome::Skipped);
        }

        tracing::info!(scenario = scenario.name(), "planning scenario");
        lifecycle.advance(Stage::Filtering);
        let (context, restorer) = match self.acquire().await {
            Ok(acquired) => acquired,
            Err(error) => {
                lifecycle.advance(Stage::TornDown);
                return finish(lifecycle, Outcome::from_error(error));
            }
        };

        let admission = match unwinding(self.admit(scenario, &context, &mut lifecycle)).await {
            Ok(admission) => admission,
            Err(message) => Err(ScenarioError::SetupPanicked(message)),
        };
        drop(context);
        let teardown = restorer.restore().await;
        if (admission.is_err() || teardown.is_err()) && lifecycle.current() != Stage::Skipped {
            lifecycle.advance(Stage::TornDown);
        }

        let executions = match (admission, teardown) {
            (Ok(Admission::Skipped), Ok(())) => return finish(lifecycle, Outcome::Skipped),
            (Ok(Admission::Solved(executions)), Ok(())) => executions,
            (Err(error), _) => return finish(lifecycle, Outcome::from_error(error)),
            (Ok(_), Err(error)) => {
                return finish(lifecycle, Outcome::from_error(ScenarioError::Teardown(error)))
            }
        };

        if executions.is_empty() {
            tracing::warn!(scenario = scenario.name(), "requirement expands to no executions");
        }
        let single = executions.len() == 1;
        Planned::Executions(
            executions
                .into_iter()
                .enumerate()
                .map(|(variant, steps)| Plan {
                    order: (index, variant),
                    id: if single {
                        ExecutionId::single(scenario.name())
                    } else {
                        ExecutionId::variant(scenario.name(), variant)
                    },
                    scenario,
                    steps,
                    lifecycle: lifecycle.clone(),
                })
                .collect(),
        )
    }

    /// Admission filter, then every constraint's solve
    async fn admit(
        &self,
        scenario: &Scenario<W::Context>,
        context: &W::Context,
        lifecycle: &mut Lifecycle,
    ) -> Result<Admission<W::Context>, ScenarioError> {
        if let Some(filter) = scenario.options().filter() {
            let admitted = filter(context.clone()).await.map_err(ScenarioError::Filter)?;
            if !admitted {
                tracing::info!(scenario = scenario.name(), "admission filter rejected scenario");
                lifecycle.advance(Stage::Skipped);
                return Ok(Admission::Skipped);
            }
        }

        lifecycle.advance(Stage::Solving);
        self.check_variant_budget(scenario.requirement(), context)?;
        let mut choices = Vec::new();
        for constraint in &self.constraints {
            let solve = constraint
                .solve(scenario.requirement(), context)
                .await
                .map_err(|error| ScenarioError::from_solve(constraint.name(), error))?;
            match solve {
                Solve::NotApplicable => {}
                Solve::Variants(variants) => {
                    tracing::debug!(
                        constraint = constraint.name(),
                        variants = variants.len(),
                        "constraint applies"
                    );
                    choices.push(
                        variants
                            .into_iter()
                            .map(|variant| Step {
                                constraint: Arc::clone(constraint),
                                variant,
                            })
                            .collect::<Vec<_>>(),
                    );
                }
            }
        }

        let count = choices
            .iter()
            .try_fold(1usize, |acc, options| acc.checked_mul(options.len()))
            .unwrap_or(usize::MAX);
        if count > self.config.max_variants {
            return Err(ScenarioError::VariantLimit {
                count,
                limit: self.config.max_variants,
            });
        }
        Ok(Admission::Solved(product(&choices)))
    }

    /// Count executions before any constraint enumerates them
    ///
    /// Resolvers run here and again while solving.
    fn check_variant_budget(
        &self,
        requirement: &Requirement<W::Context>,
        context: &W::Context,
    ) -> Result<(), ScenarioError> {
        let limit = self.config.max_variants;
        let mut count = 1usize;
        for constraint in &self.constraints {
            let owned = constraint.dimensions();
            if !owned.iter().any(|dimension| requirement.contains(dimension)) {
                continue;
            }
            let variants = requirement
                .resolve_dimensions(context, owned)
                .and_then(|resolved| cardinality(&resolved))
                .map_err(|source| ScenarioError::Resolution {
                    constraint: constraint.name(),
                    source,
                })?;
            // a single oversized constraint fails even when another one vetoes
            if variants > limit {
                return Err(ScenarioError::VariantLimit { count: variants, limit });
            }
            count = count.saturating_mul(variants);
        }
        if count > limit {
            return Err(ScenarioError::VariantLimit { count, limit });
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(execution = %plan.id))]
    async fn execute(&self, plan: Plan<'_, W::Context>) -> (Order, ExecutionReport) {
        let Plan {
            order,
            id,
            scenario,
            steps,
            mut lifecycle,
        } = plan;
        let clock = Instant::now();
        let requirement = steps
            .iter()
            .flat_map(|step| step.variant.requirement.iter())
            .map(|(dimension, value)| (dimension.clone(), value.clone()))
            .collect();

        let conflicts = detect_conflicts(&steps);
        for conflict in &conflicts {
            tracing::warn!(
                key = %conflict.key,
                constraints = ?conflict.constraints,
                "constraints touch the same state key"
            );
        }

        let mut applied = 0;
        let outcome = match conflicts.first() {
            Some(conflict) if self.config.deny_conflicts => {
                lifecycle.advance(Stage::TornDown);
                Outcome::from_error(ScenarioError::Conflict {
                    key: conflict.key.clone(),
                    constraints: conflict.constraints.clone(),
                })
            }
            _ => self.run_execution(scenario, &steps, &mut lifecycle, &mut applied).await,
        };

        let report = ExecutionReport {
            id,
            requirement,
            outcome,
            conflicts,
            solutions_applied: applied,
            stages: lifecycle.into_stages(),
            duration_ms: elapsed_ms(clock),
        };
        log_outcome(&report);
        (order, report)
    }

    /// Fresh context, snapshot, setup and body, then restore
    async fn run_execution(
        &self,
        scenario: &Scenario<W::Context>,
        steps: &[Step<W::Context>],
        lifecycle: &mut Lifecycle,
        applied: &mut usize,
    ) -> Outcome {
        lifecycle.advance(Stage::Applying);
        let (context, restorer) = match self.acquire().await {
            Ok(acquired) => acquired,
            Err(error) => {
                lifecycle.advance(Stage::TornDown);
                return Outcome::from_error(error);
            }
        };

        let result = self.prepare_and_run(scenario, steps, context, lifecycle, applied).await;
        lifecycle.advance(Stage::TornDown);
        let teardown = restorer.restore().await;

        match (result, teardown) {
            (Ok(()), Ok(())) => Outcome::Passed,
            (Ok(()), Err(error)) => Outcome::from_error(ScenarioError::Teardown(error)),
            (Err(error), Ok(())) => Outcome::from_error(error),
            (Err(error), Err(teardown)) => {
                tracing::error!(error = %teardown, "teardown failed after execution failure");
                Outcome::from_error(error)
            }
        }
    }

    async fn prepare_and_run(
        &self,
        scenario: &Scenario<W::Context>,
        steps: &[Step<W::Context>],
        context: W::Context,
        lifecycle: &mut Lifecycle,
        applied: &mut usize,
    ) -> Result<(), ScenarioError> {
        let context = unwinding(self.prepare(steps, context, lifecycle, applied))
            .await
            .map_err(ScenarioError::SetupPanicked)??;

        lifecycle.advance(Stage::Executing);
        let body = Arc::clone(scenario.body());
        match unwinding(body(context)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(error)) => Err(ScenarioError::Body(error)),
            Err(message) => Err(ScenarioError::BodyPanicked(message)),
        }
    }

    /// Apply solutions left to right, then check post-conditions
    async fn prepare(
        &self,
        steps: &[Step<W::Context>],
        mut context: W::Context,
        lifecycle: &mut Lifecycle,
        applied: &mut usize,
    ) -> Result<W::Context, ScenarioError> {
        let solutions = steps
            .iter()
            .flat_map(|step| step.variant.solutions.iter().map(move |s| (step.constraint.name(), s)));
        for (position, (constraint, solution)) in solutions.enumerate() {
            tracing::debug!(step = position, constraint, solution = solution.name(), "applying solution");
            context = solution
                .apply(context)
                .await
                .map_err(|source| ScenarioError::Apply {
                    step: position,
                    solution: solution.name().to_string(),
                    source,
                })?;
            *applied += 1;
        }

        if self.config.verify_constraints {
            lifecycle.advance(Stage::Verifying);
            for step in steps {
                step.constraint
                    .check(&step.variant.requirement, &context)
                    .await
                    .map_err(|source| ScenarioError::Check {
                        constraint: step.constraint.name(),
                        source,
                    })?;
            }
        }
        Ok(context)
    }

    async fn acquire(&self) -> Result<(W::Context, Box<dyn Restorer>), ScenarioError> {
        let context = self.world.context().await?;
        let restorer = context.snapshot().await?;
        Ok((context, restorer))
    }
}

impl<W: World> std::fmt::Debug for Runner<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("constraints", &self.constraint_names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Cartesian product of option lists, first list varying slowest
fn product<T: Clone>(choices: &[Vec<T>]) -> Vec<Vec<T>> {
    choices.iter().fold(vec![Vec::new()], |prefixes, options| {
        prefixes
            .iter()
            .flat_map(|prefix| {
                options.iter().map(move |option| {
                    let mut next = prefix.clone();
                    next.push(option.clone());
                    next
                })
            })
            .collect()
    })
}

/// State keys touched by more than one constraint
fn detect_conflicts<C: Context>(steps: &[Step<C>]) -> Vec<Conflict> {
    let mut owners: BTreeMap<&str, Vec<&'static str>> = BTreeMap::new();
    for step in steps {
        let name = step.constraint.name();
        for key in step.variant.solutions.iter().flat_map(|s| s.touches()) {
            let constraints = owners.entry(key.as_str()).or_default();
            if !constraints.contains(&name) {
                constraints.push(name);
            }
        }
    }
    owners
        .into_iter()
        .filter(|(_, constraints)| constraints.len() > 1)
        .map(|(key, constraints)| Conflict {
            key: key.to_string(),
            constraints,
        })
        .collect()
}

/// Await user code, turning a panic into its message
async fn unwinding<F: Future>(future: F) -> Result<F::Output, String> {
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|payload| panic_message(payload.as_ref()))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string())
}

fn elapsed_ms(clock: Instant) -> u64 {
    u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn log_outcome(report: &ExecutionReport) {
    match &report.outcome {
        Outcome::Passed => tracing::info!(execution = %report.id, "passed"),
        Outcome::Skipped => tracing::info!(execution = %report.id, "skipped"),
        Outcome::SetupFailure(error) => {
            tracing::error!(execution = %report.id, %error, "setup failed");
        }
        Outcome::Failed(error) => tracing::error!(execution = %report.id, %error, "failed"),
    }
}
