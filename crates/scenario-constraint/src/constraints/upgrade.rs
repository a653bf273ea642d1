//! Configuration upgrades
//!
//! `upgrade` holds a partial configuration. The solution merges it over the
//! context's current configuration (delta wins per top-level key) and
//! redeploys. `true` redeploys the current configuration unchanged; `false`
//! and `{}` need no steps.

use crate::constraint::{solve_variants, Constraint};
use crate::error::{CheckError, SolveError};
use crate::solution::{Solution, Solve};
use async_trait::async_trait;
use scenario_context::{Configuration, Context};
use scenario_requirement::{ConcreteRequirement, Requirement};
use serde_json::Value;

const DIMENSION: &str = "upgrade";

/// Upgrade delta of one variant
#[derive(Debug, Clone, PartialEq)]
enum Upgrade {
    None,
    Redeploy,
    Merge(Configuration),
}

impl Upgrade {
    fn parse(value: &Value) -> Result<Self, SolveError> {
        match value {
            Value::Bool(false) | Value::Null => Ok(Self::None),
            Value::Bool(true) => Ok(Self::Redeploy),
            Value::Object(map) if map.is_empty() => Ok(Self::None),
            Value::Object(_) => Configuration::from_json(value.clone())
                .map(Self::Merge)
                .map_err(|e| SolveError::invalid(DIMENSION, e.to_string())),
            other => Err(SolveError::invalid(
                DIMENSION,
                format!("expected an object or a boolean, got {other}"),
            )),
        }
    }
}

/// Solves the `upgrade` dimension
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeConstraint;

impl UpgradeConstraint {
    /// Create constraint
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn solution<C: Context>(upgrade: Upgrade) -> Option<Solution<C>> {
    match upgrade {
        Upgrade::None => None,
        Upgrade::Redeploy => Some(
            Solution::new("upgrade: redeploy", |ctx: C| async move {
                let current = ctx.configuration();
                ctx.upgrade(current).await
            }),
        ),
        Upgrade::Merge(delta) => {
            let keys: Vec<String> = delta.keys().map(str::to_string).collect();
            let name = format!("upgrade: {}", keys.join(", "));
            let solution = Solution::new(name, move |ctx: C| {
                let delta = delta.clone();
                async move {
                    let merged = ctx.configuration().merge(&delta);
                    tracing::debug!(keys = ?delta.keys().collect::<Vec<_>>(), "upgrading configuration");
                    ctx.upgrade(merged).await
                }
            });
            Some(
                keys.into_iter()
                    .fold(solution, |s, key| s.touching(format!("config.{key}"))),
            )
        }
    }
}

#[async_trait]
impl<C: Context> Constraint<C> for UpgradeConstraint {
    fn name(&self) -> &'static str {
        "upgrade"
    }

    fn dimensions(&self) -> &'static [&'static str] {
        &[DIMENSION]
    }

    async fn solve(&self, requirement: &Requirement<C>, context: &C) -> Result<Solve<C>, SolveError> {
        solve_variants(requirement, context, &[DIMENSION], |variant| {
            let value = variant.get(DIMENSION).unwrap_or(&Value::Null);
            Ok(solution(Upgrade::parse(value)?).into_iter().collect())
        })
    }

    async fn check(&self, requirement: &ConcreteRequirement, context: &C) -> Result<(), CheckError> {
        let Some(value) = requirement.get(DIMENSION) else {
            return Ok(());
        };
        let Upgrade::Merge(delta) = Upgrade::parse(value)? else {
            return Ok(());
        };

        let configuration = context.configuration();
        for key in delta.keys() {
            let expected = delta.get(key).unwrap_or(&Value::Null);
            let actual = configuration.get(key).unwrap_or(&Value::Null);
            if expected != actual {
                return Err(CheckError::unsatisfied(DIMENSION, key, expected, actual));
            }
        }
        Ok(())
    }
}
