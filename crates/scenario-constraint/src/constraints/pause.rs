//! Pause flags
//!
//! `pause` is an object of boolean flags. `all` sets every flag first; the
//! named flags then override it, so `{"all": true, "supplyPaused": false}`
//! pauses everything but supplies.

use crate::constraint::{solve_variants, Constraint};
use crate::error::{CheckError, SolveError};
use crate::solution::{Solution, Solve};
use async_trait::async_trait;
use scenario_context::{PauseFlags, PauseGuardian};
use scenario_requirement::{ConcreteRequirement, Requirement};
use serde_json::Value;

const DIMENSION: &str = "pause";
const ALL: &str = "all";

/// Parsed `pause` value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PauseRequest {
    all: Option<bool>,
    flags: Vec<(&'static str, bool)>,
}

impl PauseRequest {
    fn parse(value: Option<&Value>) -> Result<Self, SolveError> {
        let object = value
            .and_then(Value::as_object)
            .ok_or_else(|| SolveError::invalid(DIMENSION, "expected an object of pause flags"))?;

        let mut request = Self::default();
        for (name, value) in object {
            let paused = value.as_bool().ok_or_else(|| {
                SolveError::invalid(DIMENSION, format!("`{name}` must be a boolean, got {value}"))
            })?;
            if name == ALL {
                request.all = Some(paused);
                continue;
            }
            let known = PauseFlags::default()
                .entries()
                .into_iter()
                .map(|(known, _)| known)
                .find(|known| *known == name.as_str())
                .ok_or_else(|| {
                    SolveError::invalid(DIMENSION, format!("unknown pause flag `{name}`"))
                })?;
            request.flags.push((known, paused));
        }
        Ok(request)
    }

    /// Flags after applying the request over `current`
    fn apply(&self, current: PauseFlags) -> PauseFlags {
        let mut flags = self.all.map_or(current, PauseFlags::all);
        for (name, paused) in &self.flags {
            flags.set(name, *paused);
        }
        flags
    }

    /// Flag names the request determines
    fn mentioned(&self) -> Vec<&'static str> {
        if self.all.is_some() {
            return PauseFlags::default().entries().iter().map(|(name, _)| *name).collect();
        }
        self.flags.iter().map(|(name, _)| *name).collect()
    }
}

/// Solves the `pause` dimension
#[derive(Debug, Clone, Copy, Default)]
pub struct PauseConstraint;

impl PauseConstraint {
    /// Create constraint
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl<C: PauseGuardian> Constraint<C> for PauseConstraint {
    fn name(&self) -> &'static str {
        "pause"
    }

    fn dimensions(&self) -> &'static [&'static str] {
        &[DIMENSION]
    }

    async fn solve(&self, requirement: &Requirement<C>, context: &C) -> Result<Solve<C>, SolveError> {
        solve_variants(requirement, context, &[DIMENSION], |variant| {
            let request = PauseRequest::parse(variant.get(DIMENSION))?;
            let mentioned = request.mentioned();
            if mentioned.is_empty() {
                return Ok(Vec::new());
            }
            let name = format!("pause: {}", mentioned.join(", "));
            let solution = Solution::new(name, move |ctx: C| {
                let request = request.clone();
                async move {
                    let flags = request.apply(ctx.pause_flags().await?);
                    ctx.set_pause_flags(flags).await
                }
            });
            Ok(vec![mentioned
                .into_iter()
                .fold(solution, |s, flag| s.touching(format!("pause.{flag}")))])
        })
    }

    async fn check(&self, requirement: &ConcreteRequirement, context: &C) -> Result<(), CheckError> {
        if !requirement.contains(DIMENSION) {
            return Ok(());
        }
        let request = PauseRequest::parse(requirement.get(DIMENSION))?;
        let actual = context.pause_flags().await?;
        let expected = request.apply(actual);
        let mentioned = request.mentioned();

        for ((name, wanted), (_, found)) in expected.entries().into_iter().zip(actual.entries()) {
            if mentioned.contains(&name) && wanted != found {
                return Err(CheckError::unsatisfied(DIMENSION, name, wanted, found));
            }
        }
        Ok(())
    }
}
