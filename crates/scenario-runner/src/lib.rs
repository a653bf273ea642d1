//! Scenario Runner
//!
//! Registers scenarios and runs every concrete variant of their
//! requirements against isolated contexts.
//!
//! # Core Concepts
//!
//! - [`ScenarioRegistry`]: scenarios of one run, in registration order
//! - [`Runner`]: filter, solve, apply, verify, execute, tear down
//! - [`Stage`]: lifecycle of one execution
//! - [`RunReport`]: one [`ExecutionReport`] per execution
//! - [`RunnerConfig`]: concurrency, variant cap, checks, conflict policy
//!
//! # Example
//!
//! ```rust,ignore
//! use scenario_constraint::default_constraints;
//! use scenario_requirement::Requirement;
//! use scenario_runner::{Runner, ScenarioOptions, ScenarioRegistry};
//! use serde_json::json;
//!
//! let mut registry = ScenarioRegistry::new();
//! registry.scenario(
//!     "supply then borrow",
//!     Requirement::from_json(json!({"tokenBalances": {"$comet": {"$base": ">= 1000"}}}))?,
//!     ScenarioOptions::new(),
//!     |ctx| async move { /* drive ctx */ Ok(()) },
//! );
//!
//! let report = Runner::new(world, default_constraints()).run(&registry).await;
//! assert!(report.is_success());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod error;
mod report;
mod runner;
mod scenario;
mod state;
pub mod telemetry;

pub use config::RunnerConfig;
pub use error::{ConfigError, FailureKind, ScenarioError};
pub use report::{Conflict, ExecutionId, ExecutionReport, Outcome, RunReport, Summary};
pub use runner::Runner;
pub use scenario::{Body, Filter, Mode, Scenario, ScenarioOptions, ScenarioRegistry};
pub use state::{allowed_transitions, is_allowed, Stage};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
