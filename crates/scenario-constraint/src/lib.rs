//! Scenario Constraints
//!
//! Constraints compile the dimensions of a requirement they understand into
//! ordered, asynchronous state transitions.
//!
//! # Core Concepts
//!
//! - [`Constraint`]: owns a fixed set of dimensions, solves and checks them
//! - [`Solve`]: not applicable, or one [`Variant`] per fuzzed expansion
//! - [`Solution`]: one named context transition, with the state keys it touches
//! - [`AmountCondition`]: `">= 1000"`-style balance conditions
//! - [`default_constraints`]: upgrade, prices, token balances, pause
//!
//! # Example
//!
//! ```rust,ignore
//! let constraints = default_constraints::<MyContext>();
//! for constraint in &constraints {
//!     if let Solve::Variants(variants) = constraint.solve(&requirement, &ctx).await? {
//!         // apply variants[i].solutions in order
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod amount;
mod constraint;
mod constraints;
mod error;
mod solution;

pub use amount::{AmountCondition, Comparison};
pub use constraint::{solve_variants, Constraint};
pub use constraints::{
    default_constraints, PauseConstraint, PriceConstraint, TokenBalanceConstraint,
    UpgradeConstraint,
};
pub use error::{CheckError, SolveError};
pub use solution::{Solution, Solve, Variant};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
