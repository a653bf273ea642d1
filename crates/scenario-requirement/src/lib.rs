//! Scenario Requirements
//!
//! Declarative descriptions of the world state a scenario needs, and the
//! deterministic fuzzer that expands them into concrete variants.
//!
//! # Core Concepts
//!
//! - [`Spec`]: static value spec (literal, set, range, nested object)
//! - [`ValueSpec`]: a static spec or a resolver computed from the context
//! - [`Requirement`]: dimension name → [`ValueSpec`]
//! - [`StaticRequirement`]: all resolvers evaluated
//! - [`ConcreteRequirement`]: one literal per dimension
//! - [`fuzz`]: Cartesian expansion of a [`StaticRequirement`]
//!
//! # Example
//!
//! ```rust
//! use scenario_requirement::{fuzz, Requirement, Spec};
//! use serde_json::json;
//!
//! let requirement = Requirement::<()>::builder()
//!     .with("upgrade", Spec::object([("base", Spec::one_of(["USDC", "WETH"]))]))
//!     .with("prices", Spec::literal(json!({"$base": 1})))
//!     .build()
//!     .unwrap();
//!
//! let variants = fuzz(&requirement.resolve(&()).unwrap()).unwrap();
//! assert_eq!(variants.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod error;
mod fuzz;
mod requirement;
mod spec;

pub use error::{RequirementError, ResolveError};
pub use fuzz::{cardinality, fuzz, fuzz_spec};
pub use requirement::{ConcreteRequirement, Requirement, RequirementBuilder, StaticRequirement};
pub use spec::{IntRange, Resolver, Spec, ValueSpec};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
