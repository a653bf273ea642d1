//! Logging setup
//!
//! `RUST_LOG` overrides the default filter. Installing twice is harmless;
//! the first subscriber stays.

use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,scenario_runner=info,scenario_constraint=info";

/// Install a human-readable subscriber
///
/// Returns `false` if a global subscriber was already installed.
pub fn init() -> bool {
    install(false)
}

/// Install a JSON-lines subscriber
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_json() -> bool {
    install(true)
}

fn install(json: bool) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt().with_env_filter(filter).with_target(false);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.is_ok()
}
