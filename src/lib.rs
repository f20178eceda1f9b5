//! DevSim - Script-Driven Device Behavior Engine
//!
//! Simulates IoT devices by running small user-supplied scripts that compute
//! a device's next telemetry values and property changes. Scripts are
//! compiled once per process, cached, and executed in isolated contexts
//! against shared per-device state, with a fixed four-function host API
//! (`log`, `updateState`, `updateProperty`, `sleep`). A faulty script skips
//! one update for one device; it never takes down a sibling device or the
//! simulation loop.
//!
//! # Example
//!
//! ```no_run
//! use devsim::{simulate, Result};
//! use std::collections::HashMap;
//! use std::path::Path;
//! use std::time::Duration;
//!
//! fn main() -> Result<()> {
//!     let context = HashMap::new();
//!     let (state, _properties) = simulate(
//!         Path::new("scripts"),
//!         "thermostat.rhai",
//!         &context,
//!         HashMap::new(),
//!         HashMap::new(),
//!         10,
//!         Duration::from_millis(100),
//!     )?;
//!     println!("{:?}", state.get("temperature"));
//!     Ok(())
//! }
//! ```

#![warn(rust_2018_idioms)]

// Public modules
pub mod device;
pub mod engine;

// Utility modules
pub mod util;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

use std::collections::HashMap;
use std::path::Path;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::device::{DeviceStore, ValueMap};
use crate::engine::BehaviorEngine;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name
pub const NAME: &str = "DevSim";

/// Run a behavior script against a single simulated device for `ticks`
/// ticks, sleeping `interval` between ticks.
///
/// Builds a [`BehaviorEngine`] and a state/properties store pair, compiles
/// the script up front so an unusable script is reported immediately, then
/// drives the invocation loop. Returns the final state and properties
/// snapshots.
pub fn simulate(
    scripts_dir: &Path,
    script_id: &str,
    context: &ValueMap,
    initial_state: ValueMap,
    initial_properties: ValueMap,
    ticks: u32,
    interval: Duration,
) -> Result<(ValueMap, ValueMap)> {
    let engine = BehaviorEngine::new(scripts_dir);
    engine
        .compile(script_id)
        .with_context(|| format!("Failed to compile script: {}", script_id))?;

    let state = DeviceStore::with_values("state", initial_state);
    let properties = DeviceStore::with_values("properties", initial_properties);

    for tick in 0..ticks {
        debug!("tick {} of {}", tick + 1, ticks);
        engine.invoke(script_id, context, &state, &properties);
        if interval > Duration::ZERO && tick + 1 < ticks {
            thread::sleep(interval);
        }
    }

    Ok((state.snapshot(), properties.snapshot()))
}

/// Compile a script without executing it, reporting syntax errors.
pub fn check_script(
    scripts_dir: &Path,
    script_id: &str,
) -> Result<()> {
    let engine = BehaviorEngine::new(scripts_dir);
    engine
        .compile(script_id)
        .with_context(|| format!("Failed to check script: {}", script_id))?;
    Ok(())
}

/// Parse a JSON object string into a [`ValueMap`], as used for inline CLI
/// context values.
pub fn parse_value_map(json: &str) -> Result<ValueMap> {
    let parsed: HashMap<String, serde_json::Value> =
        serde_json::from_str(json).context("Expected a JSON object of key/value pairs")?;
    Ok(parsed)
}
