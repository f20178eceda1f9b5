//! Invocation orchestration and failure containment
//!
//! `BehaviorEngine::invoke` is the single entry point the simulation loop
//! calls per device per tick. Whatever goes wrong inside - a missing file,
//! a syntax error, a script throwing, a value that will not normalize - is
//! logged and swallowed here. The worst outcome is one skipped update for
//! one device on one tick.

use std::path::PathBuf;
use std::sync::Arc;

use rhai::serde::to_dynamic;
use rhai::{Dynamic, Engine, Map, Scope};
use tracing::{debug, error};

use crate::device::{DeviceStore, ValueMap};
use crate::engine::cache::{ScriptCache, ScriptLoader};
use crate::engine::errors::{ScriptError, ScriptResult};
use crate::engine::host::{bind_host, UpdateSink};
use crate::engine::normalize::normalize;

/// The script-driven behavior engine for simulated devices.
///
/// One instance is shared by every simulated device. The compiled-program
/// cache is the only state shared across invocations; each `invoke` call
/// otherwise runs in a fresh execution context.
pub struct BehaviorEngine {
    loader: ScriptLoader,
    cache: ScriptCache,
}

impl BehaviorEngine {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            loader: ScriptLoader::new(scripts_dir),
            cache: ScriptCache::new(),
        }
    }

    /// Compile `script_id` through the cache without executing it.
    pub fn compile(
        &self,
        script_id: &str,
    ) -> ScriptResult<()> {
        self.cache.get_or_compile(script_id, &self.loader).map(|_| ())
    }

    pub fn cache(&self) -> &ScriptCache {
        &self.cache
    }

    pub fn loader(&self) -> &ScriptLoader {
        &self.loader
    }

    /// Run one behavior tick for one device.
    ///
    /// This is the containment boundary: `invoke` never returns an error
    /// and never panics on script misbehavior. Retry, if wanted, is the
    /// caller's business on its next scheduled tick.
    pub fn invoke(
        &self,
        script_id: &str,
        context: &ValueMap,
        state: &DeviceStore,
        properties: &DeviceStore,
    ) {
        if let Err(err) = self.try_invoke(script_id, context, state, properties) {
            error!(
                "script {} failed ({}): {}; no updates applied this tick",
                script_id,
                err.kind(),
                err
            );
        }
    }

    fn try_invoke(
        &self,
        script_id: &str,
        context: &ValueMap,
        state: &DeviceStore,
        properties: &DeviceStore,
    ) -> ScriptResult<()> {
        let program = self.cache.get_or_compile(script_id, &self.loader)?;

        // Fresh execution context: engine, scope, and host bindings live
        // exactly as long as this call. The sink buffers every update the
        // script records; nothing touches the stores until commit.
        let sink = Arc::new(UpdateSink::new());
        let mut engine = Engine::new();
        bind_host(&mut engine, script_id, &sink);

        // Scripts rely on positional binding: context, state snapshot,
        // properties snapshot, in that order.
        let args = (
            to_script_map(script_id, context)?,
            to_script_map(script_id, &state.snapshot())?,
            to_script_map(script_id, &properties.snapshot())?,
        );

        let mut scope = Scope::new();
        let returned = engine
            .call_fn::<Dynamic>(&mut scope, &program, "main", args)
            .map_err(|err| ScriptError::Runtime {
                id: script_id.to_string(),
                message: err.to_string(),
            })?;

        // Commit. The returned value is applied to device state
        // unconditionally, after any updates the script recorded itself;
        // extending last makes the end-of-invocation apply win per key.
        let mut updates = sink.take_state();
        updates.extend(normalize(&returned));
        let applied = updates.len();
        state.apply(&updates);
        properties.apply(&sink.take_properties());

        debug!("script {} executed, {} state keys applied", script_id, applied);
        Ok(())
    }
}

/// Expose a value map to the script as a native map.
fn to_script_map(
    script_id: &str,
    values: &ValueMap,
) -> ScriptResult<Map> {
    let dynamic = to_dynamic(values).map_err(|err| ScriptError::Runtime {
        id: script_id.to_string(),
        message: format!("cannot expose values to script: {}", err),
    })?;
    dynamic.try_cast::<Map>().ok_or_else(|| ScriptError::Runtime {
        id: script_id.to_string(),
        message: "snapshot did not serialize to a map".to_string(),
    })
}
