//! Host API bound into each script execution context
//!
//! Scripts see exactly four functions: `log`, `updateState`,
//! `updateProperty`, and `sleep`. State and property updates are recorded
//! into a per-invocation [`UpdateSink`] and committed by the orchestrator
//! only when the script finishes cleanly, so a script that throws halfway
//! leaves the device stores exactly as they were.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rhai::{Dynamic, Engine};
use tracing::debug;

use crate::engine::normalize::{normalize, UpdateSet};

/// Per-invocation buffers for updates recorded by host calls.
///
/// Repeated calls within one invocation merge last-seen-wins per key. The
/// orchestrator drains the buffers exactly once, after `main` returns.
#[derive(Default)]
pub struct UpdateSink {
    state: Mutex<UpdateSet>,
    properties: Mutex<UpdateSet>,
}

impl UpdateSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a state update from a raw script value.
    pub fn record_state(
        &self,
        value: &Dynamic,
    ) {
        let updates = normalize(value);
        self.state.lock().extend(updates);
    }

    /// Record a property update from a raw script value.
    pub fn record_property(
        &self,
        value: &Dynamic,
    ) {
        let updates = normalize(value);
        self.properties.lock().extend(updates);
    }

    /// Drain the pending state updates.
    pub fn take_state(&self) -> UpdateSet {
        std::mem::take(&mut *self.state.lock())
    }

    /// Drain the pending property updates.
    pub fn take_properties(&self) -> UpdateSet {
        std::mem::take(&mut *self.properties.lock())
    }
}

/// Register the host functions on an execution engine, closing over one
/// invocation's sink. The bindings live exactly as long as the engine they
/// are registered on.
pub fn bind_host(
    engine: &mut Engine,
    script_id: &str,
    sink: &Arc<UpdateSink>,
) {
    // `log` tolerates any value shape; Dynamic always renders.
    let id = script_id.to_string();
    engine.register_fn("log", move |data: Dynamic| {
        debug!("script {}: {}", id, data);
    });

    let recorder = Arc::clone(sink);
    engine.register_fn("updateState", move |data: Dynamic| {
        recorder.record_state(&data);
    });

    let recorder = Arc::clone(sink);
    engine.register_fn("updateProperty", move |data: Dynamic| {
        recorder.record_property(&data);
    });

    engine.register_fn("sleep", sleep_ms);
    engine.register_fn("sleep", |ms: f64| sleep_ms(ms as i64));
}

/// Blocking delay on the invocation's own thread of control. Zero and
/// negative durations return immediately as a no-op rather than an error.
fn sleep_ms(ms: i64) {
    if ms > 0 {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}
