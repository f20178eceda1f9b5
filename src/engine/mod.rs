//! The script-driven device behavior engine
//!
//! This is the core of the simulator: it turns a script identifier, a
//! caller-supplied context, and a pair of device stores into one executed
//! behavior tick.
//!
//! # Architecture
//!
//! - [`ScriptLoader`](cache::ScriptLoader) - resolves identifiers to source text
//! - [`ScriptCache`](cache::ScriptCache) - compile-once cache of programs
//! - [`normalize`](normalize::normalize) - script value to canonical update set
//! - [`UpdateSink`](host::UpdateSink) - per-invocation host API buffers
//! - [`BehaviorEngine`](invoke::BehaviorEngine) - the `invoke` entry point
//!   and failure containment boundary

pub mod cache;
pub mod errors;
pub mod host;
pub mod invoke;
pub mod normalize;

pub use cache::{ScriptCache, ScriptLoader};
pub use errors::{ScriptError, ScriptResult};
pub use invoke::BehaviorEngine;
pub use normalize::{normalize, UpdateSet};
