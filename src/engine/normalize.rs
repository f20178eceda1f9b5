//! Script return value normalization
//!
//! Scripts hand back whatever shape they like: nothing at all, a native map
//! literal, or some other value the engine can serialize into named fields.
//! Everything downstream (host calls, the end-of-invocation apply) works on
//! one canonical shape, the [`UpdateSet`].

use indexmap::IndexMap;
use rhai::serde::from_dynamic;
use rhai::Dynamic;
use serde_json::Value;
use tracing::warn;

use crate::engine::errors::{ScriptError, ScriptResult};

/// Canonical key/value updates derived from a script value. Transient:
/// built, applied to a store once, then discarded.
pub type UpdateSet = IndexMap<String, Value>;

/// Convert an arbitrary script value into an [`UpdateSet`].
///
/// Two extraction strategies are tried in order: a native map is taken
/// as-is; any other value is serialized and kept only if it yields an
/// object with named fields. A value that fits neither shape is logged and
/// becomes an empty set. Never panics, never propagates an error.
pub fn normalize(value: &Dynamic) -> UpdateSet {
    match try_normalize(value) {
        Ok(updates) => updates,
        Err(err) => {
            warn!("script value produced no updates: {}", err);
            UpdateSet::new()
        }
    }
}

pub(crate) fn try_normalize(value: &Dynamic) -> ScriptResult<UpdateSet> {
    if value.is_unit() {
        return Ok(UpdateSet::new());
    }

    if value.is_map() {
        let map = value.clone_cast::<rhai::Map>();
        let mut updates = UpdateSet::new();
        for (key, entry) in map {
            match from_dynamic::<Value>(&entry) {
                // Last-seen-wins for duplicate keys.
                Ok(converted) => {
                    updates.insert(key.to_string(), converted);
                }
                // Best-effort per key: one odd value must not drop the rest.
                Err(err) => {
                    warn!("skipping unconvertible key `{}`: {}", key, err);
                }
            }
        }
        return Ok(updates);
    }

    // Not a native map: serialize the whole value and keep its named
    // fields, if it has any.
    match from_dynamic::<Value>(value) {
        Ok(Value::Object(fields)) => Ok(fields.into_iter().collect()),
        Ok(_) => Err(ScriptError::Normalization(format!(
            "{} has no named fields",
            value.type_name()
        ))),
        Err(err) => Err(ScriptError::Normalization(err.to_string())),
    }
}
