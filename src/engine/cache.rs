//! Script loading and the compile-once program cache
//!
//! Compiled programs are keyed by script identifier and kept for the whole
//! process lifetime. There is no invalidation path: a script edited on disk
//! after its first compile keeps running in its original form until restart.
//! This is a documented limitation, accepted because device models reference
//! a small fixed set of behavior scripts.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rhai::{Engine, AST};
use tracing::debug;

use crate::engine::errors::{ScriptError, ScriptResult};

/// Resolves script identifiers to source text under a scripts directory.
///
/// An identifier is a file name relative to the configured directory, e.g.
/// `thermostat.rhai`.
pub struct ScriptLoader {
    dir: PathBuf,
}

impl ScriptLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the source text for `id`.
    ///
    /// A missing file maps to [`ScriptError::NotFound`]. The miss is never
    /// remembered anywhere, so a retry after the file appears succeeds.
    pub fn load(
        &self,
        id: &str,
    ) -> ScriptResult<String> {
        let path = self.dir.join(id);
        if !path.exists() {
            return Err(ScriptError::NotFound(id.to_string()));
        }
        Ok(std::fs::read_to_string(&path)?)
    }
}

/// Compile-once cache of programs, shared by all concurrent invocations.
///
/// Reads take the lock shared; an insertion takes it exclusively, so no
/// reader ever observes a partial entry. Programs are immutable after
/// insertion and handed out as `Arc` clones, so the program identity for a
/// given identifier is stable across every reader. The cache grows and is
/// never evicted.
pub struct ScriptCache {
    compiler: Engine,
    programs: RwLock<HashMap<String, Arc<AST>>>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self {
            compiler: Engine::new(),
            programs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached programs.
    pub fn len(&self) -> usize {
        self.programs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.read().is_empty()
    }

    /// Return the compiled program for `id`, compiling at most once.
    ///
    /// On a hit the source is neither re-read nor re-parsed. On a miss the
    /// source is loaded and compiled outside the write lock; if two callers
    /// race on the same cold identifier, the loser drops its own compile
    /// and adopts the stored program.
    pub fn get_or_compile(
        &self,
        id: &str,
        loader: &ScriptLoader,
    ) -> ScriptResult<Arc<AST>> {
        if let Some(program) = self.programs.read().get(id) {
            return Ok(Arc::clone(program));
        }

        let source = loader.load(id)?;
        let ast = self
            .compiler
            .compile(&source)
            .map_err(|err| ScriptError::Compile {
                id: id.to_string(),
                message: err.to_string(),
            })?;

        let mut programs = self.programs.write();
        let program = match programs.entry(id.to_string()) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                debug!("compiled script {}", id);
                Arc::clone(entry.insert(Arc::new(ast)))
            }
        };
        Ok(program)
    }
}

impl Default for ScriptCache {
    fn default() -> Self {
        Self::new()
    }
}
