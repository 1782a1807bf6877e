//! Shared compile cache.
//!
//! Every file is parsed once and the tree is shared by all requests until
//! something evicts it. Parsing always goes through [`CodeCache::compile`],
//! which hands the fresh tree to the debugger before anything else sees it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use pinpoint_debug::{CacheInvalidator, DebugRequest};
use pinpoint_syntax::SyntaxTree;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::debug;

use crate::error::RuntimeError;
use crate::loader::SourceLoader;

/// A compiled file.
#[derive(Debug, Clone)]
pub struct Script {
    /// Normalized absolute filename.
    pub filename: SmolStr,
    /// The (possibly instrumented) tree.
    pub tree: Arc<SyntaxTree>,
}

/// Compiled trees keyed by normalized filename.
#[derive(Debug, Default)]
pub struct CodeCache {
    entries: Mutex<FxHashMap<SmolStr, Arc<SyntaxTree>>>,
    compiles: AtomicUsize,
}

impl CodeCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached tree for `filename`, compiling it on a miss.
    pub fn compile(
        &self,
        filename: &str,
        loader: &dyn SourceLoader,
        debug: Option<&mut DebugRequest>,
    ) -> Result<Script, RuntimeError> {
        if let Some(tree) = self.entries.lock().get(filename) {
            return Ok(Script {
                filename: filename.into(),
                tree: Arc::clone(tree),
            });
        }

        let source = loader.load(filename)?;
        let parse = pinpoint_syntax::parse(&source);
        if let Some(err) = parse.errors().first() {
            return Err(RuntimeError::Compile {
                filename: filename.into(),
                message: err.to_string().into(),
            });
        }
        let mut tree = parse.into_tree();
        if let Some(debug) = debug {
            let injected = debug.on_compile(filename, &mut tree);
            if injected > 0 {
                debug!("{filename}: {injected} probe(s) injected");
            }
        }

        let tree = Arc::new(tree);
        self.entries
            .lock()
            .insert(SmolStr::new(filename), Arc::clone(&tree));
        self.compiles.fetch_add(1, Ordering::Relaxed);
        debug!("compiled {filename}");
        Ok(Script {
            filename: filename.into(),
            tree,
        })
    }

    /// Drops the cached tree for `filename`. Returns true if one was cached.
    pub fn evict(&self, filename: &str) -> bool {
        self.entries.lock().remove(filename).is_some()
    }

    /// Returns true if a tree for `filename` is cached.
    #[must_use]
    pub fn contains(&self, filename: &str) -> bool {
        self.entries.lock().contains_key(filename)
    }

    /// Number of parses performed so far.
    #[must_use]
    pub fn compile_count(&self) -> usize {
        self.compiles.load(Ordering::Relaxed)
    }
}

impl CacheInvalidator for CodeCache {
    fn invalidate(&self, filename: &str) {
        if self.evict(filename) {
            debug!("evicted {filename}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;

    #[test]
    fn test_compile_is_cached_until_evicted() {
        let loader = MemoryLoader::new().with_file("/a.php", "<?php\n$a = 1;\n");
        let cache = CodeCache::new();
        let first = cache.compile("/a.php", &loader, None).unwrap();
        let second = cache.compile("/a.php", &loader, None).unwrap();
        assert!(Arc::ptr_eq(&first.tree, &second.tree));
        assert_eq!(cache.compile_count(), 1);

        cache.invalidate("/a.php");
        let third = cache.compile("/a.php", &loader, None).unwrap();
        assert_ne!(first.tree.stamp(), third.tree.stamp());
        assert_eq!(cache.compile_count(), 2);
    }

    #[test]
    fn test_parse_errors_are_not_cached() {
        let loader = MemoryLoader::new().with_file("/bad.php", "<?php\n$a = ;\n");
        let cache = CodeCache::new();
        let err = cache.compile("/bad.php", &loader, None).unwrap_err();
        assert!(matches!(err, RuntimeError::Compile { .. }));
        assert!(!cache.contains("/bad.php"));
    }
}
