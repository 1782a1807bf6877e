//! Source file loading.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::error::RuntimeError;

/// Supplies source text for a normalized filename.
pub trait SourceLoader: Send + Sync {
    /// Reads the whole file.
    fn load(&self, filename: &str) -> Result<String, RuntimeError>;
}

/// Reads files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    fn load(&self, filename: &str) -> Result<String, RuntimeError> {
        std::fs::read_to_string(filename).map_err(|err| RuntimeError::Load {
            filename: filename.into(),
            message: err.to_string().into(),
        })
    }
}

/// In-memory file set, used by tests and embedders.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    files: RwLock<FxHashMap<SmolStr, String>>,
}

impl MemoryLoader {
    /// Creates an empty file set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, replacing any previous content.
    #[must_use]
    pub fn with_file(self, filename: &str, source: &str) -> Self {
        self.insert(filename, source);
        self
    }

    /// Adds or replaces a file.
    pub fn insert(&self, filename: &str, source: &str) {
        self.files
            .write()
            .insert(SmolStr::new(filename), source.to_string());
    }
}

impl SourceLoader for MemoryLoader {
    fn load(&self, filename: &str) -> Result<String, RuntimeError> {
        self.files
            .read()
            .get(filename)
            .cloned()
            .ok_or_else(|| RuntimeError::Load {
                filename: filename.into(),
                message: "no such file".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with_file("/a.php", "<?php echo 1;");
        assert_eq!(loader.load("/a.php").unwrap(), "<?php echo 1;");
        assert!(matches!(
            loader.load("/b.php"),
            Err(RuntimeError::Load { .. })
        ));
    }
}
