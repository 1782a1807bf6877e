#![allow(dead_code)]

use std::sync::Arc;

use pinpoint_debug::{DebuggerConfig, SnapshotOptions};
use pinpoint_runtime::{MemoryLoader, Runtime};

/// A runtime over an in-memory file set that tests can keep editing.
pub struct Fixture {
    pub loader: Arc<MemoryLoader>,
    pub runtime: Runtime,
}

impl Fixture {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self::with_config(files, &DebuggerConfig::default())
    }

    pub fn with_config(files: &[(&str, &str)], config: &DebuggerConfig) -> Self {
        let loader = Arc::new(MemoryLoader::new());
        for (filename, source) in files {
            loader.insert(filename, source);
        }
        let runtime = Runtime::new(config, loader.clone());
        Self { loader, runtime }
    }
}

/// Runs a single script without breakpoints and returns its output.
pub fn run_script(source: &str) -> String {
    let fixture = Fixture::new(&[("/main.php", source)]);
    let mut request = fixture.runtime.begin_request();
    match request.run("/main.php") {
        Ok(output) => output,
        Err(err) => panic!("script failed: {err}"),
    }
}

pub fn snapshot(id: &str) -> SnapshotOptions {
    SnapshotOptions {
        id: Some(id.into()),
        ..SnapshotOptions::default()
    }
}
