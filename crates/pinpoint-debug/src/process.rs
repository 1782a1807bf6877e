//! Process-wide debugger state shared by all requests.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::time::Duration;

use indexmap::IndexSet;
use parking_lot::Mutex;
use pinpoint_syntax::TreeStamp;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::config::{split_name_list, DebuggerConfig};
use crate::error::RejectReason;
use crate::sandbox::{AllowList, Sandbox};
use crate::types::BreakpointId;

/// Ids spliced into the tree currently cached for one file.
#[derive(Debug, Clone)]
struct InjectedFile {
    stamp: TreeStamp,
    ids: IndexSet<BreakpointId>,
}

/// Running totals across finished requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessStats {
    pub total_requests: u64,
    /// Sum of non-handler wall time over all finished requests.
    pub total_time: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    pub max_time: Duration,
    pub max_time_percentage: f64,
    pub max_memory: usize,
}

#[derive(Debug)]
struct ProcessState {
    injected: FxHashMap<SmolStr, InjectedFile>,
    sandbox: Sandbox,
    stats: ProcessStats,
    limits: Limits,
    source_root: Option<PathBuf>,
}

/// Long-lived registry guarded by a mutex; safe to share between threads
/// compiling and serving different requests.
#[derive(Debug)]
pub struct ProcessRegistry {
    state: Mutex<ProcessState>,
}

impl Default for ProcessRegistry {
    fn default() -> Self {
        Self::new(&DebuggerConfig::default())
    }
}

impl ProcessRegistry {
    #[must_use]
    pub fn new(config: &DebuggerConfig) -> Self {
        Self {
            state: Mutex::new(ProcessState {
                injected: FxHashMap::default(),
                sandbox: Sandbox::new(AllowList::new(
                    config.allowed_functions.iter().cloned(),
                    config.allowed_methods.iter().cloned(),
                )),
                stats: ProcessStats::default(),
                limits: Limits {
                    max_time: config.max_time,
                    max_time_percentage: config.max_time_percentage,
                    max_memory: config.max_memory,
                },
                source_root: config.source_root.clone(),
            }),
        }
    }

    /// Whether `id` is spliced into the cached tree for `filename`.
    #[must_use]
    pub fn is_injected(&self, filename: &str, id: &str) -> bool {
        self.state
            .lock()
            .injected
            .get(filename)
            .is_some_and(|file| file.ids.contains(id))
    }

    /// Records a successful splice of `id` into the tree with `stamp`.
    ///
    /// A stamp different from the recorded one means the file was
    /// recompiled; the ids of the old tree are forgotten first.
    pub fn mark_injected(&self, filename: &str, id: &str, stamp: TreeStamp) {
        let mut state = self.state.lock();
        let file = state
            .injected
            .entry(SmolStr::new(filename))
            .or_insert_with(|| InjectedFile {
                stamp,
                ids: IndexSet::new(),
            });
        if file.stamp != stamp {
            file.stamp = stamp;
            file.ids.clear();
        }
        file.ids.insert(SmolStr::new(id));
    }

    /// Whether `id` was already spliced into exactly this tree.
    #[must_use]
    pub fn is_injected_into(&self, filename: &str, id: &str, stamp: TreeStamp) -> bool {
        self.state
            .lock()
            .injected
            .get(filename)
            .is_some_and(|file| file.stamp == stamp && file.ids.contains(id))
    }

    /// Forgets the ids of `filename` unless they belong to `stamp`.
    pub fn begin_tree(&self, filename: &str, stamp: TreeStamp) {
        let mut state = self.state.lock();
        if let Some(file) = state.injected.get_mut(filename) {
            if file.stamp != stamp {
                file.stamp = stamp;
                file.ids.clear();
            }
        }
    }

    /// Injected ids per file, sorted by filename.
    #[must_use]
    pub fn injected_ids(&self) -> Vec<(SmolStr, Vec<BreakpointId>)> {
        let state = self.state.lock();
        let mut files: Vec<_> = state
            .injected
            .iter()
            .filter(|(_, file)| !file.ids.is_empty())
            .map(|(name, file)| (name.clone(), file.ids.iter().cloned().collect()))
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));
        files
    }

    /// Validates an expression against the current allow-lists.
    pub fn validate(&self, source: &str) -> Result<(), RejectReason> {
        self.state.lock().sandbox.validate(source)
    }

    /// Replaces the user function allow-list from a comma-separated string.
    pub fn set_allowed_functions(&self, csv: &str) {
        self.state
            .lock()
            .sandbox
            .allow_list_mut()
            .set_functions(split_name_list(csv));
    }

    /// Replaces the user method allow-list from a comma-separated string.
    pub fn set_allowed_methods(&self, csv: &str) {
        self.state
            .lock()
            .sandbox
            .allow_list_mut()
            .set_methods(split_name_list(csv));
    }

    #[must_use]
    pub fn allowed_functions(&self) -> Vec<SmolStr> {
        self.state.lock().sandbox.allow_list().user_functions()
    }

    #[must_use]
    pub fn allowed_methods(&self) -> Vec<SmolStr> {
        self.state.lock().sandbox.allow_list().user_methods()
    }

    #[must_use]
    pub fn source_root(&self) -> Option<PathBuf> {
        self.state.lock().source_root.clone()
    }

    pub fn set_source_root(&self, root: Option<PathBuf>) {
        self.state.lock().source_root = root;
    }

    #[must_use]
    pub fn limits(&self) -> Limits {
        self.state.lock().limits
    }

    #[must_use]
    pub fn stats(&self) -> ProcessStats {
        self.state.lock().stats
    }

    /// Handler time budget for a request starting now.
    ///
    /// The lesser of the absolute ceiling and a percentage of the average
    /// request time; only the absolute ceiling applies before the first
    /// request finishes.
    #[must_use]
    pub fn max_time(&self) -> Duration {
        let state = self.state.lock();
        let absolute = state.limits.max_time;
        if state.stats.total_requests == 0 {
            return absolute;
        }
        #[allow(clippy::cast_precision_loss)]
        let average = state.stats.total_time.as_secs_f64() / state.stats.total_requests as f64;
        let adaptive = average * state.limits.max_time_percentage / 100.0;
        Duration::try_from_secs_f64(adaptive).map_or(absolute, |adaptive| absolute.min(adaptive))
    }

    /// Adds one finished request to the running totals.
    pub fn record_request(&self, elapsed: Duration) {
        let mut state = self.state.lock();
        state.stats.total_requests = state.stats.total_requests.saturating_add(1);
        state.stats.total_time = state.stats.total_time.saturating_add(elapsed);
    }
}
