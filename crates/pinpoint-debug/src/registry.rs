//! Request-local breakpoint tables.

#![allow(missing_docs)]

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::types::{Breakpoint, BreakpointId};

/// Breakpoints registered during one request.
///
/// `pending_by_file` preserves registration order per file; `by_id` owns the
/// records. Both are dropped with the request.
#[derive(Debug, Default)]
pub struct RequestRegistry {
    pending_by_file: FxHashMap<SmolStr, Vec<BreakpointId>>,
    by_id: FxHashMap<BreakpointId, Breakpoint>,
}

impl RequestRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a validated breakpoint.
    ///
    /// An earlier breakpoint with the same id is replaced and removed from
    /// its file's pending list. Returns the replaced record.
    pub fn insert(&mut self, breakpoint: Breakpoint) -> Option<Breakpoint> {
        let replaced = self.by_id.remove(&breakpoint.id);
        if let Some(old) = &replaced {
            if let Some(ids) = self.pending_by_file.get_mut(&old.filename) {
                ids.retain(|id| id != &old.id);
                if ids.is_empty() {
                    self.pending_by_file.remove(&old.filename);
                }
            }
        }
        self.pending_by_file
            .entry(breakpoint.filename.clone())
            .or_default()
            .push(breakpoint.id.clone());
        self.by_id.insert(breakpoint.id.clone(), breakpoint);
        replaced
    }

    /// Breakpoints pending for `filename`, in registration order.
    #[must_use]
    pub fn find_pending(&self, filename: &str) -> Option<Vec<&Breakpoint>> {
        let ids = self.pending_by_file.get(filename)?;
        Some(ids.iter().filter_map(|id| self.by_id.get(id)).collect())
    }

    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&Breakpoint> {
        self.by_id.get(id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Breakpoint> {
        self.by_id.get_mut(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
