//! Objects and closures.

#![allow(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use pinpoint_syntax::NodeId;
use smol_str::SmolStr;

use super::Value;
use crate::cache::Script;
use crate::eval::ClassDef;

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Allocates a process-unique object handle.
pub(crate) fn next_handle() -> u64 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

/// Shared, mutable object. Objects have handle semantics: copies of a
/// [`Value::Object`] refer to the same instance.
pub type ObjectRef = Rc<RefCell<Object>>;

/// An instance of a user class.
#[derive(Debug)]
pub struct Object {
    pub class: Rc<ClassDef>,
    pub handle: u64,
    pub properties: IndexMap<SmolStr, Value>,
}

impl Object {
    pub fn new(class: Rc<ClassDef>, properties: IndexMap<SmolStr, Value>) -> ObjectRef {
        Rc::new(RefCell::new(Self {
            class,
            handle: next_handle(),
            properties,
        }))
    }

    #[must_use]
    pub fn class_name(&self) -> &SmolStr {
        &self.class.name
    }
}

/// A closure value: code plus the variables captured by `use (...)`.
#[derive(Debug)]
pub struct ClosureValue {
    pub handle: u64,
    pub script: Script,
    pub node: NodeId,
    pub captured: Vec<(SmolStr, Value)>,
    pub this: Option<ObjectRef>,
    pub class: Option<Rc<ClassDef>>,
}
