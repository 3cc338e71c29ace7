// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-file module records and the values they exchange.

use crate::vfs::{NodeId, NodeRef};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Execution state of a module within one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunState {
    Unstarted,
    Running,
    Completed,
}

/// A module's exports: a string-keyed object mutated in place by the module
/// body and shared by reference with every requirer.
///
/// Because the same object is handed out to all holders, assignments made
/// after an early partial export are visible to anyone still holding the
/// handle. That sharing is what makes require cycles tolerable.
#[derive(Debug, Clone, Default)]
pub struct Exports(Rc<RefCell<Map<String, Value>>>);

impl Exports {
    /// Create an empty exports object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign one export.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.0.borrow_mut().insert(key.into(), value);
    }

    /// Read one export by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// True if nothing has been exported yet.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Number of exported keys.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.0.borrow().clone()
    }
}

/// Key/value state that survives across rebuild generations.
///
/// Created once at process start and threaded unchanged into every rebuilt
/// sandbox, so modules can retain state across rebuilds deliberately.
#[derive(Debug, Clone, Default)]
pub struct Persisted(Rc<RefCell<Map<String, Value>>>);

impl Persisted {
    /// Create an empty carrier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store one value.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.0.borrow_mut().insert(key.into(), value);
    }

    /// Read one value by key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.0.borrow().clone()
    }
}

/// Execution record for one source file.
///
/// A module transitions `Unstarted -> Running -> Completed` exactly once
/// per generation; every load request after the first returns the same
/// exports object without re-executing the source.
#[derive(Debug)]
pub struct ModuleCell {
    file: NodeId,
    state: Cell<RunState>,
    exports: Exports,
}

impl ModuleCell {
    pub(crate) fn new(file: NodeId) -> Self {
        Self {
            file,
            state: Cell::new(RunState::Unstarted),
            exports: Exports::new(),
        }
    }

    /// The backing source file.
    pub fn file(&self) -> NodeId {
        self.file
    }

    pub(crate) fn state(&self) -> RunState {
        self.state.get()
    }

    pub(crate) fn set_state(&self, state: RunState) {
        self.state.set(state);
    }

    /// The exports object, shared by reference with every requirer.
    pub fn exports(&self) -> Exports {
        self.exports.clone()
    }
}

/// Result of a `require` call from inside a module body.
#[derive(Debug)]
pub enum Required {
    /// Exports of a source-file module, executed on first reference.
    Module(Exports),
    /// A directory or non-source file addressed directly.
    Node(NodeRef),
    /// Value produced by the external-module loader.
    External(Value),
}

impl Required {
    /// The exports object, if this resolved to a module.
    pub fn into_exports(self) -> Option<Exports> {
        match self {
            Required::Module(exports) => Some(exports),
            _ => None,
        }
    }

    /// The tree node, if this resolved to a plain node.
    pub fn into_node(self) -> Option<NodeRef> {
        match self {
            Required::Node(node) => Some(node),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exports_clones_share_one_object() {
        let exports = Exports::new();
        let alias = exports.clone();
        assert!(alias.is_empty());

        exports.set("value", json!(42));
        assert_eq!(alias.get("value"), Some(json!(42)));
        assert_eq!(alias.len(), 1);
    }

    #[test]
    fn persisted_roundtrips_values() {
        let persisted = Persisted::new();
        persisted.set("count", json!(3));
        assert_eq!(persisted.get("count"), Some(json!(3)));
        assert_eq!(persisted.snapshot().len(), 1);
    }
}
