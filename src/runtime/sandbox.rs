// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One isolated execution generation over a freshly loaded tree.

use crate::error::{Error, Result};
use crate::runtime::executor::{ExternalModules, ModuleExecutor};
use crate::runtime::module::{Exports, ModuleCell, Persisted, Required, RunState};
use crate::runtime::scope::ModuleScope;
use crate::runtime::timers::TimerSet;
use crate::transpile::{TransformOptions, Transpiler, is_source_file};
use crate::vfs::{FsTree, NodeId, NodeRef, SharedTree};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// A rebuild generation.
///
/// Construction eagerly discovers every source file in the tree and
/// creates one unexecuted [`ModuleCell`] per file; execution happens
/// lazily, at most once per file, in first-reference order starting from
/// whatever the coordinator loads first. All generation-scoped state (the
/// tree, the modules, the timers) is discarded wholesale on the next
/// rebuild; only the persisted carrier and the suppression set survive.
pub struct Sandbox {
    tree: SharedTree,
    modules: HashMap<NodeId, Rc<ModuleCell>>,
    persisted: Persisted,
    timers: TimerSet,
    transpiler: Rc<dyn Transpiler>,
    executor: Rc<dyn ModuleExecutor>,
    externals: Rc<dyn ExternalModules>,
}

impl Sandbox {
    /// Build a generation over `tree`.
    pub fn new(
        tree: SharedTree,
        persisted: Persisted,
        transpiler: Rc<dyn Transpiler>,
        executor: Rc<dyn ModuleExecutor>,
        externals: Rc<dyn ExternalModules>,
    ) -> Rc<Self> {
        let mut modules = HashMap::new();
        {
            let tree = tree.borrow();
            discover(&tree, tree.root(), &mut modules);
        }
        debug!(modules = modules.len(), "sandbox generation constructed");
        Rc::new(Self {
            tree,
            modules,
            persisted,
            timers: TimerSet::new(),
            transpiler,
            executor,
            externals,
        })
    }

    /// The shared tree this generation runs over.
    pub fn tree(&self) -> SharedTree {
        Rc::clone(&self.tree)
    }

    /// The cross-generation persisted carrier.
    pub fn persisted(&self) -> &Persisted {
        &self.persisted
    }

    /// Timers registered by this generation's modules.
    pub fn timers(&self) -> &TimerSet {
        &self.timers
    }

    /// The module record for a source file, if one was discovered.
    pub fn module_for(&self, file: NodeId) -> Option<Rc<ModuleCell>> {
        self.modules.get(&file).cloned()
    }

    /// Number of discovered modules.
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Load a module: executes the body on first reference and returns the
    /// shared exports object on every call.
    ///
    /// A require cycle that re-enters a running module gets its partial
    /// exports, whatever has been assigned so far, with no cycle error.
    pub fn load(self: &Rc<Self>, cell: &Rc<ModuleCell>) -> Result<Exports> {
        if cell.state() != RunState::Unstarted {
            return Ok(cell.exports());
        }
        cell.set_state(RunState::Running);

        let file = cell.file();
        let (source, real_path, dir) = {
            let tree = self.tree.borrow();
            let source = tree.text(file).ok_or_else(|| Error::NotAFile(tree.path(file)))?;
            let dir = tree.parent(file).unwrap_or_else(|| tree.root());
            (source, tree.real_path(file), dir)
        };

        let options = TransformOptions {
            file_path: real_path.to_string_lossy().replace('\\', "/"),
        };
        let result = self.transpiler.transform(&source, &options).and_then(|program| {
            let scope = ModuleScope::new(Rc::clone(self), file, dir, cell.exports());
            self.executor.execute(&program, &scope)
        });
        // a failed body still counts as ran: later requires get the
        // partial exports without re-executing
        cell.set_state(RunState::Completed);
        result.map(|()| cell.exports())
    }

    /// Resolve and load `specifier` on behalf of the module in `file`.
    pub fn require_from(self: &Rc<Self>, file: NodeId, specifier: &str) -> Result<Required> {
        if !specifier.starts_with('.') && !specifier.starts_with('/') {
            return self.externals.require(specifier).map(Required::External);
        }
        let target = {
            let tree = self.tree.borrow();
            let dir = tree.parent(file).unwrap_or_else(|| tree.root());
            tree.find(dir, specifier)
        };
        let Some(target) = target else {
            return Err(Error::ModuleNotFound(specifier.to_string()));
        };
        match self.modules.get(&target) {
            Some(cell) => {
                let cell = Rc::clone(cell);
                self.load(&cell).map(Required::Module)
            }
            // directories and non-source assets resolve to the node itself
            None => Ok(Required::Node(NodeRef::new(self.tree(), target))),
        }
    }

    /// Cancel every timer and interval this generation registered.
    ///
    /// Must be called before the generation is discarded; skipping it
    /// leaks scheduled callbacks that would fire against a torn-down
    /// context.
    pub fn shutdown(&self) {
        self.timers.shutdown();
    }
}

fn discover(tree: &FsTree, dir: NodeId, out: &mut HashMap<NodeId, Rc<ModuleCell>>) {
    for sub in tree.dirs(dir) {
        discover(tree, sub, out);
    }
    for file in tree.files(dir) {
        if is_source_file(tree.name(file)) {
            out.insert(file, Rc::new(ModuleCell::new(file)));
        }
    }
}
