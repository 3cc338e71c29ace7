// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Ties the tree, the sandbox, and the change stream together.

use crate::error::{Error, Result};
use crate::runtime::{
    ExternalModules, ModuleExecutor, ModuleRegistry, NoExternalModules, Persisted, Sandbox,
};
use crate::suppress::SuppressionSet;
use crate::transpile::{Passthrough, Transpiler};
use crate::vfs::{FsTree, SharedTree};
use crate::watch::ChangeStream;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Entry specifier loaded after every rebuild.
pub const DEFAULT_ENTRY: &str = "/main";

/// Quiet period a burst of change notifications must outlast before a
/// rebuild is triggered.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Configures and constructs a [`Coordinator`].
pub struct CoordinatorBuilder {
    base: PathBuf,
    entry: String,
    debounce: Duration,
    transpiler: Rc<dyn Transpiler>,
    executor: Rc<dyn ModuleExecutor>,
    externals: Rc<dyn ExternalModules>,
}

impl CoordinatorBuilder {
    /// Override the entry specifier (default [`DEFAULT_ENTRY`]).
    pub fn entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = entry.into();
        self
    }

    /// Override the debounce window (default [`DEFAULT_DEBOUNCE`]).
    pub fn debounce(mut self, window: Duration) -> Self {
        self.debounce = window;
        self
    }

    /// Install a source transpiler (default passes source through).
    pub fn transpiler(mut self, transpiler: impl Transpiler + 'static) -> Self {
        self.transpiler = Rc::new(transpiler);
        self
    }

    /// Install the executor that runs module programs (default is an empty
    /// [`ModuleRegistry`], under which every module is unregistered).
    pub fn executor(mut self, executor: impl ModuleExecutor + 'static) -> Self {
        self.executor = Rc::new(executor);
        self
    }

    /// Install a provider for bare specifiers (default rejects them all).
    pub fn externals(mut self, externals: impl ExternalModules + 'static) -> Self {
        self.externals = Rc::new(externals);
        self
    }

    /// Construct the coordinator and run the initial build.
    ///
    /// A tree that cannot load or an entry that cannot resolve is a
    /// configuration error and fails construction. An entry body that
    /// fails is logged and the coordinator is returned anyway; the next
    /// change gets a fresh attempt.
    pub fn build(self) -> Result<Coordinator> {
        let coordinator = Coordinator {
            base: self.base,
            entry: self.entry,
            debounce: self.debounce,
            suppressed: SuppressionSet::new(),
            persisted: Persisted::new(),
            transpiler: self.transpiler,
            executor: self.executor,
            externals: self.externals,
            current: RefCell::new(None),
        };
        coordinator.rebuild()?;
        Ok(coordinator)
    }
}

/// Owns the rebuild cycle.
///
/// Each rebuild loads a fresh tree from disk, discards the previous
/// sandbox generation (shutting down its timers), and executes the entry
/// module in a new one. The suppression set and the persisted carrier are
/// the only state shared across generations.
pub struct Coordinator {
    base: PathBuf,
    entry: String,
    debounce: Duration,
    suppressed: SuppressionSet,
    persisted: Persisted,
    transpiler: Rc<dyn Transpiler>,
    executor: Rc<dyn ModuleExecutor>,
    externals: Rc<dyn ExternalModules>,
    current: RefCell<Option<Rc<Sandbox>>>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("base", &self.base)
            .field("entry", &self.entry)
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// Start configuring a coordinator over the directory at `base`.
    pub fn builder(base: impl Into<PathBuf>) -> CoordinatorBuilder {
        CoordinatorBuilder {
            base: base.into(),
            entry: DEFAULT_ENTRY.to_string(),
            debounce: DEFAULT_DEBOUNCE,
            transpiler: Rc::new(Passthrough),
            executor: Rc::new(ModuleRegistry::new()),
            externals: Rc::new(NoExternalModules),
        }
    }

    /// The watched directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The entry specifier resolved after every rebuild.
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// The current sandbox generation, if a build has completed.
    pub fn sandbox(&self) -> Option<Rc<Sandbox>> {
        self.current.borrow().clone()
    }

    /// The cross-generation persisted carrier.
    pub fn persisted(&self) -> &Persisted {
        &self.persisted
    }

    /// The self-write suppression set shared with every loaded tree.
    pub fn suppressed(&self) -> &SuppressionSet {
        &self.suppressed
    }

    /// Tear down the current generation and build a new one from disk.
    ///
    /// The entry module is resolved against the fresh tree and executed.
    /// This is the one recovery boundary in the system: a body that fails
    /// is logged here and the rebuild still counts as done, leaving the
    /// new generation current (its timers were registered before the
    /// failure and must be shut down on the next rebuild like anyone
    /// else's). A tree that fails to load or an entry that does not
    /// resolve to a source module propagates instead.
    pub fn rebuild(&self) -> Result<()> {
        if let Some(previous) = self.current.borrow_mut().take() {
            previous.shutdown();
        }
        let tree = FsTree::load(&self.base, self.suppressed.clone())?;
        let tree: SharedTree = Rc::new(RefCell::new(tree));
        let sandbox = Sandbox::new(
            tree,
            self.persisted.clone(),
            Rc::clone(&self.transpiler),
            Rc::clone(&self.executor),
            Rc::clone(&self.externals),
        );
        let result = self.run_entry(&sandbox);
        *self.current.borrow_mut() = Some(sandbox);
        match result {
            Ok(()) => Ok(()),
            Err(err @ Error::MissingEntry(_)) => Err(err),
            Err(err) => {
                error!(entry = %self.entry, %err, "entry module failed");
                Ok(())
            }
        }
    }

    fn run_entry(&self, sandbox: &Rc<Sandbox>) -> Result<()> {
        let entry = {
            let tree = sandbox.tree();
            let tree = tree.borrow();
            tree.find(tree.root(), &self.entry)
        };
        // resolving to a non-source node is as missing as not resolving
        let cell = entry
            .and_then(|id| sandbox.module_for(id))
            .ok_or_else(|| Error::MissingEntry(self.entry.clone()))?;
        sandbox.load(&cell)?;
        Ok(())
    }

    /// React to a change notification for `path`.
    ///
    /// A path registered in the suppression set is a self-inflicted write:
    /// the registration is consumed and no rebuild happens. Anything else
    /// triggers a full rebuild. Returns whether a rebuild ran.
    pub fn file_changed(&self, path: &Path) -> Result<bool> {
        if self.suppressed.consume(path) {
            debug!(path = %path.display(), "self-inflicted change, skipping rebuild");
            return Ok(false);
        }
        info!(path = %path.display(), "change detected, rebuilding");
        self.rebuild()?;
        Ok(true)
    }

    /// Watch the base directory and rebuild on every settled change.
    ///
    /// Runs until the change stream closes. Rebuild failures after startup
    /// are logged and the loop keeps going, so a broken edit can be fixed
    /// by the next one. Timer callbacks need a `tokio::task::LocalSet`, so
    /// drive this future inside one.
    pub async fn run(&self) -> Result<()> {
        let mut changes = ChangeStream::watch(&self.base, self.debounce)?;
        info!(base = %self.base.display(), entry = %self.entry, "watching");
        while let Some(path) = changes.next().await {
            if let Err(err) = self.file_changed(&path) {
                error!(%err, "rebuild failed");
            }
        }
        Ok(())
    }
}
