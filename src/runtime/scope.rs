// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The capability record injected into each running module body.

use crate::error::Result;
use crate::runtime::module::{Exports, Persisted, Required};
use crate::runtime::sandbox::Sandbox;
use crate::vfs::{DirRef, FileRef, NodeId, NodeRef};
use std::rc::Rc;
use std::time::Duration;

/// The explicit, minimal capability set a module body runs with: a require
/// bound to the file's own resolution scope, the shared exports object,
/// handles to the file and its directory, the persisted carrier, and
/// tracked timer primitives. There is no ambient access beyond these.
pub struct ModuleScope {
    sandbox: Rc<Sandbox>,
    file: NodeId,
    dir: NodeId,
    exports: Exports,
}

impl ModuleScope {
    pub(crate) fn new(sandbox: Rc<Sandbox>, file: NodeId, dir: NodeId, exports: Exports) -> Self {
        Self { sandbox, file, dir, exports }
    }

    /// Require another module relative to this file's directory.
    ///
    /// Specifiers without a leading `.` or `/` are forwarded to the
    /// external-module loader.
    pub fn require(&self, specifier: &str) -> Result<Required> {
        self.sandbox.require_from(self.file, specifier)
    }

    /// This module's exports object, shared with every requirer.
    pub fn exports(&self) -> &Exports {
        &self.exports
    }

    /// Handle to the file being executed.
    pub fn file(&self) -> FileRef {
        FileRef::new(NodeRef::new(self.sandbox.tree(), self.file))
    }

    /// Handle to the file's directory.
    pub fn dir(&self) -> DirRef {
        DirRef::new(NodeRef::new(self.sandbox.tree(), self.dir))
    }

    /// The cross-generation persisted carrier.
    pub fn persisted(&self) -> Persisted {
        self.sandbox.persisted().clone()
    }

    /// Schedule a one-shot timer, tracked by this generation and cancelled
    /// on shutdown. Must run within a tokio `LocalSet`.
    pub fn set_timeout(&self, delay: Duration, callback: impl FnOnce() + 'static) {
        self.sandbox.timers().set_timeout(delay, callback);
    }

    /// Schedule a repeating interval, tracked by this generation and
    /// cancelled on shutdown. Must run within a tokio `LocalSet`.
    pub fn set_interval(&self, period: Duration, callback: impl FnMut() + 'static) {
        self.sandbox.timers().set_interval(period, callback);
    }
}
