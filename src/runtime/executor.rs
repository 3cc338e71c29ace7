// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The plugin boundary where module bodies execute.
//!
//! Rust has no dynamic source execution, so the sandbox boundary is a
//! plugin-loading one with the same capability-injection contract: the
//! executor receives the transformed program and a [`ModuleScope`] carrying
//! the module's entire capability set, and runs whatever stands in for the
//! module body.

use crate::error::{Error, Result};
use crate::runtime::scope::ModuleScope;
use crate::transpile::Transformed;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Executes one transformed module body inside the sandbox.
pub trait ModuleExecutor {
    /// Run the body for the file described by `scope`.
    fn execute(&self, program: &Transformed, scope: &ModuleScope) -> Result<()>;
}

/// A native module body.
pub type ModuleBody = Rc<dyn Fn(&ModuleScope) -> Result<()>>;

/// Executor mapping root-relative file paths to native Rust bodies.
///
/// This is the embedder-facing plugin surface: register one body per
/// source-file path (e.g. `/main.ts`). A discovered source file with no
/// registered body fails execution, the moral equivalent of a syntax
/// error.
#[derive(Default)]
pub struct ModuleRegistry {
    bodies: HashMap<String, ModuleBody>,
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the body for a root-relative file path.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        body: impl Fn(&ModuleScope) -> Result<()> + 'static,
    ) {
        self.bodies.insert(path.into(), Rc::new(body));
    }

    /// Number of registered bodies.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// True if no bodies are registered.
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl ModuleExecutor for ModuleRegistry {
    fn execute(&self, _program: &Transformed, scope: &ModuleScope) -> Result<()> {
        let path = scope.file().path();
        match self.bodies.get(&path) {
            Some(body) => body(scope),
            None => Err(Error::UnregisteredModule(path)),
        }
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry").field("bodies", &self.bodies.len()).finish()
    }
}

/// Loader for specifiers that do not reference the virtual tree (no
/// leading `.` or `/`).
pub trait ExternalModules {
    /// Load an external module by specifier.
    fn require(&self, specifier: &str) -> Result<Value>;
}

/// Default external loader: every bare specifier is missing.
#[derive(Debug, Default)]
pub struct NoExternalModules;

impl ExternalModules for NoExternalModules {
    fn require(&self, specifier: &str) -> Result<Value> {
        Err(Error::ModuleNotFound(specifier.to_string()))
    }
}
