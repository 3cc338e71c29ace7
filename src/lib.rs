// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rekindle is a hot-reloading module runtime over a directory of source
//! files.
//!
//! A [`Coordinator`] mirrors a directory into an in-memory tree, resolves
//! and executes an entry module inside a throwaway [`Sandbox`] generation,
//! and rebuilds the whole thing from scratch whenever a file changes on
//! disk. Writes the runtime performs itself are registered in a
//! [`SuppressionSet`] so the resulting change notifications do not loop
//! back into a rebuild.
//!
//! Module bodies are native Rust closures registered in a
//! [`ModuleRegistry`] keyed by virtual path. Each body receives a
//! [`ModuleScope`] granting it `require`, its exports object, tree
//! handles, timers, and a [`Persisted`] value store that survives
//! rebuilds.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod error;
pub mod runtime;
pub mod suppress;
pub mod transpile;
pub mod vfs;
pub mod watch;

pub use coordinator::{Coordinator, CoordinatorBuilder, DEFAULT_DEBOUNCE, DEFAULT_ENTRY};
pub use error::{Error, Result};
pub use runtime::{
    Exports, ExternalModules, ModuleBody, ModuleCell, ModuleExecutor, ModuleRegistry, ModuleScope,
    NoExternalModules, Persisted, Required, Sandbox, TimerSet,
};
pub use suppress::SuppressionSet;
pub use transpile::{Passthrough, TransformOptions, Transformed, Transpiler};
pub use vfs::{DirRef, FileRef, FsTree, NodeId, NodeRef, SharedTree};
pub use watch::ChangeStream;

/// Crate version, taken from the package manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
