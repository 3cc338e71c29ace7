// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the runtime.

use thiserror::Error;

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading trees, resolving paths, or running modules.
#[derive(Debug, Error)]
pub enum Error {
    /// A create or rename would overwrite an existing sibling.
    #[error("cannot overwrite existing entry '{0}'")]
    Conflict(String),

    /// A required path did not resolve to any node in the tree.
    #[error("cannot find module '{0}'")]
    ModuleNotFound(String),

    /// The designated entry module is absent or not a source file.
    #[error("entry module '{0}' is missing or not a source file")]
    MissingEntry(String),

    /// A source file was loaded but no body is registered for it.
    #[error("no module body registered for '{0}'")]
    UnregisteredModule(String),

    /// The transpiler rejected a source file.
    #[error("transform failed for '{file}': {reason}")]
    Transform {
        /// Real path of the offending file.
        file: String,
        /// Transpiler-reported reason.
        reason: String,
    },

    /// The operation needed a file but the node is a directory.
    #[error("'{0}' is not a file")]
    NotAFile(String),

    /// The tree root has no parent and cannot be renamed.
    #[error("cannot rename the tree root")]
    RenameRoot,

    /// Backing-store I/O failure.
    #[error("file system error: {0}")]
    Fs(#[from] std::io::Error),

    /// File watcher failure.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Failure raised by a module body.
    #[error(transparent)]
    Module(#[from] anyhow::Error),
}
