// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory virtual filesystem mirrored from a real directory tree.
//!
//! The tree is loaded wholesale from disk into an arena of nodes and all
//! path resolution happens against that arena. Mutations (create, replace,
//! rename) write through to the backing store synchronously, registering
//! self-writes in the shared [`crate::SuppressionSet`] so the next change
//! notification for that path is dropped.

mod handle;
mod resolver;
mod tree;

pub use handle::{DirRef, FileRef, NodeRef, SharedTree};
pub use tree::{FsTree, NodeId};
