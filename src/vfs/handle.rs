// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared handles over a loaded tree.
//!
//! Sandboxed module bodies receive these instead of raw arena access: a
//! handle pairs the shared tree with one node index and keeps every borrow
//! short, so a body can require other modules while holding handles.

use super::tree::{FsTree, NodeId};
use crate::error::Result;
use std::cell::RefCell;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

/// Shared, mutable access to a loaded tree. One logical thread of control;
/// borrows are scoped to single operations.
pub type SharedTree = Rc<RefCell<FsTree>>;

/// Handle to any node in a shared tree.
#[derive(Clone)]
pub struct NodeRef {
    tree: SharedTree,
    id: NodeId,
}

impl NodeRef {
    pub(crate) fn new(tree: SharedTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// Arena index of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node name (single path segment).
    pub fn name(&self) -> String {
        self.tree.borrow().name(self.id).to_string()
    }

    /// Root-relative path.
    pub fn path(&self) -> String {
        self.tree.borrow().path(self.id)
    }

    /// Location on the backing store.
    pub fn real_path(&self) -> PathBuf {
        self.tree.borrow().real_path(self.id)
    }

    /// Parent directory handle; `None` for the root.
    pub fn parent(&self) -> Option<DirRef> {
        let parent = self.tree.borrow().parent(self.id)?;
        Some(DirRef(NodeRef::new(Rc::clone(&self.tree), parent)))
    }

    /// True if this node is a file.
    pub fn is_file(&self) -> bool {
        self.tree.borrow().is_file(self.id)
    }

    /// True if this node is a directory.
    pub fn is_dir(&self) -> bool {
        self.tree.borrow().is_dir(self.id)
    }

    /// View as a file handle.
    pub fn as_file(&self) -> Option<FileRef> {
        self.is_file().then(|| FileRef(self.clone()))
    }

    /// View as a directory handle.
    pub fn as_dir(&self) -> Option<DirRef> {
        self.is_dir().then(|| DirRef(self.clone()))
    }

    /// Rename this node in memory and on the backing store. Renames are
    /// not suppressed; see [`FsTree::rename`].
    pub fn rename(&self, new_name: &str) -> Result<()> {
        self.tree.borrow_mut().rename(self.id, new_name)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef").field("id", &self.id).finish()
    }
}

/// Handle to a file node.
#[derive(Debug, Clone)]
pub struct FileRef(NodeRef);

impl FileRef {
    pub(crate) fn new(node: NodeRef) -> Self {
        Self(node)
    }

    /// The underlying node handle.
    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    /// Node name.
    pub fn name(&self) -> String {
        self.0.name()
    }

    /// Root-relative path.
    pub fn path(&self) -> String {
        self.0.path()
    }

    /// Location on the backing store.
    pub fn real_path(&self) -> PathBuf {
        self.0.real_path()
    }

    /// Copy of the raw content.
    pub fn bytes(&self) -> Vec<u8> {
        self.0
            .tree
            .borrow()
            .buffer(self.0.id)
            .map(<[u8]>::to_vec)
            .unwrap_or_default()
    }

    /// UTF-8 decoding of the content.
    pub fn text(&self) -> String {
        self.0.tree.borrow().text(self.0.id).unwrap_or_default()
    }

    /// Replace the content, writing through to disk with suppression.
    pub fn replace(&self, content: Vec<u8>) -> Result<()> {
        self.0.tree.borrow_mut().replace(self.0.id, content)
    }

    /// Rename this file. Not suppressed; see [`FsTree::rename`].
    pub fn rename(&self, new_name: &str) -> Result<()> {
        self.0.rename(new_name)
    }
}

/// Handle to a directory node.
#[derive(Debug, Clone)]
pub struct DirRef(NodeRef);

impl DirRef {
    pub(crate) fn new(node: NodeRef) -> Self {
        Self(node)
    }

    /// The underlying node handle.
    pub fn node(&self) -> &NodeRef {
        &self.0
    }

    /// Node name.
    pub fn name(&self) -> String {
        self.0.name()
    }

    /// Root-relative path.
    pub fn path(&self) -> String {
        self.0.path()
    }

    /// Location on the backing store.
    pub fn real_path(&self) -> PathBuf {
        self.0.real_path()
    }

    /// File children in load order.
    pub fn files(&self) -> Vec<FileRef> {
        let ids = self.0.tree.borrow().files(self.0.id);
        ids.into_iter()
            .map(|id| FileRef(NodeRef::new(Rc::clone(&self.0.tree), id)))
            .collect()
    }

    /// Subdirectory children in load order.
    pub fn dirs(&self) -> Vec<DirRef> {
        let ids = self.0.tree.borrow().dirs(self.0.id);
        ids.into_iter()
            .map(|id| DirRef(NodeRef::new(Rc::clone(&self.0.tree), id)))
            .collect()
    }

    /// Resolve a path expression relative to this directory.
    pub fn find(&self, expr: &str) -> Option<NodeRef> {
        let id = self.0.tree.borrow().find(self.0.id, expr)?;
        Some(NodeRef::new(Rc::clone(&self.0.tree), id))
    }

    /// Create a file in this directory, writing through to disk with
    /// suppression. Fails with a conflict if the name is taken.
    pub fn create_file(&self, name: &str, content: Vec<u8>) -> Result<FileRef> {
        let id = self.0.tree.borrow_mut().create_file(self.0.id, name, content)?;
        Ok(FileRef(NodeRef::new(Rc::clone(&self.0.tree), id)))
    }
}
