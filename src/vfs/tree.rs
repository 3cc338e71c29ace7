// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-backed file tree loaded wholesale from the backing store.

use crate::error::{Error, Result};
use crate::suppress::SuppressionSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Index of a node in the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug)]
enum NodeKind {
    File(Vec<u8>),
    Dir(Vec<NodeId>),
}

#[derive(Debug)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// The in-memory tree.
///
/// Nodes live in an arena indexed by [`NodeId`]; each node stores only its
/// local name and its parent's index, so paths are derived by chasing
/// parent links to the root. Directory children keep disk enumeration
/// order. Lookup maps are computed on demand rather than cached: the tree
/// is small and a cache would go stale across mutations.
#[derive(Debug)]
pub struct FsTree {
    base: PathBuf,
    nodes: Vec<Node>,
    suppressed: SuppressionSet,
}

impl FsTree {
    /// Load the tree rooted at `base` from disk.
    ///
    /// The walk is synchronous and recursive; entries whose names start
    /// with `.` are invisible (no node is created and dot-directories are
    /// not descended into). Any I/O error aborts the whole load; there is
    /// no partial-tree recovery. `base` is canonicalized so real paths
    /// agree with the paths the watcher reports.
    pub fn load(base: impl AsRef<Path>, suppressed: SuppressionSet) -> Result<Self> {
        let base = base.as_ref().canonicalize()?;
        let mut tree = Self { base, nodes: Vec::new(), suppressed };
        let root = tree.alloc(String::new(), None, NodeKind::Dir(Vec::new()));
        tree.load_dir(root)?;
        Ok(tree)
    }

    fn load_dir(&mut self, dir: NodeId) -> Result<()> {
        let real = self.real_path(dir);
        for entry in fs::read_dir(&real)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }
            let meta = fs::metadata(entry.path())?;
            if meta.is_dir() {
                let child = self.alloc(name, Some(dir), NodeKind::Dir(Vec::new()));
                self.push_child(dir, child);
                self.load_dir(child)?;
            } else if meta.is_file() {
                let buffer = fs::read(entry.path())?;
                let child = self.alloc(name, Some(dir), NodeKind::File(buffer));
                self.push_child(dir, child);
            }
        }
        Ok(())
    }

    fn alloc(&mut self, name: String, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { name, parent, kind });
        id
    }

    fn push_child(&mut self, dir: NodeId, child: NodeId) {
        if let NodeKind::Dir(children) = &mut self.nodes[dir.0].kind {
            children.push(child);
        }
    }

    /// The root directory.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Canonical base location on the backing store.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The suppression set this tree registers its writes in.
    pub fn suppressed(&self) -> &SuppressionSet {
        &self.suppressed
    }

    /// Node name, a single path segment. Empty for the root.
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Parent directory; `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// True if the node is a directory.
    pub fn is_dir(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Dir(_))
    }

    /// True if the node is a file.
    pub fn is_file(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::File(_))
    }

    /// Root-relative path, `/`-separated with a leading `/`.
    pub fn path(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let node = &self.nodes[node.0];
            if !node.name.is_empty() {
                parts.push(node.name.as_str());
            }
            current = node.parent;
        }
        parts.reverse();
        format!("/{}", parts.join("/"))
    }

    /// Backing-store location: the base joined with the root-relative path.
    pub fn real_path(&self, id: NodeId) -> PathBuf {
        let path = self.path(id);
        self.base.join(path.trim_start_matches('/'))
    }

    /// Child ids of a directory in load order; empty for files.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &self.nodes[id.0].kind {
            NodeKind::Dir(children) => children,
            NodeKind::File(_) => &[],
        }
    }

    /// Subdirectory children of a directory.
    pub fn dirs(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).iter().copied().filter(|c| self.is_dir(*c)).collect()
    }

    /// File children of a directory.
    pub fn files(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).iter().copied().filter(|c| self.is_file(*c)).collect()
    }

    /// Any child by name. Files and directories share one namespace per
    /// directory.
    pub fn child_by_name(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.children(dir).iter().copied().find(|c| self.name(*c) == name)
    }

    pub(crate) fn file_by_name(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.children(dir)
            .iter()
            .copied()
            .find(|c| self.is_file(*c) && self.name(*c) == name)
    }

    pub(crate) fn dir_by_name(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.children(dir)
            .iter()
            .copied()
            .find(|c| self.is_dir(*c) && self.name(*c) == name)
    }

    /// Raw content of a file node.
    pub fn buffer(&self, id: NodeId) -> Option<&[u8]> {
        match &self.nodes[id.0].kind {
            NodeKind::File(buffer) => Some(buffer),
            NodeKind::Dir(_) => None,
        }
    }

    /// UTF-8 decoding of the content, derived on demand.
    pub fn text(&self, id: NodeId) -> Option<String> {
        self.buffer(id).map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Create a file under `dir`, writing `content` through to disk.
    ///
    /// Fails with [`Error::Conflict`] if any child, file or directory,
    /// already has that name. The real path is registered in the
    /// suppression set before the write is issued, so the resulting change
    /// notification is classified as self-inflicted.
    pub fn create_file(&mut self, dir: NodeId, name: &str, content: Vec<u8>) -> Result<NodeId> {
        if self.child_by_name(dir, name).is_some() {
            return Err(Error::Conflict(name.to_string()));
        }
        let real = self.real_path(dir).join(name);
        self.suppressed.insert(&real);
        fs::write(&real, &content)?;
        let child = self.alloc(name.to_string(), Some(dir), NodeKind::File(content));
        self.push_child(dir, child);
        Ok(child)
    }

    /// Replace a file's content with the same suppress-then-write
    /// discipline. The in-memory buffer changes only after the write lands.
    pub fn replace(&mut self, file: NodeId, content: Vec<u8>) -> Result<()> {
        if !self.is_file(file) {
            return Err(Error::NotAFile(self.path(file)));
        }
        let real = self.real_path(file);
        self.suppressed.insert(&real);
        fs::write(&real, &content)?;
        self.nodes[file.0].kind = NodeKind::File(content);
        Ok(())
    }

    /// Rename a node in memory and on disk.
    ///
    /// Fails with [`Error::Conflict`] if the parent already has a child
    /// named `new_name`. Renames are not suppressed: the resulting change
    /// notification will trigger a rebuild unless the caller suppresses it
    /// separately.
    pub fn rename(&mut self, id: NodeId, new_name: &str) -> Result<()> {
        let Some(parent) = self.parent(id) else {
            return Err(Error::RenameRoot);
        };
        if self.child_by_name(parent, new_name).is_some() {
            return Err(Error::Conflict(new_name.to_string()));
        }
        let old_real = self.real_path(id);
        self.nodes[id.0].name = new_name.to_string();
        let new_real = self.real_path(id);
        fs::rename(&old_real, &new_real)?;
        Ok(())
    }
}
