// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Path resolution over the in-memory tree.
//!
//! Mirrors conventional module-resolution ergonomics (extensions may be
//! omitted and a directory can stand in for its index file) while staying
//! strictly confined to the arena. Resolution never touches the real
//! filesystem.

use super::tree::{FsTree, NodeId};
use crate::transpile::SOURCE_EXTENSIONS;

/// Normalize a path expression into absolute root-relative segments.
///
/// `.` segments collapse, `..` pops (clamped at the root), and a trailing
/// empty segment marks a path that ended in a separator.
fn segments(base_path: &str, expr: &str) -> Vec<String> {
    let joined = if expr.starts_with('/') {
        expr.to_string()
    } else {
        format!("{base_path}/{expr}")
    };
    let trailing = joined.ends_with('/');
    let mut out: Vec<String> = Vec::new();
    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            name => out.push(name.to_string()),
        }
    }
    if trailing || out.is_empty() {
        out.push(String::new());
    }
    out
}

impl FsTree {
    /// Resolve a path expression relative to the directory `from`
    /// (absolute expressions ignore `from`).
    ///
    /// Every segment but the last must name a subdirectory. For the last
    /// segment the candidates are tried in strict priority order: an exact
    /// file; the name with the primary source extension; with the
    /// secondary extension; the named subdirectory's index file with the
    /// primary, then the secondary extension. An empty last segment (the
    /// expression ended in a separator) resolves to the directory itself.
    pub fn find(&self, from: NodeId, expr: &str) -> Option<NodeId> {
        debug_assert!(self.is_dir(from));
        let segs = segments(&self.path(from), expr);
        let mut dir = self.root();
        for (i, segment) in segs.iter().enumerate() {
            if i + 1 == segs.len() {
                if segment.is_empty() {
                    return Some(dir);
                }
                return self.resolve_entry(dir, segment);
            }
            dir = self.dir_by_name(dir, segment)?;
        }
        None
    }

    fn resolve_entry(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        let (primary, secondary) = (SOURCE_EXTENSIONS[0], SOURCE_EXTENSIONS[1]);
        if let Some(file) = self.file_by_name(dir, name) {
            return Some(file);
        }
        if let Some(file) = self.file_by_name(dir, &format!("{name}{primary}")) {
            return Some(file);
        }
        if let Some(file) = self.file_by_name(dir, &format!("{name}{secondary}")) {
            return Some(file);
        }
        let sub = self.dir_by_name(dir, name)?;
        if let Some(file) = self.file_by_name(sub, &format!("index{primary}")) {
            return Some(file);
        }
        self.file_by_name(sub, &format!("index{secondary}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suppress::SuppressionSet;
    use std::fs;
    use std::path::Path;

    fn tree_with(files: &[&str]) -> (tempfile::TempDir, FsTree) {
        let dir = tempfile::tempdir().unwrap();
        for rel in files {
            let path = dir.path().join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, *rel).unwrap();
        }
        let tree = FsTree::load(dir.path(), SuppressionSet::new()).unwrap();
        (dir, tree)
    }

    fn found_name(tree: &FsTree, expr: &str) -> Option<String> {
        tree.find(tree.root(), expr).map(|id| tree.name(id).to_string())
    }

    #[test]
    fn exact_file_wins_over_extension_candidates() {
        let (_d, tree) = tree_with(&["util", "util.ts", "util.tsx"]);
        assert_eq!(found_name(&tree, "/util").as_deref(), Some("util"));
    }

    #[test]
    fn primary_extension_beats_secondary() {
        let (_d, tree) = tree_with(&["util.ts", "util.tsx"]);
        assert_eq!(found_name(&tree, "/util").as_deref(), Some("util.ts"));
    }

    #[test]
    fn secondary_extension_when_primary_absent() {
        let (_d, tree) = tree_with(&["util.tsx"]);
        assert_eq!(found_name(&tree, "/util").as_deref(), Some("util.tsx"));
    }

    #[test]
    fn directory_index_with_primary_extension() {
        let (_d, tree) = tree_with(&["util/index.ts", "util/index.tsx"]);
        let id = tree.find(tree.root(), "/util").unwrap();
        assert_eq!(tree.path(id), "/util/index.ts");
    }

    #[test]
    fn directory_index_with_secondary_extension() {
        let (_d, tree) = tree_with(&["util/index.tsx"]);
        let id = tree.find(tree.root(), "/util").unwrap();
        assert_eq!(tree.path(id), "/util/index.tsx");
    }

    #[test]
    fn directory_without_index_is_not_found() {
        let (_d, tree) = tree_with(&["util/other.ts"]);
        assert_eq!(tree.find(tree.root(), "/util"), None);
    }

    #[test]
    fn missing_intermediate_directory_fails_the_lookup() {
        let (_d, tree) = tree_with(&["a/b.ts"]);
        assert_eq!(tree.find(tree.root(), "/nope/b"), None);
    }

    #[test]
    fn trailing_separator_resolves_to_the_directory() {
        let (_d, tree) = tree_with(&["sub/index.ts"]);
        let root = tree.root();
        assert_eq!(tree.find(root, "/"), Some(root));
        let sub = tree.find(root, "/sub/").unwrap();
        assert!(tree.is_dir(sub));
        assert_eq!(tree.path(sub), "/sub");
    }

    #[test]
    fn relative_expressions_start_from_the_calling_directory() {
        let (_d, tree) = tree_with(&["main.ts", "sub/child.ts"]);
        let root = tree.root();
        let sub = tree.dir_by_name(root, "sub").unwrap();
        let child = tree.find(sub, "./child").unwrap();
        assert_eq!(tree.path(child), "/sub/child.ts");
        let main = tree.find(sub, "../main").unwrap();
        assert_eq!(tree.path(main), "/main.ts");
    }

    #[test]
    fn parent_segments_clamp_at_the_root() {
        let (_d, tree) = tree_with(&["main.ts"]);
        let main = tree.find(tree.root(), "/../../main").unwrap();
        assert_eq!(tree.path(main), "/main.ts");
    }

    #[test]
    fn resolution_is_confined_to_the_arena() {
        let (dir, tree) = tree_with(&["main.ts"]);
        // a file created on disk after load is invisible until reload
        fs::write(dir.path().join("late.ts"), "late").unwrap();
        assert_eq!(tree.find(tree.root(), "/late"), None);
        assert!(Path::new(&dir.path().join("late.ts")).exists());
    }
}
