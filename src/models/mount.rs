//! Mount paths and the nested tree handed to the runtime's bulk mount.
//!
//! A [`MountPath`] is only ever produced by the path normalizer, so every
//! value is relative, lower-case, free of empty segments and never contains
//! a `.` or `..` segment.

use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// MountPath
// ============================================================================

/// Canonical, sandbox-safe relative path (`src/index.js`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MountPath(String);

impl MountPath {
    /// Wrap an already-normalized string.
    pub(crate) fn from_normalized(path: String) -> Self {
        debug_assert!(!path.is_empty());
        Self(path)
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Number of segments (`a/b/c` has depth 3).
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Last segment.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Every proper ancestor, shallowest first (`a`, `a/b` for `a/b/c`).
    pub fn ancestors(&self) -> Vec<MountPath> {
        self.0
            .match_indices('/')
            .map(|(i, _)| MountPath(self.0[..i].to_string()))
            .collect()
    }

    /// Remove a leading directory prefix, if this path lives strictly below it.
    pub fn strip_prefix(&self, dir: &str) -> Option<MountPath> {
        self.0
            .strip_prefix(dir)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
            .map(|rest| MountPath(rest.to_string()))
    }
}

impl fmt::Display for MountPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// MountTree
// ============================================================================

/// A node in the mount tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MountNode {
    File { contents: Vec<u8> },
    Directory { children: BTreeMap<String, MountNode> },
}

impl MountNode {
    fn directory() -> Self {
        Self::Directory {
            children: BTreeMap::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory { .. })
    }
}

/// Why an insert into the tree was refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeConflict {
    /// A file already occupies a segment that needs to be a directory.
    FileInTheWay(String),
    /// A directory already occupies the path of a file.
    DirectoryInTheWay(String),
}

/// Nested directory tree in the runtime's bulk-mount shape.
///
/// Children are kept in a `BTreeMap` so iteration (and therefore the JS
/// object handed to the runtime) is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MountTree {
    root: BTreeMap<String, MountNode>,
}

impl MountTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level entries.
    pub fn entries(&self) -> &BTreeMap<String, MountNode> {
        &self.root
    }

    /// Walk to the children map of `dirs`, creating directories on the way.
    fn descend<'a, 'b>(
        &'a mut self,
        dirs: impl Iterator<Item = &'b str>,
    ) -> Result<&'a mut BTreeMap<String, MountNode>, TreeConflict> {
        let mut current = &mut self.root;
        let mut walked = String::new();

        for part in dirs {
            if !walked.is_empty() {
                walked.push('/');
            }
            walked.push_str(part);

            let entry = current
                .entry(part.to_string())
                .or_insert_with(MountNode::directory);
            current = match entry {
                MountNode::Directory { children } => children,
                MountNode::File { .. } => return Err(TreeConflict::FileInTheWay(walked)),
            };
        }

        Ok(current)
    }

    /// Ensure a directory (and all of its ancestors) exists. Idempotent.
    pub fn insert_directory(&mut self, path: &MountPath) -> Result<(), TreeConflict> {
        self.descend(path.segments()).map(|_| ())
    }

    /// Insert a file, creating ancestors. A file at the same path is replaced.
    pub fn insert_file(&mut self, path: &MountPath, contents: Vec<u8>) -> Result<(), TreeConflict> {
        let segments: Vec<&str> = path.segments().collect();
        let Some((name, dirs)) = segments.split_last() else {
            return Ok(());
        };

        let parent = self.descend(dirs.iter().copied())?;
        if let Some(MountNode::Directory { .. }) = parent.get(*name) {
            return Err(TreeConflict::DirectoryInTheWay(path.to_string()));
        }
        parent.insert(name.to_string(), MountNode::File { contents });
        Ok(())
    }

    /// Look up a node by path.
    pub fn get(&self, path: &str) -> Option<&MountNode> {
        let mut parts = path.split('/').filter(|s| !s.is_empty());
        let mut node = self.root.get(parts.next()?)?;
        for part in parts {
            match node {
                MountNode::Directory { children } => node = children.get(part)?,
                MountNode::File { .. } => return None,
            }
        }
        Some(node)
    }

    /// Number of file nodes in the whole tree.
    pub fn file_count(&self) -> usize {
        fn count(children: &BTreeMap<String, MountNode>) -> usize {
            children
                .values()
                .map(|node| match node {
                    MountNode::File { .. } => 1,
                    MountNode::Directory { children } => count(children),
                })
                .sum()
        }
        count(&self.root)
    }
}
