use std::collections::BTreeMap;

// =============================================================================
// Node Kind
// =============================================================================

/// Kind of a file system entry.
///
/// Variant order matters: folders sort before files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    pub fn is_folder(self) -> bool {
        self == Self::Folder
    }
}

// =============================================================================
// Directory Listing
// =============================================================================

/// Entry returned by the runtime's directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_file: bool,
}

impl DirEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_file: true,
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_file: false,
        }
    }
}

// =============================================================================
// File Map
// =============================================================================

/// Snapshot of the mounted file system: absolute path to entry kind.
///
/// # Path Convention
///
/// - Keys are absolute: `"/package.json"`, `"/src/index.js"`
/// - No trailing slashes, no empty segments
/// - Intermediate folders may be missing; consumers synthesize them
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileMap {
    entries: BTreeMap<String, NodeKind>,
}

impl FileMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical key form of a path (`src//a/` becomes `/src/a`).
    pub fn canonical(path: &str) -> String {
        let joined = path
            .split('/')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        format!("/{}", joined)
    }

    pub fn insert(&mut self, path: &str, kind: NodeKind) {
        self.entries.insert(Self::canonical(path), kind);
    }

    pub fn kind(&self, path: &str) -> Option<NodeKind> {
        self.entries.get(&Self::canonical(path)).copied()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.kind(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeKind)> {
        self.entries.iter().map(|(path, kind)| (path.as_str(), *kind))
    }

    /// Check whether a folder has no descendants in the map.
    pub fn is_folder_empty(&self, folder: &str) -> bool {
        let prefix = format!("{}/", Self::canonical(folder).trim_end_matches('/'));
        !self.entries.keys().any(|path| path.starts_with(&prefix))
    }

    /// Paths equal to `path` or nested below it.
    pub fn subtree(&self, path: &str) -> Vec<String> {
        let target = Self::canonical(path);
        let prefix = format!("{}/", target.trim_end_matches('/'));
        self.entries
            .keys()
            .filter(|p| **p == target || p.starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// Remove `path` and every path prefixed by `path + "/"`, returning them.
    pub fn remove_subtree(&mut self, path: &str) -> Vec<String> {
        let removed = self.subtree(path);
        for p in &removed {
            self.entries.remove(p);
        }
        removed
    }
}

impl FromIterator<(String, NodeKind)> for FileMap {
    fn from_iter<I: IntoIterator<Item = (String, NodeKind)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (path, kind) in iter {
            map.insert(&path, kind);
        }
        map
    }
}

// =============================================================================
// File Tree Node
// =============================================================================

/// One row of the reconciled file tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileTreeNode {
    /// Position in the full (uncollapsed) pre-order listing.
    pub id: usize,
    pub kind: NodeKind,
    pub name: String,
    pub full_path: String,
    pub depth: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileMap {
        [
            ("/src".to_string(), NodeKind::Folder),
            ("/src/index.js".to_string(), NodeKind::File),
            ("/src/lib/a.js".to_string(), NodeKind::File),
            ("/srcfile".to_string(), NodeKind::File),
            ("/empty".to_string(), NodeKind::Folder),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_canonical() {
        assert_eq!(FileMap::canonical("src//a/"), "/src/a");
        assert_eq!(FileMap::canonical("/"), "/");
        assert_eq!(FileMap::canonical(""), "/");
    }

    #[test]
    fn test_folder_empty() {
        let map = sample();
        assert!(map.is_folder_empty("/empty"));
        assert!(!map.is_folder_empty("/src"));
        assert!(!map.is_folder_empty("/"));
    }

    #[test]
    fn test_remove_subtree_respects_segment_boundary() {
        let mut map = sample();
        let removed = map.remove_subtree("/src");

        assert_eq!(removed, vec!["/src", "/src/index.js", "/src/lib/a.js"]);
        assert!(map.contains("/srcfile"));
        assert!(!map.contains("/src/lib/a.js"));
    }

    #[test]
    fn test_kind_lookup_uses_canonical_form() {
        let map = sample();
        assert_eq!(map.kind("src/index.js"), Some(NodeKind::File));
        assert_eq!(map.kind("/src/"), Some(NodeKind::Folder));
        assert_eq!(map.kind("/missing"), None);
    }
}
