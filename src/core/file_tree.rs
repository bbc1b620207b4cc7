//! File tree reconciliation.
//!
//! [`reconcile_all`] turns a flat [`FileMap`] into the full pre-order row
//! list (folders first, then natural name order); [`visible`] then drops
//! every row below a collapsed folder. Both are pure: the same inputs always
//! produce the same rows. The only state is the collapsed set, kept by
//! [`CollapsedFolders`] and keyed by full path so it survives rebuilds.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::config::DEFAULT_HIDDEN_NAMES;
use crate::models::{FileMap, FileTreeNode, NodeKind};

// ============================================================================
// Options
// ============================================================================

/// Extra rule hiding entries from the tree. Matched against both the entry
/// name and its full path.
#[derive(Clone, Debug)]
pub enum HiddenRule {
    Literal(String),
    Pattern(Regex),
}

impl HiddenRule {
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    pub fn matches(&self, name: &str, full_path: &str) -> bool {
        match self {
            Self::Literal(value) => name == value || full_path == value,
            Self::Pattern(re) => re.is_match(name) || re.is_match(full_path),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TreeOptions {
    /// Folder whose contents are listed.
    pub root_folder: String,
    /// Suppress the `/` row when listing from the root.
    pub hide_root: bool,
    pub hidden: Vec<HiddenRule>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            root_folder: "/".to_string(),
            hide_root: false,
            hidden: DEFAULT_HIDDEN_NAMES
                .iter()
                .map(|name| HiddenRule::literal(*name))
                .collect(),
        }
    }
}

impl TreeOptions {
    fn shows_root_row(&self) -> bool {
        FileMap::canonical(&self.root_folder) == "/" && !self.hide_root
    }

    fn is_hidden(&self, name: &str, full_path: &str) -> bool {
        name.starts_with('.')
            || name.starts_with('_')
            || self.hidden.iter().any(|rule| rule.matches(name, full_path))
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Compare names case-insensitively, with digit runs compared by value
/// (`file2` before `file10`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        let (x, y) = match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => (x, y),
        };

        if x.is_ascii_digit() && y.is_ascii_digit() {
            let left = take_digits(&mut a);
            let right = take_digits(&mut b);
            let left = left.trim_start_matches('0');
            let right = right.trim_start_matches('0');
            let ord = left.len().cmp(&right.len()).then_with(|| left.cmp(right));
            if ord != Ordering::Equal {
                return ord;
            }
            continue;
        }

        a.next();
        b.next();
        let ord = x.to_lowercase().cmp(y.to_lowercase());
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Build the full pre-order row list, ignoring collapse state.
///
/// Folders implied by deeper paths are synthesized. When a path appears as
/// both a file and a folder, the folder wins. Hidden entries are dropped
/// together with everything below them. Row ids are positions in this list.
pub fn reconcile_all(map: &FileMap, options: &TreeOptions) -> Vec<FileTreeNode> {
    let root = FileMap::canonical(&options.root_folder);
    let root_prefix = if root == "/" {
        "/".to_string()
    } else {
        format!("{}/", root)
    };

    let mut kinds: BTreeMap<String, NodeKind> = BTreeMap::new();
    for (path, kind) in map.iter() {
        let Some(relative) = path.strip_prefix(&root_prefix) else {
            continue;
        };
        if relative.is_empty() {
            continue;
        }

        let segments: Vec<&str> = relative.split('/').collect();
        let mut current = root.clone();
        for (i, segment) in segments.iter().enumerate() {
            current = join(&current, segment);
            let implied = if i + 1 < segments.len() {
                NodeKind::Folder
            } else {
                kind
            };
            let slot = kinds.entry(current.clone()).or_insert(implied);
            if implied.is_folder() {
                *slot = NodeKind::Folder;
            }
        }
    }

    let mut children: BTreeMap<&str, Vec<(&str, NodeKind)>> = BTreeMap::new();
    for (path, kind) in &kinds {
        children
            .entry(parent_of(path))
            .or_default()
            .push((path.as_str(), *kind));
    }
    for siblings in children.values_mut() {
        siblings.sort_by(|(a_path, a_kind), (b_path, b_kind)| {
            let (a_name, b_name) = (name_of(a_path), name_of(b_path));
            a_kind
                .cmp(b_kind)
                .then_with(|| natural_cmp(a_name, b_name))
                .then_with(|| a_name.cmp(b_name))
        });
    }

    let mut out = Vec::with_capacity(kinds.len() + 1);
    let mut depth = 0;
    if options.shows_root_row() {
        out.push(FileTreeNode {
            id: 0,
            kind: NodeKind::Folder,
            name: "/".to_string(),
            full_path: "/".to_string(),
            depth: 0,
        });
        depth = 1;
    }
    walk(&root, depth, &children, options, &mut out);
    out
}

fn walk(
    dir: &str,
    depth: usize,
    children: &BTreeMap<&str, Vec<(&str, NodeKind)>>,
    options: &TreeOptions,
    out: &mut Vec<FileTreeNode>,
) {
    let Some(siblings) = children.get(dir) else {
        return;
    };
    for &(path, kind) in siblings {
        let name = name_of(path);
        if options.is_hidden(name, path) {
            continue;
        }
        out.push(FileTreeNode {
            id: out.len(),
            kind,
            name: name.to_string(),
            full_path: path.to_string(),
            depth,
        });
        if kind.is_folder() {
            walk(path, depth + 1, children, options, out);
        }
    }
}

/// Check whether any strict ancestor of `path` (including `/`) is collapsed.
fn under_collapsed(path: &str, collapsed: &BTreeSet<String>) -> bool {
    if path == "/" {
        return false;
    }
    if collapsed.contains("/") {
        return true;
    }
    path.match_indices('/')
        .skip(1)
        .any(|(idx, _)| collapsed.contains(&path[..idx]))
}

/// Drop rows that sit anywhere below a collapsed folder. Collapsed folders
/// themselves stay visible.
pub fn visible(nodes: &[FileTreeNode], collapsed: &BTreeSet<String>) -> Vec<FileTreeNode> {
    nodes
        .iter()
        .filter(|node| !under_collapsed(&node.full_path, collapsed))
        .cloned()
        .collect()
}

/// [`reconcile_all`] followed by [`visible`].
pub fn reconcile(
    map: &FileMap,
    options: &TreeOptions,
    collapsed: &BTreeSet<String>,
) -> Vec<FileTreeNode> {
    visible(&reconcile_all(map, options), collapsed)
}

// ============================================================================
// Collapse State
// ============================================================================

/// Collapsed folder set, persisted across rebuilds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollapsedFolders {
    paths: BTreeSet<String>,
    primed: bool,
}

impl CollapsedFolders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> &BTreeSet<String> {
        &self.paths
    }

    pub fn is_collapsed(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Flip one folder. Folders with no contents cannot be toggled; returns
    /// whether anything changed.
    pub fn toggle(&mut self, path: &str, map: &FileMap) -> bool {
        if path != "/" && map.is_folder_empty(path) {
            return false;
        }
        if !self.paths.remove(path) {
            self.paths.insert(path.to_string());
        }
        true
    }

    /// Collapse every folder the first time a non-empty listing is seen.
    /// Later listings leave the user's choices alone.
    pub fn prime(&mut self, nodes: &[FileTreeNode]) {
        if self.primed || nodes.iter().all(|n| n.full_path == "/") {
            return;
        }
        self.primed = true;
        self.paths.extend(
            nodes
                .iter()
                .filter(|n| n.kind.is_folder() && n.full_path != "/")
                .map(|n| n.full_path.clone()),
        );
    }

    /// Forget removed paths.
    pub fn forget(&mut self, removed: &[String]) {
        for path in removed {
            self.paths.remove(path);
        }
    }

    /// Start over, as for a freshly imported project.
    pub fn clear(&mut self) {
        self.paths.clear();
        self.primed = false;
    }
}
