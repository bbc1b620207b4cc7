//! Mount tree construction.
//!
//! Turns the flat, normalized archive entries into the nested tree the
//! runtime mounts in bulk, plus the ordered list of directories that must
//! exist beforehand (shallowest first, so parents are always created before
//! their children).

use std::collections::BTreeSet;

use crate::core::error::BringUpError;
use crate::models::{MountPath, MountTree};

/// An archive entry after path normalization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedEntry {
    pub path: MountPath,
    pub is_directory: bool,
    pub bytes: Option<Vec<u8>>,
}

#[cfg(test)]
impl NormalizedEntry {
    pub fn file(path: MountPath, bytes: Vec<u8>) -> Self {
        Self {
            path,
            is_directory: false,
            bytes: Some(bytes),
        }
    }

    pub fn directory(path: MountPath) -> Self {
        Self {
            path,
            is_directory: true,
            bytes: None,
        }
    }
}

/// Result of [`build`]: the tree and the directories to pre-create.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountPlan {
    pub tree: MountTree,
    pub directories: Vec<MountPath>,
}

impl MountPlan {
    pub fn file_count(&self) -> usize {
        self.tree.file_count()
    }
}

/// Build the mount plan.
///
/// A directory implied by a deeper file and also listed explicitly is one
/// node. Entries that collide with an existing node of the other kind are
/// skipped with a warning. Fails with [`BringUpError::EmptyArchive`] when no
/// file survives.
pub fn build(entries: impl IntoIterator<Item = NormalizedEntry>) -> Result<MountPlan, BringUpError> {
    let mut tree = MountTree::new();
    let mut directories: BTreeSet<MountPath> = BTreeSet::new();

    for entry in entries {
        let inserted = if entry.is_directory {
            tree.insert_directory(&entry.path)
        } else {
            tree.insert_file(&entry.path, entry.bytes.unwrap_or_default())
        };

        match inserted {
            Ok(()) => {
                directories.extend(entry.path.ancestors());
                if entry.is_directory {
                    directories.insert(entry.path);
                }
            }
            Err(conflict) => {
                log::warn!("skipping archive entry {}: {:?}", entry.path, conflict);
            }
        }
    }

    if tree.file_count() == 0 {
        return Err(BringUpError::EmptyArchive);
    }

    let mut directories: Vec<MountPath> = directories.into_iter().collect();
    directories.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.cmp(b)));

    Ok(MountPlan { tree, directories })
}

/// Strip a single shared top-level folder when it holds the manifest.
///
/// `project/package.json, project/src/a.js` becomes `package.json, src/a.js`.
/// Archives with a manifest at the root, or with more than one top-level
/// entry, are returned unchanged.
pub fn strip_single_root(entries: Vec<NormalizedEntry>, manifest: &str) -> Vec<NormalizedEntry> {
    let Some(first) = entries.first() else {
        return entries;
    };
    let Some(top) = first.path.segments().next().map(str::to_string) else {
        return entries;
    };

    let has_root_manifest = entries
        .iter()
        .any(|e| !e.is_directory && e.path.as_str() == manifest);
    let shares_top = entries
        .iter()
        .all(|e| e.path.segments().next() == Some(top.as_str()));
    let nested_manifest = format!("{}/{}", top, manifest);
    let has_nested_manifest = entries
        .iter()
        .any(|e| !e.is_directory && e.path.as_str() == nested_manifest);

    if has_root_manifest || !shares_top || !has_nested_manifest {
        return entries;
    }

    log::info!("stripping top-level folder {}/ from archive", top);
    entries
        .into_iter()
        .filter_map(|e| {
            let path = e.path.strip_prefix(&top)?;
            Some(NormalizedEntry { path, ..e })
        })
        .collect()
}
