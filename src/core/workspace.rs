//! Operations on the mounted project: snapshotting it into a [`FileMap`]
//! and user-initiated deletion.

use std::collections::VecDeque;

use crate::config::SNAPSHOT_SKIP_DIRS;
use crate::core::error::{DeleteError, RuntimeError};
use crate::core::runtime::Runtime;
use crate::models::{FileMap, NodeKind};

// ============================================================================
// Snapshot
// ============================================================================

fn child_path(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{}", name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Read the tree below `root` breadth-first.
///
/// Folders named in [`SNAPSHOT_SKIP_DIRS`] are recorded but not entered.
/// A folder that disappears while being walked is skipped.
pub async fn read_file_map<R: Runtime>(runtime: &R, root: &str) -> Result<FileMap, RuntimeError> {
    let root = FileMap::canonical(root);
    let mut map = FileMap::new();
    let mut queue = VecDeque::from([root.clone()]);

    while let Some(dir) = queue.pop_front() {
        let entries = match runtime.list_directory(&dir).await {
            Ok(entries) => entries,
            Err(RuntimeError::NotFound(_)) if dir != root => {
                log::debug!("{} vanished during snapshot", dir);
                continue;
            }
            Err(RuntimeError::NotFound(_)) => return Ok(map),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let path = child_path(&dir, &entry.name);
            if entry.is_file {
                map.insert(&path, NodeKind::File);
            } else {
                map.insert(&path, NodeKind::Folder);
                if !SNAPSHOT_SKIP_DIRS.contains(&entry.name.as_str()) {
                    queue.push_back(path);
                }
            }
        }
    }

    Ok(map)
}

/// Orders overlapping snapshot reads. Each read takes a ticket before it
/// starts; only the newest ticket may publish its result.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnapshotSequence {
    latest: u64,
}

impl SnapshotSequence {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.latest
    }
}

// ============================================================================
// Deletion
// ============================================================================

/// Result of [`delete_entry`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined.
    Cancelled,
    /// `paths` (the target and everything below it) are gone.
    Removed { paths: Vec<String> },
}

/// Confirmation prompt for deleting `path`.
pub fn delete_prompt(name: &str, kind: NodeKind) -> String {
    match kind {
        NodeKind::Folder => format!("Are you sure you want to delete {} and all its contents?", name),
        NodeKind::File => format!("Are you sure you want to delete {}?", name),
    }
}

/// Delete a file or folder after asking `confirm`.
///
/// Folders are removed recursively. A target that is already gone counts as
/// deleted. On success the removed paths are dropped from `map` and
/// returned so callers can forget their view state.
pub async fn delete_entry<R: Runtime>(
    runtime: &R,
    map: &mut FileMap,
    path: &str,
    confirm: impl FnOnce(&str) -> bool,
) -> Result<DeleteOutcome, DeleteError> {
    let path = FileMap::canonical(path);
    let Some(kind) = map.kind(&path) else {
        return Err(DeleteError::UnknownPath(path));
    };

    let name = path.rsplit('/').next().unwrap_or(&path);
    if !confirm(&delete_prompt(name, kind)) {
        return Ok(DeleteOutcome::Cancelled);
    }

    match runtime.remove_path(&path, kind.is_folder()).await {
        Ok(()) => {}
        Err(RuntimeError::NotFound(_)) => log::debug!("{} was already gone", path),
        Err(source) => return Err(DeleteError::Runtime { path, source }),
    }

    let paths = map.remove_subtree(&path);
    log::info!("deleted {} ({} entries)", path, paths.len());
    Ok(DeleteOutcome::Removed { paths })
}
