//! Data models and types for the application.
//!
//! Contains domain types for:
//! - [`BringUpState`] - Import attempt lifecycle shown by the status badge
//! - [`MountPath`], [`MountTree`] - Normalized archive content ready for mounting
//! - [`FileMap`], [`FileTreeNode`], [`NodeKind`] - Mounted file system snapshot and tree rows
//! - [`TerminalBuffer`] - Terminal scrollback
//! - [`Toast`] - Transient notifications

mod filesystem;
mod mount;
mod status;
mod terminal;
mod toast;

pub use filesystem::{DirEntry, FileMap, FileTreeNode, NodeKind};
pub use mount::{MountNode, MountPath, MountTree};
pub use status::BringUpState;
pub use terminal::TerminalBuffer;
pub use toast::{Toast, ToastLevel};
