//! Core business logic of the development shell.
//!
//! This module provides:
//! - [`Orchestrator`] driving an uploaded project from archive to running dev server
//! - `normalize` and `mount_tree` turning archive entries into a mountable tree
//! - [`OutputFanOut`] broadcasting process output to terminal views
//! - `probe` polling the dev server until it accepts connections
//! - [`file_tree`] reconciliation of the mounted file map into tree rows
//! - [`workspace`] snapshot and deletion helpers
//!
//! Everything here is runtime-neutral: the sandbox, the network and the
//! upload are reached through the [`Runtime`], [`Transport`] and
//! [`UploadSource`] traits.

mod archive;
pub mod error;
mod fanout;
pub mod file_tree;
mod mount_tree;
mod normalize;
mod orchestrator;
mod package;
mod probe;
mod runtime;
mod upload;
pub mod workspace;

#[cfg(test)]
pub(crate) mod testing;

pub use error::RuntimeError;
pub use fanout::{OutputFanOut, TerminalSink};
pub use file_tree::CollapsedFolders;
pub use orchestrator::Orchestrator;
pub use package::PackageManager;
pub use probe::Transport;
pub use runtime::{OutputPipe, Process, Runtime};
pub use upload::UploadSource;
