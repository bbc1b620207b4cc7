//! UI components built with Leptos.
//!
//! - [`Workbench`] - Root layout (header, file tree, terminals, toasts)
//! - [`header`] - Import and reset controls with the status badge
//! - [`file_tree`] - Mounted project tree
//! - [`terminal`] - Terminal views fed by the output fan-out
//! - [`icons`] - Centralized icon definitions (change theme here)
//! - [`status`] - Bring-up status badge
//! - [`toast`] - Transient notifications

pub mod file_tree;
pub mod header;
pub mod icons;
pub mod status;
pub mod terminal;
pub mod toast;
pub mod workbench;

pub use workbench::Workbench;
