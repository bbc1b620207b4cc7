//! Application configuration.
//!
//! Centralizes all configuration constants used throughout the application.
//! [`BringUpConfig`] bundles the values the orchestrator needs so tests and
//! other hosts can build orchestrators with their own limits.

use crate::core::PackageManager;

// =============================================================================
// Application Metadata
// =============================================================================

/// Application name displayed in the header.
pub const APP_NAME: &str = "devshell";

/// Maximum log level forwarded to the browser console.
pub const LOG_LEVEL: log::LevelFilter = log::LevelFilter::Info;

// =============================================================================
// Import Configuration
// =============================================================================

/// Largest accepted upload (50 MiB).
pub const MAX_ARCHIVE_BYTES: u64 = 50 * 1024 * 1024;

/// Largest size a single archive member may extract to (256 MiB). Larger
/// members are skipped like any other unreadable entry.
pub const MAX_ENTRY_BYTES: u64 = 256 * 1024 * 1024;

/// Accepted upload name suffixes (also used as the file picker filter).
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".zip", ".tar.gz"];

/// Project descriptor that must exist at the mount root.
pub const MANIFEST_FILE: &str = "package.json";

/// Lock files probed in priority order; npm is used when none is present.
pub const LOCK_FILES: &[(&str, PackageManager)] = &[
    ("yarn.lock", PackageManager::Yarn),
    ("pnpm-lock.yaml", PackageManager::Pnpm),
];

/// Script names tried in order when starting the project.
pub const START_SCRIPTS: &[&str] = &["dev", "start"];

// =============================================================================
// Readiness Configuration
// =============================================================================

/// Readiness probe defaults.
pub mod readiness {
    /// Endpoint polled after the start command is issued.
    pub const URL: &str = "http://localhost:3000";
    /// Delay between probe attempts in milliseconds.
    pub const INTERVAL_MS: u32 = 1000;
    /// Failed connection attempts allowed before giving up.
    pub const MAX_ATTEMPTS: u32 = 30;
}

// =============================================================================
// File Tree Configuration
// =============================================================================

/// Entry names hidden from the file tree in addition to dot/underscore names.
pub const DEFAULT_HIDDEN_NAMES: &[&str] = &["node_modules"];

/// Directories the file map snapshot does not descend into.
pub const SNAPSHOT_SKIP_DIRS: &[&str] = &["node_modules"];

/// Horizontal indent per tree depth level, in pixels.
pub const TREE_INDENT_PX: usize = 8;

// =============================================================================
// Terminal Configuration
// =============================================================================

/// Maximum number of lines each terminal view keeps.
pub const MAX_TERMINAL_LINES: usize = 2000;

/// Maximum number of terminal views open at once.
pub const MAX_TERMINALS: usize = 4;

// =============================================================================
// UI Configuration
// =============================================================================

/// How long a toast stays visible, in milliseconds.
pub const TOAST_DURATION_MS: u32 = 4000;

/// Icon theme selection.
///
/// Available themes:
/// - `Bootstrap` - Familiar, slightly bolder (default)
/// - `Lucide` - Minimal, thin strokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(dead_code)]
pub enum IconTheme {
    #[default]
    Bootstrap,
    Lucide,
}

/// Icon theme used throughout the workbench.
pub const ICON_THEME: IconTheme = IconTheme::Bootstrap;

// =============================================================================
// Bring-Up Configuration
// =============================================================================

/// Polling policy for server readiness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadinessConfig {
    pub url: String,
    pub interval_ms: u32,
    pub max_attempts: u32,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            url: readiness::URL.to_string(),
            interval_ms: readiness::INTERVAL_MS,
            max_attempts: readiness::MAX_ATTEMPTS,
        }
    }
}

/// Everything the orchestrator needs to drive one import attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BringUpConfig {
    pub max_archive_bytes: u64,
    pub max_entry_bytes: u64,
    pub manifest_file: String,
    pub start_scripts: Vec<String>,
    /// Strip a single top-level folder when it holds the manifest.
    pub strip_single_root: bool,
    pub readiness: ReadinessConfig,
}

impl Default for BringUpConfig {
    fn default() -> Self {
        Self {
            max_archive_bytes: MAX_ARCHIVE_BYTES,
            max_entry_bytes: MAX_ENTRY_BYTES,
            manifest_file: MANIFEST_FILE.to_string(),
            start_scripts: START_SCRIPTS.iter().map(|s| s.to_string()).collect(),
            strip_single_root: true,
            readiness: ReadinessConfig::default(),
        }
    }
}
