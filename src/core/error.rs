//! Error types for the bring-up pipeline and its collaborators.
//!
//! Provides structured error handling with meaningful error messages
//! and proper error categorization for each domain:
//!
//! - [`BringUpError`] - Terminal failure of an import attempt (shown in terminals)
//! - [`RuntimeError`] - Sandboxed runtime capability failures (mount, fs, spawn)
//! - [`ArchiveError`] - Archive decoding failures
//! - [`ProbeError`] - Readiness probe transport failures
//! - [`DeleteError`] - File tree deletion failures (shown as a toast)

use thiserror::Error;

/// Why an import attempt ended in the `Error` state.
///
/// Every variant renders a human-readable message; that message is what the
/// terminal sinks receive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BringUpError {
    /// Upload name does not end in a supported extension.
    #[error("Invalid file format. Only {supported} files are supported.")]
    InvalidArchiveFormat { supported: String },

    /// Upload exceeds the configured ceiling.
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    /// The archive container could not be decoded at all.
    #[error("Corrupt archive: {0}")]
    CorruptArchive(String),

    /// No file entries survived decoding.
    #[error("Archive contains no files")]
    EmptyArchive,

    /// The project descriptor is not present at the mount root.
    #[error("Missing manifest: {0} not found in project root")]
    MissingManifest(String),

    /// The project descriptor exists but is not valid JSON.
    #[error("Malformed manifest {file}: {reason}")]
    MalformedManifest { file: String, reason: String },

    /// The runtime refused the mount.
    #[error("Mount failed: {0}")]
    MountError(String),

    /// The install command exited unsuccessfully.
    #[error("Dependency installation failed with exit code {0}")]
    InstallFailed(i32),

    /// The manifest declares none of the preferred start scripts.
    #[error("No start script found (expected one of: {expected})")]
    NoStartScript { expected: String },

    /// The dev server process exited before it became reachable.
    #[error("Dev server exited with code {0} before becoming ready")]
    ServerExited(i32),

    /// The readiness probe exhausted its attempts.
    #[error("Dev server not reachable at {url} after {attempts} attempts")]
    ReadinessTimeout { url: String, attempts: u32 },

    /// Any other runtime failure during a stage.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Failures reported by the sandboxed runtime capability interface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Path does not exist.
    #[error("{0}: no such file or directory")]
    NotFound(String),
    /// Bulk mount was rejected.
    #[error("mount rejected: {0}")]
    Mount(String),
    /// Process could not be started.
    #[error("failed to spawn `{command}`: {reason}")]
    Spawn { command: String, reason: String },
    /// Runtime could not be booted.
    #[error("runtime unavailable: {0}")]
    Boot(String),
    /// Any other file system failure.
    #[error("{0}")]
    Io(String),
}

impl RuntimeError {
    /// Check whether this error means the target path is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<RuntimeError> for BringUpError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Mount(msg) => Self::MountError(msg),
            other => Self::Runtime(other.to_string()),
        }
    }
}

/// Failures raised while decoding an uploaded archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The container itself is unreadable.
    #[error("{0}")]
    Corrupt(String),
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        Self::Corrupt(err.to_string())
    }
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Corrupt(err.to_string())
    }
}

/// A single failed connection attempt of the readiness probe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Connection could not be established.
    #[error("connection to {url} failed: {reason}")]
    Connect { url: String, reason: String },
    /// Request object could not be built.
    #[error("invalid probe request for {0}")]
    InvalidRequest(String),
}

/// Failures of a user-initiated deletion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteError {
    /// Path is not part of the current file map.
    #[error("{0} is not in the file tree")]
    UnknownPath(String),
    /// Runtime refused the removal.
    #[error("failed to delete {path}: {source}")]
    Runtime {
        path: String,
        #[source]
        source: RuntimeError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bring_up_messages() {
        assert_eq!(
            BringUpError::InstallFailed(1).to_string(),
            "Dependency installation failed with exit code 1"
        );
        assert_eq!(BringUpError::EmptyArchive.to_string(), "Archive contains no files");
        assert_eq!(
            BringUpError::MissingManifest("package.json".into()).to_string(),
            "Missing manifest: package.json not found in project root"
        );
    }

    #[test]
    fn test_runtime_error_conversion() {
        let mount: BringUpError = RuntimeError::Mount("quota".into()).into();
        assert_eq!(mount, BringUpError::MountError("quota".into()));

        let other: BringUpError = RuntimeError::NotFound("/x".into()).into();
        assert!(matches!(other, BringUpError::Runtime(_)));
    }

    #[test]
    fn test_not_found_detection() {
        assert!(RuntimeError::NotFound("a".into()).is_not_found());
        assert!(!RuntimeError::Io("a".into()).is_not_found());
    }
}
