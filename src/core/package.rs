//! Package manager detection and manifest inspection.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::config::LOCK_FILES;
use crate::core::error::BringUpError;

// =============================================================================
// Package Manager
// =============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
    Pnpm,
}

impl PackageManager {
    /// Executable name inside the runtime.
    pub fn command(self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
        }
    }

    /// Pick a manager from the lock files present at the project root.
    ///
    /// `has_file` answers whether a root-level file exists. Lock files are
    /// checked in [`LOCK_FILES`] order; npm is the fallback.
    pub fn detect(mut has_file: impl FnMut(&str) -> bool) -> Self {
        LOCK_FILES
            .iter()
            .find(|&&(lock, _)| has_file(lock))
            .map(|&(_, pm)| pm)
            .unwrap_or_default()
    }

    pub fn install_args(self) -> Vec<String> {
        vec!["install".to_string()]
    }

    pub fn run_args(self, script: &str) -> Vec<String> {
        vec!["run".to_string(), script.to_string()]
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

// =============================================================================
// Manifest
// =============================================================================

/// The parts of `package.json` the bring-up pipeline reads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub scripts: BTreeMap<String, String>,
}

impl PackageManifest {
    /// Parse manifest bytes. `file` names the manifest in the error.
    pub fn parse(bytes: &[u8], file: &str) -> Result<Self, BringUpError> {
        serde_json::from_slice(bytes).map_err(|e| BringUpError::MalformedManifest {
            file: file.to_string(),
            reason: e.to_string(),
        })
    }

    /// First of `preferred` that the manifest declares.
    pub fn start_script<'a>(&self, preferred: &'a [String]) -> Result<&'a str, BringUpError> {
        preferred
            .iter()
            .find(|name| self.scripts.contains_key(name.as_str()))
            .map(String::as_str)
            .ok_or_else(|| BringUpError::NoStartScript {
                expected: preferred.join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preferred() -> Vec<String> {
        vec!["dev".into(), "start".into()]
    }

    #[test]
    fn test_detect_defaults_to_npm() {
        assert_eq!(PackageManager::detect(|_| false), PackageManager::Npm);
    }

    #[test]
    fn test_detect_lock_files() {
        assert_eq!(
            PackageManager::detect(|f| f == "yarn.lock"),
            PackageManager::Yarn
        );
        assert_eq!(
            PackageManager::detect(|f| f == "pnpm-lock.yaml"),
            PackageManager::Pnpm
        );
        // yarn wins when both are present
        assert_eq!(PackageManager::detect(|_| true), PackageManager::Yarn);
    }

    #[test]
    fn test_commands() {
        assert_eq!(PackageManager::Pnpm.command(), "pnpm");
        assert_eq!(PackageManager::Npm.run_args("dev"), vec!["run", "dev"]);
        assert_eq!(PackageManager::Yarn.install_args(), vec!["install"]);
        assert_eq!(PackageManager::Yarn.to_string(), "yarn");
    }

    #[test]
    fn test_start_script_preference() {
        let manifest =
            PackageManifest::parse(br#"{"scripts":{"start":"node a","dev":"vite"}}"#, "package.json")
                .unwrap();
        assert_eq!(manifest.start_script(&preferred()).unwrap(), "dev");

        let manifest =
            PackageManifest::parse(br#"{"scripts":{"start":"node a"}}"#, "package.json").unwrap();
        assert_eq!(manifest.start_script(&preferred()).unwrap(), "start");
    }

    #[test]
    fn test_no_start_script() {
        let manifest = PackageManifest::parse(br#"{"name":"x"}"#, "package.json").unwrap();
        assert_eq!(manifest.name.as_deref(), Some("x"));
        assert_eq!(
            manifest.start_script(&preferred()).unwrap_err(),
            BringUpError::NoStartScript {
                expected: "dev, start".into()
            }
        );
    }

    #[test]
    fn test_malformed_manifest() {
        let err = PackageManifest::parse(b"{ not json", "package.json").unwrap_err();
        assert!(matches!(err, BringUpError::MalformedManifest { ref file, .. } if file == "package.json"));
    }
}
