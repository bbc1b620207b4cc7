//! Archive decoding.
//!
//! The orchestrator only sees [`ArchiveDecoder`]; [`BuiltinDecoder`] covers
//! the two upload formats (`.zip` and `.tar.gz`). Entries that fail on their
//! own are reported individually so one bad file does not sink the import.

use std::io::{Cursor, Read};

use crate::config::MAX_ENTRY_BYTES;
use crate::core::error::ArchiveError;

// ============================================================================
// Archive Format
// ============================================================================

/// Upload container format, derived from the file name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    /// Detect the format from an upload name (case-insensitive suffix).
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") {
            Some(Self::TarGz)
        } else {
            None
        }
    }
}

// ============================================================================
// Entries
// ============================================================================

/// One decoded archive member, path still raw.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub raw_path: String,
    pub is_directory: bool,
    pub bytes: Option<Vec<u8>>,
}

impl ArchiveEntry {
    pub fn file(raw_path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            raw_path: raw_path.into(),
            is_directory: false,
            bytes: Some(bytes.into()),
        }
    }

    pub fn directory(raw_path: impl Into<String>) -> Self {
        Self {
            raw_path: raw_path.into(),
            is_directory: true,
            bytes: None,
        }
    }
}

/// A member that could not be read; the rest of the archive is still usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryError {
    pub raw_path: String,
    pub reason: String,
}

pub type DecodedEntry = Result<ArchiveEntry, EntryError>;

/// Decodes an uploaded blob into its members.
pub trait ArchiveDecoder {
    /// Fails only when the container as a whole is unreadable.
    fn decode(&self, bytes: &[u8], format: ArchiveFormat) -> Result<Vec<DecodedEntry>, ArchiveError>;
}

// ============================================================================
// Builtin Decoder
// ============================================================================

/// Decoder backed by the `zip` and `tar`/`flate2` crates.
///
/// Header sizes are never trusted: each member is read through a
/// [`Read::take`] bound of `max_entry_bytes`, and a member that extracts
/// past it becomes an [`EntryError`].
#[derive(Clone, Copy, Debug)]
pub struct BuiltinDecoder {
    max_entry_bytes: u64,
}

impl BuiltinDecoder {
    pub fn new(max_entry_bytes: u64) -> Self {
        Self { max_entry_bytes }
    }
}

impl Default for BuiltinDecoder {
    fn default() -> Self {
        Self::new(MAX_ENTRY_BYTES)
    }
}

impl ArchiveDecoder for BuiltinDecoder {
    fn decode(&self, bytes: &[u8], format: ArchiveFormat) -> Result<Vec<DecodedEntry>, ArchiveError> {
        match format {
            ArchiveFormat::Zip => decode_zip(bytes, self.max_entry_bytes),
            ArchiveFormat::TarGz => decode_tar_gz(bytes, self.max_entry_bytes),
        }
    }
}

/// Read one member, failing once it passes `limit` bytes.
fn read_entry(reader: impl Read, limit: u64) -> Result<Vec<u8>, String> {
    let mut contents = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut contents)
        .map_err(|e| e.to_string())?;
    if contents.len() as u64 > limit {
        return Err(format!("extracts to more than {} bytes", limit));
    }
    Ok(contents)
}

fn decode_zip(bytes: &[u8], limit: u64) -> Result<Vec<DecodedEntry>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut out = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut member = match archive.by_index(index) {
            Ok(member) => member,
            Err(e) => {
                out.push(Err(EntryError {
                    raw_path: format!("#{}", index),
                    reason: e.to_string(),
                }));
                continue;
            }
        };

        let raw_path = member.name().to_string();
        if member.is_dir() {
            out.push(Ok(ArchiveEntry::directory(raw_path)));
            continue;
        }

        match read_entry(&mut member, limit) {
            Ok(contents) => out.push(Ok(ArchiveEntry::file(raw_path, contents))),
            Err(reason) => out.push(Err(EntryError { raw_path, reason })),
        }
    }

    Ok(out)
}

fn decode_tar_gz(bytes: &[u8], limit: u64) -> Result<Vec<DecodedEntry>, ArchiveError> {
    let gz = flate2::read::GzDecoder::new(bytes);
    let mut archive = tar::Archive::new(gz);
    let mut out = Vec::new();

    for member in archive.entries()? {
        let mut member = match member {
            Ok(member) => member,
            Err(e) => {
                // The stream is broken from here on.
                if out.iter().all(|decoded: &DecodedEntry| decoded.is_err()) {
                    return Err(ArchiveError::Corrupt(e.to_string()));
                }
                out.push(Err(EntryError {
                    raw_path: String::from("<truncated>"),
                    reason: e.to_string(),
                }));
                break;
            }
        };

        let raw_path = match member.path() {
            Ok(path) => path.to_string_lossy().into_owned(),
            Err(e) => {
                out.push(Err(EntryError {
                    raw_path: String::from_utf8_lossy(&member.path_bytes()).into_owned(),
                    reason: e.to_string(),
                }));
                continue;
            }
        };

        let entry_type = member.header().entry_type();
        if entry_type.is_dir() {
            out.push(Ok(ArchiveEntry::directory(raw_path)));
        } else if entry_type.is_file() {
            match read_entry(&mut member, limit) {
                Ok(contents) => out.push(Ok(ArchiveEntry::file(raw_path, contents))),
                Err(reason) => out.push(Err(EntryError { raw_path, reason })),
            }
        } else {
            out.push(Err(EntryError {
                raw_path,
                reason: format!("unsupported entry type {:?}", entry_type),
            }));
        }
    }

    Ok(out)
}
