//! Uploaded archive source.

use crate::core::error::RuntimeError;

/// A user-selected file. Name and size are known up front so the
/// orchestrator can reject an upload before reading it.
#[allow(async_fn_in_trait)]
pub trait UploadSource {
    fn name(&self) -> String;

    /// Declared size in bytes.
    fn size(&self) -> u64;

    async fn read_bytes(&self) -> Result<Vec<u8>, RuntimeError>;
}
