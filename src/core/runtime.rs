//! Capability interface of the sandboxed runtime.
//!
//! The orchestrator never talks to the WebContainer (or any other sandbox)
//! directly; it is generic over [`Runtime`]. Paths use the
//! [`FileMap`](crate::models::FileMap) convention: absolute, `/` being the
//! project root.
//!
//! The runtime is single-threaded. Futures may hold `Rc`s and are not `Send`.

use std::rc::Rc;

use crate::core::error::RuntimeError;
use crate::models::{DirEntry, MountTree};

/// Receives output chunks of a spawned process, in production order.
pub type OutputPipe = Rc<dyn Fn(&str)>;

/// A running process inside the sandbox.
#[allow(async_fn_in_trait)]
pub trait Process {
    /// Resolve with the exit code once the process has ended and its output
    /// stream is drained: every chunk has reached the [`OutputPipe`] before
    /// this returns. May be awaited more than once.
    async fn exit(&self) -> i32;

    /// Best-effort termination. Not guaranteed to be synchronous.
    fn kill(&self);
}

/// Operations the bring-up pipeline needs from the sandbox.
#[allow(async_fn_in_trait)]
pub trait Runtime {
    type Process: Process;

    /// Materialize a tree at the project root.
    async fn mount(&self, tree: &MountTree) -> Result<(), RuntimeError>;

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, RuntimeError>;

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, RuntimeError>;

    /// Succeeds even if the path is already absent.
    async fn remove_path(&self, path: &str, recursive: bool) -> Result<(), RuntimeError>;

    /// Succeeds even if the directory already exists.
    async fn make_directory(&self, path: &str, recursive: bool) -> Result<(), RuntimeError>;

    /// Start a process. Its combined stdout/stderr is fed to `output` as it
    /// arrives, chunk by chunk, without line buffering.
    async fn spawn(
        &self,
        command: &str,
        args: &[String],
        output: OutputPipe,
    ) -> Result<Self::Process, RuntimeError>;
}

/// Names of the plain files directly under the project root.
///
/// A listing failure is logged and yields no names.
pub async fn root_file_names<R: Runtime>(runtime: &R) -> Vec<String> {
    match runtime.list_directory("/").await {
        Ok(entries) => entries
            .into_iter()
            .filter(|entry| entry.is_file)
            .map(|entry| entry.name)
            .collect(),
        Err(e) => {
            if !e.is_not_found() {
                log::warn!("could not list project root: {}", e);
            }
            Vec::new()
        }
    }
}

/// Remove every top-level entry of the project root.
pub async fn clear_root<R: Runtime>(runtime: &R) -> Result<(), RuntimeError> {
    let entries = match runtime.list_directory("/").await {
        Ok(entries) => entries,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e),
    };
    for entry in entries {
        runtime
            .remove_path(&format!("/{}", entry.name), !entry.is_file)
            .await?;
    }
    Ok(())
}
