//! Test doubles for the runtime, the network and terminal sinks.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Write};
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};

use crate::core::error::{ProbeError, RuntimeError};
use crate::core::fanout::TerminalSink;
use crate::core::probe::Transport;
use crate::core::runtime::{OutputPipe, Process, Runtime};
use crate::core::upload::UploadSource;
use crate::models::{DirEntry, FileMap, MountNode, MountTree};

// ============================================================================
// Archives
// ============================================================================

/// Build a zip. `None` contents mark a directory entry.
pub fn build_zip(entries: &[(&str, Option<&str>)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (path, contents) in entries {
        match contents {
            Some(text) => {
                writer.start_file(*path, options).unwrap();
                writer.write_all(text.as_bytes()).unwrap();
            }
            None => writer.add_directory(*path, options).unwrap(),
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Build a gzip-compressed tar. `None` contents mark a directory entry.
pub fn build_tar_gz(entries: &[(&str, Option<&str>)]) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        match contents {
            Some(text) => {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(text.len() as u64);
                header.set_mode(0o644);
                builder
                    .append_data(&mut header, path, text.as_bytes())
                    .unwrap();
            }
            None => {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                builder
                    .append_data(&mut header, path, std::io::empty())
                    .unwrap();
            }
        }
    }
    builder.into_inner().unwrap().finish().unwrap()
}

// ============================================================================
// Upload
// ============================================================================

pub struct MemoryUpload {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Overrides the reported size.
    pub declared_size: Option<u64>,
    reads: Cell<usize>,
}

impl MemoryUpload {
    pub fn new(name: &str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            bytes,
            declared_size: None,
            reads: Cell::new(0),
        }
    }

    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl UploadSource for MemoryUpload {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn size(&self) -> u64 {
        self.declared_size.unwrap_or(self.bytes.len() as u64)
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, RuntimeError> {
        self.reads.set(self.reads.get() + 1);
        Ok(self.bytes.clone())
    }
}

// ============================================================================
// Runtime
// ============================================================================

/// How a scripted process ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessExit {
    Code(i32),
    /// Keeps running until killed; `exit` never resolves.
    Never,
}

#[derive(Clone, Debug)]
pub struct ScriptedProcess {
    pub output: Vec<String>,
    pub exit: ProcessExit,
    /// Deliver output from a detached local task instead of inside `spawn`.
    pub streamed: bool,
}

impl ScriptedProcess {
    pub fn exits(code: i32) -> Self {
        Self {
            output: Vec::new(),
            exit: ProcessExit::Code(code),
            streamed: false,
        }
    }

    pub fn runs_forever() -> Self {
        Self {
            output: Vec::new(),
            exit: ProcessExit::Never,
            streamed: false,
        }
    }

    pub fn printing(mut self, chunk: &str) -> Self {
        self.output.push(chunk.to_string());
        self
    }

    /// Pump output on a `tokio::task::spawn_local` task that yields before
    /// every chunk. Tests using this must run inside a `LocalSet`.
    pub fn streamed(mut self) -> Self {
        self.streamed = true;
        self
    }
}

type Drained = Shared<LocalBoxFuture<'static, ()>>;

/// Forward `chunks` from a separate local task; the handle resolves once all
/// have been written.
fn pump_detached(chunks: Vec<String>, output: OutputPipe) -> Drained {
    let pump = async move {
        for chunk in chunks {
            tokio::task::yield_now().await;
            output(&chunk);
        }
    }
    .boxed_local()
    .shared();
    tokio::task::spawn_local(pump.clone());
    pump
}

/// Recorded runtime operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Mount,
    ReadFile(String),
    List(String),
    Remove(String),
    MakeDirectory(String),
    Spawn(String),
}

pub struct MemoryProcess {
    exit: ProcessExit,
    killed: Rc<Cell<bool>>,
    drained: Option<Drained>,
}

impl Process for MemoryProcess {
    async fn exit(&self) -> i32 {
        if let Some(drained) = &self.drained {
            drained.clone().await;
        }
        match self.exit {
            ProcessExit::Code(code) => code,
            ProcessExit::Never => futures::future::pending::<i32>().await,
        }
    }

    fn kill(&self) {
        self.killed.set(true);
    }
}

#[derive(Default)]
struct MemoryFs {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

impl MemoryFs {
    fn is_dir(&self, path: &str) -> bool {
        path == "/" || self.dirs.contains(path)
    }

    fn children(&self, dir: &str) -> Vec<DirEntry> {
        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{}/", dir)
        };
        let direct = |path: &String| {
            path.strip_prefix(&prefix)
                .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                .map(str::to_string)
        };
        let mut out: Vec<DirEntry> = self
            .dirs
            .iter()
            .filter_map(direct)
            .map(DirEntry::folder)
            .collect();
        out.extend(self.files.keys().filter_map(direct).map(DirEntry::file));
        out
    }

    fn mount_children(&mut self, base: &str, children: &BTreeMap<String, MountNode>) {
        for (name, node) in children {
            let path = if base == "/" {
                format!("/{}", name)
            } else {
                format!("{}/{}", base, name)
            };
            match node {
                MountNode::File { contents } => {
                    self.files.insert(path, contents.clone());
                }
                MountNode::Directory { children } => {
                    self.dirs.insert(path.clone());
                    self.mount_children(&path, children);
                }
            }
        }
    }
}

/// In-memory runtime with scripted processes and a call journal.
#[derive(Default)]
pub struct MemoryRuntime {
    fs: RefCell<MemoryFs>,
    scripts: RefCell<BTreeMap<String, ScriptedProcess>>,
    journal: RefCell<Vec<Call>>,
    mount_failure: Option<String>,
    killed: RefCell<BTreeMap<String, Rc<Cell<bool>>>>,
}

impl MemoryRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: &str, contents: &str) -> Self {
        {
            let mut fs = self.fs.borrow_mut();
            let path = FileMap::canonical(path);
            let mut parent = path.as_str();
            while let Some(idx) = parent.rfind('/') {
                parent = &parent[..idx];
                if parent.is_empty() {
                    break;
                }
                fs.dirs.insert(parent.to_string());
            }
            fs.files.insert(path, contents.as_bytes().to_vec());
        }
        self
    }

    pub fn with_dir(self, path: &str) -> Self {
        self.fs.borrow_mut().dirs.insert(FileMap::canonical(path));
        self
    }

    /// Script the process started by `command_line` (`"npm install"`).
    pub fn with_process(self, command_line: &str, process: ScriptedProcess) -> Self {
        self.scripts
            .borrow_mut()
            .insert(command_line.to_string(), process);
        self
    }

    pub fn failing_mount(mut self, reason: &str) -> Self {
        self.mount_failure = Some(reason.to_string());
        self
    }

    pub fn journal(&self) -> Vec<Call> {
        self.journal.borrow().clone()
    }

    pub fn mount_count(&self) -> usize {
        self.journal
            .borrow()
            .iter()
            .filter(|c| **c == Call::Mount)
            .count()
    }

    /// Command lines spawned so far, in order.
    pub fn spawned(&self) -> Vec<String> {
        self.journal
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Spawn(line) => Some(line.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn was_killed(&self, command_line: &str) -> bool {
        self.killed
            .borrow()
            .get(command_line)
            .is_some_and(|flag| flag.get())
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.fs.borrow().files.contains_key(path)
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.fs.borrow().dirs.contains(path)
    }

    fn record(&self, call: Call) {
        self.journal.borrow_mut().push(call);
    }
}

impl Runtime for MemoryRuntime {
    type Process = MemoryProcess;

    async fn mount(&self, tree: &MountTree) -> Result<(), RuntimeError> {
        self.record(Call::Mount);
        if let Some(reason) = &self.mount_failure {
            return Err(RuntimeError::Mount(reason.clone()));
        }
        self.fs.borrow_mut().mount_children("/", tree.entries());
        Ok(())
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, RuntimeError> {
        self.record(Call::ReadFile(path.to_string()));
        let fs = self.fs.borrow();
        match fs.files.get(path) {
            Some(bytes) => Ok(bytes.clone()),
            None if fs.is_dir(path) => Err(RuntimeError::Io(format!("{}: is a directory", path))),
            None => Err(RuntimeError::NotFound(path.to_string())),
        }
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, RuntimeError> {
        self.record(Call::List(path.to_string()));
        let fs = self.fs.borrow();
        if !fs.is_dir(path) {
            return Err(RuntimeError::NotFound(path.to_string()));
        }
        Ok(fs.children(path))
    }

    async fn remove_path(&self, path: &str, recursive: bool) -> Result<(), RuntimeError> {
        self.record(Call::Remove(path.to_string()));
        let mut fs = self.fs.borrow_mut();
        if fs.files.remove(path).is_some() {
            return Ok(());
        }
        if !fs.dirs.contains(path) {
            return Ok(());
        }
        let prefix = format!("{}/", path);
        let has_children = fs.files.keys().chain(fs.dirs.iter()).any(|p| p.starts_with(&prefix));
        if has_children && !recursive {
            return Err(RuntimeError::Io(format!("{}: directory not empty", path)));
        }
        fs.files.retain(|p, _| !p.starts_with(&prefix));
        fs.dirs.retain(|p| p != path && !p.starts_with(&prefix));
        Ok(())
    }

    async fn make_directory(&self, path: &str, recursive: bool) -> Result<(), RuntimeError> {
        self.record(Call::MakeDirectory(path.to_string()));
        let mut fs = self.fs.borrow_mut();
        let parent = path.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
        if !recursive && !parent.is_empty() && !fs.is_dir(parent) {
            return Err(RuntimeError::NotFound(parent.to_string()));
        }
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            fs.dirs.insert(current.clone());
        }
        Ok(())
    }

    async fn spawn(
        &self,
        command: &str,
        args: &[String],
        output: OutputPipe,
    ) -> Result<MemoryProcess, RuntimeError> {
        let line = std::iter::once(command.to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");
        self.record(Call::Spawn(line.clone()));

        let script = self
            .scripts
            .borrow()
            .get(&line)
            .cloned()
            .unwrap_or_else(|| ScriptedProcess::exits(0));
        let drained = if script.streamed {
            Some(pump_detached(script.output, output))
        } else {
            for chunk in &script.output {
                output(chunk);
            }
            None
        };

        let killed = Rc::new(Cell::new(false));
        self.killed.borrow_mut().insert(line, killed.clone());
        Ok(MemoryProcess {
            exit: script.exit,
            killed,
            drained,
        })
    }
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Default)]
struct TransportLog {
    urls: Vec<String>,
    sleeps: Vec<u32>,
}

/// Transport that fails a fixed number of connects before answering.
/// Sleeping is instant. Clones share the same log.
#[derive(Clone)]
pub struct ScriptedTransport {
    failures_before_ready: Option<u32>,
    log: Rc<RefCell<TransportLog>>,
}

impl ScriptedTransport {
    pub fn ready_after(failures: u32) -> Self {
        Self {
            failures_before_ready: Some(failures),
            log: Rc::default(),
        }
    }

    pub fn never_ready() -> Self {
        Self {
            failures_before_ready: None,
            log: Rc::default(),
        }
    }

    pub fn attempts(&self) -> usize {
        self.log.borrow().urls.len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.log.borrow().urls.clone()
    }

    pub fn sleeps(&self) -> Vec<u32> {
        self.log.borrow().sleeps.clone()
    }
}

impl Transport for ScriptedTransport {
    async fn connect(&self, url: &str) -> Result<(), ProbeError> {
        let attempt = {
            let mut log = self.log.borrow_mut();
            log.urls.push(url.to_string());
            log.urls.len() as u32
        };
        match self.failures_before_ready {
            Some(failures) if attempt > failures => Ok(()),
            _ => Err(ProbeError::Connect {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }

    async fn sleep(&self, millis: u32) {
        self.log.borrow_mut().sleeps.push(millis);
    }
}

// ============================================================================
// Sink
// ============================================================================

/// Sink that records every chunk it receives.
#[derive(Default)]
pub struct RecordingSink {
    chunks: RefCell<Vec<String>>,
}

impl RecordingSink {
    pub fn chunks(&self) -> Vec<String> {
        self.chunks.borrow().clone()
    }

    pub fn text(&self) -> String {
        self.chunks.borrow().concat()
    }
}

impl TerminalSink for RecordingSink {
    fn write(&self, text: &str) {
        self.chunks.borrow_mut().push(text.to_string());
    }
}
