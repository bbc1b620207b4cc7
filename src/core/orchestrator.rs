//! Environment bring-up state machine.
//!
//! An [`Orchestrator`] takes one uploaded archive through
//! `Idle → Importing → Installing → Starting → Ready`, or into `Error`.
//! Stages run strictly one after another. Every failure ends the attempt in
//! [`BringUpState::Error`] and its message is written to every terminal.
//!
//! # Cancellation
//!
//! Each attempt captures the current generation. [`Orchestrator::reset`]
//! bumps it and kills tracked processes; an attempt that wakes up under a
//! newer generation stops without touching the state or the terminals.
//! Runtime operations already issued are not recalled.

use std::cell::{Cell, RefCell};
use std::pin::pin;
use std::rc::Rc;

use futures::future::{self, Either};

use crate::config::{BringUpConfig, SUPPORTED_EXTENSIONS};
use crate::core::archive::{ArchiveDecoder, ArchiveFormat, BuiltinDecoder};
use crate::core::error::{BringUpError, RuntimeError};
use crate::core::fanout::OutputFanOut;
use crate::core::mount_tree::{self, NormalizedEntry};
use crate::core::normalize::{is_root_like, normalize};
use crate::core::package::{PackageManager, PackageManifest};
use crate::core::probe::{ProbeOutcome, ReadinessProber, Transport};
use crate::core::runtime::{self, OutputPipe, Process, Runtime};
use crate::core::upload::UploadSource;
use crate::models::BringUpState;

/// Callback invoked after every state change.
pub type StatusListener = Rc<dyn Fn(&BringUpState)>;

/// Why an attempt stopped early.
enum Halt {
    Failed(BringUpError),
    /// A reset happened while the attempt was suspended.
    Cancelled,
}

impl From<BringUpError> for Halt {
    fn from(err: BringUpError) -> Self {
        Self::Failed(err)
    }
}

impl From<RuntimeError> for Halt {
    fn from(err: RuntimeError) -> Self {
        Self::Failed(err.into())
    }
}

type Step<T = ()> = Result<T, Halt>;

/// Drives import attempts against an injected runtime and transport.
pub struct Orchestrator<R: Runtime, T: Transport> {
    runtime: Rc<R>,
    prober: ReadinessProber<T>,
    decoder: Box<dyn ArchiveDecoder>,
    fanout: OutputFanOut,
    config: BringUpConfig,
    state: RefCell<BringUpState>,
    listeners: RefCell<Vec<StatusListener>>,
    generation: Rc<Cell<u64>>,
    processes: RefCell<Vec<Rc<R::Process>>>,
}

impl<R: Runtime, T: Transport> Orchestrator<R, T> {
    pub fn new(runtime: Rc<R>, transport: T, fanout: OutputFanOut, config: BringUpConfig) -> Self {
        Self {
            runtime,
            prober: ReadinessProber::new(transport),
            decoder: Box::new(BuiltinDecoder::new(config.max_entry_bytes)),
            fanout,
            config,
            state: RefCell::new(BringUpState::Idle),
            listeners: RefCell::new(Vec::new()),
            generation: Rc::new(Cell::new(0)),
            processes: RefCell::new(Vec::new()),
        }
    }

    /// Replace the archive decoder.
    #[cfg(test)]
    pub fn with_decoder(mut self, decoder: Box<dyn ArchiveDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn state(&self) -> BringUpState {
        self.state.borrow().clone()
    }

    pub fn runtime(&self) -> &Rc<R> {
        &self.runtime
    }

    pub fn fanout(&self) -> &OutputFanOut {
        &self.fanout
    }

    /// Register a status listener for the orchestrator's lifetime. It is not
    /// called for the current state.
    pub fn subscribe_status(&self, listener: StatusListener) {
        self.listeners.borrow_mut().push(listener);
    }

    // ========================================================================
    // Public operations
    // ========================================================================

    /// Run one import attempt to completion and return the state it ended in.
    ///
    /// Only accepted from `Idle`; otherwise the call is ignored and the
    /// current state is returned.
    pub async fn import_project<U: UploadSource>(&self, upload: &U) -> BringUpState {
        if self.state() != BringUpState::Idle {
            log::warn!("import of {} ignored: bring-up is {}", upload.name(), self.state());
            return self.state();
        }

        let generation = self.generation.get();
        log::info!("import attempt {} for {}", generation, upload.name());

        match self.run(generation, upload).await {
            Ok(()) => {}
            Err(Halt::Cancelled) => log::info!("import attempt {} abandoned", generation),
            Err(Halt::Failed(err)) => self.fail(generation, err),
        }
        self.state()
    }

    /// Abandon the current attempt, kill its processes and return to `Idle`.
    pub fn reset(&self) {
        self.generation.set(self.generation.get() + 1);

        let processes = std::mem::take(&mut *self.processes.borrow_mut());
        if !processes.is_empty() {
            log::info!("killing {} process(es)", processes.len());
        }
        for process in processes {
            process.kill();
        }

        self.set_state(BringUpState::Idle);
    }

    // ========================================================================
    // Stages
    // ========================================================================

    async fn run<U: UploadSource>(&self, generation: u64, upload: &U) -> Step {
        self.transition(generation, BringUpState::Importing)?;
        let (file_count, manifest) = self.import_stage(generation, upload).await?;
        self.write(
            generation,
            &format!("Project imported, {} files mounted\n", file_count),
        )?;

        self.transition(generation, BringUpState::Installing)?;
        let pm = self.detect_package_manager(generation).await?;
        self.install_stage(generation, pm).await?;

        self.transition(generation, BringUpState::Starting)?;
        self.start_stage(generation, pm, &manifest).await?;

        self.transition(generation, BringUpState::Ready)?;
        self.write(
            generation,
            &format!("Server ready at {}\n", self.config.readiness.url),
        )
    }

    async fn import_stage<U: UploadSource>(
        &self,
        generation: u64,
        upload: &U,
    ) -> Step<(usize, PackageManifest)> {
        let name = upload.name();
        let Some(format) = ArchiveFormat::from_file_name(&name) else {
            return Err(BringUpError::InvalidArchiveFormat {
                supported: SUPPORTED_EXTENSIONS.join(" and "),
            }
            .into());
        };

        let size = upload.size();
        if size > self.config.max_archive_bytes {
            return Err(BringUpError::FileTooLarge {
                size,
                limit: self.config.max_archive_bytes,
            }
            .into());
        }

        let bytes = upload.read_bytes().await?;
        self.check(generation)?;

        let decoded = self
            .decoder
            .decode(&bytes, format)
            .map_err(|e| BringUpError::CorruptArchive(e.to_string()))?;

        let mut entries = Vec::with_capacity(decoded.len());
        for decoded in decoded {
            match decoded {
                Ok(entry) if is_root_like(&entry.raw_path) => {}
                Ok(entry) => entries.push(NormalizedEntry {
                    path: normalize(&entry.raw_path),
                    is_directory: entry.is_directory,
                    bytes: entry.bytes,
                }),
                Err(e) => log::warn!("skipping unreadable entry {}: {}", e.raw_path, e.reason),
            }
        }
        if self.config.strip_single_root {
            entries = mount_tree::strip_single_root(entries, &self.config.manifest_file);
        }

        let plan = mount_tree::build(entries)?;
        log::info!(
            "mounting {} files in {} directories",
            plan.file_count(),
            plan.directories.len()
        );

        runtime::clear_root(&*self.runtime).await?;
        self.check(generation)?;
        for dir in &plan.directories {
            self.runtime
                .make_directory(&format!("/{}", dir), true)
                .await?;
            self.check(generation)?;
        }
        self.runtime.mount(&plan.tree).await?;
        self.check(generation)?;

        let manifest_path = format!("/{}", self.config.manifest_file);
        let manifest_bytes = match self.runtime.read_file(&manifest_path).await {
            Ok(bytes) => bytes,
            Err(RuntimeError::NotFound(_)) => {
                self.check(generation)?;
                return Err(BringUpError::MissingManifest(self.config.manifest_file.clone()).into());
            }
            Err(e) => return Err(e.into()),
        };
        self.check(generation)?;
        let manifest = PackageManifest::parse(&manifest_bytes, &self.config.manifest_file)?;

        Ok((plan.file_count(), manifest))
    }

    async fn detect_package_manager(&self, generation: u64) -> Step<PackageManager> {
        let present = runtime::root_file_names(&*self.runtime).await;
        self.check(generation)?;
        Ok(PackageManager::detect(|file| {
            present.iter().any(|name| name == file)
        }))
    }

    async fn install_stage(&self, generation: u64, pm: PackageManager) -> Step {
        self.write(
            generation,
            &format!("Installing dependencies with {}...\n", pm),
        )?;

        let process = self
            .spawn_tracked(generation, pm.command(), &pm.install_args())
            .await?;
        let code = process.exit().await;
        self.check(generation)?;
        self.untrack(&process);

        if code != 0 {
            return Err(BringUpError::InstallFailed(code).into());
        }
        Ok(())
    }

    async fn start_stage(
        &self,
        generation: u64,
        pm: PackageManager,
        manifest: &PackageManifest,
    ) -> Step {
        let script = manifest.start_script(&self.config.start_scripts)?;
        self.write(
            generation,
            &format!("Dependencies installed, starting {} run {}...\n", pm, script),
        )?;

        let server = self
            .spawn_tracked(generation, pm.command(), &pm.run_args(script))
            .await?;

        // An early exit wins over a pending probe.
        let exited = pin!(server.exit());
        let probed = pin!(self.prober.probe_with(&self.config.readiness));
        let outcome = match future::select(exited, probed).await {
            Either::Left((code, _)) => {
                self.check(generation)?;
                self.untrack(&server);
                return Err(BringUpError::ServerExited(code).into());
            }
            Either::Right((outcome, _)) => outcome,
        };
        self.check(generation)?;

        match outcome {
            ProbeOutcome::Ready { attempt } => {
                log::info!("dev server ready after {} attempt(s)", attempt);
                Ok(())
            }
            ProbeOutcome::Exhausted { attempts } => Err(BringUpError::ReadinessTimeout {
                url: self.config.readiness.url.clone(),
                attempts,
            }
            .into()),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn check(&self, generation: u64) -> Step {
        if self.generation.get() == generation {
            Ok(())
        } else {
            Err(Halt::Cancelled)
        }
    }

    fn transition(&self, generation: u64, next: BringUpState) -> Step {
        self.check(generation)?;
        log::info!("bring-up: {} -> {}", self.state(), next);
        self.set_state(next);
        Ok(())
    }

    fn write(&self, generation: u64, text: &str) -> Step {
        self.check(generation)?;
        self.fanout.broadcast(text);
        Ok(())
    }

    fn fail(&self, generation: u64, err: BringUpError) {
        if self.check(generation).is_err() {
            return;
        }
        log::error!("bring-up failed: {}", err);
        let message = format!("{}\n", err);
        self.set_state(BringUpState::Error(err));
        self.fanout.broadcast(&message);
    }

    fn set_state(&self, next: BringUpState) {
        *self.state.borrow_mut() = next.clone();
        let listeners: Vec<StatusListener> = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&next);
        }
    }

    /// Output pipe that drops chunks once its attempt is stale.
    fn pipe(&self, generation: u64) -> OutputPipe {
        let fanout = self.fanout.clone();
        let current = self.generation.clone();
        Rc::new(move |chunk: &str| {
            if current.get() == generation {
                fanout.broadcast(chunk);
            }
        })
    }

    async fn spawn_tracked(
        &self,
        generation: u64,
        command: &str,
        args: &[String],
    ) -> Step<Rc<R::Process>> {
        self.check(generation)?;
        log::info!("spawning {} {}", command, args.join(" "));

        let process = Rc::new(
            self.runtime
                .spawn(command, args, self.pipe(generation))
                .await?,
        );
        if self.check(generation).is_err() {
            process.kill();
            return Err(Halt::Cancelled);
        }
        self.processes.borrow_mut().push(process.clone());
        Ok(process)
    }

    fn untrack(&self, process: &Rc<R::Process>) {
        self.processes
            .borrow_mut()
            .retain(|tracked| !Rc::ptr_eq(tracked, process));
    }
}
