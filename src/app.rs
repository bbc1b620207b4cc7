//! Root application module.
//!
//! Contains the main App component and the AppContext that binds the
//! orchestrator to Leptos signals.

use std::rc::Rc;

use gloo_timers::callback::Timeout;
use leptos::prelude::*;
use leptos::task::spawn_local;
use web_sys::File;

use crate::components::Workbench;
use crate::config::{BringUpConfig, MAX_TERMINALS, TOAST_DURATION_MS};
use crate::core::file_tree::{self, TreeOptions};
use crate::core::workspace::{self, DeleteOutcome, SnapshotSequence};
use crate::core::{CollapsedFolders, Orchestrator, OutputFanOut};
use crate::models::{BringUpState, FileMap, FileTreeNode, Toast};
use crate::utils::{BrowserUpload, HttpTransport, WebContainerRuntime, dom};

/// Orchestrator wired to the browser runtime and network.
pub type BrowserOrchestrator = Orchestrator<WebContainerRuntime, HttpTransport>;

// ============================================================================
// AppContext
// ============================================================================

/// Global application context provided to all components.
///
/// The orchestrator itself is single-threaded and lives in local storage;
/// everything the views read is mirrored into signals:
///
/// - **status**: Bring-up state, updated on every transition
/// - **file_map**: Last snapshot of the mounted project
/// - **collapsed** / **selected**: File tree view state
/// - **toasts**: Transient notifications
/// - **terminals**: Ids of the open terminal views
#[derive(Clone, Copy)]
pub struct AppContext {
    orchestrator: StoredValue<Rc<BrowserOrchestrator>, LocalStorage>,
    pub status: RwSignal<BringUpState>,
    pub file_map: RwSignal<FileMap>,
    pub collapsed: RwSignal<CollapsedFolders>,
    pub selected: RwSignal<Option<String>>,
    pub toasts: RwSignal<Vec<Toast>>,
    pub terminals: RwSignal<Vec<usize>>,
    next_terminal: RwSignal<usize>,
    snapshots: StoredValue<SnapshotSequence>,
}

impl AppContext {
    /// Creates the context and subscribes it to orchestrator status changes.
    pub fn new() -> Self {
        let orchestrator = Rc::new(Orchestrator::new(
            Rc::new(WebContainerRuntime::new()),
            HttpTransport,
            OutputFanOut::new(),
            BringUpConfig::default(),
        ));

        let ctx = Self {
            orchestrator: StoredValue::new_local(orchestrator.clone()),
            status: RwSignal::new(BringUpState::Idle),
            file_map: RwSignal::new(FileMap::new()),
            collapsed: RwSignal::new(CollapsedFolders::new()),
            selected: RwSignal::new(None),
            toasts: RwSignal::new(Vec::new()),
            terminals: RwSignal::new(vec![0]),
            next_terminal: RwSignal::new(1),
            snapshots: StoredValue::new(SnapshotSequence::default()),
        };

        orchestrator.subscribe_status(Rc::new(move |state: &BringUpState| {
            ctx.status.set(state.clone());
            // Installing is entered right after a successful mount.
            if matches!(
                state,
                BringUpState::Installing | BringUpState::Ready | BringUpState::Error(_)
            ) {
                ctx.refresh_files();
            }
        }));

        ctx
    }

    pub fn orchestrator(&self) -> Rc<BrowserOrchestrator> {
        self.orchestrator.get_value()
    }

    pub fn fanout(&self) -> OutputFanOut {
        self.orchestrator().fanout().clone()
    }

    // ========================================================================
    // Bring-up
    // ========================================================================

    /// Start importing a picked archive.
    pub fn import(&self, file: File) {
        let orchestrator = self.orchestrator();
        if orchestrator.state() != BringUpState::Idle {
            self.push_toast(Toast::warning("Reset the environment before importing another project"));
            return;
        }

        self.push_toast(Toast::info(format!("Importing {}", file.name())));
        self.collapsed.update(CollapsedFolders::clear);
        self.selected.set(None);

        let ctx = *self;
        spawn_local(async move {
            let upload = BrowserUpload::new(file);
            match orchestrator.import_project(&upload).await {
                BringUpState::Ready => ctx.push_toast(Toast::success("Dev server is ready")),
                BringUpState::Error(_) => {
                    ctx.push_toast(Toast::error("Import failed, see terminal output"))
                }
                _ => {}
            }
        });
    }

    /// Abandon the current attempt and go back to idle.
    pub fn reset(&self) {
        self.orchestrator().reset();
        self.push_toast(Toast::info("Environment reset"));
    }

    // ========================================================================
    // File tree
    // ========================================================================

    /// Re-read the mounted project into `file_map`. A read overtaken by a
    /// later refresh is discarded.
    pub fn refresh_files(&self) {
        let ctx = *self;
        let runtime = self.orchestrator().runtime().clone();
        let Some(ticket) = self.snapshots.try_update_value(SnapshotSequence::issue) else {
            return;
        };
        spawn_local(async move {
            let result = workspace::read_file_map(&*runtime, "/").await;
            if !ctx.snapshots.with_value(|seq| seq.is_current(ticket)) {
                log::debug!("dropping stale file snapshot {}", ticket);
                return;
            }
            match result {
                Ok(map) => {
                    let nodes = file_tree::reconcile_all(&map, &TreeOptions::default());
                    ctx.collapsed.update(|c| c.prime(&nodes));
                    ctx.file_map.set(map);
                }
                Err(e) => log::warn!("could not read project files: {}", e),
            }
        });
    }

    /// Visible tree rows for the current snapshot and collapse state.
    pub fn tree_rows(&self) -> Vec<FileTreeNode> {
        self.file_map.with(|map| {
            self.collapsed
                .with(|c| file_tree::reconcile(map, &TreeOptions::default(), c.paths()))
        })
    }

    pub fn toggle_folder(&self, path: &str) {
        self.file_map.with_untracked(|map| {
            self.collapsed.update(|c| {
                c.toggle(path, map);
            })
        });
    }

    pub fn select(&self, path: &str) {
        self.selected.set(Some(path.to_string()));
    }

    /// Delete a tree entry after confirmation, then refresh the snapshot.
    pub fn delete(&self, path: String) {
        let ctx = *self;
        let runtime = self.orchestrator().runtime().clone();
        spawn_local(async move {
            let mut map = ctx.file_map.get_untracked();
            match workspace::delete_entry(&*runtime, &mut map, &path, dom::confirm).await {
                Ok(DeleteOutcome::Removed { paths }) => {
                    ctx.collapsed.update(|c| c.forget(&paths));
                    if ctx
                        .selected
                        .get_untracked()
                        .is_some_and(|selected| paths.contains(&selected))
                    {
                        ctx.selected.set(None);
                    }
                    ctx.file_map.set(map);
                    ctx.refresh_files();
                }
                Ok(DeleteOutcome::Cancelled) => {}
                Err(e) => ctx.push_toast(Toast::error(e.to_string())),
            }
        });
    }

    // ========================================================================
    // Toasts and terminals
    // ========================================================================

    /// Show a toast and dismiss it after `TOAST_DURATION_MS`.
    pub fn push_toast(&self, toast: Toast) {
        let id = toast.id;
        let toasts = self.toasts;
        toasts.update(|t| t.push(toast));
        Timeout::new(TOAST_DURATION_MS, move || {
            toasts.update(|t| t.retain(|toast| toast.id != id));
        })
        .forget();
    }

    pub fn dismiss_toast(&self, id: usize) {
        self.toasts.update(|t| t.retain(|toast| toast.id != id));
    }

    pub fn add_terminal(&self) {
        if self.terminals.with(|t| t.len()) >= MAX_TERMINALS {
            return;
        }
        let id = self.next_terminal.get_untracked();
        self.next_terminal.set(id + 1);
        self.terminals.update(|t| t.push(id));
    }

    /// Close a terminal view. The last one stays open.
    pub fn close_terminal(&self, id: usize) {
        self.terminals.update(|t| {
            if t.len() > 1 {
                t.retain(|open| *open != id);
            }
        });
    }
}

impl Default for AppContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Root application component with error boundary.
///
/// This component:
/// - Creates and provides the global AppContext
/// - Wraps the app in an ErrorBoundary for graceful error handling
/// - Renders the Workbench
#[component]
pub fn App() -> impl IntoView {
    let ctx = AppContext::new();
    provide_context(ctx);

    view! {
        <ErrorBoundary
            fallback=|errors| view! {
                <div style="
                    display: flex;
                    flex-direction: column;
                    align-items: center;
                    justify-content: center;
                    height: 100vh;
                    padding: 2rem;
                    background: #0d1117;
                    color: #e0e0e0;
                    font-family: 'JetBrains Mono', monospace;
                ">
                    <h1 style="color: #ff6b6b; margin-bottom: 1rem;">
                        "Something went wrong"
                    </h1>
                    <ul style="color: #ff6b6b; font-size: 0.9rem;">
                        {move || errors.get()
                            .into_iter()
                            .map(|(_, e)| view! { <li>{e.to_string()}</li> })
                            .collect::<Vec<_>>()
                        }
                    </ul>
                    <button
                        on:click=move |_| {
                            if let Some(window) = web_sys::window() {
                                let _ = window.location().reload();
                            }
                        }
                        style="
                            background: #4a90e2;
                            color: white;
                            border: none;
                            padding: 0.75rem 2rem;
                            border-radius: 4px;
                            cursor: pointer;
                        "
                    >
                        "Reload Page"
                    </button>
                </div>
            }
        >
            <Workbench />
        </ErrorBoundary>
    }
}
