//! [`Runtime`] backed by the StackBlitz WebContainer API.
//!
//! The page loads `@webcontainer/api` and exposes the `WebContainer` class on
//! `window` (see `index.html`). Booting is lazy: the first runtime call boots
//! the container, concurrent callers share that boot, and a failed boot is
//! forgotten so the next call tries again.

use std::cell::RefCell;
use std::collections::BTreeMap;

use futures::future::{FutureExt, LocalBoxFuture, Shared};
use js_sys::{Array, Object, Promise, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::ReadableStreamDefaultReader;

use crate::core::{OutputPipe, Process, Runtime, RuntimeError};
use crate::models::{DirEntry, MountNode, MountTree};

// =============================================================================
// Bindings
// =============================================================================

#[wasm_bindgen]
extern "C" {
    #[derive(Clone)]
    type WebContainer;

    #[wasm_bindgen(static_method_of = WebContainer, catch)]
    fn boot() -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn fs(this: &WebContainer) -> ContainerFs;

    #[wasm_bindgen(method, catch)]
    fn mount(this: &WebContainer, tree: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn spawn(this: &WebContainer, command: &str, args: &Array) -> Result<Promise, JsValue>;

    type ContainerFs;

    #[wasm_bindgen(method, catch, js_name = readFile)]
    fn read_file(this: &ContainerFs, path: &str) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn readdir(this: &ContainerFs, path: &str, options: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn rm(this: &ContainerFs, path: &str, options: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn mkdir(this: &ContainerFs, path: &str, options: &JsValue) -> Result<Promise, JsValue>;

    type ContainerProcess;

    #[wasm_bindgen(method, getter)]
    fn output(this: &ContainerProcess) -> web_sys::ReadableStream;

    #[wasm_bindgen(method, getter)]
    fn exit(this: &ContainerProcess) -> Promise;

    #[wasm_bindgen(method, js_name = kill)]
    fn kill_process(this: &ContainerProcess);

    type ContainerDirEnt;

    #[wasm_bindgen(method, getter)]
    fn name(this: &ContainerDirEnt) -> String;

    #[wasm_bindgen(method, js_name = isFile)]
    fn is_file(this: &ContainerDirEnt) -> bool;
}

// =============================================================================
// Helpers
// =============================================================================

fn describe(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            Reflect::get(err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", err))
}

fn fs_error(path: &str, err: JsValue) -> RuntimeError {
    let message = describe(&err);
    if message.contains("ENOENT") {
        RuntimeError::NotFound(path.to_string())
    } else {
        RuntimeError::Io(format!("{}: {}", path, message))
    }
}

async fn settle(promise: Result<Promise, JsValue>) -> Result<JsValue, JsValue> {
    JsFuture::from(promise?).await
}

fn options(pairs: &[(&str, bool)]) -> Result<JsValue, RuntimeError> {
    let obj = Object::new();
    for (key, value) in pairs {
        Reflect::set(&obj, &JsValue::from_str(key), &JsValue::from_bool(*value))
            .map_err(|e| RuntimeError::Io(describe(&e)))?;
    }
    Ok(obj.into())
}

/// Convert to the `{ name: { file: { contents } } | { directory: {...} } }`
/// shape `mount` expects.
fn tree_to_js(children: &BTreeMap<String, MountNode>) -> Result<Object, JsValue> {
    let out = Object::new();
    for (name, node) in children {
        let entry = Object::new();
        match node {
            MountNode::File { contents } => {
                let file = Object::new();
                Reflect::set(
                    &file,
                    &JsValue::from_str("contents"),
                    &Uint8Array::from(contents.as_slice()),
                )?;
                Reflect::set(&entry, &JsValue::from_str("file"), &file)?;
            }
            MountNode::Directory { children } => {
                let dir = tree_to_js(children)?;
                Reflect::set(&entry, &JsValue::from_str("directory"), &dir)?;
            }
        }
        Reflect::set(&out, &JsValue::from_str(name), &entry)?;
    }
    Ok(out)
}

/// Resolves once a process output stream has closed and every chunk has
/// been handed to the pipe.
type Drained = Shared<LocalBoxFuture<'static, ()>>;

/// Forward a process output stream to `output` until it closes.
fn pump_output(stream: web_sys::ReadableStream, output: OutputPipe) -> Drained {
    let reader: ReadableStreamDefaultReader = stream.get_reader().unchecked_into();
    let pump = async move {
        loop {
            let chunk = match JsFuture::from(reader.read()).await {
                Ok(chunk) => chunk,
                Err(e) => {
                    log::warn!("process output stream failed: {}", describe(&e));
                    break;
                }
            };
            let done = Reflect::get(&chunk, &JsValue::from_str("done"))
                .ok()
                .and_then(|d| d.as_bool())
                .unwrap_or(true);
            if done {
                break;
            }
            if let Some(text) = Reflect::get(&chunk, &JsValue::from_str("value"))
                .ok()
                .and_then(|v| v.as_string())
            {
                output(&text);
            }
        }
    }
    .boxed_local()
    .shared();
    spawn_local(pump.clone());
    pump
}

// =============================================================================
// Runtime
// =============================================================================

type BootFuture = Shared<LocalBoxFuture<'static, Result<WebContainer, RuntimeError>>>;

async fn boot_container() -> Result<WebContainer, RuntimeError> {
    log::info!("booting WebContainer");
    let instance = settle(WebContainer::boot())
        .await
        .map_err(|e| RuntimeError::Boot(describe(&e)))?;
    Ok(instance.unchecked_into())
}

#[derive(Default)]
pub struct WebContainerRuntime {
    boot: RefCell<Option<BootFuture>>,
}

impl WebContainerRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    async fn instance(&self) -> Result<WebContainer, RuntimeError> {
        let boot = self
            .boot
            .borrow_mut()
            .get_or_insert_with(|| boot_container().boxed_local().shared())
            .clone();

        let result = boot.clone().await;
        if result.is_err() {
            let mut slot = self.boot.borrow_mut();
            if slot.as_ref().is_some_and(|current| current.ptr_eq(&boot)) {
                *slot = None;
            }
        }
        result
    }
}

pub struct WebContainerProcess {
    handle: ContainerProcess,
    exit: Promise,
    drained: Drained,
}

impl Process for WebContainerProcess {
    async fn exit(&self) -> i32 {
        let code = match JsFuture::from(self.exit.clone()).await {
            Ok(code) => code.as_f64().map(|c| c as i32).unwrap_or(-1),
            Err(e) => {
                log::warn!("process exit failed: {}", describe(&e));
                -1
            }
        };
        // The exit promise can settle before the last chunks are read.
        self.drained.clone().await;
        code
    }

    fn kill(&self) {
        self.handle.kill_process();
    }
}

impl Runtime for WebContainerRuntime {
    type Process = WebContainerProcess;

    async fn mount(&self, tree: &MountTree) -> Result<(), RuntimeError> {
        let container = self.instance().await?;
        let js_tree = tree_to_js(tree.entries()).map_err(|e| RuntimeError::Mount(describe(&e)))?;
        settle(container.mount(&js_tree))
            .await
            .map(|_| ())
            .map_err(|e| RuntimeError::Mount(describe(&e)))
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>, RuntimeError> {
        let container = self.instance().await?;
        let bytes = settle(container.fs().read_file(path))
            .await
            .map_err(|e| fs_error(path, e))?;
        Ok(Uint8Array::new(&bytes).to_vec())
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>, RuntimeError> {
        let container = self.instance().await?;
        let opts = options(&[("withFileTypes", true)])?;
        let listing = settle(container.fs().readdir(path, &opts))
            .await
            .map_err(|e| fs_error(path, e))?;

        Ok(Array::from(&listing)
            .iter()
            .map(|value| {
                let entry: ContainerDirEnt = value.unchecked_into();
                if entry.is_file() {
                    DirEntry::file(entry.name())
                } else {
                    DirEntry::folder(entry.name())
                }
            })
            .collect())
    }

    async fn remove_path(&self, path: &str, recursive: bool) -> Result<(), RuntimeError> {
        let container = self.instance().await?;
        let opts = options(&[("recursive", recursive), ("force", true)])?;
        match settle(container.fs().rm(path, &opts)).await {
            Ok(_) => Ok(()),
            Err(e) => match fs_error(path, e) {
                err if err.is_not_found() => Ok(()),
                err => Err(err),
            },
        }
    }

    async fn make_directory(&self, path: &str, recursive: bool) -> Result<(), RuntimeError> {
        let container = self.instance().await?;
        let opts = options(&[("recursive", recursive)])?;
        match settle(container.fs().mkdir(path, &opts)).await {
            Ok(_) => Ok(()),
            Err(e) if describe(&e).contains("EEXIST") => Ok(()),
            Err(e) => Err(fs_error(path, e)),
        }
    }

    async fn spawn(
        &self,
        command: &str,
        args: &[String],
        output: OutputPipe,
    ) -> Result<WebContainerProcess, RuntimeError> {
        let container = self.instance().await?;
        let js_args: Array = args.iter().map(|a| JsValue::from_str(a)).collect();
        let handle: ContainerProcess = settle(container.spawn(command, &js_args))
            .await
            .map_err(|e| RuntimeError::Spawn {
                command: command.to_string(),
                reason: describe(&e),
            })?
            .unchecked_into();

        let drained = pump_output(handle.output(), output);
        let exit = handle.exit();
        Ok(WebContainerProcess {
            handle,
            exit,
            drained,
        })
    }
}
