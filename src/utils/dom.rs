//! DOM and Web API utility functions.
//!
//! Provides safe, consistent access to browser APIs with proper error handling.

use js_sys::Uint8Array;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, File, HtmlInputElement, Window};

use crate::core::{RuntimeError, UploadSource};

/// Get the browser window object.
#[inline]
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// Ask the user a yes/no question with `window.confirm`.
///
/// Returns `false` when no window is available.
pub fn confirm(message: &str) -> bool {
    window()
        .and_then(|w| w.confirm_with_message(message).ok())
        .unwrap_or(false)
}

/// Take the first file chosen in a file input's `change` event and reset the
/// input so picking the same file again fires another event.
pub fn take_selected_file(event: &Event) -> Option<File> {
    let input = event.target()?.dyn_into::<HtmlInputElement>().ok()?;
    let file = input.files()?.get(0);
    input.set_value("");
    file
}

// =============================================================================
// Upload
// =============================================================================

/// A `File` picked by the user.
pub struct BrowserUpload {
    file: File,
}

impl BrowserUpload {
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl UploadSource for BrowserUpload {
    fn name(&self) -> String {
        self.file.name()
    }

    fn size(&self) -> u64 {
        self.file.size() as u64
    }

    async fn read_bytes(&self) -> Result<Vec<u8>, RuntimeError> {
        let buffer = JsFuture::from(self.file.array_buffer())
            .await
            .map_err(|e| RuntimeError::Io(format!("could not read {}: {:?}", self.file.name(), e)))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}
