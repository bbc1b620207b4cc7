//! Browser-side implementations of the core traits and DOM helpers.
//!
//! Provides:
//! - [`WebContainerRuntime`] - Sandboxed runtime over the WebContainer API
//! - [`HttpTransport`] - Readiness probe transport over the Fetch API
//! - [`BrowserUpload`] - Upload source wrapping a picked `File`
//! - [`logger`] - `log` backend writing to the browser console

pub mod dom;
mod fetch;
pub mod logger;
mod webcontainer;

pub use dom::BrowserUpload;
pub use fetch::HttpTransport;
pub use webcontainer::WebContainerRuntime;
