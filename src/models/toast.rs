//! Transient user notifications.

use std::sync::atomic::{AtomicUsize, Ordering};

static TOAST_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Severity of a toast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
    Info,
    Warning,
}

/// A notification shown briefly in the corner of the workbench.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub id: usize,
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    fn new(level: ToastLevel, message: impl Into<String>) -> Self {
        Self {
            id: TOAST_COUNTER.fetch_add(1, Ordering::Relaxed),
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(ToastLevel::Warning, message)
    }
}
