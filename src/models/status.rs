//! Bring-up status shared between the orchestrator and the UI.

use std::fmt;

use crate::core::error::BringUpError;

/// Lifecycle of one import attempt.
///
/// Transitions only move forward (`Idle → Importing → Installing → Starting
/// → Ready`), any stage may fall into `Error`, and only an explicit reset
/// returns to `Idle`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum BringUpState {
    #[default]
    Idle,
    Importing,
    Installing,
    Starting,
    Ready,
    Error(BringUpError),
}

impl BringUpState {
    /// Check whether an attempt is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Importing | Self::Installing | Self::Starting)
    }

    /// `Ready` and `Error` end an attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Error(_))
    }

    /// The failure, if this is the `Error` state.
    pub fn error(&self) -> Option<&BringUpError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }

    /// Coarse status keyword for the status indicator.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Importing => "importing",
            Self::Installing => "installing",
            Self::Starting => "starting",
            Self::Ready => "ready",
            Self::Error(_) => "error",
        }
    }

    /// Human label for the status indicator.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Importing => "Importing project",
            Self::Installing => "Installing dependencies",
            Self::Starting => "Starting application",
            Self::Ready => "Ready",
            Self::Error(_) => "Error",
        }
    }
}

impl fmt::Display for BringUpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(err) => write!(f, "error: {}", err),
            other => f.write_str(other.keyword()),
        }
    }
}
