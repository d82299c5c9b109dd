//! Per-height attempt state machine.
//!
//! ```text
//! Pending -> Fetching(1) -> Validating -> Persisting -> Succeeded
//!               ^               |            |
//!               |               v            v
//!               +---------- Backoff <--------+---> FailedExhausted
//! ```
//!
//! Any suspension point may also lead to `Aborted` once cancellation is
//! requested. `Succeeded`, `FailedExhausted` and `Aborted` are terminal.

use std::fmt;
use std::path::PathBuf;

use blockdump_fetch::{Payload, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Application,
    Validation,
    Persistence,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Transport => "transport",
            FailureKind::Application => "application",
            FailureKind::Validation => "validation",
            FailureKind::Persistence => "persistence",
        })
    }
}

/// What went wrong on one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind:        FailureKind,
    pub http_status: Option<u16>,
    pub error:       String,
}

impl Failure {
    pub fn transport(error: impl Into<String>) -> Self {
        Self {
            kind:        FailureKind::Transport,
            http_status: None,
            error:       error.into(),
        }
    }

    pub fn application(status: u16, error: impl Into<String>) -> Self {
        Self {
            kind:        FailureKind::Application,
            http_status: Some(status),
            error:       error.into(),
        }
    }

    pub fn validation(status: u16, error: impl fmt::Display) -> Self {
        Self {
            kind:        FailureKind::Validation,
            http_status: Some(status),
            error:       format!("write/validate error: {error}"),
        }
    }

    pub fn persistence(status: u16, error: impl fmt::Display) -> Self {
        Self {
            kind:        FailureKind::Persistence,
            http_status: Some(status),
            error:       format!("write/validate error: {error}"),
        }
    }

    /// Status column text; empty when no response was received.
    pub fn http_status_text(&self) -> String {
        self.http_status.map(|s| s.to_string()).unwrap_or_default()
    }
}

#[derive(Debug)]
pub enum ItemState {
    Pending,
    Fetching { attempt: u32 },
    Validating { attempt: u32, status: u16, payload: Payload },
    Persisting { attempt: u32, status: u16, record: Record },
    Backoff { attempt: u32, failure: Failure },
    Succeeded { tries: u32, http_status: u16, path: PathBuf },
    FailedExhausted { tries: u32, failure: Failure },
    Aborted,
}

impl ItemState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemState::Succeeded { .. } | ItemState::FailedExhausted { .. } | ItemState::Aborted
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ItemState::Pending => "pending",
            ItemState::Fetching { .. } => "fetching",
            ItemState::Validating { .. } => "validating",
            ItemState::Persisting { .. } => "persisting",
            ItemState::Backoff { .. } => "backoff",
            ItemState::Succeeded { .. } => "succeeded",
            ItemState::FailedExhausted { .. } => "failed",
            ItemState::Aborted => "aborted",
        }
    }
}
