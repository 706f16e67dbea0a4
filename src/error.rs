//! Error Types
//!
//! Structured error kinds for lit, matching the error taxonomy in the
//! design: `ValueError`, `InternalShellError`, `DiscoveryError`, and
//! `Fatal`. `Timeout` is deliberately not a variant here — a timeout is an
//! ordinary test outcome (`ResultCode::Timeout`), not a propagated error.

use thiserror::Error;

/// Top-level error type for lit's core engine.
#[derive(Error, Debug, Clone)]
pub enum LitError {
    /// Malformed boolean expression, directive, or shell literal.
    #[error("{0}")]
    Value(String),

    /// Parse or pre-exec failure inside a command tree.
    #[error("shell parser error on: {0}")]
    InternalShell(String),

    /// Non-fatal discovery problem (missing suite for an input, etc).
    #[error("{0}")]
    Discovery(String),

    /// Unrecoverable configuration problem; exit code 2.
    #[error("{0}")]
    Fatal(String),
}

impl LitError {
    pub fn value(msg: impl Into<String>) -> Self {
        LitError::Value(msg.into())
    }

    pub fn internal_shell(command_line: impl Into<String>) -> Self {
        LitError::InternalShell(command_line.into())
    }

    pub fn discovery(msg: impl Into<String>) -> Self {
        LitError::Discovery(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        LitError::Fatal(msg.into())
    }
}

pub type LitResult<T> = Result<T, LitError>;
