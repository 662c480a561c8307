//! Shared error type used across every crate in this workspace.
//!
//! Variants map onto the error taxonomy the runtime reasons about: some are
//! retriable (transient provider failures), some terminate a turn outright,
//! and tool-level validation/not-found errors are meant to be downgraded to
//! a `toolResult{status:"error"}` event rather than aborting the stream.

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A capability port failed. `retriable` distinguishes transient
    /// (rate-limit, timeout, 5xx) from permanent (4xx) provider errors so
    /// callers can decide whether to retry or fail fast.
    #[error("provider {provider}: {message}")]
    Provider {
        provider: String,
        message: String,
        retriable: bool,
    },

    /// A long-running provider operation returned without a terminal state.
    /// Callers should attempt a post-hoc verification before treating this
    /// as a real failure.
    #[error("dangling operation: {0}")]
    Dangling(String),

    #[error("cancelled")]
    Cancelled,

    #[error("config: {0}")]
    Config(String),

    #[error("internal: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Http(_) => true,
            Error::Provider { retriable, .. } => *retriable,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
