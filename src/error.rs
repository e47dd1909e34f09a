//! Central error types for the replay compositor.
//!
//! Only loading boundaries (event logs, configuration, custom cursor images)
//! and the preview CLI produce errors. The per-frame render path absorbs bad
//! input instead of failing. All errors implement `Serialize` so the host UI
//! can receive them over IPC.

use serde::Serialize;
use thiserror::Error;

/// Main error type for replay compositor operations.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Reading or writing a file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decoding/encoding failed
    #[error("Image error: {0}")]
    Image(String),

    /// Base64 payload could not be decoded
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Cursor sprite could not be rasterised
    #[error("Sprite error: {0}")]
    Sprite(String),

    /// Configuration rejected
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Render loop task failed or was aborted
    #[error("Render loop error: {0}")]
    RenderLoop(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Serialize as the error message string for the host UI.
impl Serialize for ReplayError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<image::ImageError> for ReplayError {
    fn from(err: image::ImageError) -> Self {
        ReplayError::Image(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ReplayError {
    fn from(err: tokio::task::JoinError) -> Self {
        ReplayError::RenderLoop(err.to_string())
    }
}

impl From<String> for ReplayError {
    fn from(msg: String) -> Self {
        ReplayError::Other(msg)
    }
}

impl From<&str> for ReplayError {
    fn from(msg: &str) -> Self {
        ReplayError::Other(msg.to_string())
    }
}

/// Extension trait for adding context to Results.
///
/// # Example
/// ```ignore
/// use crate::error::{ResultExt, ReplayResult};
///
/// fn load(path: &Path) -> ReplayResult<String> {
///     std::fs::read_to_string(path).context("failed to read event log")
/// }
/// ```
pub trait ResultExt<T> {
    /// Add context to an error, converting it to ReplayError::Other.
    fn context(self, msg: &str) -> ReplayResult<T>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F: FnOnce() -> String>(self, f: F) -> ReplayResult<T>;
}

impl<T, E: std::fmt::Display> ResultExt<T> for Result<T, E> {
    fn context(self, msg: &str) -> ReplayResult<T> {
        self.map_err(|e| ReplayError::Other(format!("{}: {}", msg, e)))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> ReplayResult<T> {
        self.map_err(|e| ReplayError::Other(format!("{}: {}", f(), e)))
    }
}

/// Extension trait for adding context to Option types.
pub trait OptionExt<T> {
    /// Convert None to ReplayError::Other with the given message.
    fn context(self, msg: &str) -> ReplayResult<T>;

    /// Convert None to ReplayError::Other with a lazily evaluated message.
    fn with_context<F: FnOnce() -> String>(self, f: F) -> ReplayResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn context(self, msg: &str) -> ReplayResult<T> {
        self.ok_or_else(|| ReplayError::Other(msg.to_string()))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> ReplayResult<T> {
        self.ok_or_else(|| ReplayError::Other(f()))
    }
}

/// Type alias for Results using ReplayError.
pub type ReplayResult<T> = Result<T, ReplayError>;
