//! Error types for the viewport renderer
//!
//! Two families of failures exist:
//! - `Error`: general failures returned through `Result` (invalid state,
//!   rejected requests, renderer backend failures).
//! - `DrawRequestError`: recoverable codes returned by the instance manager
//!   when a draw request cannot be queued or looked up. Callers treat these
//!   as "do not draw this request" and carry on with the frame.

use std::fmt;

/// Result type for viewport renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Viewport renderer errors
#[derive(Debug, Clone)]
pub enum Error {
    /// An object was used outside its lifecycle (draw before update, etc.)
    InvalidState(String),

    /// A draw request was rejected by the instance manager
    InvalidRequest(DrawRequestError),

    /// Invalid resource (geometry handle, buffer, cache name, etc.)
    InvalidResource(String),

    /// Renderer backend failure (upload, submit)
    BackendError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::InvalidRequest(code) => write!(f, "Invalid draw request: {}", code),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

/// Recoverable error codes of the instance manager.
///
/// None of these abort the frame. A request that fails to queue, or whose
/// result cannot be fetched, is simply not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawRequestError {
    /// The id was never issued in the current pass (stale, foreign or out of range)
    NoSuchId,
    /// The id is valid but `process_draw_requests` has not run yet
    NotProcessed,
    /// A queue call was made outside `begin_pass` / `end_pass`
    NotInPass,
    /// A queue call was made after the pass was resolved
    AlreadyProcessed,
    /// Per-instance arrays do not match the transform count
    MismatchedInstanceData,
}

impl DrawRequestError {
    /// Short stable name of the code (used in log lines)
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawRequestError::NoSuchId => "no such id",
            DrawRequestError::NotProcessed => "not processed",
            DrawRequestError::NotInPass => "not in pass",
            DrawRequestError::AlreadyProcessed => "already processed",
            DrawRequestError::MismatchedInstanceData => "mismatched instance data",
        }
    }
}

impl fmt::Display for DrawRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::error::Error for DrawRequestError {}

impl From<DrawRequestError> for Error {
    fn from(code: DrawRequestError) -> Self {
        Error::InvalidRequest(code)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
