//! Error types for AI requests.

use thiserror::Error;

/// Errors that can occur while talking to the model service.
#[derive(Error, Debug)]
pub enum AiError {
    /// The service answered HTTP 429; never retried
    #[error("Too many requests, try again later")]
    RateLimited,

    /// The task did not finish within the polling budget
    #[error("AI task timed out after {attempts} polls")]
    Timeout {
        /// Number of status polls made
        attempts: u32,
    },

    /// The service reported the task as failed
    #[error("AI task failed: {0}")]
    TaskFailed(String),

    /// Network or host-level failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request cannot be built from the current state
    #[error("Invalid AI request: {message}")]
    InvalidRequest {
        /// What is missing
        message: String,
    },

    /// Edge stitching needs at least two masks
    #[error("Edge stitching needs at least two masks")]
    NotEnoughMasks,

    /// Response decoded but does not match the request
    #[error("Invalid AI response: {message}")]
    InvalidResponse {
        /// Description of the mismatch
        message: String,
    },
}

impl AiError {
    /// Create a transport error with a message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create an invalid request error with a message.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an invalid response error with a message.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}
