//! Typed errors for the REST client.
//!
//! Trait seams (`EntitySearchProvider`, `CommandDispatcher`) speak
//! `anyhow::Result`; these variants let callers that care tell a dead
//! network apart from a server that answered with garbage.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connect, timeout, TLS)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the JSON shape we expected
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Short machine-readable kind, used as the failure kind in the transcript
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Transport(_) => "transport",
            ApiError::Status { .. } => "status",
            ApiError::Decode(_) => "decode",
        }
    }
}
