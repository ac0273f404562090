//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while encoding or decoding wire events.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed event frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),

    #[error("Invalid color literal: {0:?}")]
    InvalidColor(String),
}
