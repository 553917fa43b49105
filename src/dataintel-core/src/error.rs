use crate::transport::TransportError;

/// Every failure a client operation can surface.
///
/// Variants are raised once and never retried: retries happen inside
/// [`crate::execute_with_retry`], before a response is classified.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP transport failed: {0}")]
    Transport(#[from] TransportError),

    /// Status-level failure that is not a classified API error, e.g. a
    /// login that returned 200 without a token.
    #[error("{message}")]
    HttpStatus { status: u16, message: String },

    #[error("Unauthorized (401): {body}")]
    Unauthorized { body: String },

    #[error("Unexpected status code {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("{0}")]
    NotImplemented(String),

    #[error("Similarity search failed with status code {status}: {text}")]
    SimilaritySearchFailure { status: u16, text: String },

    #[error("Invalid {record} in response: {reason}")]
    InvalidResponse { record: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// HTTP status attached to the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::HttpStatus { status, .. }
            | ClientError::UnexpectedStatus { status, .. }
            | ClientError::SimilaritySearchFailure { status, .. } => Some(*status),
            ClientError::Unauthorized { .. } => Some(401),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
