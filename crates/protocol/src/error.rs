use thiserror::Error;

/// Failures a decoder/encoder can raise. Never retried against the same
/// candidate by the executor; a translation failure always fails over.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("target protocol cannot represent this request: {0}")]
    Validation(String),

    #[error("malformed stream event: {0}")]
    InvalidStreamEvent(String),
}

pub type CodecResult<T> = Result<T, CodecError>;
