/// Error taxonomy for a dispatched exchange.
///
/// `Transport`, `Status` and `Malformed` describe the three ways a request
/// can fail at runtime; `Misconfigured` indicates an internal invariant was
/// violated and always surfaces. Cache IO failures are deliberately absent:
/// caching is best-effort and never breaks the network path.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Connect/IO/TLS failure before any response was received.
    #[error("transport failure: {0}")]
    Transport(String),

    /// A non-2xx HTTP response, surfaced with the raw body so the caller can
    /// render server-provided detail.
    #[error("HTTP status {code}")]
    Status { code: u16, body: String },

    /// The body looked like JSON but failed to parse.
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A core invariant was violated; indicates a bug, never swallowed.
    #[error("misconfigured exchange: {0}")]
    Misconfigured(String),
}

impl Error {
    /// The numeric status for `Status` errors, `None` otherwise.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}
