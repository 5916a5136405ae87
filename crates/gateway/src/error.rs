/// Failure of a single backend exchange.
///
/// Nothing is retried; the caller decides whether the failure blocks, degrades
/// or is merely logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Connection, timeout or body-read failure.
    #[error("request failed: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("server responded {status}: {body}")]
    Status { status: u16, body: String },
    /// The body was not the JSON shape we expected.
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    Url(String),
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}
