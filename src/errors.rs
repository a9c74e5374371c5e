use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransitError {
    #[error("transit service returned {status} {reason}")]
    Service { status: u16, reason: String },
    #[error("malformed response: {0}")]
    ResponseShape(String),
    #[error("failed to decode plaintext")]
    Decode(#[from] base64::DecodeError),
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TransitError {
    /// The HTTP status code for errors reported by the service itself
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<url::ParseError> for TransitError {
    fn from(e: url::ParseError) -> Self {
        Self::Config(format!("invalid server url: {}", e))
    }
}

/// A connection-level failure raised before any HTTP status was received
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to connect: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else {
            Self::Other(e.to_string())
        }
    }
}

impl From<url::ParseError> for TransportError {
    fn from(e: url::ParseError) -> Self {
        Self::Other(format!("failed to build request url: {}", e))
    }
}
