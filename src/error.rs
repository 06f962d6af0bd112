use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    // Transport errors
    #[error("failed to connect to {}: {source}", .path.display())]
    Connect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("endpoint {} did not appear within {waited:?}", .path.display())]
    EndpointTimeout { path: PathBuf, waited: Duration },

    #[error("wait for endpoint cancelled")]
    Cancelled,

    #[error("connection closed before frame was terminated ({buffered} bytes buffered)")]
    ConnectionClosed { buffered: usize },

    #[error("response frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    #[error("no complete response frame within {0:?}")]
    ResponseTimeout(Duration),

    #[error("connection desynchronized: previous request did not complete")]
    Desynchronized,

    #[error("{trailing} unsolicited bytes received after response frame")]
    TrailingData { trailing: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // Server-reported or malformed responses
    #[error("server error: {message}")]
    Protocol { message: String },

    // Encoding errors
    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("non-finite component {value} at position {position}")]
    NonFiniteComponent { position: usize, value: f32 },

    #[error("no index created on this connection")]
    IndexNotCreated,

    #[error("validation error: {0}")]
    Validation(String),

    // Config errors
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Coarse classification of a [`ClientError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The connection failed or can no longer be trusted.
    Transport,
    /// The server answered with an error or a malformed frame.
    Protocol,
    /// The request was rejected before anything was written.
    Encoding,
    Config,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Connect { .. }
            | ClientError::EndpointTimeout { .. }
            | ClientError::Cancelled
            | ClientError::ConnectionClosed { .. }
            | ClientError::FrameTooLarge { .. }
            | ClientError::ResponseTimeout(_)
            | ClientError::Desynchronized
            | ClientError::TrailingData { .. }
            | ClientError::Io(_) => ErrorKind::Transport,

            ClientError::Protocol { .. } => ErrorKind::Protocol,

            ClientError::UnknownMetric(_)
            | ClientError::DimensionMismatch { .. }
            | ClientError::NonFiniteComponent { .. }
            | ClientError::IndexNotCreated
            | ClientError::Validation(_) => ErrorKind::Encoding,

            ClientError::Config(_) => ErrorKind::Config,
        }
    }

    /// Build a protocol error carrying the raw frame text.
    pub(crate) fn protocol(frame: &str) -> Self {
        ClientError::Protocol {
            message: frame.to_string(),
        }
    }

    /// Label used for the outcome dimension of command metrics.
    pub(crate) fn outcome_label(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Transport => "transport_error",
            ErrorKind::Protocol => "protocol_error",
            ErrorKind::Encoding => "encoding_error",
            ErrorKind::Config => "config_error",
        }
    }
}
