use thiserror::Error;

/// Errors raised by the connection manager, its mediator and the engine adapter.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// A session for this remote id is already registered.
    #[error("connection already exists in connection storage (socket id: {0})")]
    DuplicateConnection(String),

    /// No session is registered for this remote id.
    #[error("no connection exists for socket id {0}")]
    NotFound(String),

    /// `connect` was called with neither a data channel nor a media stream.
    #[error("enable either data channel or media stream")]
    InvalidOption,

    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The peer-connection engine rejected an operation.
    #[error("engine error: {0}")]
    Engine(String),

    #[error("signaling channel error: {0}")]
    Signaling(String),

    #[error("malformed signaling payload: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("unknown signaling event {0:?}")]
    UnknownEvent(String),

    #[error("invalid ice server configuration: {0}")]
    Config(String),
}

impl From<webrtc::Error> for ConnectorError {
    fn from(err: webrtc::Error) -> Self {
        ConnectorError::Engine(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConnectorError>;
