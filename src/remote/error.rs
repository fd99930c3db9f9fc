//! Remote document service error types.

/// Errors that can occur when talking to the remote document service.
#[derive(Debug)]
pub enum RemoteError {
    /// The request could not be sent or the response could not be read.
    HttpError(String),
    /// The server answered with a non-success status.
    StatusError(u16),
    /// The server sent a document that is not a valid trip.
    DecodeError(String),
    /// WebSocket connection could not be established.
    ConnectionError(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::HttpError(e) => write!(f, "HTTP error: {}", e),
            RemoteError::StatusError(status) => write!(f, "Server returned status {}", status),
            RemoteError::DecodeError(e) => write!(f, "Invalid trip document: {}", e),
            RemoteError::ConnectionError(e) => write!(f, "Connection error: {}", e),
        }
    }
}

impl std::error::Error for RemoteError {}
