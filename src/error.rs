//! Error types for mailbox-client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The transport could not be established (network, TLS, timeout).
    #[error("Connection error: {0}")]
    Connection(String),

    /// The server rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Unexpected server response or session state.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("Message not found: UID {0}")]
    MessageNotFound(u32),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this is a credential rejection.
    ///
    /// Presentation layers use this to show an "incorrect credentials"
    /// alert instead of a generic failure.
    #[must_use]
    pub const fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Connection(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
