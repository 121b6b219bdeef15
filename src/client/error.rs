use serde::{Deserialize, Serialize};

/// Concrete type for a [`crate::client::Client`]` error
pub type Result<T> = std::result::Result<T, Error>;

/// Enum that represents a [`crate::client::Client`] error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Error {
    /// Variant returned when a client was unable to establish a tcp connection with a ringdb node
    UnableToConnect { reason: String },
    /// The node didn't answer within the configured time
    Timeout { operation: String, after_ms: u64 },
    /// Variant returned if the client was unable to interpret the server response
    InvalidServerResponse { reason: String },
    /// The server processed the request and answered with an error
    Server(crate::error::Error),
    /// Generic IO error (automatically converted from [`std::io::Error`])
    Io { reason: String },
    /// Tells the user of the Client library that it did something wrong (like calling connect twice)
    Logic { reason: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io {
            reason: value.to_string(),
        }
    }
}

/// Errors raised while reading/writing [`crate::server::message::Message`]s on the client side
impl From<crate::error::Error> for Error {
    fn from(value: crate::error::Error) -> Self {
        use crate::error::Error as TopLevelError;
        match value {
            TopLevelError::Io { reason } => Error::Io { reason },
            _ => Self::InvalidServerResponse {
                reason: value.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidServerResponse {
            reason: value.to_string(),
        }
    }
}
