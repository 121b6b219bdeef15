//! This module defines client/user visible errors that can be returned by ringdb.
//!
//! Errors travel over the wire as part of every response, which is why they are both [`Serialize`]
//! and [`Deserialize`]. Note that a missing key is not an error: it is a regular outcome
//! (see [`crate::dispatcher::Outcome::NotFound`]).
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::cluster::node::NodeAddress;

pub type Result<T> = std::result::Result<T, Error>;

/// Error enum with all possible variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Error {
    /// Routing is impossible with the current configuration (eg: the ring has no nodes).
    /// Fatal for routing until the topology is repaired.
    Configuration { reason: String },
    /// A forward to the owner of the key failed (connect error, timeout or broken exchange)
    PeerUnavailable { addr: String, reason: String },
    InvalidRequest(InvalidRequest),
    Internal(Internal),
    Io { reason: String },
}

impl Error {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration { .. })
    }

    pub fn is_peer_unavailable(&self) -> bool {
        matches!(self, Error::PeerUnavailable { .. })
    }

    pub(crate) fn peer_unavailable(addr: &NodeAddress, reason: impl Into<String>) -> Self {
        Self::PeerUnavailable {
            addr: addr.to_string(),
            reason: reason.into(),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            reason: err.to_string(),
        }
    }
}

impl From<crate::storage_engine::Error> for Error {
    fn from(err: crate::storage_engine::Error) -> Self {
        Self::Internal(Internal::StorageEngine(err))
    }
}

impl From<crate::cluster::error::Error> for Error {
    fn from(err: crate::cluster::error::Error) -> Self {
        use crate::cluster::error::Error as ClusterError;
        match err {
            ClusterError::NoOwner => Self::Configuration {
                reason: "No nodes available to own the key. The topology is empty".to_string(),
            },
            ClusterError::InvalidIdentity { reason } => Self::Configuration { reason },
            ClusterError::Internal { reason } => Self::Internal(Internal::Logic { reason }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Internal {
    Logic { reason: String },
    StorageEngine(crate::storage_engine::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InvalidRequest {
    MaxMessageSizeExceeded { max: u32, got: u32 },
    MessageReceivedWithoutRequestId,
    MessageRequestIdMustBeUtf8Encoded,
    UnableToConstructCommandFromMessage { expected_id: u8, got: u8 },
    InvalidJsonPayload(String),
    EmptyMessagePayload,
    UnrecognizedCommand { id: u8 },
}

#[cfg(test)]
mod tests {
    use super::{Error, Internal};
    use crate::cluster::error::Error as ClusterError;
    use crate::storage_engine::Error as StorageEngineError;

    #[test]
    fn no_owner_is_a_configuration_error() {
        let err: Error = ClusterError::NoOwner.into();
        assert!(err.is_configuration());
        assert!(!err.is_peer_unavailable());
    }

    #[test]
    fn poisoned_routing_lock_is_an_internal_error() {
        let err: Error = ClusterError::Internal {
            reason: "poisoned".to_string(),
        }
        .into();
        match err {
            Error::Internal(Internal::Logic { reason }) => assert_eq!(reason, "poisoned"),
            _ => panic!("Unexpected error: {}", err),
        }
    }

    #[test]
    fn storage_errors_are_internal_errors() {
        let err: Error = StorageEngineError::Logic {
            reason: "poisoned".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            Error::Internal(Internal::StorageEngine(StorageEngineError::Logic { .. }))
        ));
    }

    #[test]
    fn errors_survive_the_wire() {
        let err = Error::PeerUnavailable {
            addr: "127.0.0.1:7002".to_string(),
            reason: "connection refused".to_string(),
        };
        let serialized = serde_json::to_string(&err).unwrap();
        let deserialized: Error = serde_json::from_str(&serialized).unwrap();
        assert!(deserialized.is_peer_unavailable());
    }
}
