//! Node addresses and the identity of the running process.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// An opaque address of a reachable node, usually formatted as `<host>:<port>`.
///
/// Addresses are compared byte by byte. No DNS resolution or normalization happens anywhere, so
/// the same node must be spelled the same way in every configuration file of the cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeAddress(String);

impl NodeAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Display for NodeAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeAddress {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}

impl From<String> for NodeAddress {
    fn from(v: String) -> Self {
        Self(v)
    }
}

impl From<NodeAddress> for String {
    fn from(v: NodeAddress) -> Self {
        v.0
    }
}

/// The address this process answers on, resolved once at startup.
///
/// [`NodeIdentity::is`] is the only way routing decides whether a key is local.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    addr: NodeAddress,
}

impl NodeIdentity {
    /// # Errors
    /// Fails if the address is empty or carries leading/trailing whitespace. The address is
    /// rejected rather than trimmed since every peer list must spell it exactly the same way.
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr: String = addr.into();
        if addr.is_empty() {
            return Err(Error::InvalidIdentity {
                reason: "self address can't be empty".to_string(),
            });
        }

        if addr.trim() != addr {
            return Err(Error::InvalidIdentity {
                reason: format!("self address {:?} has surrounding whitespace", addr),
            });
        }

        Ok(Self {
            addr: NodeAddress(addr),
        })
    }

    pub fn addr(&self) -> &NodeAddress {
        &self.addr
    }

    pub fn is(&self, other: &NodeAddress) -> bool {
        self.addr == *other
    }
}
