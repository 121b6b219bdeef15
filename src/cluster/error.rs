use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Error {
    /// The partitioning scheme has no nodes, so no key has an owner.
    /// This is a configuration problem, never a missing key.
    NoOwner,
    /// The node identity provided at startup is unusable
    InvalidIdentity { reason: String },
    /// A poisoned lock around the routing state
    Internal { reason: String },
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
