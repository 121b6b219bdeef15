//! This trait represents the interface for a storage engine (Key/Value) - the local store of a node.
//! Keys and values are opaque bytes and are not interpreted in any way by StorageEngine implementations
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::{fmt::Debug, sync::Arc};

pub mod in_memory;

/// The storage engine handle shared by every connection of a node
pub type SyncStorageEngine = Arc<dyn StorageEngine + Send + Sync + 'static>;

#[async_trait]
pub trait StorageEngine: Debug {
    /// Returns [`None`] if the key doesn't exist
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>>;
    /// Unconditional upsert - the last write to reach the node wins
    async fn put(&self, key: Bytes, value: Bytes) -> Result<()>;
    /// Returns whether the key existed (and was therefore removed)
    async fn delete(&self, key: &[u8]) -> Result<bool>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Error {
    Logic { reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for Error {}
