//! Mock implementation for [`PeerClient`]
//!
//! Every peer is backed by its own [`InMemory`] storage engine, so tests can assert on where a
//! forwarded write ended up without starting any TCP listener.
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    cluster::node::NodeAddress,
    dispatcher::{Operation, Outcome},
    error::{Error, Result},
    storage_engine::{in_memory::InMemory, StorageEngine},
    test_utils::fault::Fault,
};

use super::PeerClient;

#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub n_calls: usize,
    pub targets: Vec<NodeAddress>,
}

#[derive(Debug, Default)]
struct Inner {
    peers: HashMap<NodeAddress, InMemory>,
    faults: HashMap<NodeAddress, Fault>,
    stats: Stats,
}

#[derive(Debug, Default, Clone)]
pub struct MockPeerClient {
    inner: Arc<Mutex<Inner>>,
}

impl MockPeerClient {
    /// storage of `addr` as seen by forwarded requests. Created on first use
    pub fn peer_storage(&self, addr: &NodeAddress) -> InMemory {
        let mut inner = self.inner.lock().unwrap();
        inner.peers.entry(addr.clone()).or_default().clone()
    }

    pub fn set_fault(&self, addr: &NodeAddress, fault: Fault) {
        self.inner
            .lock()
            .unwrap()
            .faults
            .insert(addr.clone(), fault);
    }

    pub fn stats(&self) -> Stats {
        self.inner.lock().unwrap().stats.clone()
    }
}

#[async_trait]
impl PeerClient for MockPeerClient {
    async fn forward(&self, addr: &NodeAddress, operation: Operation) -> Result<Outcome> {
        let storage = {
            let mut inner = self.inner.lock().unwrap();
            inner.stats.n_calls += 1;
            inner.stats.targets.push(addr.clone());

            if inner
                .faults
                .get(addr)
                .map(|fault| fault.triggers())
                .unwrap_or(false)
            {
                return Err(Error::peer_unavailable(addr, "Mocked error on forward"));
            }

            inner.peers.entry(addr.clone()).or_default().clone()
        };

        match operation {
            Operation::Get { key } => Ok(match storage.get(&key).await? {
                Some(value) => Outcome::Found(value),
                None => Outcome::NotFound,
            }),
            Operation::Set { key, value } => {
                storage.put(key, value).await?;
                Ok(Outcome::Stored)
            }
            Operation::Delete { key } => Ok(Outcome::Deleted(storage.delete(&key).await?)),
        }
    }
}
