//! Module that contains the Client API for all public commands implemented by ringdb,
//! and the [`PeerClient`] capability a node uses to forward requests to the owner of a key.
use crate::{
    cluster::node::NodeAddress,
    cmd::{
        cluster::{ring_state::RingStateResponse, TopologyResponse},
        delete::DeleteResponse,
        get::GetResponse,
        ping::PingResponse,
        set::SetResponse,
    },
    dispatcher::{Operation, Outcome},
};

use async_trait::async_trait;
use bytes::Bytes;
use error::Result;

pub mod db_client;
pub mod error;
#[cfg(test)]
pub mod mock;
pub mod peer;

/// Trait that defines which functions a ringdb client needs to implement
#[async_trait]
pub trait Client {
    /// Starts a TCP connection with a ringdb node
    async fn connect(&mut self) -> Result<()>;
    /// Ping command interface
    async fn ping(&mut self) -> Result<PingResponse>;
    /// Get command interface. `forwarded` is only set by nodes relaying a request to its owner
    async fn get(&mut self, key: Bytes, forwarded: bool) -> Result<GetResponse>;
    /// Set command interface
    async fn set(&mut self, key: Bytes, value: Bytes, forwarded: bool) -> Result<SetResponse>;
    /// Delete command interface
    async fn delete(&mut self, key: Bytes, forwarded: bool) -> Result<DeleteResponse>;
    /// RingState command interface
    async fn ring_state(&mut self, include_ranges: bool) -> Result<RingStateResponse>;
    /// AddNode command interface
    async fn add_node(&mut self, addr: NodeAddress) -> Result<TopologyResponse>;
    /// RemoveNode command interface
    async fn remove_node(&mut self, addr: NodeAddress) -> Result<TopologyResponse>;
    /// ReplaceTopology command interface
    async fn replace_topology(&mut self, nodes: Vec<NodeAddress>) -> Result<TopologyResponse>;
}

/// The capability used by [`crate::dispatcher::Dispatcher`] to execute an [`Operation`] on the node owning its key.
///
/// Implementations must bound the time spent on a single forward and never retry.
/// Any failure to obtain an answer from the peer is reported as
/// [`crate::error::Error::PeerUnavailable`], while errors returned by the peer itself are relayed unchanged.
#[async_trait]
pub trait PeerClient: std::fmt::Debug + Send + Sync {
    async fn forward(
        &self,
        addr: &NodeAddress,
        operation: Operation,
    ) -> crate::error::Result<Outcome>;
}
