//! RING_STATE command. Read-only view of the receiving node's topology.
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cluster::{node::NodeAddress, partitioning::RingSnapshot, routing::KeyRouter};
use crate::cmd::CommandId;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::server::message::{json_payload, IntoMessage};

#[derive(Debug, Serialize, Deserialize)]
pub struct RingState {
    /// whether to compute the full hash range table
    #[serde(default)]
    include_ranges: bool,
}

impl RingState {
    pub fn new(include_ranges: bool) -> Self {
        Self { include_ranges }
    }

    #[instrument(name = "cmd::cluster::ring_state", level = "info", skip(dispatcher))]
    pub fn execute(self, dispatcher: &Dispatcher) -> Result<RingStateResponse> {
        let router = dispatcher.router();
        // a single read of the topology, so nodes and snapshot always agree
        let snapshot = router.snapshot(self.include_ranges)?;
        Ok(RingStateResponse {
            self_addr: router.identity().addr().clone(),
            nodes: snapshot.distribution.keys().cloned().collect(),
            snapshot,
        })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::RingState
    }
}

impl IntoMessage for RingState {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RingStateResponse {
    pub self_addr: NodeAddress,
    pub nodes: Vec<NodeAddress>,
    pub snapshot: RingSnapshot,
}
