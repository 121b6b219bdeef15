//! REMOVE_NODE command. Removing a node that isn't part of the topology is a no-op.
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cluster::{node::NodeAddress, routing::KeyRouter};
use crate::cmd::CommandId;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::server::message::{json_payload, IntoMessage};

use super::TopologyResponse;

#[derive(Debug, Serialize, Deserialize)]
pub struct RemoveNode {
    addr: NodeAddress,
}

impl RemoveNode {
    pub fn new(addr: NodeAddress) -> Self {
        Self { addr }
    }

    #[instrument(name = "cmd::cluster::remove_node", level = "info", skip(dispatcher))]
    pub fn execute(self, dispatcher: &Dispatcher) -> Result<TopologyResponse> {
        let router = dispatcher.router();
        router.remove_node(&self.addr)?;
        Ok(TopologyResponse {
            nodes: router.nodes()?,
        })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::RemoveNode
    }
}

impl IntoMessage for RemoveNode {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
