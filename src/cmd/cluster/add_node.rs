//! ADD_NODE command. Adds a node to the topology of the receiving node only.
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
pub struct AddNode {
    addr: NodeAddress,
}

impl AddNode {
    pub fn new(addr: NodeAddress) -> Self {
        Self { addr }
    }

    #[instrument(name = "cmd::cluster::add_node", level = "info", skip(dispatcher))]
    pub fn execute(self, dispatcher: &Dispatcher) -> Result<TopologyResponse> {
        let router = dispatcher.router();
        router.add_node(self.addr)?;
        Ok(TopologyResponse {
            nodes: router.nodes()?,
        })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::AddNode
    }
}

impl IntoMessage for AddNode {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
