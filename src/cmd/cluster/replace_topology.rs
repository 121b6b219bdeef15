//! REPLACE_TOPOLOGY command. Atomically swaps the whole node list of the receiving node.
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
pub struct ReplaceTopology {
    nodes: Vec<NodeAddress>,
}

impl ReplaceTopology {
    pub fn new(nodes: Vec<NodeAddress>) -> Self {
        Self { nodes }
    }

    #[instrument(name = "cmd::cluster::replace_topology", level = "info", skip(dispatcher))]
    pub fn execute(self, dispatcher: &Dispatcher) -> Result<TopologyResponse> {
        let router = dispatcher.router();
        router.replace_topology(self.nodes)?;
        Ok(TopologyResponse {
            nodes: router.nodes()?,
        })
    }

    pub fn cmd_id() -> CommandId {
        CommandId::ReplaceTopology
    }
}

impl IntoMessage for ReplaceTopology {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}
