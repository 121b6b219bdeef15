//! Administrative commands. They act on the topology of the node receiving them and are never forwarded.
use serde::{Deserialize, Serialize};

use crate::cluster::node::NodeAddress;

pub mod add_node;
pub mod remove_node;
pub mod replace_topology;
pub mod ring_state;

/// Response shared by every command that mutates the topology: the resulting node list, sorted
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopologyResponse {
    pub nodes: Vec<NodeAddress>,
}
