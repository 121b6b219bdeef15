//! Module that contains different partitioning schemes
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::Result;
use super::node::NodeAddress;

pub mod consistent_hashing;
pub mod modulo;

/// This trait defines a PartitioningScheme (ie: how keys are split amongst cluster nodes)
///
/// Implementations are plain single-owner data structures. They are never shared directly:
/// [`crate::cluster::routing::RoutingService`] is the only owner and takes care of synchronization.
///
/// Note that changing the set of nodes only changes ownership. Entries already stored on a node
/// are not moved anywhere.
pub trait PartitioningScheme: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// adds a new node. Returns false if the node was already present
    fn add_node(&mut self, node: NodeAddress) -> bool;

    /// removes a node. Returns false if the node was not present
    fn remove_node(&mut self, node: &NodeAddress) -> bool;

    /// returns the owner of a given key
    ///
    /// # Errors
    /// [`super::error::Error::NoOwner`] if there are no nodes at all
    fn key_owner(&self, key: &[u8]) -> Result<NodeAddress>;

    /// the current set of nodes, sorted
    fn nodes(&self) -> Vec<NodeAddress>;

    /// drops every node
    fn clear(&mut self);

    /// read-only statistics. Ranges are only computed when asked for since they can be large
    fn snapshot(&self, include_ranges: bool) -> RingSnapshot;

    /// clears the scheme and adds the given nodes in order
    fn initialize(&mut self, nodes: Vec<NodeAddress>) {
        self.clear();
        for node in nodes {
            self.add_node(node);
        }
    }
}

/// Introspection view of a partitioning scheme. Only used for monitoring, never for routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingSnapshot {
    pub total_nodes: usize,
    pub total_virtual_nodes: usize,
    pub virtual_nodes_per_node: usize,
    /// how many points of the hash space each node holds
    pub distribution: BTreeMap<NodeAddress, usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranges: Option<BTreeMap<NodeAddress, Vec<HashRange>>>,
}

/// A contiguous arc of the hash ring, inclusive on both ends. `start > end` means the arc wraps
/// through zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashRange {
    pub start: u64,
    pub end: u64,
    /// the virtual node point closing this arc (always equal to `end`)
    pub hash: u64,
    /// number of hash values in the arc. u128 since a single point owns all 2^64 values
    pub size: u128,
    pub start_degrees: f64,
    pub end_degrees: f64,
    pub size_degrees: f64,
}

const HASH_SPACE: f64 = 18_446_744_073_709_551_616.0; // 2^64

fn to_degrees(v: f64) -> f64 {
    (v / HASH_SPACE * 360.0 * 100.0).round() / 100.0
}

impl HashRange {
    /// Builds the arc `(previous, point]`. `previous == point` means the point is alone on the ring.
    pub fn closing_at(previous: u64, point: u64) -> Self {
        let start = previous.wrapping_add(1);
        let size = if previous == point {
            1u128 << 64
        } else {
            point.wrapping_sub(previous) as u128
        };

        Self {
            start,
            end: point,
            hash: point,
            size,
            start_degrees: to_degrees(start as f64),
            end_degrees: to_degrees(point as f64),
            size_degrees: to_degrees(size as f64),
        }
    }
}
