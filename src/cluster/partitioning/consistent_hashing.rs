//! Consistent-hashing is the default [`PartitioningScheme`] for ringdb
use crate::cluster::error::{Error, Result};
use crate::cluster::hashing::{md5_hash, HashFn, HashValue};
use crate::cluster::node::NodeAddress;
use std::collections::{BTreeMap, BTreeSet};

use super::{HashRange, PartitioningScheme, RingSnapshot};

/// Default amount of points each physical node takes on the ring
pub const DEFAULT_VIRTUAL_NODES_PER_NODE: usize = 150;

/// HashRing decides which storage node owns a specific key. It does it by creating a
/// fixed hash space - in this case [0, 2^64) - and computing the hash of both the storage nodes
/// and the keys being stored. The node that owns the key is the first node whose hash is equal to or
/// higher than the hash of the key.
/// Note that this hash space should be viewed as a circular buffer (or hash ring). Let's
/// try to understand the hash ring statement through an example:
///
/// In this example we have a hash space that goes from 0 to 10 (ie: the hash function returns a number between 0 and 10).
/// Nodes:     ['A', 'B', 'C']
/// Nodes_hash:[ 2 ,  5 ,  8 ]
///
/// key to store: 'foo', hash('foo') = 4 -> owned by node B (hash 5)
/// key to store: 'bar', hash('bar) = 7 -> owned by node C (hash 8)
/// key to store: 'zoo', hash('zoo') = 9 -> owned by node A (hash 2)
///   - this last one shows the circular nature of the Nodes_hash
///
/// A single point per node leaves very uneven arcs, so every physical node is placed
/// `virtual_nodes_per_node` times on the ring, at `hash("<addr>:<i>")` for i in [0, virtual_nodes_per_node).
/// Removal recomputes the same points, so they are never stored separately.
///
/// **The important property of consistent hashing is that if a node is added/removed, only the keys
/// falling on that node's arcs change owner.**
///
/// Two virtual nodes landing on the same point is accepted (the later insert wins) rather than
/// corrected. With a 64 bit space this is extremely unlikely.
#[derive(Clone, Debug)]
pub struct HashRing {
    ring: BTreeMap<HashValue, NodeAddress>,
    nodes: BTreeSet<NodeAddress>,
    virtual_nodes_per_node: usize,
    hash_fn: HashFn,
}

impl Default for HashRing {
    fn default() -> Self {
        Self::new(DEFAULT_VIRTUAL_NODES_PER_NODE)
    }
}

impl HashRing {
    pub fn new(virtual_nodes_per_node: usize) -> Self {
        Self::new_with_hash_fn(virtual_nodes_per_node, md5_hash)
    }

    /// A `virtual_nodes_per_node` of 0 is raised to 1: a node without points would be registered
    /// but never own anything. Configuration rejects 0 before a ring is ever built
    pub fn new_with_hash_fn(virtual_nodes_per_node: usize, hash_fn: HashFn) -> Self {
        Self {
            ring: BTreeMap::new(),
            nodes: BTreeSet::new(),
            virtual_nodes_per_node: virtual_nodes_per_node.max(1),
            hash_fn,
        }
    }

    fn virtual_node_hashes<'a>(
        &'a self,
        node: &'a NodeAddress,
    ) -> impl Iterator<Item = HashValue> + 'a {
        (0..self.virtual_nodes_per_node)
            .map(move |i| (self.hash_fn)(format!("{}:{}", node, i).as_bytes()))
    }

    /// arcs owned by each node. The first point closes the arc wrapping around from the last one
    fn ranges(&self) -> BTreeMap<NodeAddress, Vec<HashRange>> {
        let mut ranges: BTreeMap<NodeAddress, Vec<HashRange>> = self
            .nodes
            .iter()
            .map(|node| (node.clone(), Vec::new()))
            .collect();

        let mut previous = match self.ring.keys().next_back() {
            Some(last) => *last,
            None => return ranges,
        };

        for (point, node) in self.ring.iter() {
            ranges
                .entry(node.clone())
                .or_default()
                .push(HashRange::closing_at(previous, *point));
            previous = *point;
        }

        ranges
    }
}

impl PartitioningScheme for HashRing {
    fn add_node(&mut self, node: NodeAddress) -> bool {
        if self.nodes.contains(&node) {
            return false;
        }

        let points: Vec<HashValue> = self.virtual_node_hashes(&node).collect();
        for point in points {
            self.ring.insert(point, node.clone());
        }
        self.nodes.insert(node);

        true
    }

    fn remove_node(&mut self, node: &NodeAddress) -> bool {
        if !self.nodes.remove(node) {
            return false;
        }

        let points: Vec<HashValue> = self.virtual_node_hashes(node).collect();
        for point in points {
            // on a collision the point may belong to somebody else by now
            if self.ring.get(&point) == Some(node) {
                self.ring.remove(&point);
            }
        }

        true
    }

    fn key_owner(&self, key: &[u8]) -> Result<NodeAddress> {
        let key_hash = (self.hash_fn)(key);
        self.ring
            .range(key_hash..)
            .next()
            .or_else(|| self.ring.iter().next())
            .map(|(_, node)| node.clone())
            .ok_or(Error::NoOwner)
    }

    fn nodes(&self) -> Vec<NodeAddress> {
        self.nodes.iter().cloned().collect()
    }

    fn clear(&mut self) {
        self.ring.clear();
        self.nodes.clear();
    }

    fn snapshot(&self, include_ranges: bool) -> RingSnapshot {
        let mut distribution: BTreeMap<NodeAddress, usize> = self
            .nodes
            .iter()
            .map(|node| (node.clone(), 0))
            .collect();
        for node in self.ring.values() {
            *distribution.entry(node.clone()).or_default() += 1;
        }

        RingSnapshot {
            total_nodes: self.nodes.len(),
            total_virtual_nodes: self.ring.len(),
            virtual_nodes_per_node: self.virtual_nodes_per_node,
            distribution,
            ranges: include_ranges.then(|| self.ranges()),
        }
    }
}
