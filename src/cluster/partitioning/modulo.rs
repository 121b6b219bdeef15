//! Plain modulo partitioning: `shards[hash(key) % shards.len()]`.
//!
//! This is the degenerate version of [`super::consistent_hashing::HashRing`] (a single point per
//! node and no ring). It is what a coordinator uses to spread keys over a fixed shard list.
//! Any membership change reshuffles the owner of most keys, so the list is expected to stay
//! static for the lifetime of the deployment.
use std::collections::BTreeMap;

use crate::cluster::error::{Error, Result};
use crate::cluster::hashing::{md5_hash, HashFn};
use crate::cluster::node::NodeAddress;

use super::{PartitioningScheme, RingSnapshot};

#[derive(Clone, Debug)]
pub struct ModuloPartitioning {
    /// indexes are 0-based and follow insertion order
    shards: Vec<NodeAddress>,
    hash_fn: HashFn,
}

impl Default for ModuloPartitioning {
    fn default() -> Self {
        Self::new_with_hash_fn(md5_hash)
    }
}

impl ModuloPartitioning {
    pub fn new_with_hash_fn(hash_fn: HashFn) -> Self {
        Self {
            shards: Vec::new(),
            hash_fn,
        }
    }

    /// the shards in the order used for indexing
    pub fn shards(&self) -> &[NodeAddress] {
        &self.shards
    }
}

impl PartitioningScheme for ModuloPartitioning {
    fn add_node(&mut self, node: NodeAddress) -> bool {
        if self.shards.contains(&node) {
            return false;
        }

        self.shards.push(node);
        true
    }

    fn remove_node(&mut self, node: &NodeAddress) -> bool {
        let len_before = self.shards.len();
        self.shards.retain(|shard| shard != node);
        len_before != self.shards.len()
    }

    fn key_owner(&self, key: &[u8]) -> Result<NodeAddress> {
        if self.shards.is_empty() {
            return Err(Error::NoOwner);
        }

        let index = (self.hash_fn)(key) % self.shards.len() as u64;
        Ok(self.shards[index as usize].clone())
    }

    fn nodes(&self) -> Vec<NodeAddress> {
        let mut nodes = self.shards.clone();
        nodes.sort();
        nodes
    }

    fn clear(&mut self) {
        self.shards.clear();
    }

    fn snapshot(&self, _include_ranges: bool) -> RingSnapshot {
        let distribution: BTreeMap<NodeAddress, usize> =
            self.shards.iter().map(|shard| (shard.clone(), 1)).collect();

        RingSnapshot {
            total_nodes: self.shards.len(),
            total_virtual_nodes: self.shards.len(),
            virtual_nodes_per_node: 1,
            distribution,
            ranges: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ModuloPartitioning;
    use crate::cluster::{error::Error, node::NodeAddress, partitioning::PartitioningScheme};

    fn test_hash_fn(key: &[u8]) -> u64 {
        key.iter().map(|b| *b as u64).sum()
    }

    fn shards() -> Vec<NodeAddress> {
        vec![
            NodeAddress::from("127.0.0.1:7001"),
            NodeAddress::from("127.0.0.1:7002"),
            NodeAddress::from("127.0.0.1:7003"),
        ]
    }

    #[test]
    fn owner_is_hash_mod_len() {
        let mut registry = ModuloPartitioning::new_with_hash_fn(test_hash_fn);
        registry.initialize(shards());

        // 'a' = 97 -> 97 % 3 = 1
        assert_eq!(registry.key_owner(b"a").unwrap(), shards()[1]);
        // 'c' = 99 -> 0
        assert_eq!(registry.key_owner(b"c").unwrap(), shards()[0]);
        // 'e' = 101 -> 2
        assert_eq!(registry.key_owner(b"e").unwrap(), shards()[2]);
    }

    #[test]
    fn empty_registry_has_no_owner() {
        let registry = ModuloPartitioning::default();
        assert_eq!(registry.key_owner(b"a").err(), Some(Error::NoOwner));
    }

    #[test]
    fn add_and_remove_are_idempotent() {
        let mut registry = ModuloPartitioning::default();
        assert!(registry.add_node(shards()[0].clone()));
        assert!(!registry.add_node(shards()[0].clone()));
        assert!(registry.remove_node(&shards()[0]));
        assert!(!registry.remove_node(&shards()[0]));
        assert!(registry.shards().is_empty());
    }

    #[test]
    fn deterministic_owner_within_shards() {
        let mut registry = ModuloPartitioning::default();
        registry.initialize(shards());
        let owner = registry.key_owner(b"user:42").unwrap();
        assert!(shards().contains(&owner));
        for _ in 0..1000 {
            assert_eq!(owner, registry.key_owner(b"user:42").unwrap());
        }
    }

    #[test]
    fn snapshot_reports_one_point_per_shard() {
        let mut registry = ModuloPartitioning::default();
        registry.initialize(shards());
        let snapshot = registry.snapshot(true);
        assert_eq!(snapshot.total_nodes, 3);
        assert_eq!(snapshot.total_virtual_nodes, 3);
        assert_eq!(snapshot.virtual_nodes_per_node, 1);
        assert!(snapshot.ranges.is_none());
    }
}
