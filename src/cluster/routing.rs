//! This file contains the [`RoutingService`] data structure.
//! It owns the [`PartitioningScheme`] of the process together with the node's own identity and
//! answers the two questions every request asks: who owns key K, and is that me?
//!
//! No other component holds the scheme. Everything else talks to it through the [`KeyRouter`]
//! capability, which is what lets a deployment choose between the ring ([`RingRoutingService`])
//! and the plain modulo registry ([`ShardRegistry`]) without the request path knowing which one it got.
//!
//! # Concurrency
//! The current scheme lives behind `RwLock<Arc<S>>`. Readers take the read lock only long enough
//! to clone the [`Arc`] and then work on an immutable scheme. Writers are serialized by a separate
//! mutex, apply their change to a private copy and swap it in. A reader therefore sees either
//! the whole change or none of it, and never waits on a writer for more than the swap.
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use tracing::{event, instrument, Level};

use super::{
    error::{Error, Result},
    node::{NodeAddress, NodeIdentity},
    partitioning::{
        consistent_hashing::HashRing, modulo::ModuloPartitioning, PartitioningScheme,
        RingSnapshot,
    },
};

/// Routing over the consistent hash ring - the default for storage nodes
pub type RingRoutingService = RoutingService<HashRing>;

/// Routing over a fixed shard list - used by coordinators
pub type ShardRegistry = RoutingService<ModuloPartitioning>;

/// Outcome of a single ownership lookup. Computed from the live scheme on every call and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    pub owner: NodeAddress,
    pub is_local: bool,
}

/// The ownership-by-key capability shared by every routing strategy.
pub trait KeyRouter: std::fmt::Debug + Send + Sync {
    /// this process' own identity
    fn identity(&self) -> &NodeIdentity;

    /// # Errors
    /// [`Error::NoOwner`] if there are no nodes to route to
    fn owner_of(&self, key: &[u8]) -> Result<NodeAddress>;

    /// Ownership lookup plus the identity check, from a single read of the topology
    fn route(&self, key: &[u8]) -> Result<RoutingDecision> {
        let owner = self.owner_of(key)?;
        let is_local = self.identity().is(&owner);
        Ok(RoutingDecision { owner, is_local })
    }

    fn is_local(&self, key: &[u8]) -> Result<bool> {
        Ok(self.route(key)?.is_local)
    }

    fn nodes(&self) -> Result<Vec<NodeAddress>>;

    fn add_node(&self, node: NodeAddress) -> Result<()>;

    fn remove_node(&self, node: &NodeAddress) -> Result<()>;

    /// Discards the current topology and rebuilds it from `nodes`
    fn replace_topology(&self, nodes: Vec<NodeAddress>) -> Result<()>;

    fn snapshot(&self, include_ranges: bool) -> Result<RingSnapshot>;
}

#[derive(Debug)]
pub struct RoutingService<S: PartitioningScheme> {
    identity: NodeIdentity,
    initial_nodes: Vec<NodeAddress>,
    /// an empty scheme carrying the configuration (eg: virtual nodes per node) used to rebuild from scratch
    template: S,
    current: RwLock<Arc<S>>,
    writer: Mutex<()>,
}

impl<S: PartitioningScheme> RoutingService<S> {
    /// Builds a service with an empty topology. [`RoutingService::initialize`] has to be called
    /// before routing anything.
    pub fn new(scheme: S, initial_nodes: Vec<NodeAddress>, identity: NodeIdentity) -> Self {
        let mut template = scheme;
        template.clear();

        Self {
            identity,
            initial_nodes,
            current: RwLock::new(Arc::new(template.clone())),
            template,
            writer: Mutex::new(()),
        }
    }

    /// Populates the scheme from the node list given at construction.
    /// An empty list is accepted - every lookup will then fail with [`Error::NoOwner`].
    #[instrument(name = "routing::initialize", level = "info", skip(self))]
    pub fn initialize(&self) -> Result<()> {
        if self.initial_nodes.is_empty() {
            event!(
                Level::WARN,
                "Initializing routing without any nodes. Every request will fail until the topology is repaired"
            );
        } else if !self.initial_nodes.contains(self.identity.addr()) {
            event!(
                Level::WARN,
                "Own address {} is not part of the node list {:?} - no key will ever be served locally",
                self.identity.addr(),
                self.initial_nodes
            );
        }

        self.rebuild(self.initial_nodes.clone())
    }

    fn load(&self) -> Result<Arc<S>> {
        match self.current.read() {
            Ok(guard) => Ok(guard.clone()),
            Err(_) => Err(Error::Internal {
                reason: "Unable to acquire read lock for RoutingService - poisoned...".to_string(),
            }),
        }
    }

    fn store(&self, next: S) -> Result<()> {
        match self.current.write() {
            Ok(mut guard) => {
                *guard = Arc::new(next);
                Ok(())
            }
            Err(_) => Err(Error::Internal {
                reason: "Unable to acquire write lock for RoutingService - poisoned...".to_string(),
            }),
        }
    }

    fn acquire_writer(&self) -> Result<MutexGuard<()>> {
        self.writer.lock().map_err(|_| Error::Internal {
            reason: "Unable to acquire writer lock for RoutingService - poisoned...".to_string(),
        })
    }

    /// applies `f` to a private copy of the current scheme and publishes it if anything changed
    fn mutate<F: FnOnce(&mut S) -> bool>(&self, f: F) -> Result<bool> {
        let _writer = self.acquire_writer()?;
        let mut next = (*self.load()?).clone();
        if !f(&mut next) {
            return Ok(false);
        }

        self.store(next)?;
        Ok(true)
    }

    fn rebuild(&self, nodes: Vec<NodeAddress>) -> Result<()> {
        let _writer = self.acquire_writer()?;
        let mut next = self.template.clone();
        next.initialize(nodes);
        self.store(next)?;
        self.log_stats("Topology rebuilt");
        Ok(())
    }

    fn log_stats(&self, context: &str) {
        match self.load() {
            Ok(scheme) => {
                let snapshot = scheme.snapshot(false);
                event!(
                    Level::INFO,
                    "{}: {} nodes, {} virtual nodes, distribution {:?}",
                    context,
                    snapshot.total_nodes,
                    snapshot.total_virtual_nodes,
                    snapshot.distribution
                );
            }
            Err(err) => event!(Level::WARN, "Unable to log routing stats: {}", err),
        }
    }
}

impl<S: PartitioningScheme> KeyRouter for RoutingService<S> {
    fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    fn owner_of(&self, key: &[u8]) -> Result<NodeAddress> {
        let owner = self.load()?.key_owner(key)?;
        event!(
            Level::DEBUG,
            "Key {:?} routes to node {}",
            String::from_utf8_lossy(key),
            owner
        );
        Ok(owner)
    }

    fn nodes(&self) -> Result<Vec<NodeAddress>> {
        Ok(self.load()?.nodes())
    }

    #[instrument(name = "routing::add_node", level = "info", skip(self))]
    fn add_node(&self, node: NodeAddress) -> Result<()> {
        if self.mutate(|scheme| scheme.add_node(node.clone()))? {
            self.log_stats(&format!("Added node {}", node));
        } else {
            event!(Level::DEBUG, "Node {} already part of the topology", node);
        }
        Ok(())
    }

    #[instrument(name = "routing::remove_node", level = "info", skip(self))]
    fn remove_node(&self, node: &NodeAddress) -> Result<()> {
        if self.mutate(|scheme| scheme.remove_node(node))? {
            self.log_stats(&format!("Removed node {}", node));
        } else {
            event!(Level::DEBUG, "Node {} is not part of the topology", node);
        }
        Ok(())
    }

    #[instrument(name = "routing::replace_topology", level = "info", skip(self))]
    fn replace_topology(&self, nodes: Vec<NodeAddress>) -> Result<()> {
        event!(
            Level::INFO,
            "Replacing topology. Old nodes: {:?}, new nodes: {:?}",
            self.nodes()?,
            nodes
        );
        self.rebuild(nodes)
    }

    fn snapshot(&self, include_ranges: bool) -> Result<RingSnapshot> {
        Ok(self.load()?.snapshot(include_ranges))
    }
}
