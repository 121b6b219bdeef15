//! The request path of a ringdb process.
//!
//! A [`Dispatcher`] takes a data [`Operation`], asks its [`KeyRouter`] who owns the key exactly once and then
//! either executes the operation against the local [`crate::storage_engine::StorageEngine`] or forwards it to the owner
//! through a [`PeerClient`]. Whatever the owner answers is relayed back unchanged.
//!
//! The routing decision is never re-evaluated for the same request. A node that receives a forwarded
//! operation serves it locally (see [`Dispatcher::serve_forwarded`]) even if its own ring disagrees, which is what
//! keeps two nodes with different views of the topology from bouncing a request between them.
use std::sync::Arc;

use bytes::Bytes;
use strum_macros::EnumDiscriminants;
use tracing::{event, instrument, Level};

use crate::{
    client::PeerClient,
    cluster::{
        node::NodeAddress,
        routing::{KeyRouter, RoutingDecision},
    },
    error::{Error, Result},
    storage_engine::SyncStorageEngine,
};

/// A data operation, as received from a client or from a peer
#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(name(OperationKind), derive(strum_macros::Display))]
pub enum Operation {
    Get { key: Bytes },
    Set { key: Bytes, value: Bytes },
    Delete { key: Bytes },
}

impl Operation {
    pub fn key(&self) -> &Bytes {
        match self {
            Operation::Get { key } | Operation::Set { key, .. } | Operation::Delete { key } => key,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.into()
    }
}

/// The result of a completed [`Operation`]. Absence of a key is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Found(Bytes),
    NotFound,
    Stored,
    /// whether the key existed and was removed
    Deleted(bool),
}

/// Where a request is going to be executed. Fixed once computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Local,
    Remote(NodeAddress),
}

impl From<RoutingDecision> for Route {
    fn from(decision: RoutingDecision) -> Self {
        if decision.is_local {
            Route::Local
        } else {
            Route::Remote(decision.owner)
        }
    }
}

#[derive(Debug)]
pub struct Dispatcher {
    router: Arc<dyn KeyRouter>,
    /// `None` for processes that own no data (coordinators)
    storage: Option<SyncStorageEngine>,
    peer_client: Arc<dyn PeerClient>,
}

impl Dispatcher {
    pub fn new(
        router: Arc<dyn KeyRouter>,
        storage: Option<SyncStorageEngine>,
        peer_client: Arc<dyn PeerClient>,
    ) -> Self {
        Self {
            router,
            storage,
            peer_client,
        }
    }

    pub fn router(&self) -> &Arc<dyn KeyRouter> {
        &self.router
    }

    /// Routes `operation` once and executes it where it belongs
    #[instrument(name = "dispatcher::dispatch", level = "info", skip(self, operation), fields(kind = %operation.kind()))]
    pub async fn dispatch(&self, operation: Operation) -> Result<Outcome> {
        let route: Route = self.router.route(operation.key())?.into();
        event!(Level::DEBUG, "route for key {:?}: {:?}", operation.key(), route);

        match route {
            Route::Local => self.execute_local(operation).await,
            Route::Remote(owner) => self.peer_client.forward(&owner, operation).await,
        }
    }

    /// Executes an operation forwarded by a peer. The sender already routed it, so it is served locally
    /// regardless of what this node's topology says.
    #[instrument(name = "dispatcher::serve_forwarded", level = "info", skip(self, operation), fields(kind = %operation.kind()))]
    pub async fn serve_forwarded(&self, operation: Operation) -> Result<Outcome> {
        match self.router.route(operation.key()) {
            Ok(decision) if !decision.is_local => {
                event!(
                    Level::WARN,
                    "StaleOwnership: forwarded key {:?} is owned by {} according to {}. Serving it locally",
                    operation.key(),
                    decision.owner,
                    self.router.identity().addr()
                );
            }
            Err(err) => {
                event!(
                    Level::WARN,
                    "StaleOwnership: unable to resolve owner of forwarded key {:?}: {}. Serving it locally",
                    operation.key(),
                    err
                );
            }
            Ok(_) => {}
        }

        self.execute_local(operation).await
    }

    #[instrument(level = "debug", skip(self, operation))]
    async fn execute_local(&self, operation: Operation) -> Result<Outcome> {
        let storage = self.storage.as_ref().ok_or_else(|| Error::Configuration {
            reason: format!(
                "{} owns no local storage but was selected to serve a request",
                self.router.identity().addr()
            ),
        })?;

        match operation {
            Operation::Get { key } => Ok(match storage.get(&key).await? {
                Some(value) => Outcome::Found(value),
                None => Outcome::NotFound,
            }),
            Operation::Set { key, value } => {
                storage.put(key, value).await?;
                Ok(Outcome::Stored)
            }
            Operation::Delete { key } => Ok(Outcome::Deleted(storage.delete(&key).await?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bytes::Bytes;

    use super::{Dispatcher, Operation, OperationKind, Outcome};
    use crate::{
        client::mock::MockPeerClient,
        cluster::{
            node::{NodeAddress, NodeIdentity},
            partitioning::{consistent_hashing::HashRing, modulo::ModuloPartitioning},
            routing::{KeyRouter, RingRoutingService, ShardRegistry},
        },
        storage_engine::{in_memory::InMemory, StorageEngine},
        test_utils::fault::Fault,
    };

    const SELF_ADDR: &str = "127.0.0.1:7001";
    const PEER_ADDR: &str = "127.0.0.1:7002";

    fn addrs(v: &[&str]) -> Vec<NodeAddress> {
        v.iter().map(|addr| NodeAddress::from(*addr)).collect()
    }

    struct Fixture {
        dispatcher: Dispatcher,
        storage: InMemory,
        peers: MockPeerClient,
    }

    fn fixture(peers: &[&str]) -> Fixture {
        let identity = NodeIdentity::new(SELF_ADDR).unwrap();
        let router = RingRoutingService::new(HashRing::default(), addrs(peers), identity);
        router.initialize().unwrap();

        let storage = InMemory::default();
        let peer_client = MockPeerClient::default();
        let dispatcher = Dispatcher::new(
            Arc::new(router),
            Some(Arc::new(storage.clone())),
            Arc::new(peer_client.clone()),
        );

        Fixture {
            dispatcher,
            storage,
            peers: peer_client,
        }
    }

    /// finds a key owned by `owner`
    fn key_owned_by(dispatcher: &Dispatcher, owner: &str) -> Bytes {
        (0..)
            .map(|i| Bytes::from(format!("key-{}", i)))
            .find(|key| dispatcher.router().owner_of(key).unwrap() == NodeAddress::from(owner))
            .unwrap()
    }

    #[test]
    fn operation_kind_is_printable() {
        let op = Operation::Delete {
            key: Bytes::from("foo"),
        };
        assert_eq!(op.kind(), OperationKind::Delete);
        assert_eq!(op.kind().to_string(), "Delete");
    }

    #[tokio::test]
    async fn local_operations_hit_local_storage() {
        let f = fixture(&[SELF_ADDR]);
        let key = Bytes::from("foo");

        assert_eq!(
            f.dispatcher
                .dispatch(Operation::Get { key: key.clone() })
                .await
                .unwrap(),
            Outcome::NotFound
        );
        assert_eq!(
            f.dispatcher
                .dispatch(Operation::Set {
                    key: key.clone(),
                    value: Bytes::from("bar")
                })
                .await
                .unwrap(),
            Outcome::Stored
        );
        assert_eq!(
            f.storage.get(&key).await.unwrap(),
            Some(Bytes::from("bar"))
        );
        assert_eq!(
            f.dispatcher
                .dispatch(Operation::Get { key: key.clone() })
                .await
                .unwrap(),
            Outcome::Found(Bytes::from("bar"))
        );
        assert_eq!(
            f.dispatcher
                .dispatch(Operation::Delete { key: key.clone() })
                .await
                .unwrap(),
            Outcome::Deleted(true)
        );
        assert_eq!(
            f.dispatcher
                .dispatch(Operation::Delete { key })
                .await
                .unwrap(),
            Outcome::Deleted(false)
        );
        assert_eq!(f.peers.stats().n_calls, 0);
    }

    #[tokio::test]
    async fn remote_operations_are_forwarded_to_the_owner() {
        let f = fixture(&[SELF_ADDR, PEER_ADDR]);
        let key = key_owned_by(&f.dispatcher, PEER_ADDR);

        let outcome = f
            .dispatcher
            .dispatch(Operation::Set {
                key: key.clone(),
                value: Bytes::from("bar"),
            })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Stored);

        // nothing written locally, everything on the peer
        assert_eq!(f.storage.get(&key).await.unwrap(), None);
        let peer_storage = f.peers.peer_storage(&NodeAddress::from(PEER_ADDR));
        assert_eq!(
            peer_storage.get(&key).await.unwrap(),
            Some(Bytes::from("bar"))
        );

        let outcome = f
            .dispatcher
            .dispatch(Operation::Get { key: key.clone() })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Found(Bytes::from("bar")));

        let stats = f.peers.stats();
        assert_eq!(stats.n_calls, 2);
        assert!(stats
            .targets
            .iter()
            .all(|target| *target == NodeAddress::from(PEER_ADDR)));
    }

    #[tokio::test]
    async fn unreachable_owner_is_not_a_miss() {
        let f = fixture(&[SELF_ADDR, PEER_ADDR]);
        f.peers
            .set_fault(&NodeAddress::from(PEER_ADDR), Fault::always());
        let key = key_owned_by(&f.dispatcher, PEER_ADDR);

        let err = f
            .dispatcher
            .dispatch(Operation::Get { key })
            .await
            .err()
            .unwrap();
        assert!(err.is_peer_unavailable());
    }

    #[tokio::test]
    async fn empty_topology_is_a_configuration_error() {
        let f = fixture(&[]);
        let err = f
            .dispatcher
            .dispatch(Operation::Get {
                key: Bytes::from("foo"),
            })
            .await
            .err()
            .unwrap();
        assert!(err.is_configuration());
        assert_eq!(f.peers.stats().n_calls, 0);
    }

    #[tokio::test]
    async fn forwarded_operations_are_served_locally_even_if_stale() {
        let f = fixture(&[SELF_ADDR, PEER_ADDR]);
        let key = key_owned_by(&f.dispatcher, PEER_ADDR);

        let outcome = f
            .dispatcher
            .serve_forwarded(Operation::Set {
                key: key.clone(),
                value: Bytes::from("bar"),
            })
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Stored);
        assert_eq!(
            f.storage.get(&key).await.unwrap(),
            Some(Bytes::from("bar"))
        );
        assert_eq!(f.peers.stats().n_calls, 0);
    }

    #[tokio::test]
    async fn coordinator_always_forwards() {
        let identity = NodeIdentity::new("127.0.0.1:7000").unwrap();
        let registry = ShardRegistry::new(
            ModuloPartitioning::default(),
            addrs(&[SELF_ADDR, PEER_ADDR]),
            identity,
        );
        registry.initialize().unwrap();
        let peers = MockPeerClient::default();
        let dispatcher = Dispatcher::new(Arc::new(registry), None, Arc::new(peers.clone()));

        for i in 0..20 {
            let key = Bytes::from(format!("user:{}", i));
            let owner = dispatcher.router().owner_of(&key).unwrap();
            dispatcher
                .dispatch(Operation::Set {
                    key: key.clone(),
                    value: Bytes::from("v"),
                })
                .await
                .unwrap();
            assert_eq!(
                peers.peer_storage(&owner).get(&key).await.unwrap(),
                Some(Bytes::from("v"))
            );
        }
        assert_eq!(peers.stats().n_calls, 20);

        // a coordinator has nothing to serve from
        let err = dispatcher
            .serve_forwarded(Operation::Get {
                key: Bytes::from("foo"),
            })
            .await
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }
}
