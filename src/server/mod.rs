//! This file contains the TCP listener implementation
//!  - It accepts tcp connections
//!  - tries to parse a [`Message`] out of the connection
//!  - tries to construct a [`Command`] out of the parsed Message
//!  - executes the command
//!  - writes the response back to the client
//!
//! Clients and peers talk to the same listener. A peer forwarding a request is just a client that
//! sets the `forwarded` flag on the command.
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tracing::{event, instrument, Level};

use crate::client::peer::TcpPeerClient;
use crate::cluster::{
    node::{NodeAddress, NodeIdentity},
    partitioning::{consistent_hashing::HashRing, modulo::ModuloPartitioning},
    routing::{KeyRouter, RingRoutingService, ShardRegistry},
};
use crate::cmd::Command;
use crate::dispatcher::Dispatcher;
use crate::error::Error;
use crate::storage_engine::{in_memory::InMemory, SyncStorageEngine};

use self::config::{Config, CoordinatorConfig, NodeConfig, PartitioningScheme, Role, StorageEngine};
use self::message::Message;

pub mod config;
pub mod message;

tokio::task_local! {
    /// Id of the request being served by the current task. Propagated on forwards so that a
    /// single request can be followed across nodes
    pub static REQUEST_ID: String;
}

pub struct Server {
    client_listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    pub async fn from_config(path: PathBuf) -> anyhow::Result<Self> {
        let c = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&c)?;

        Self::new(config).await
    }

    pub async fn new(config: Config) -> anyhow::Result<Self> {
        match config.role {
            Role::Node(node_config) => Self::new_node(node_config).await,
            Role::Coordinator(coordinator_config) => {
                Self::new_coordinator(coordinator_config).await
            }
        }
    }

    async fn new_node(config: NodeConfig) -> anyhow::Result<Self> {
        let NodeConfig {
            port,
            bind_host,
            self_addr,
            storage_engine,
            partitioning_scheme,
            peers,
            peer_client,
        } = config;

        let identity = NodeIdentity::new(self_addr)?;
        let storage_engine: SyncStorageEngine = match storage_engine {
            StorageEngine::InMemory => Arc::new(InMemory::default()),
        };

        let router: Arc<dyn KeyRouter> = match partitioning_scheme {
            PartitioningScheme::ConsistentHashing {
                virtual_nodes_per_node,
            } => {
                if virtual_nodes_per_node == 0 {
                    return Err(Error::Configuration {
                        reason: "virtual_nodes_per_node must be greater than 0".to_string(),
                    }
                    .into());
                }
                let router = RingRoutingService::new(
                    HashRing::new(virtual_nodes_per_node),
                    peers,
                    identity,
                );
                router.initialize()?;
                Arc::new(router)
            }
            PartitioningScheme::Modulo => {
                let router = ShardRegistry::new(ModuloPartitioning::default(), peers, identity);
                router.initialize()?;
                Arc::new(router)
            }
        };

        let client_listener = TcpListener::bind(format!("{}:{}", bind_host, port)).await?;
        let dispatcher = Dispatcher::new(
            router,
            Some(storage_engine),
            Arc::new(TcpPeerClient::new((&peer_client).into())),
        );

        Ok(Self {
            client_listener,
            dispatcher: Arc::new(dispatcher),
        })
    }

    async fn new_coordinator(config: CoordinatorConfig) -> anyhow::Result<Self> {
        let CoordinatorConfig {
            port,
            bind_host,
            self_addr,
            shards,
            peer_client,
        } = config;

        let identity = NodeIdentity::new(self_addr)?;
        if shards.contains(identity.addr()) {
            return Err(Error::Configuration {
                reason: format!(
                    "coordinator {} can't be one of its own shards {:?}",
                    identity.addr(),
                    shards
                ),
            }
            .into());
        }

        let router = ShardRegistry::new(ModuloPartitioning::default(), shards, identity);
        router.initialize()?;

        let client_listener = TcpListener::bind(format!("{}:{}", bind_host, port)).await?;
        let dispatcher = Dispatcher::new(
            Arc::new(router),
            None,
            Arc::new(TcpPeerClient::new((&peer_client).into())),
        );

        Ok(Self {
            client_listener,
            dispatcher: Arc::new(dispatcher),
        })
    }

    pub fn client_listener_local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.client_listener.local_addr()?)
    }

    pub fn self_addr(&self) -> &NodeAddress {
        self.dispatcher.router().identity().addr()
    }

    /// Accepts connections until `shutdown` resolves. Every connection is served by its own task
    pub async fn run(&mut self, shutdown: impl Future) -> anyhow::Result<()> {
        event!(
            Level::INFO,
            "Listener started on {:?} as {}",
            self.client_listener.local_addr(),
            self.self_addr()
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accepted = self.client_listener.accept() => {
                    match accepted {
                        Ok((tcp_stream, _)) => {
                            let dispatcher = self.dispatcher.clone();
                            tokio::spawn(handle_connection(tcp_stream, dispatcher));
                        }
                        Err(err) => {
                            event!(Level::WARN, "Unable to accept connection: {}", err);
                        }
                    }
                }
                _ = &mut shutdown => {
                    event!(Level::INFO, "Shutting down listener");
                    return Ok(());
                }
            }
        }
    }
}

#[instrument(level = "debug", skip(dispatcher))]
async fn handle_connection(
    mut tcp_stream: TcpStream,
    dispatcher: Arc<Dispatcher>,
) -> anyhow::Result<()> {
    loop {
        let cmd_id = match tcp_stream.read_u8().await {
            Ok(cmd_id) => cmd_id,
            Err(err) => {
                event!(Level::DEBUG, "Connection closed: {}", err);
                return Ok(());
            }
        };

        let message = match Message::try_from_async_read_with_cmd_id(cmd_id, &mut tcp_stream).await
        {
            Ok(message) => message,
            Err(Error::Io { reason }) => {
                event!(Level::DEBUG, "Connection closed: {}", reason);
                return Ok(());
            }
            Err(err) => {
                // the stream can't be trusted to be aligned on a frame boundary anymore.
                // Answer with the error and close
                event!(Level::WARN, "Dropping connection after malformed message: {}", err);
                let response = Message::response::<()>(cmd_id, &Err(err));
                tcp_stream.write_all(&response.serialize()).await?;
                return Ok(());
            }
        };

        let request_id = message.request_id.clone();
        let dispatcher = dispatcher.clone();
        let response = REQUEST_ID
            .scope(request_id, async move {
                match Command::try_from_message(message) {
                    Ok(cmd) => cmd.execute(dispatcher).await,
                    Err(err) => Message::response::<()>(cmd_id, &Err(err)),
                }
            })
            .await;

        tcp_stream.write_all(&response.serialize()).await?;
    }
}
