#![allow(dead_code)]

use std::net::TcpListener as StdTcpListener;

use ringdb::{
    client::{db_client::DbClient, Client},
    cluster::node::NodeAddress,
    server::{
        config::{
            Config, CoordinatorConfig, NodeConfig, PartitioningScheme, PeerClientConfig, Role,
            StorageEngine,
        },
        Server,
    },
};
use tokio::{
    sync::oneshot::{channel, Receiver, Sender},
    task::JoinHandle,
};

async fn shutdown_future(receiver: Receiver<()>) {
    let _ = receiver.await;
}

pub struct ServerHandle {
    task_handle: JoinHandle<()>,
    shutdown: Sender<()>,
    pub addr: NodeAddress,
}

impl ServerHandle {
    pub async fn client(&self) -> DbClient {
        let mut client = DbClient::new(self.addr.to_string());
        client.connect().await.unwrap();
        client
    }

    pub async fn stop(self) {
        drop(self.shutdown);
        self.task_handle.await.unwrap();
    }
}

/// a port nobody listens on at the time of the call
pub fn free_port() -> u16 {
    let listener = StdTcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub fn local_addr(port: u16) -> NodeAddress {
    NodeAddress::from(format!("127.0.0.1:{}", port))
}

pub fn node_config(port: u16, peers: Vec<NodeAddress>, scheme: PartitioningScheme) -> Config {
    Config {
        role: Role::Node(NodeConfig {
            port,
            bind_host: "127.0.0.1".to_string(),
            self_addr: local_addr(port).to_string(),
            storage_engine: StorageEngine::InMemory,
            partitioning_scheme: scheme,
            peers,
            peer_client: PeerClientConfig {
                connect_timeout_ms: 1000,
                read_timeout_ms: 2000,
            },
        }),
    }
}

pub fn coordinator_config(port: u16, shards: Vec<NodeAddress>) -> Config {
    Config {
        role: Role::Coordinator(CoordinatorConfig {
            port,
            bind_host: "127.0.0.1".to_string(),
            self_addr: local_addr(port).to_string(),
            shards,
            peer_client: PeerClientConfig::default(),
        }),
    }
}

pub async fn start_server(config: Config) -> ServerHandle {
    let mut server = Server::new(config)
        .await
        .expect("Unable to construct server from config");
    let addr = server.self_addr().clone();
    let (shutdown_sender, shutdown_receiver) = channel();
    let task_handle = tokio::spawn(async move {
        server
            .run(shutdown_future(shutdown_receiver))
            .await
            .unwrap();
    });

    ServerHandle {
        task_handle,
        shutdown: shutdown_sender,
        addr,
    }
}

/// starts `n` ring nodes that all know about each other
pub async fn start_ring(n: usize) -> Vec<ServerHandle> {
    let ports: Vec<u16> = (0..n).map(|_| free_port()).collect();
    let peers: Vec<NodeAddress> = ports.iter().map(|port| local_addr(*port)).collect();

    let mut handles = Vec::new();
    for port in ports {
        handles.push(
            start_server(node_config(
                port,
                peers.clone(),
                PartitioningScheme::ConsistentHashing {
                    virtual_nodes_per_node: 150,
                },
            ))
            .await,
        );
    }

    handles
}

pub async fn stop_all(handles: Vec<ServerHandle>) {
    for handle in handles {
        handle.stop().await;
    }
}
