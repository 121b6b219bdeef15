//! JSON configuration of a ringdb process. A process is either a storage `node` or a `coordinator`.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::peer::Timeouts;
use crate::cluster::{node::NodeAddress, partitioning::consistent_hashing::DEFAULT_VIRTUAL_NODES_PER_NODE};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    #[serde(flatten)]
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Node(NodeConfig),
    Coordinator(CoordinatorConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NodeConfig {
    pub port: u16,
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    /// how this node is named in every peer list. Must match exactly
    pub self_addr: String,
    pub storage_engine: StorageEngine,
    pub partitioning_scheme: PartitioningScheme,
    #[serde(default)]
    pub peers: Vec<NodeAddress>,
    #[serde(default)]
    pub peer_client: PeerClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CoordinatorConfig {
    pub port: u16,
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    pub self_addr: String,
    #[serde(default)]
    pub shards: Vec<NodeAddress>,
    #[serde(default)]
    pub peer_client: PeerClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageEngine {
    InMemory,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PartitioningScheme {
    ConsistentHashing {
        #[serde(default = "default_virtual_nodes_per_node")]
        virtual_nodes_per_node: usize,
    },
    Modulo,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PeerClientConfig {
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

impl Default for PeerClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl From<&PeerClientConfig> for Timeouts {
    fn from(config: &PeerClientConfig) -> Self {
        Timeouts {
            connect: Duration::from_millis(config.connect_timeout_ms),
            read: Duration::from_millis(config.read_timeout_ms),
        }
    }
}

fn default_bind_host() -> String {
    "127.0.0.1".to_string()
}

fn default_virtual_nodes_per_node() -> usize {
    DEFAULT_VIRTUAL_NODES_PER_NODE
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_read_timeout_ms() -> u64 {
    10000
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::cluster::node::NodeAddress;

    use super::{
        Config, CoordinatorConfig, NodeConfig, PartitioningScheme, PeerClientConfig, Role,
        StorageEngine,
    };

    fn read_config(name: &str) -> Config {
        let mut config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        config_path.push("conf");
        config_path.push(name);

        let stringified_json = std::fs::read_to_string(config_path).unwrap();
        serde_json::from_str(&stringified_json).unwrap()
    }

    #[test]
    fn deserialize_node() {
        let config = read_config("node_1.json");

        match config.role {
            Role::Node(NodeConfig {
                port,
                bind_host,
                self_addr,
                storage_engine,
                partitioning_scheme,
                peers,
                peer_client,
            }) => {
                assert_eq!(port, 7001);
                assert_eq!(bind_host, "127.0.0.1");
                assert_eq!(self_addr, "127.0.0.1:7001");
                assert_eq!(storage_engine, StorageEngine::InMemory);
                assert_eq!(
                    partitioning_scheme,
                    PartitioningScheme::ConsistentHashing {
                        virtual_nodes_per_node: 150
                    }
                );
                assert_eq!(
                    peers,
                    vec![
                        NodeAddress::from("127.0.0.1:7001"),
                        NodeAddress::from("127.0.0.1:7002"),
                        NodeAddress::from("127.0.0.1:7003"),
                    ]
                );
                assert_eq!(peer_client, PeerClientConfig::default());
            }
            other => panic!("Unexpected role: {:?}", other),
        }
    }

    #[test]
    fn deserialize_coordinator() {
        let config = read_config("coordinator.json");

        match config.role {
            Role::Coordinator(CoordinatorConfig {
                port,
                self_addr,
                shards,
                ..
            }) => {
                assert_eq!(port, 7000);
                assert_eq!(self_addr, "127.0.0.1:7000");
                assert_eq!(shards.len(), 3);
            }
            other => panic!("Unexpected role: {:?}", other),
        }
    }

    #[test]
    fn defaults_are_applied() {
        let config: Config = serde_json::from_str(
            r#"{"node": {
                "port": 7005,
                "self_addr": "127.0.0.1:7005",
                "storage_engine": "in_memory",
                "partitioning_scheme": {"consistent_hashing": {}}
            }}"#,
        )
        .unwrap();

        match config.role {
            Role::Node(node) => {
                assert_eq!(node.bind_host, "127.0.0.1");
                assert!(node.peers.is_empty());
                assert_eq!(
                    node.partitioning_scheme,
                    PartitioningScheme::ConsistentHashing {
                        virtual_nodes_per_node: 150
                    }
                );
                assert_eq!(node.peer_client.connect_timeout_ms, 5000);
                assert_eq!(node.peer_client.read_timeout_ms, 10000);
            }
            other => panic!("Unexpected role: {:?}", other),
        }
    }

    #[test]
    fn modulo_scheme() {
        let config: Config = serde_json::from_str(
            r#"{"node": {
                "port": 7005,
                "self_addr": "127.0.0.1:7005",
                "storage_engine": "in_memory",
                "partitioning_scheme": "modulo"
            }}"#,
        )
        .unwrap();

        match config.role {
            Role::Node(node) => assert_eq!(node.partitioning_scheme, PartitioningScheme::Modulo),
            other => panic!("Unexpected role: {:?}", other),
        }
    }
}
