//! A concrete [`Client`] implementation for ringdb
use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{event, Level};

use crate::cluster::node::NodeAddress;
use crate::cmd::{
    self,
    cluster::{ring_state::RingStateResponse, TopologyResponse},
    delete::DeleteResponse,
    get::GetResponse,
    ping::PingResponse,
    set::SetResponse,
};
use crate::server::message::{IntoMessage, Message};

use super::error::{Error, Result};
use super::Client;

/// DbClient handle
pub struct DbClient {
    /// state stores the [`DbClientState`] of this implementation
    state: DbClientState,
}

/// A [`DbClient`] can either be Connected or Disconnected
enum DbClientState {
    Disconnected { addr: String },
    Connected { connection: TcpStream },
}

impl DbClient {
    pub fn new(addr: String) -> Self {
        Self {
            state: DbClientState::Disconnected { addr },
        }
    }

    fn get_conn_mut(&mut self) -> Result<&mut TcpStream> {
        match &mut self.state {
            DbClientState::Connected { connection } => Ok(connection),
            DbClientState::Disconnected { .. } => Err(Error::Logic {
                reason: "You must call `connect` before any other method for DbClient".to_string(),
            }),
        }
    }

    /// Sends `cmd` and waits for its response on the same connection.
    ///
    /// The response payload is the json encoding of `Result<T, crate::error::Error>`. Server side
    /// errors become [`Error::Server`].
    async fn request<C: IntoMessage, T: DeserializeOwned>(&mut self, cmd: C) -> Result<T> {
        let request = Message::from(cmd);
        let cmd_id = request.cmd_id;
        let serialized = request.serialize();

        let conn = self.get_conn_mut()?;
        conn.write_all(&serialized).await?;

        let response = Message::try_from_async_read(conn).await?;
        if response.cmd_id != cmd_id {
            return Err(Error::InvalidServerResponse {
                reason: format!(
                    "Expected response for command {} but got {}",
                    cmd_id, response.cmd_id
                ),
            });
        }

        let payload = response.payload.ok_or(Error::InvalidServerResponse {
            reason: "Response without payload".to_string(),
        })?;

        match serde_json::from_slice::<std::result::Result<T, crate::error::Error>>(&payload)? {
            Ok(response) => Ok(response),
            Err(err) => {
                event!(Level::DEBUG, "Server answered with error: {}", err);
                Err(Error::Server(err))
            }
        }
    }
}

#[async_trait]
impl Client for DbClient {
    async fn connect(&mut self) -> Result<()> {
        match &self.state {
            DbClientState::Disconnected { addr } => {
                let connection =
                    TcpStream::connect(addr)
                        .await
                        .map_err(|e| Error::UnableToConnect {
                            reason: e.to_string(),
                        })?;
                self.state = DbClientState::Connected { connection };
            }
            DbClientState::Connected { .. } => {
                return Err(Error::Logic {
                    reason: "called `connect` twice on a DbClient".to_string(),
                });
            }
        }

        Ok(())
    }

    async fn ping(&mut self) -> Result<PingResponse> {
        self.request(cmd::ping::Ping).await
    }

    async fn get(&mut self, key: Bytes, forwarded: bool) -> Result<GetResponse> {
        self.request(cmd::get::Get::new(key, forwarded)).await
    }

    async fn set(&mut self, key: Bytes, value: Bytes, forwarded: bool) -> Result<SetResponse> {
        self.request(cmd::set::Set::new(key, value, forwarded))
            .await
    }

    async fn delete(&mut self, key: Bytes, forwarded: bool) -> Result<DeleteResponse> {
        self.request(cmd::delete::Delete::new(key, forwarded))
            .await
    }

    async fn ring_state(&mut self, include_ranges: bool) -> Result<RingStateResponse> {
        self.request(cmd::cluster::ring_state::RingState::new(include_ranges))
            .await
    }

    async fn add_node(&mut self, addr: NodeAddress) -> Result<TopologyResponse> {
        self.request(cmd::cluster::add_node::AddNode::new(addr))
            .await
    }

    async fn remove_node(&mut self, addr: NodeAddress) -> Result<TopologyResponse> {
        self.request(cmd::cluster::remove_node::RemoveNode::new(addr))
            .await
    }

    async fn replace_topology(&mut self, nodes: Vec<NodeAddress>) -> Result<TopologyResponse> {
        self.request(cmd::cluster::replace_topology::ReplaceTopology::new(nodes))
            .await
    }
}
