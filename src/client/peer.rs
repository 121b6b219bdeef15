//! [`PeerClient`] implementation on top of [`DbClient`].
//!
//! Every forward opens its own connection. Both the connect phase and the request/response
//! exchange are bounded by timeouts so that a stalled peer can't hold the calling task forever.
//! There is no retry: the first failure is reported as [`Error::PeerUnavailable`].
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{event, instrument, Level};

use crate::{
    cluster::node::NodeAddress,
    dispatcher::{Operation, Outcome},
    error::{Error, Result},
};

use super::{db_client::DbClient, error::Error as ClientError, Client, PeerClient};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TcpPeerClient {
    timeouts: Timeouts,
}

impl TcpPeerClient {
    pub fn new(timeouts: Timeouts) -> Self {
        Self { timeouts }
    }

    async fn exchange(
        client: &mut DbClient,
        operation: Operation,
    ) -> std::result::Result<Outcome, ClientError> {
        match operation {
            Operation::Get { key } => client
                .get(key, true)
                .await
                .map(|response| match response.value {
                    Some(value) => Outcome::Found(value),
                    None => Outcome::NotFound,
                }),
            Operation::Set { key, value } => client
                .set(key, value, true)
                .await
                .map(|_| Outcome::Stored),
            Operation::Delete { key } => client
                .delete(key, true)
                .await
                .map(|response| Outcome::Deleted(response.deleted == 1)),
        }
    }
}

#[async_trait]
impl PeerClient for TcpPeerClient {
    #[instrument(name = "peer_client::forward", level = "info", skip(self))]
    async fn forward(&self, addr: &NodeAddress, operation: Operation) -> Result<Outcome> {
        let mut client = DbClient::new(addr.to_string());

        match timeout(self.timeouts.connect, client.connect()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                event!(Level::WARN, "Unable to connect to peer {}: {}", addr, err);
                return Err(Error::peer_unavailable(addr, err.to_string()));
            }
            Err(_) => {
                event!(Level::WARN, "Timed out connecting to peer {}", addr);
                let err = ClientError::Timeout {
                    operation: "connect".to_string(),
                    after_ms: self.timeouts.connect.as_millis() as u64,
                };
                return Err(Error::peer_unavailable(addr, err.to_string()));
            }
        }

        let operation_kind = operation.kind();
        match timeout(self.timeouts.read, Self::exchange(&mut client, operation)).await {
            Ok(Ok(outcome)) => Ok(outcome),
            // the peer processed the request and answered with an error. Relay it unchanged
            Ok(Err(ClientError::Server(err))) => Err(err),
            Ok(Err(err)) => {
                event!(Level::WARN, "Forward to peer {} failed: {}", addr, err);
                Err(Error::peer_unavailable(addr, err.to_string()))
            }
            Err(_) => {
                event!(Level::WARN, "Timed out waiting for peer {}", addr);
                let err = ClientError::Timeout {
                    operation: operation_kind.to_string(),
                    after_ms: self.timeouts.read.as_millis() as u64,
                };
                Err(Error::peer_unavailable(addr, err.to_string()))
            }
        }
    }
}
