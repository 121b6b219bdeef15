//! DELETE command. Deleting a key that doesn't exist is not an error.
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::dispatcher::{Dispatcher, Operation, Outcome};
use crate::error::Result;
use crate::server::message::{json_payload, IntoMessage};

use super::{unexpected_outcome, CommandId};

#[derive(Debug, Serialize, Deserialize)]
pub struct Delete {
    #[serde(with = "crate::utils::serde_utf8_bytes")]
    key: Bytes,
    #[serde(default)]
    forwarded: bool,
}

impl Delete {
    pub fn new(key: Bytes, forwarded: bool) -> Self {
        Self { key, forwarded }
    }

    pub async fn execute(self, dispatcher: &Dispatcher) -> Result<DeleteResponse> {
        let operation = Operation::Delete { key: self.key };
        let outcome = if self.forwarded {
            dispatcher.serve_forwarded(operation).await?
        } else {
            dispatcher.dispatch(operation).await?
        };

        match outcome {
            Outcome::Deleted(existed) => Ok(DeleteResponse {
                deleted: u8::from(existed),
            }),
            other => Err(unexpected_outcome(other)),
        }
    }

    pub fn cmd_id() -> CommandId {
        CommandId::Delete
    }
}

impl IntoMessage for Delete {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}

/// `deleted` is 1 if the key existed, 0 otherwise
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: u8,
}
