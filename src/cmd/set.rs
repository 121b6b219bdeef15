//! SET command. Unconditional upsert on the owner of the key: the last write to reach it wins.
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::dispatcher::{Dispatcher, Operation, Outcome};
use crate::error::Result;
use crate::server::message::{json_payload, IntoMessage};

use super::{unexpected_outcome, CommandId};

#[derive(Debug, Serialize, Deserialize)]
pub struct Set {
    #[serde(with = "crate::utils::serde_utf8_bytes")]
    key: Bytes,
    #[serde(with = "crate::utils::serde_utf8_bytes")]
    value: Bytes,
    #[serde(default)]
    forwarded: bool,
}

impl Set {
    pub fn new(key: Bytes, value: Bytes, forwarded: bool) -> Self {
        Self {
            key,
            value,
            forwarded,
        }
    }

    pub async fn execute(self, dispatcher: &Dispatcher) -> Result<SetResponse> {
        let operation = Operation::Set {
            key: self.key,
            value: self.value,
        };
        let outcome = if self.forwarded {
            dispatcher.serve_forwarded(operation).await?
        } else {
            dispatcher.dispatch(operation).await?
        };

        match outcome {
            Outcome::Stored => Ok(SetResponse {
                message: "Ok".to_string(),
            }),
            other => Err(unexpected_outcome(other)),
        }
    }

    pub fn cmd_id() -> CommandId {
        CommandId::Set
    }
}

impl IntoMessage for Set {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetResponse {
    pub message: String,
}
