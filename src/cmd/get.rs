//! GET command. Returns the value stored for a key or `null` if there is none.
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::dispatcher::{Dispatcher, Operation, Outcome};
use crate::error::Result;
use crate::server::message::{json_payload, IntoMessage};

use super::{unexpected_outcome, CommandId};

#[derive(Debug, Serialize, Deserialize)]
pub struct Get {
    #[serde(with = "crate::utils::serde_utf8_bytes")]
    key: Bytes,
    /// set by a node relaying the request to the owner of `key`
    #[serde(default)]
    forwarded: bool,
}

impl Get {
    pub fn new(key: Bytes, forwarded: bool) -> Self {
        Self { key, forwarded }
    }

    pub fn is_forwarded(&self) -> bool {
        self.forwarded
    }

    pub async fn execute(self, dispatcher: &Dispatcher) -> Result<GetResponse> {
        let operation = Operation::Get { key: self.key };
        let outcome = if self.forwarded {
            dispatcher.serve_forwarded(operation).await?
        } else {
            dispatcher.dispatch(operation).await?
        };

        match outcome {
            Outcome::Found(value) => Ok(GetResponse { value: Some(value) }),
            Outcome::NotFound => Ok(GetResponse { value: None }),
            other => Err(unexpected_outcome(other)),
        }
    }

    pub fn cmd_id() -> CommandId {
        CommandId::Get
    }
}

impl IntoMessage for Get {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }

    fn payload(&self) -> Option<Bytes> {
        json_payload(self)
    }
}

/// `value` is `None` when the key doesn't exist
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GetResponse {
    #[serde(with = "crate::utils::serde_option_utf8_bytes")]
    pub value: Option<Bytes>,
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::{Get, GetResponse};

    #[test]
    fn wire_format() {
        let payload = serde_json::to_string(&Get::new(Bytes::from("foo"), true)).unwrap();
        assert_eq!(payload, r#"{"key":"foo","forwarded":true}"#);

        let not_found: GetResponse = serde_json::from_str(r#"{"value":null}"#).unwrap();
        assert_eq!(not_found.value, None);
    }
}
