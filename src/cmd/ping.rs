//! PING command. Answered by the receiving node itself, never routed.
use serde::{Deserialize, Serialize};

use crate::server::message::IntoMessage;

use super::CommandId;

#[derive(Debug)]
pub struct Ping;

impl Ping {
    pub fn execute(self) -> PingResponse {
        PingResponse {
            message: "PONG".to_string(),
        }
    }

    pub fn cmd_id() -> CommandId {
        CommandId::Ping
    }
}

impl IntoMessage for Ping {
    fn cmd_id(&self) -> CommandId {
        Self::cmd_id()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}
