//! Module that contains all commands implemented by ringdb.
//!
//! # Design principals
//! Commands have 2 responsibilities:
//!  1. Parse request params (basically serde_json calls)
//!  2. Construct responses that are sent back to callers
//!
//! Everything else should be delegated to the [`crate::dispatcher`] and [`crate::cluster`] modules.
pub mod cluster;
pub mod delete;
pub mod get;
pub mod ping;
pub mod set;

use std::sync::Arc;

use cluster::add_node::AddNode as AddNodeCommand;
use cluster::remove_node::RemoveNode as RemoveNodeCommand;
use cluster::replace_topology::ReplaceTopology as ReplaceTopologyCommand;
use cluster::ring_state::RingState as RingStateCommand;
use delete::Delete as DeleteCommand;
use get::Get as GetCommand;
use ping::Ping as PingCommand;
use set::Set as SetCommand;
use strum_macros::{Display, FromRepr};
use tracing::{event, instrument, Level};

use crate::{
    dispatcher::Dispatcher,
    error::{Error, InvalidRequest, Result},
    server::message::Message,
};

/// Command ids used to figure out the layout of the payload to be parsed from a [`Message`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum CommandId {
    Ping = 1,
    Get = 2,
    Set = 3,
    Delete = 4,
    RingState = 100,
    AddNode = 101,
    RemoveNode = 102,
    ReplaceTopology = 103,
}

impl TryFrom<u8> for CommandId {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        CommandId::from_repr(id).ok_or(Error::InvalidRequest(InvalidRequest::UnrecognizedCommand {
            id,
        }))
    }
}

/// Command definition - this enum contains all commands implemented by ringdb.
///
/// Data commands go through the [`Dispatcher`]. Cluster commands only touch the topology of the node receiving them.
#[derive(Debug)]
pub enum Command {
    Ping(PingCommand),
    Get(GetCommand),
    Set(SetCommand),
    Delete(DeleteCommand),
    RingState(RingStateCommand),
    AddNode(AddNodeCommand),
    RemoveNode(RemoveNodeCommand),
    ReplaceTopology(ReplaceTopologyCommand),
}

/// macro that tries to construct a specific [`Command`] from a [`Message`]
macro_rules! try_from_message_with_payload {
    ($message:expr, $t:ident) => {{
        (|| {
            if $message.cmd_id != $t::cmd_id() as u8 {
                return Err(Error::InvalidRequest(
                    InvalidRequest::UnableToConstructCommandFromMessage {
                        expected_id: $t::cmd_id() as u8,
                        got: $message.cmd_id,
                    },
                ));
            }

            if let Some(payload) = $message.payload {
                let s: $t = serde_json::from_slice(&payload).map_err(|e| {
                    Error::InvalidRequest(InvalidRequest::InvalidJsonPayload(e.to_string()))
                })?;
                Ok(s)
            } else {
                return Err(Error::InvalidRequest(InvalidRequest::EmptyMessagePayload));
            }
        })()
    }};
}

impl Command {
    pub fn cmd_id(&self) -> CommandId {
        match self {
            Command::Ping(_) => CommandId::Ping,
            Command::Get(_) => CommandId::Get,
            Command::Set(_) => CommandId::Set,
            Command::Delete(_) => CommandId::Delete,
            Command::RingState(_) => CommandId::RingState,
            Command::AddNode(_) => CommandId::AddNode,
            Command::RemoveNode(_) => CommandId::RemoveNode,
            Command::ReplaceTopology(_) => CommandId::ReplaceTopology,
        }
    }

    /// Executes a given command and builds the response [`Message`] for it
    #[instrument(name = "cmd::execute", level = "info", skip(dispatcher))]
    pub async fn execute(self, dispatcher: Arc<Dispatcher>) -> Message {
        let cmd_id = self.cmd_id() as u8;
        match self {
            Command::Ping(cmd) => Message::response(cmd_id, &Ok(cmd.execute())),
            Command::Get(cmd) => Message::response(cmd_id, &cmd.execute(&dispatcher).await),
            Command::Set(cmd) => Message::response(cmd_id, &cmd.execute(&dispatcher).await),
            Command::Delete(cmd) => Message::response(cmd_id, &cmd.execute(&dispatcher).await),
            Command::RingState(cmd) => Message::response(cmd_id, &cmd.execute(&dispatcher)),
            Command::AddNode(cmd) => Message::response(cmd_id, &cmd.execute(&dispatcher)),
            Command::RemoveNode(cmd) => Message::response(cmd_id, &cmd.execute(&dispatcher)),
            Command::ReplaceTopology(cmd) => {
                Message::response(cmd_id, &cmd.execute(&dispatcher))
            }
        }
    }

    /// Tries to construct a [`Command`] from the provided [`Message`]
    ///
    /// # Errors
    /// returns an error if the payload doesn't conform with the specified [`Command`]
    #[instrument(level = "info")]
    pub fn try_from_message(message: Message) -> Result<Command> {
        let cmd_id = match CommandId::try_from(message.cmd_id) {
            Ok(cmd_id) => cmd_id,
            Err(err) => {
                event!(Level::WARN, "Unrecognized command: {}", message.cmd_id);
                return Err(err);
            }
        };

        match cmd_id {
            CommandId::Ping => Ok(Command::Ping(PingCommand)),
            CommandId::Get => Ok(Command::Get(try_from_message_with_payload!(
                message, GetCommand
            )?)),
            CommandId::Set => Ok(Command::Set(try_from_message_with_payload!(
                message, SetCommand
            )?)),
            CommandId::Delete => Ok(Command::Delete(try_from_message_with_payload!(
                message,
                DeleteCommand
            )?)),
            CommandId::RingState => Ok(Command::RingState(try_from_message_with_payload!(
                message,
                RingStateCommand
            )?)),
            CommandId::AddNode => Ok(Command::AddNode(try_from_message_with_payload!(
                message,
                AddNodeCommand
            )?)),
            CommandId::RemoveNode => Ok(Command::RemoveNode(try_from_message_with_payload!(
                message,
                RemoveNodeCommand
            )?)),
            CommandId::ReplaceTopology => Ok(Command::ReplaceTopology(
                try_from_message_with_payload!(message, ReplaceTopologyCommand)?,
            )),
        }
    }
}

/// Builds the error returned when the [`Dispatcher`] hands back an [`crate::dispatcher::Outcome`] that doesn't
/// belong to the operation that was sent
pub(crate) fn unexpected_outcome(outcome: crate::dispatcher::Outcome) -> Error {
    Error::Internal(crate::error::Internal::Logic {
        reason: format!("Unexpected outcome {:?}", outcome),
    })
}
