//! This module contains the definition of a [`Message`] - the smallest unit of parseable bytes built for the ringdb [`crate::server::Server`].
//!
//! When serialized, a [`Message`] looks like the following:
//!
//! [1 byte - cmd_id][4 bytes - request_id len][request_id][4 bytes - length of payload][payload]
//!
//! Requests and responses share the same framing. A response carries the `cmd_id` and `request_id`
//! of the request it answers and its payload is the json encoding of `Result<Response, Error>`.
use std::mem::size_of;

use bytes::{BufMut, Bytes, BytesMut};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{event, instrument, Level};

use crate::{
    cmd::CommandId,
    error::{Error, InvalidRequest, Result},
    utils::generate_random_ascii_string,
};

use super::REQUEST_ID;

/// Kind of arbitrary but let's make sure a single connection can't consume more
/// than 1Mb of memory...
pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;

const REQUEST_ID_LEN: usize = 16;

/// The unit of the protocol built on top of TCP
/// that this server uses.
#[derive(Debug, Clone)]
pub struct Message {
    /// Used as a way of identifying the format of the payload for deserialization.
    /// Kept as the raw byte so that unknown ids can still be answered.
    pub cmd_id: u8,
    /// A unique request identifier - used for request tracing and debugging
    /// Note that this has to be encoded as utf8 otherwise parsing the message will fail
    pub request_id: String,
    /// the Request payload
    pub payload: Option<Bytes>,
}

/// A trait that has to be implemented for any structs/enums that can be transformed into a [`Message`]
pub trait IntoMessage {
    /// Same as [`Message::cmd_id`]
    fn cmd_id(&self) -> CommandId;
    /// Same as [`Message::payload`]
    fn payload(&self) -> Option<Bytes> {
        None
    }
    /// The request id of the request being served by this task, or a new one if this is where
    /// the request starts
    fn request_id(&self) -> String {
        REQUEST_ID
            .try_with(|rid| rid.clone())
            .unwrap_or_else(|_| generate_random_ascii_string(REQUEST_ID_LEN))
    }
}

/// json payload of a command. Commands are plain structs so encoding can't fail in practice,
/// but if it does we log it and send an empty payload rather than taking the process down
pub(crate) fn json_payload<T: Serialize>(value: &T) -> Option<Bytes> {
    match serde_json::to_vec(value) {
        Ok(buf) => Some(Bytes::from(buf)),
        Err(err) => {
            event!(Level::ERROR, "Unable to serialize payload: {}", err);
            None
        }
    }
}

impl Message {
    /// Constructs a new [`Message`] with the given id and payload
    pub fn new(cmd_id: u8, request_id: String, payload: Option<Bytes>) -> Self {
        Self {
            cmd_id,
            request_id,
            payload,
        }
    }

    /// Builds the response to a request with `cmd_id`. The request id is taken from the current task.
    pub fn response<T: Serialize>(cmd_id: u8, result: &Result<T>) -> Self {
        let request_id = REQUEST_ID
            .try_with(|rid| rid.clone())
            .unwrap_or_else(|_| generate_random_ascii_string(REQUEST_ID_LEN));

        Self {
            cmd_id,
            request_id,
            payload: json_payload(result),
        }
    }

    /// This function tries to construct a [`Message`] by reading bytes from the provided [`AsyncRead`] source
    /// # Errors
    /// This functions returns errors in the following cases
    ///  1. The message size is bigger than [`MAX_MESSAGE_SIZE`]
    ///  2. The message is somehow malformed (eg: less bytes were provided than the length received)
    #[instrument(level = "info", skip(reader))]
    pub async fn try_from_async_read<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Self> {
        event!(Level::TRACE, "Will read id");
        let cmd_id = reader.read_u8().await?;

        Self::try_from_async_read_with_cmd_id(cmd_id, reader).await
    }

    /// Same as [`Message::try_from_async_read`] for a caller that already consumed the `cmd_id` byte.
    /// The server reads it first so that a malformed frame can still be answered with the right id
    pub(crate) async fn try_from_async_read_with_cmd_id<R: AsyncRead + Unpin>(
        cmd_id: u8,
        reader: &mut R,
    ) -> Result<Self> {
        event!(Level::TRACE, "Will read request_id_len");
        let request_id_length = reader.read_u32().await?;
        if request_id_length == 0 {
            return Err(Error::InvalidRequest(
                InvalidRequest::MessageReceivedWithoutRequestId,
            ));
        }

        if request_id_length > MAX_MESSAGE_SIZE {
            return Err(Error::InvalidRequest(
                InvalidRequest::MaxMessageSizeExceeded {
                    max: MAX_MESSAGE_SIZE,
                    got: request_id_length,
                },
            ));
        }

        let request_id = {
            let mut buf = vec![0u8; request_id_length as usize];
            event!(
                Level::TRACE,
                "Will read request id of size: {}",
                request_id_length
            );
            reader.read_exact(&mut buf).await?;
            String::from_utf8(buf).map_err(|_| {
                Error::InvalidRequest(InvalidRequest::MessageRequestIdMustBeUtf8Encoded)
            })?
        };

        event!(Level::TRACE, "will read payload length");
        let payload_length = reader.read_u32().await?;

        let payload = if payload_length > 0 {
            if payload_length.saturating_add(request_id_length) > MAX_MESSAGE_SIZE {
                return Err(Error::InvalidRequest(
                    InvalidRequest::MaxMessageSizeExceeded {
                        max: MAX_MESSAGE_SIZE,
                        got: payload_length,
                    },
                ));
            }
            let mut buf = vec![0u8; payload_length as usize];
            event!(Level::TRACE, "Will read payload of len: {}", payload_length);
            reader.read_exact(&mut buf).await?;
            Some(buf.into())
        } else {
            None
        };

        Ok(Self {
            cmd_id,
            request_id,
            payload,
        })
    }

    /// Serializes a [`Message`] struct into it's serialized format (see top level comment for format)
    pub fn serialize(self) -> Bytes {
        let payload_len = self.payload.as_ref().map_or(0, |payload| payload.len());
        let mut buf = BytesMut::with_capacity(
            self.request_id.len() + payload_len + 2 * size_of::<u32>() + size_of::<u8>(),
        );

        event!(Level::TRACE, "Will serialize id: {}", self.cmd_id);
        buf.put_u8(self.cmd_id);
        buf.put_u32(self.request_id.len() as u32);
        buf.put(self.request_id.as_bytes());

        event!(Level::TRACE, "Will serialize payload_len: {}", payload_len);
        buf.put_u32(payload_len as u32);
        if let Some(payload) = self.payload {
            buf.put(payload);
        }

        buf.freeze()
    }
}

impl<M: IntoMessage> From<M> for Message {
    fn from(v: M) -> Self {
        Self {
            cmd_id: v.cmd_id() as u8,
            request_id: v.request_id(),
            payload: v.payload(),
        }
    }
}
