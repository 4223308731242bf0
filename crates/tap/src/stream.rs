//! Outbound reply stream
//!
//! The router hands each aggregated reply to a [`ReplyStream`] and waits for
//! the send to finish before returning control to the bus. The transport
//! behind it (RPC server stream, channel, stdout) is up to the caller.

use async_trait::async_trait;
use tokio::sync::mpsc;

use logship_protocol::FollowReply;

use crate::error::{Result, TapError};

/// Destination of a follow stream's replies
#[async_trait]
pub trait ReplyStream: Send + Sync {
    /// Send one reply, waiting while the client is not ready
    ///
    /// An error ends the follow stream.
    async fn send(&self, reply: FollowReply) -> Result<()>;
}

/// Bounded channel stream: a full channel blocks the router
#[async_trait]
impl ReplyStream for mpsc::Sender<FollowReply> {
    async fn send(&self, reply: FollowReply) -> Result<()> {
        mpsc::Sender::send(self, reply)
            .await
            .map_err(|_| TapError::Send("reply receiver dropped".into()))
    }
}
