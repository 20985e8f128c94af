//! Outbound messaging.
//!
//! [`Outbound`] is the gateway's raw `send(channel, text)` primitive.
//! Handlers never see it directly; they get a [`Sender`] that is bound to the
//! channel the triggering event came from and can do nothing but send text
//! there.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;

use crate::error::SendResult;
use crate::event::ChannelId;

/// The gateway's send primitive.
#[async_trait]
pub trait Outbound: Send + Sync {
    /// Sends `text` to `channel`.
    async fn send(&self, channel: &ChannelId, text: &str) -> SendResult<()>;
}

/// A boxed outbound trait object.
pub type BoxedOutbound = Arc<dyn Outbound>;

/// Send capability scoped to a single channel.
#[derive(Clone)]
pub struct Sender {
    outbound: BoxedOutbound,
    channel_id: ChannelId,
}

impl Sender {
    /// Binds `outbound` to `channel_id`.
    pub fn new(outbound: BoxedOutbound, channel_id: ChannelId) -> Self {
        Self {
            outbound,
            channel_id,
        }
    }

    /// The channel this sender is bound to.
    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Sends `text` to the bound channel.
    pub async fn send(&self, text: impl AsRef<str>) -> SendResult<()> {
        let text = text.as_ref();
        trace!(channel = %self.channel_id, len = text.len(), "Sending message");
        self.outbound.send(&self.channel_id, text).await
    }
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}
