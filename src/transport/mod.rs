#![cfg(feature = "std")]

use crate::protocol::Message;

/// Ordered, reliable delivery of whole protocol frames.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()>;
    async fn recv(&mut self) -> anyhow::Result<Message>;
}

pub mod in_memory;
pub mod tcp;
