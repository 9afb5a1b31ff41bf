#![cfg(feature = "std")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::protocol::Message;
use crate::transport::Transport;

/// One end of an in-process duplex link. Dropping an end closes the link for
/// the other side once queued frames are drained.
pub struct InMemoryTransport {
    tx: Option<UnboundedSender<Message>>,
    rx: UnboundedReceiver<Message>,
    shutdown: Arc<AtomicBool>,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_b) = unbounded_channel();
        let (tx_b, rx_a) = unbounded_channel();
        (
            Self {
                tx: Some(tx_a),
                rx: rx_a,
                shutdown: Arc::new(AtomicBool::new(false)),
            },
            Self {
                tx: Some(tx_b),
                rx: rx_b,
                shutdown: Arc::new(AtomicBool::new(false)),
            },
        )
    }

    /// Stop sending. The peer sees the link closed after draining.
    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.tx = None;
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Transport is shut down"))?;
        tx.send(msg)
            .map_err(|_| anyhow::anyhow!("Channel closed by peer"))
    }

    async fn recv(&mut self) -> anyhow::Result<Message> {
        self.rx
            .recv()
            .await
            .ok_or_else(|| anyhow::anyhow!("Channel closed"))
    }
}
