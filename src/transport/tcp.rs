#![cfg(feature = "std")]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::protocol::Message;
use crate::transport::Transport;

/// Default timeout for a single send or receive.
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum frame size (10 MB).
const MAX_MESSAGE_SIZE: u32 = 10_000_000;

/// Length-prefixed bincode frames over TCP.
pub struct TcpTransport {
    stream: TcpStream,
    io_timeout: Duration,
    max_message_size: u32,
    shutdown: Arc<AtomicBool>,
    /// Bytes of a frame not yet complete. Survives a cancelled `recv`.
    pending: Vec<u8>,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self::with_limits(stream, DEFAULT_IO_TIMEOUT, MAX_MESSAGE_SIZE)
    }

    pub fn with_limits(stream: TcpStream, io_timeout: Duration, max_message_size: u32) -> Self {
        Self {
            stream,
            io_timeout,
            max_message_size,
            shutdown: Arc::new(AtomicBool::new(false)),
            pending: Vec::new(),
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }

    /// Refuse further traffic on this end.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> anyhow::Result<()> {
        if self.is_shutdown() {
            return Err(anyhow::anyhow!("Transport is shut down"));
        }
        Ok(())
    }

    async fn read_buffered(&mut self) -> anyhow::Result<Message> {
        loop {
            if let Some(msg) = take_frame(&mut self.pending, self.max_message_size)? {
                return Ok(msg);
            }
            let n = self.stream.read_buf(&mut self.pending).await.map_err(io_error)?;
            if n == 0 {
                return Err(anyhow::anyhow!("Connection closed by peer"));
            }
        }
    }
}

fn io_error(e: std::io::Error) -> anyhow::Error {
    match e.kind() {
        std::io::ErrorKind::UnexpectedEof => anyhow::anyhow!("Connection closed by peer"),
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
            anyhow::anyhow!("Connection reset by peer")
        }
        _ => anyhow::anyhow!("I/O error: {}", e),
    }
}

/// Write one frame: 4-byte big-endian length, then the bincode body.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    msg: &Message,
    max_message_size: u32,
) -> anyhow::Result<()> {
    let data = bincode::serialize(msg).map_err(|e| anyhow::anyhow!("Serialization error: {}", e))?;
    if data.len() as u64 > max_message_size as u64 {
        return Err(anyhow::anyhow!(
            "Message too large: {} bytes (max: {})",
            data.len(),
            max_message_size
        ));
    }
    writer
        .write_all(&(data.len() as u32).to_be_bytes())
        .await
        .map_err(io_error)?;
    writer.write_all(&data).await.map_err(io_error)?;
    writer.flush().await.map_err(io_error)
}

fn check_len(len: u32, max_message_size: u32) -> anyhow::Result<()> {
    if len == 0 {
        return Err(anyhow::anyhow!("Invalid message length: 0"));
    }
    if len > max_message_size {
        return Err(anyhow::anyhow!(
            "Message too large: {} bytes (max: {})",
            len,
            max_message_size
        ));
    }
    Ok(())
}

fn decode(body: &[u8]) -> anyhow::Result<Message> {
    bincode::deserialize(body).map_err(|e| anyhow::anyhow!("Deserialization error: {}", e))
}

/// Split one complete frame off the front of `buf`, if one has arrived.
fn take_frame(buf: &mut Vec<u8>, max_message_size: u32) -> anyhow::Result<Option<Message>> {
    let Some(prefix) = buf.get(..4) else {
        return Ok(None);
    };
    let len = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]);
    check_len(len, max_message_size)?;
    let end = 4 + len as usize;
    if buf.len() < end {
        return Ok(None);
    }
    let body: Vec<u8> = buf.drain(..end).skip(4).collect();
    decode(&body).map(Some)
}

/// Read one frame written by [`write_frame`].
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_message_size: u32,
) -> anyhow::Result<Message> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await.map_err(io_error)?;
    let len = u32::from_be_bytes(len_buf);
    check_len(len, max_message_size)?;
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf).await.map_err(io_error)?;
    decode(&buf)
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, msg: Message) -> anyhow::Result<()> {
        self.ensure_open()?;
        timeout(
            self.io_timeout,
            write_frame(&mut self.stream, &msg, self.max_message_size),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Send timeout after {:?}", self.io_timeout))?
    }

    async fn recv(&mut self) -> anyhow::Result<Message> {
        self.ensure_open()?;
        timeout(self.io_timeout, self.read_buffered())
            .await
            .map_err(|_| anyhow::anyhow!("Receive timeout after {:?}", self.io_timeout))?
    }
}
