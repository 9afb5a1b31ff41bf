#![cfg(feature = "std")]

use std::sync::atomic::{AtomicU64, Ordering};
use std::vec::Vec;

use tokio::sync::Mutex;

use crate::domain::{GameId, GameState, Square};
use crate::protocol::{Message, MoveAuthority, MoveOutcome, NewGameRequest, PROTOCOL_VERSION};
use crate::transport::Transport;

/// Client-side proxy: implements [`MoveAuthority`] by exchanging frames with
/// a remote [`crate::AuthoritySkeleton`]. Calls are serialized on the transport.
pub struct AuthorityStub<T: Transport> {
    transport: Mutex<T>,
    next_seq: AtomicU64,
}

impl<T: Transport> AuthorityStub<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Mutex::new(transport),
            next_seq: AtomicU64::new(0),
        }
    }

    fn seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Send one request and wait for the response carrying the same sequence
    /// number. Authority-side failures come back as errors. Replies to
    /// earlier calls that were abandoned mid-flight are skipped.
    async fn call(&self, request: Message) -> anyhow::Result<Message> {
        let seq = request.seq();
        let mut transport = self.transport.lock().await;
        transport.send(request).await?;
        let reply = loop {
            let reply = transport.recv().await?;
            if reply.version() != PROTOCOL_VERSION {
                log::warn!(
                    "[AuthorityStub] Protocol version mismatch: expected {}, got {} (seq: {})",
                    PROTOCOL_VERSION,
                    reply.version(),
                    seq
                );
                return Err(anyhow::anyhow!(
                    "Protocol version mismatch: expected {}, got {}",
                    PROTOCOL_VERSION,
                    reply.version()
                ));
            }
            if reply.seq() < seq {
                log::debug!(
                    "[AuthorityStub] Discarding late reply to seq {} while waiting for {}",
                    reply.seq(),
                    seq
                );
                continue;
            }
            if reply.seq() > seq {
                log::warn!(
                    "[AuthorityStub] Sequence mismatch: expected {}, got {}",
                    seq,
                    reply.seq()
                );
                return Err(anyhow::anyhow!(
                    "Sequence mismatch: expected {}, got {}",
                    seq,
                    reply.seq()
                ));
            }
            break reply;
        };
        match reply {
            Message::ErrorResp { reason, .. } => Err(anyhow::anyhow!("Authority error: {}", reason)),
            other => Ok(other),
        }
    }

    async fn call_for_state(&self, request: Message) -> anyhow::Result<GameState> {
        match self.call(request).await? {
            Message::StateResp { state, .. } => Ok(state),
            other => Err(unexpected("StateResp", &other)),
        }
    }

    async fn call_for_outcome(&self, request: Message) -> anyhow::Result<MoveOutcome> {
        match self.call(request).await? {
            Message::MoveResp { outcome, .. } => Ok(outcome),
            other => Err(unexpected("MoveResp", &other)),
        }
    }
}

fn unexpected(expected: &str, got: &Message) -> anyhow::Error {
    log::warn!("[AuthorityStub] Expected {}, got {:?}", expected, got);
    anyhow::anyhow!("Expected {}, got unexpected message", expected)
}

#[async_trait::async_trait]
impl<T: Transport> MoveAuthority for AuthorityStub<T> {
    async fn new_game(&self, request: NewGameRequest) -> anyhow::Result<GameState> {
        self.call_for_state(Message::NewGame {
            version: PROTOCOL_VERSION,
            seq: self.seq(),
            request,
        })
        .await
    }

    async fn submit_move(&self, game_id: &GameId, from: Square, to: Square) -> anyhow::Result<MoveOutcome> {
        self.call_for_outcome(Message::SubmitMove {
            version: PROTOCOL_VERSION,
            seq: self.seq(),
            game_id: game_id.clone(),
            from,
            to,
        })
        .await
    }

    async fn fetch_state(&self, game_id: &GameId) -> anyhow::Result<GameState> {
        self.call_for_state(Message::FetchState {
            version: PROTOCOL_VERSION,
            seq: self.seq(),
            game_id: game_id.clone(),
        })
        .await
    }

    async fn legal_moves_for(&self, game_id: &GameId, square: Square) -> anyhow::Result<Vec<Square>> {
        let reply = self
            .call(Message::LegalMovesFor {
                version: PROTOCOL_VERSION,
                seq: self.seq(),
                game_id: game_id.clone(),
                square,
            })
            .await?;
        match reply {
            Message::SquaresResp { squares, .. } => Ok(squares),
            other => Err(unexpected("SquaresResp", &other)),
        }
    }

    async fn undo(&self, game_id: &GameId) -> anyhow::Result<MoveOutcome> {
        self.call_for_outcome(Message::Undo {
            version: PROTOCOL_VERSION,
            seq: self.seq(),
            game_id: game_id.clone(),
        })
        .await
    }
}
