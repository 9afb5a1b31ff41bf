#![cfg(feature = "std")]

use crate::protocol::{Message, MoveAuthority, PROTOCOL_VERSION};
use crate::transport::Transport;

/// Serves a [`MoveAuthority`] over a transport: one response per request,
/// echoing its sequence number. Runs until the peer goes away.
pub struct AuthoritySkeleton<A: MoveAuthority, T: Transport> {
    authority: A,
    transport: T,
}

impl<A: MoveAuthority, T: Transport> AuthoritySkeleton<A, T> {
    pub fn new(authority: A, transport: T) -> Self {
        Self {
            authority,
            transport,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        while let Ok(msg) = self.transport.recv().await {
            let seq = msg.seq();
            if msg.version() != PROTOCOL_VERSION {
                log::warn!(
                    "[AuthoritySkeleton] Protocol version mismatch: expected {}, got {} (seq: {})",
                    PROTOCOL_VERSION,
                    msg.version(),
                    seq
                );
                self.transport
                    .send(error_resp(seq, "unsupported protocol version".into()))
                    .await?;
                continue;
            }
            let reply = self.serve(msg).await;
            self.transport.send(reply).await?;
        }
        Ok(())
    }

    async fn serve(&self, msg: Message) -> Message {
        let seq = msg.seq();
        let result = match msg {
            Message::NewGame { request, .. } => self
                .authority
                .new_game(request)
                .await
                .map(|state| Message::StateResp { version: PROTOCOL_VERSION, seq, state }),
            Message::SubmitMove { game_id, from, to, .. } => self
                .authority
                .submit_move(&game_id, from, to)
                .await
                .map(|outcome| Message::MoveResp { version: PROTOCOL_VERSION, seq, outcome }),
            Message::FetchState { game_id, .. } => self
                .authority
                .fetch_state(&game_id)
                .await
                .map(|state| Message::StateResp { version: PROTOCOL_VERSION, seq, state }),
            Message::LegalMovesFor { game_id, square, .. } => self
                .authority
                .legal_moves_for(&game_id, square)
                .await
                .map(|squares| Message::SquaresResp { version: PROTOCOL_VERSION, seq, squares }),
            Message::Undo { game_id, .. } => self
                .authority
                .undo(&game_id)
                .await
                .map(|outcome| Message::MoveResp { version: PROTOCOL_VERSION, seq, outcome }),
            other => {
                log::warn!("[AuthoritySkeleton] Ignoring non-request frame: {:?}", other);
                Err(anyhow::anyhow!("expected a request"))
            }
        };
        result.unwrap_or_else(|e| error_resp(seq, e.to_string()))
    }
}

fn error_resp(seq: u64, reason: String) -> Message {
    Message::ErrorResp {
        version: PROTOCOL_VERSION,
        seq,
        reason,
    }
}
