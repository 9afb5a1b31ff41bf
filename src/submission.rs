#![cfg(feature = "std")]

use std::future::Future;
use std::sync::Arc;

use tokio::time::{timeout, Duration};

use crate::common::ClientError;
use crate::domain::{GameId, GameState, MoveRef};
use crate::protocol::{MoveAuthority, MoveOutcome};

/// Accepted snapshot, or why the move did not go through.
pub type SubmissionResult = Result<GameState, ClientError>;

/// Admits at most one outstanding move request.
#[derive(Debug)]
pub struct SubmissionChannel {
    pending: Option<MoveRef>,
    request_timeout: Duration,
    issued: u64,
}

impl SubmissionChannel {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            pending: None,
            request_timeout,
            issued: 0,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of requests issued over the channel's lifetime.
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Reserve the channel for `mv` and return the request to run. Refused
    /// locally, with no call made, while another move is in flight.
    pub fn submit(
        &mut self,
        authority: Arc<dyn MoveAuthority>,
        game_id: GameId,
        mv: MoveRef,
    ) -> Result<impl Future<Output = SubmissionResult> + Send + 'static, ClientError> {
        if let Some(inflight) = self.pending {
            log::debug!(
                "Submission {}->{} refused: {}->{} still pending",
                mv.from,
                mv.to,
                inflight.from,
                inflight.to
            );
            return Err(ClientError::LocalValidation("a move is already in flight"));
        }
        self.pending = Some(mv);
        self.issued += 1;
        Ok(send_move(authority, game_id, mv, self.request_timeout))
    }

    /// Release the channel once the request has resolved either way.
    pub fn complete(&mut self) -> Option<MoveRef> {
        self.pending.take()
    }
}

/// Issue the request, folding every failure into the client taxonomy.
pub async fn send_move(
    authority: Arc<dyn MoveAuthority>,
    game_id: GameId,
    mv: MoveRef,
    request_timeout: Duration,
) -> SubmissionResult {
    log::info!("Submitting move {} -> {} in game {}", mv.from, mv.to, game_id);
    match timeout(request_timeout, authority.submit_move(&game_id, mv.from, mv.to)).await {
        Ok(Ok(MoveOutcome::Accepted(state))) => Ok(state),
        Ok(Ok(MoveOutcome::Rejected { reason })) => {
            log::info!("Move {} -> {} rejected: {}", mv.from, mv.to, reason);
            Err(ClientError::RemoteRejection(reason))
        }
        Ok(Err(e)) => {
            log::warn!("Move {} -> {} failed: {}", mv.from, mv.to, e);
            Err(ClientError::TransportFailure(e.to_string()))
        }
        Err(_) => {
            log::warn!("Move {} -> {} timed out after {:?}", mv.from, mv.to, request_timeout);
            Err(ClientError::TransportFailure(format!(
                "no response after {:?}",
                request_timeout
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Side, Square};
    use crate::protocol::NewGameRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted {
        outcome: fn() -> anyhow::Result<MoveOutcome>,
        delay: Duration,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MoveAuthority for Scripted {
        async fn new_game(&self, _request: NewGameRequest) -> anyhow::Result<GameState> {
            unimplemented!()
        }
        async fn submit_move(&self, _game_id: &GameId, _from: Square, _to: Square) -> anyhow::Result<MoveOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            (self.outcome)()
        }
        async fn fetch_state(&self, _game_id: &GameId) -> anyhow::Result<GameState> {
            unimplemented!()
        }
        async fn legal_moves_for(&self, _game_id: &GameId, _square: Square) -> anyhow::Result<Vec<Square>> {
            unimplemented!()
        }
        async fn undo(&self, _game_id: &GameId) -> anyhow::Result<MoveOutcome> {
            unimplemented!()
        }
    }

    fn authority(outcome: fn() -> anyhow::Result<MoveOutcome>, delay: Duration) -> Arc<Scripted> {
        Arc::new(Scripted {
            outcome,
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    fn mv() -> MoveRef {
        MoveRef::new(Square::new(6, 0).unwrap(), Square::new(5, 0).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn second_submission_is_refused_locally() {
        let auth = authority(
            || Ok(MoveOutcome::Rejected { reason: "nope".into() }),
            Duration::from_millis(10),
        );
        let mut channel = SubmissionChannel::new(Duration::from_secs(10));
        let first = channel
            .submit(auth.clone(), GameId("g".into()), mv())
            .ok()
            .unwrap();
        let second = channel.submit(auth.clone(), GameId("g".into()), mv());
        assert!(matches!(second, Err(ClientError::LocalValidation(_))));
        assert_eq!(channel.issued(), 1);

        assert_eq!(first.await, Err(ClientError::RemoteRejection("nope".into())));
        assert_eq!(auth.calls.load(Ordering::SeqCst), 1);
        assert_eq!(channel.complete(), Some(mv()));
        assert!(!channel.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn silence_becomes_transport_failure() {
        let auth = authority(
            || Ok(MoveOutcome::Rejected { reason: "late".into() }),
            Duration::from_secs(60),
        );
        let result = send_move(auth, GameId("g".into()), mv(), Duration::from_secs(10)).await;
        assert!(matches!(result, Err(ClientError::TransportFailure(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_becomes_transport_failure() {
        let auth = authority(|| Err(anyhow::anyhow!("Connection closed by peer")), Duration::ZERO);
        let result = send_move(auth, GameId("g".into()), mv(), Duration::from_secs(10)).await;
        assert_eq!(
            result,
            Err(ClientError::TransportFailure("Connection closed by peer".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_state_is_delivered() {
        let auth = authority(
            || {
                let mut state = GameState::opening(GameId("g".into()), Vec::new());
                state.turn = Side::Black;
                Ok(MoveOutcome::Accepted(state))
            },
            Duration::ZERO,
        );
        let state = send_move(auth, GameId("g".into()), mv(), Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(state.turn, Side::Black);
    }
}
