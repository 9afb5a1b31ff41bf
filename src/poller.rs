#![cfg(feature = "std")]

use std::sync::Arc;

use tokio::task::AbortHandle;
use tokio::time::{interval_at, timeout, Duration, Instant, MissedTickBehavior};

use crate::common::ClientError;
use crate::domain::{GameId, GameState, Side};
use crate::protocol::MoveAuthority;

/// Identity of one poll loop. Results carrying an older token are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollToken(u64);

#[derive(Debug)]
struct ActivePoll {
    token: PollToken,
    handle: AbortHandle,
}

/// Keeps at most one poll loop alive.
#[derive(Debug, Default)]
pub struct TurnPoller {
    issued: u64,
    active: Option<ActivePoll>,
}

impl TurnPoller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_token(&self) -> Option<PollToken> {
        self.active.as_ref().map(|a| a.token)
    }

    /// Cancel any running loop and start a new one. `spawn` receives the new
    /// token and returns the handle of the task it started.
    pub fn start<F>(&mut self, spawn: F) -> PollToken
    where
        F: FnOnce(PollToken) -> AbortHandle,
    {
        self.cancel();
        self.issued += 1;
        let token = PollToken(self.issued);
        let handle = spawn(token);
        self.active = Some(ActivePoll { token, handle });
        token
    }

    /// Abort the running loop, if any.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(active) => {
                log::debug!("Cancelling poll loop {:?}", active.token);
                active.handle.abort();
                true
            }
            None => false,
        }
    }

    /// A loop delivered its state. True when `token` is the live loop, which
    /// is then retired.
    pub fn finish(&mut self, token: PollToken) -> bool {
        if self.active_token() == Some(token) {
            self.active = None;
            true
        } else {
            false
        }
    }
}

/// Fetch the snapshot every `poll_interval` until it is the local side's
/// turn or the game is over, and return that snapshot. Failed ticks are
/// logged and the loop carries on.
pub async fn poll_until_turn(
    authority: Arc<dyn MoveAuthority>,
    game_id: GameId,
    local: Side,
    poll_interval: Duration,
    request_timeout: Duration,
) -> GameState {
    let mut ticker = interval_at(Instant::now() + poll_interval, poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;
    loop {
        ticker.tick().await;
        tick += 1;
        match timeout(request_timeout, authority.fetch_state(&game_id)).await {
            Ok(Ok(state)) if state.turn == local || !state.is_live() => {
                log::debug!("Poll tick {} for game {}: {:?} to move, {:?}", tick, game_id, state.turn, state.status);
                return state;
            }
            Ok(Ok(_)) => {
                log::trace!("Poll tick {} for game {}: {}", tick, game_id, ClientError::StaleResponse);
            }
            Ok(Err(e)) => {
                log::warn!("Poll tick {} for game {} failed: {}", tick, game_id, e);
            }
            Err(_) => {
                log::warn!(
                    "Poll tick {} for game {} timed out after {:?}",
                    tick,
                    game_id,
                    request_timeout
                );
            }
        }
    }
}
