#![cfg(feature = "std")]

use std::string::String;
use std::vec::Vec;

use crate::domain::{GameId, GameState, Side, Square};

/// Version stamped on every frame. Peers with a different version are refused.
pub const PROTOCOL_VERSION: u16 = 1;

/// Strength requested from an AI opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NewGameRequest {
    pub player_side: Side,
    pub difficulty: Difficulty,
}

/// Answer to a move or undo request. Rejection reasons are free text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MoveOutcome {
    Accepted(GameState),
    Rejected { reason: String },
}

/// Frames exchanged with the move authority. Requests carry a sequence number
/// that the matching response echoes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Message {
    NewGame { version: u16, seq: u64, request: NewGameRequest },
    SubmitMove { version: u16, seq: u64, game_id: GameId, from: Square, to: Square },
    FetchState { version: u16, seq: u64, game_id: GameId },
    LegalMovesFor { version: u16, seq: u64, game_id: GameId, square: Square },
    Undo { version: u16, seq: u64, game_id: GameId },
    StateResp { version: u16, seq: u64, state: GameState },
    MoveResp { version: u16, seq: u64, outcome: MoveOutcome },
    SquaresResp { version: u16, seq: u64, squares: Vec<Square> },
    /// The authority could not serve the request at all.
    ErrorResp { version: u16, seq: u64, reason: String },
}

impl Message {
    pub fn version(&self) -> u16 {
        match self {
            Message::NewGame { version, .. }
            | Message::SubmitMove { version, .. }
            | Message::FetchState { version, .. }
            | Message::LegalMovesFor { version, .. }
            | Message::Undo { version, .. }
            | Message::StateResp { version, .. }
            | Message::MoveResp { version, .. }
            | Message::SquaresResp { version, .. }
            | Message::ErrorResp { version, .. } => *version,
        }
    }

    pub fn seq(&self) -> u64 {
        match self {
            Message::NewGame { seq, .. }
            | Message::SubmitMove { seq, .. }
            | Message::FetchState { seq, .. }
            | Message::LegalMovesFor { seq, .. }
            | Message::Undo { seq, .. }
            | Message::StateResp { seq, .. }
            | Message::MoveResp { seq, .. }
            | Message::SquaresResp { seq, .. }
            | Message::ErrorResp { seq, .. } => *seq,
        }
    }
}

/// Contract of the remote move authority. Rules, legality and the opponent
/// all live behind it.
#[async_trait::async_trait]
pub trait MoveAuthority: Send + Sync {
    async fn new_game(&self, request: NewGameRequest) -> anyhow::Result<GameState>;

    async fn submit_move(&self, game_id: &GameId, from: Square, to: Square) -> anyhow::Result<MoveOutcome>;

    /// Idempotent read of the current snapshot.
    async fn fetch_state(&self, game_id: &GameId) -> anyhow::Result<GameState>;

    async fn legal_moves_for(&self, game_id: &GameId, square: Square) -> anyhow::Result<Vec<Square>>;

    /// Take back a single ply.
    async fn undo(&self, game_id: &GameId) -> anyhow::Result<MoveOutcome>;
}
