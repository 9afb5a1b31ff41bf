//! Holds the last authoritative snapshot and remembers which move was last
//! rendered, so a move animates exactly once.

use crate::domain::{GameState, MoveRef};

/// How a new snapshot relates to what is already on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Snapshot that was current before this one.
    pub previous: Option<GameState>,
    /// The last move is new relative to the previously rendered one.
    pub should_animate: bool,
}

#[derive(Debug, Default)]
pub struct BoardStore {
    current: Option<GameState>,
    rendered_last_move: Option<MoveRef>,
}

impl BoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&GameState> {
        self.current.as_ref()
    }

    /// Replace the snapshot after a move transition (submission or poll).
    pub fn replace(&mut self, next: GameState) -> Transition {
        let key = next.last_move_key();
        let should_animate = key.is_some() && key != self.rendered_last_move;
        self.rendered_last_move = key;
        let previous = self.current.replace(next);
        Transition {
            previous,
            should_animate,
        }
    }

    /// Replace the snapshot without treating its last move as new: new games
    /// and undo land here.
    pub fn rebase(&mut self, next: GameState) -> Option<GameState> {
        self.rendered_last_move = next.last_move_key();
        self.current.replace(next)
    }
}
