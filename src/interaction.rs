//! Selection and input locking.
//!
//! The machine never talks to the network: a click yields a [`ClickOutcome`]
//! and the caller decides what to issue. Legal targets come straight from the
//! authority's move list; the move/capture tag is for presentation only.

use alloc::vec::Vec;

use crate::domain::{GameState, MoveRef, Side, Square};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetTag {
    Move,
    Capture,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub square: Square,
    pub tag: TargetTag,
}

/// Observable state of the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Selected,
    Locked,
    Terminal,
}

/// Why input is currently refused. The lock holds while any cause is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LockCauses {
    submission: bool,
    animation: bool,
}

impl LockCauses {
    fn any(&self) -> bool {
        self.submission || self.animation
    }
}

/// Result of feeding one click into the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// Input refused without any state change.
    Ignored(&'static str),
    Selected(Square),
    Deselected,
    /// The caller must issue exactly one submission for this move.
    Submit(MoveRef),
}

#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    selected: Option<Square>,
    targets: Vec<Target>,
    locks: LockCauses,
    terminal: bool,
}

impl InteractionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        if self.terminal {
            Phase::Terminal
        } else if self.locks.any() {
            Phase::Locked
        } else if self.selected.is_some() {
            Phase::Selected
        } else {
            Phase::Idle
        }
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    pub fn legal_targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target_tag(&self, sq: Square) -> Option<TargetTag> {
        self.targets.iter().find(|t| t.square == sq).map(|t| t.tag)
    }

    pub fn is_locked(&self) -> bool {
        self.locks.any()
    }

    /// Feed a click on `sq`. `state` is the current authoritative snapshot.
    pub fn click(&mut self, sq: Square, state: Option<&GameState>, local: Side) -> ClickOutcome {
        if self.terminal {
            return ClickOutcome::Ignored("game is over");
        }
        if self.locks.any() {
            return ClickOutcome::Ignored("board is locked");
        }
        let Some(state) = state else {
            return ClickOutcome::Ignored("no game loaded");
        };
        let own_piece = matches!(state.board.get(sq), Some(code) if code.side == local);

        match self.selected {
            None if own_piece => {
                self.select(sq, state, local);
                ClickOutcome::Selected(sq)
            }
            None => ClickOutcome::Ignored("nothing to select"),
            Some(current) if current == sq => {
                self.clear_selection();
                ClickOutcome::Deselected
            }
            Some(_) if own_piece => {
                self.select(sq, state, local);
                ClickOutcome::Selected(sq)
            }
            Some(current) if state.turn == local && self.target_tag(sq).is_some() => {
                self.locks.submission = true;
                ClickOutcome::Submit(MoveRef::new(current, sq))
            }
            Some(_) => {
                self.clear_selection();
                ClickOutcome::Deselected
            }
        }
    }

    fn select(&mut self, sq: Square, state: &GameState, local: Side) {
        self.selected = Some(sq);
        self.targets = state
            .destinations_from(sq)
            .map(|to| Target {
                square: to,
                tag: if state.board.is_enemy(to, local) {
                    TargetTag::Capture
                } else {
                    TargetTag::Move
                },
            })
            .collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.targets.clear();
    }

    /// A new snapshot was applied: selection is dropped and the terminal flag
    /// follows the snapshot's status.
    pub fn sync_with(&mut self, state: &GameState) {
        self.clear_selection();
        self.terminal = !state.is_live();
    }

    /// Lock input while a new game or undo request is outstanding.
    pub fn begin_request(&mut self) {
        self.clear_selection();
        self.locks.submission = true;
    }

    /// The submission finished, accepted or not.
    pub fn submission_resolved(&mut self) {
        self.locks.submission = false;
        self.clear_selection();
    }

    pub fn begin_animation(&mut self) {
        self.locks.animation = true;
    }

    pub fn end_animation(&mut self) {
        self.locks.animation = false;
    }
}
