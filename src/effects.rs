//! Edge-triggered side effects derived from two consecutive snapshots.

use alloc::vec::Vec;

use crate::domain::{GameState, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Lose,
    Draw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// `side` has just been put in check.
    Check(Side),
    CaptureCue,
    MoveCue,
    /// The game has just ended.
    Outcome(Outcome),
}

/// Effects caused by going from `prev` to `next`, seen from `local`.
///
/// Pure: applying the same snapshot twice yields nothing the second time.
pub fn dispatch(prev: &GameState, next: &GameState, local: Side) -> Vec<Effect> {
    let mut effects = Vec::new();

    if next.last_move_key().is_some() && next.last_move_key() != prev.last_move_key() {
        let captured = next.last_move.and_then(|m| m.captured).is_some();
        effects.push(if captured {
            Effect::CaptureCue
        } else {
            Effect::MoveCue
        });
    }

    if let Some(side) = next.in_check {
        if prev.in_check != Some(side) {
            effects.push(Effect::Check(side));
        }
    }

    if prev.is_live() && !next.is_live() {
        let outcome = match next.winner {
            Some(winner) if winner == local => Outcome::Win,
            Some(_) => Outcome::Lose,
            None => Outcome::Draw,
        };
        effects.push(Effect::Outcome(outcome));
    }

    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GameId, GameStatus, Move, PieceCode, PieceKind, Square};
    use alloc::vec;

    fn base() -> GameState {
        GameState::opening(GameId("g".into()), Vec::new())
    }

    fn with_move(state: &GameState, from: (u8, u8), to: (u8, u8), capture: bool) -> GameState {
        let mut next = state.clone();
        next.last_move = Some(Move {
            from: Square::new(from.0, from.1).unwrap(),
            to: Square::new(to.0, to.1).unwrap(),
            piece: None,
            captured: capture.then(|| PieceCode::new(Side::Black, PieceKind::Horse)),
        });
        next
    }

    #[test]
    fn quiet_and_capture_cues() {
        let a = with_move(&base(), (6, 0), (5, 0), false);
        assert_eq!(dispatch(&base(), &a, Side::Red), vec![Effect::MoveCue]);
        let b = with_move(&a, (7, 1), (0, 1), true);
        assert_eq!(dispatch(&a, &b, Side::Red), vec![Effect::CaptureCue]);
    }

    #[test]
    fn identical_snapshot_fires_nothing() {
        let mut a = with_move(&base(), (7, 1), (0, 1), true);
        a.in_check = Some(Side::Black);
        a.status = GameStatus::Finished;
        a.winner = Some(Side::Red);
        assert!(dispatch(&a, &a.clone(), Side::Red).is_empty());
    }

    #[test]
    fn check_is_edge_triggered() {
        let a = base();
        let mut b = with_move(&a, (7, 1), (7, 4), false);
        b.in_check = Some(Side::Black);
        b.status = GameStatus::Check;
        assert_eq!(
            dispatch(&a, &b, Side::Red),
            vec![Effect::MoveCue, Effect::Check(Side::Black)]
        );
        // still in check on a later poll: no repeat
        let c = b.clone();
        assert!(dispatch(&b, &c, Side::Red).is_empty());
        // check passes to the other side
        let mut d = with_move(&b, (0, 0), (1, 0), false);
        d.in_check = Some(Side::Red);
        assert_eq!(
            dispatch(&b, &d, Side::Red),
            vec![Effect::MoveCue, Effect::Check(Side::Red)]
        );
    }

    #[test]
    fn outcome_variants() {
        let live = base();
        let mut over = with_move(&live, (7, 1), (0, 4), true);
        over.status = GameStatus::Checkmate;
        over.winner = Some(Side::Red);
        assert!(dispatch(&live, &over, Side::Red).contains(&Effect::Outcome(Outcome::Win)));
        assert!(dispatch(&live, &over, Side::Black).contains(&Effect::Outcome(Outcome::Lose)));

        over.winner = None;
        over.status = GameStatus::Stalemate;
        assert!(dispatch(&live, &over, Side::Red).contains(&Effect::Outcome(Outcome::Draw)));
    }
}
