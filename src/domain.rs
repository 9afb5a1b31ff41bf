//! Board model shared by every layer: squares, piece codes, moves and the
//! authoritative game snapshot.

use alloc::string::String;
use alloc::vec::Vec;

use crate::common::SquareError;
use crate::config::{COLS, ROWS};

/// One of the two players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Red,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Red => Side::Black,
            Side::Black => Side::Red,
        }
    }

    /// Single-letter wire code: `r` or `b`.
    pub fn code(self) -> char {
        match self {
            Side::Red => 'r',
            Side::Black => 'b',
        }
    }

    pub fn from_code(ch: char) -> Option<Side> {
        match ch {
            'r' => Some(Side::Red),
            'b' => Some(Side::Black),
            _ => None,
        }
    }
}

impl core::fmt::Display for Side {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Side::Red => write!(f, "red"),
            Side::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum PieceKind {
    General,
    Advisor,
    Elephant,
    Chariot,
    Horse,
    Cannon,
    Soldier,
}

impl PieceKind {
    pub fn letter(self) -> char {
        match self {
            PieceKind::General => 'K',
            PieceKind::Advisor => 'A',
            PieceKind::Elephant => 'E',
            PieceKind::Chariot => 'R',
            PieceKind::Horse => 'N',
            PieceKind::Cannon => 'C',
            PieceKind::Soldier => 'P',
        }
    }

    /// `H` is accepted as an alias for the horse.
    pub fn from_letter(ch: char) -> Option<PieceKind> {
        match ch {
            'K' => Some(PieceKind::General),
            'A' => Some(PieceKind::Advisor),
            'E' => Some(PieceKind::Elephant),
            'R' => Some(PieceKind::Chariot),
            'N' | 'H' => Some(PieceKind::Horse),
            'C' => Some(PieceKind::Cannon),
            'P' => Some(PieceKind::Soldier),
            _ => None,
        }
    }
}

/// Identity of a piece as far as rendering cares: side and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct PieceCode {
    pub side: Side,
    pub kind: PieceKind,
}

impl PieceCode {
    pub const fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }

    /// Parse the two-character code used by the authority, e.g. `rK` or `bP`.
    pub fn parse(text: &str) -> Result<Self, SquareError> {
        let mut chars = text.chars();
        let side = chars.next().and_then(Side::from_code);
        let kind = chars.next().and_then(PieceKind::from_letter);
        match (side, kind, chars.next()) {
            (Some(side), Some(kind), None) => Ok(Self { side, kind }),
            _ => Err(SquareError::InvalidPieceCode),
        }
    }

    /// Traditional glyph; red and black use different characters.
    pub fn glyph(self) -> char {
        match (self.side, self.kind) {
            (Side::Red, PieceKind::General) => '帥',
            (Side::Red, PieceKind::Advisor) => '仕',
            (Side::Red, PieceKind::Elephant) => '相',
            (Side::Red, PieceKind::Chariot) => '俥',
            (Side::Red, PieceKind::Horse) => '傌',
            (Side::Red, PieceKind::Cannon) => '炮',
            (Side::Red, PieceKind::Soldier) => '兵',
            (Side::Black, PieceKind::General) => '將',
            (Side::Black, PieceKind::Advisor) => '士',
            (Side::Black, PieceKind::Elephant) => '象',
            (Side::Black, PieceKind::Chariot) => '車',
            (Side::Black, PieceKind::Horse) => '馬',
            (Side::Black, PieceKind::Cannon) => '砲',
            (Side::Black, PieceKind::Soldier) => '卒',
        }
    }
}

impl core::fmt::Display for PieceCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.side.code(), self.kind.letter())
    }
}

/// Grid coordinate. Row 0 is black's back rank, row 9 is red's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "std",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "(u8, u8)", into = "(u8, u8)")
)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    pub fn new(row: u8, col: u8) -> Result<Self, SquareError> {
        if row >= ROWS || col >= COLS {
            return Err(SquareError::OutOfBounds { row, col });
        }
        Ok(Self { row, col })
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// Every square in row-major order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..ROWS).flat_map(|row| (0..COLS).map(move |col| Square { row, col }))
    }
}

impl TryFrom<(u8, u8)> for Square {
    type Error = SquareError;

    fn try_from((row, col): (u8, u8)) -> Result<Self, Self::Error> {
        Square::new(row, col)
    }
}

impl From<Square> for (u8, u8) {
    fn from(sq: Square) -> Self {
        (sq.row, sq.col)
    }
}

impl core::fmt::Display for Square {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", (b'A' + self.col) as char, self.row)
    }
}

/// Total mapping from square to optional piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Board {
    cells: [[Option<PieceCode>; COLS as usize]; ROWS as usize],
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            cells: [[None; COLS as usize]; ROWS as usize],
        }
    }

    /// Standard opening layout.
    pub fn initial() -> Self {
        const BACK_RANK: [PieceKind; COLS as usize] = [
            PieceKind::Chariot,
            PieceKind::Horse,
            PieceKind::Elephant,
            PieceKind::Advisor,
            PieceKind::General,
            PieceKind::Advisor,
            PieceKind::Elephant,
            PieceKind::Horse,
            PieceKind::Chariot,
        ];
        let mut board = Self::empty();
        for (side, back, cannons, soldiers) in [(Side::Black, 0, 2, 3), (Side::Red, 9, 7, 6)] {
            for (col, kind) in BACK_RANK.iter().enumerate() {
                board.cells[back][col] = Some(PieceCode::new(side, *kind));
            }
            board.cells[cannons][1] = Some(PieceCode::new(side, PieceKind::Cannon));
            board.cells[cannons][7] = Some(PieceCode::new(side, PieceKind::Cannon));
            for col in (0..COLS as usize).step_by(2) {
                board.cells[soldiers][col] = Some(PieceCode::new(side, PieceKind::Soldier));
            }
        }
        board
    }

    pub fn get(&self, sq: Square) -> Option<PieceCode> {
        self.cells
            .get(sq.row as usize)
            .and_then(|row| row.get(sq.col as usize))
            .copied()
            .flatten()
    }

    pub fn set(&mut self, sq: Square, piece: Option<PieceCode>) {
        if let Some(cell) = self
            .cells
            .get_mut(sq.row as usize)
            .and_then(|row| row.get_mut(sq.col as usize))
        {
            *cell = piece;
        }
    }

    /// Move whatever sits on `from` to `to`, returning the piece that was on `to`.
    /// Performs no legality checks.
    pub fn relocate(&mut self, from: Square, to: Square) -> Option<PieceCode> {
        let moving = self.get(from);
        let captured = self.get(to);
        self.set(from, None);
        self.set(to, moving);
        captured
    }

    /// Occupied squares in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, PieceCode)> + '_ {
        Square::all().filter_map(move |sq| self.get(sq).map(|code| (sq, code)))
    }

    pub fn piece_count(&self) -> usize {
        self.occupied().count()
    }

    pub fn is_enemy(&self, sq: Square, side: Side) -> bool {
        matches!(self.get(sq), Some(code) if code.side != side)
    }
}

/// A (from, to) pair: one entry of the legal move list, or the identity of a
/// played move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveRef {
    pub from: Square,
    pub to: Square,
}

impl MoveRef {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }
}

/// A move already played, as reported by the authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: Option<PieceCode>,
    pub captured: Option<PieceCode>,
}

impl Move {
    pub fn key(&self) -> MoveRef {
        MoveRef::new(self.from, self.to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum GameStatus {
    Ongoing,
    Check,
    Checkmate,
    Stalemate,
    Finished,
}

impl GameStatus {
    /// The game continues: moves are still being played.
    pub fn is_live(self) -> bool {
        matches!(self, GameStatus::Ongoing | GameStatus::Check)
    }
}

/// Authority-issued game identifier, opaque to the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameId(pub String);

impl core::fmt::Display for GameId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authoritative snapshot. Replaced wholesale on every update.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct GameState {
    pub game_id: GameId,
    pub board: Board,
    pub turn: Side,
    pub status: GameStatus,
    pub legal_moves: Vec<MoveRef>,
    pub last_move: Option<Move>,
    pub in_check: Option<Side>,
    pub winner: Option<Side>,
    pub end_reason: Option<String>,
}

impl GameState {
    /// Fresh game on the opening layout with red to move.
    pub fn opening(game_id: GameId, legal_moves: Vec<MoveRef>) -> Self {
        Self {
            game_id,
            board: Board::initial(),
            turn: Side::Red,
            status: GameStatus::Ongoing,
            legal_moves,
            last_move: None,
            in_check: None,
            winner: None,
            end_reason: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }

    /// Identity of the last move, used to decide whether it is new.
    pub fn last_move_key(&self) -> Option<MoveRef> {
        self.last_move.as_ref().map(Move::key)
    }

    /// Destinations the authority allows from `from`.
    pub fn destinations_from(&self, from: Square) -> impl Iterator<Item = Square> + '_ {
        self.legal_moves
            .iter()
            .filter(move |m| m.from == from)
            .map(|m| m.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn sq(row: u8, col: u8) -> Square {
        Square::new(row, col).unwrap()
    }

    #[test]
    fn square_bounds() {
        assert!(Square::new(9, 8).is_ok());
        assert_eq!(
            Square::new(10, 0),
            Err(SquareError::OutOfBounds { row: 10, col: 0 })
        );
        assert!(Square::new(0, 9).is_err());
        assert_eq!(Square::all().count(), 90);
    }

    #[test]
    fn piece_code_parse() {
        let code = PieceCode::parse("rK").unwrap();
        assert_eq!(code, PieceCode::new(Side::Red, PieceKind::General));
        assert_eq!(PieceCode::parse("bH").unwrap().kind, PieceKind::Horse);
        assert_eq!(alloc::format!("{}", PieceCode::parse("bH").unwrap()), "bN");
        assert!(PieceCode::parse("xK").is_err());
        assert!(PieceCode::parse("rKK").is_err());
        assert!(PieceCode::parse("r").is_err());
    }

    #[test]
    fn initial_layout() {
        let board = Board::initial();
        assert_eq!(board.piece_count(), 32);
        assert_eq!(board.get(sq(0, 4)), Some(PieceCode::new(Side::Black, PieceKind::General)));
        assert_eq!(board.get(sq(9, 4)), Some(PieceCode::new(Side::Red, PieceKind::General)));
        assert_eq!(board.get(sq(7, 1)), Some(PieceCode::new(Side::Red, PieceKind::Cannon)));
        assert_eq!(board.get(sq(3, 8)), Some(PieceCode::new(Side::Black, PieceKind::Soldier)));
        assert_eq!(board.get(sq(4, 4)), None);
    }

    #[test]
    fn relocate_reports_capture() {
        let mut board = Board::initial();
        assert_eq!(board.relocate(sq(7, 1), sq(4, 1)), None);
        let captured = board.relocate(sq(4, 1), sq(0, 1));
        assert_eq!(captured, Some(PieceCode::new(Side::Black, PieceKind::Horse)));
        assert_eq!(board.get(sq(0, 1)), Some(PieceCode::new(Side::Red, PieceKind::Cannon)));
        assert_eq!(board.piece_count(), 31);
    }

    #[test]
    fn destinations_filter_by_origin() {
        let state = GameState::opening(
            GameId("g".into()),
            vec![
                MoveRef::new(sq(7, 1), sq(4, 1)),
                MoveRef::new(sq(7, 1), sq(7, 4)),
                MoveRef::new(sq(6, 0), sq(5, 0)),
            ],
        );
        let dests: Vec<Square> = state.destinations_from(sq(7, 1)).collect();
        assert_eq!(dests, vec![sq(4, 1), sq(7, 4)]);
        assert!(GameStatus::Check.is_live());
        assert!(!GameStatus::Checkmate.is_live());
    }
}
