//! Visual reconciliation: maps a new snapshot onto the elements already on
//! screen while creating and destroying as few as possible.
//!
//! The element that depicts a just-moved piece keeps its identity so it can
//! slide; a captured piece fades out on its own schedule. Everything else is
//! matched by piece code through a reuse pool.
//!
//! The pool is a heuristic, not identity tracking. When two identical pieces
//! (say both red chariots) sit near a move, an unmoved square may receive the
//! "other" chariot's element. They look the same, so nothing visible changes;
//! this is accepted behaviour rather than a bug.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::config::{BOARD_PAD, CELL_SIZE, PIECE_SIZE};
use crate::domain::{Board, GameState, PieceCode, Square};
use crate::interaction::{InteractionState, TargetTag};

/// Pixel position of an element's top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Where a piece standing on `sq` is drawn.
    pub fn for_square(sq: Square) -> Point {
        Point {
            x: BOARD_PAD + sq.col() as i32 * CELL_SIZE - PIECE_SIZE / 2,
            y: BOARD_PAD + sq.row() as i32 * CELL_SIZE - PIECE_SIZE / 2,
        }
    }

    pub fn minus(self, other: Point) -> Point {
        Point {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

/// Stable identity of a rendered piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u64);

impl ElementId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Presentational markers recomputed on every pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ElementFlags {
    pub selected: bool,
    pub last_move_target: bool,
    pub capture_target: bool,
    pub fading: bool,
}

/// Transit state of an element relative to its placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Motion {
    #[default]
    Resting,
    /// Drawn at `placement + offset` with no transition.
    Held(Point),
    /// Transitioning from the held offset back to its placement.
    Sliding(Point),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualElement {
    pub id: ElementId,
    pub square: Square,
    pub code: PieceCode,
    pub placement: Point,
    pub motion: Motion,
    pub flags: ElementFlags,
}

/// Selection markers taken from the interaction state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Highlights {
    pub selected: Option<Square>,
    pub capture_targets: Vec<Square>,
}

impl Highlights {
    pub fn from_interaction(ui: &InteractionState) -> Self {
        Self {
            selected: ui.selected(),
            capture_targets: ui
                .legal_targets()
                .iter()
                .filter(|t| t.tag == TargetTag::Capture)
                .map(|t| t.square)
                .collect(),
        }
    }
}

/// Instruction to animate the sliding element between two placements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidePlan {
    pub element: ElementId,
    pub from: Point,
    pub to: Point,
}

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<ElementId>,
    pub reused: Vec<ElementId>,
    pub destroyed: Vec<ElementId>,
    /// Element now fading out; the caller removes it after the fade delay.
    pub captured: Option<ElementId>,
    pub slide: Option<SlidePlan>,
}

/// Running totals, handy for asserting churn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChurnStats {
    pub created: usize,
    pub destroyed: usize,
}

#[derive(Debug, Default)]
pub struct Scene {
    elements: BTreeMap<ElementId, VisualElement>,
    next_id: u64,
    stats: ChurnStats,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(&self, id: ElementId) -> Option<&VisualElement> {
        self.elements.get(&id)
    }

    pub fn elements(&self) -> impl Iterator<Item = &VisualElement> {
        self.elements.values()
    }

    /// The non-fading element standing on `sq`, if any.
    pub fn element_at(&self, sq: Square) -> Option<&VisualElement> {
        self.elements
            .values()
            .find(|e| e.square == sq && !e.flags.fading)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn stats(&self) -> ChurnStats {
        self.stats
    }

    /// Exactly one non-fading element per occupied square, with the right code,
    /// and none on empty squares.
    pub fn matches_board(&self, board: &Board) -> bool {
        let mut claimed: BTreeMap<Square, PieceCode> = BTreeMap::new();
        for el in self.elements.values().filter(|e| !e.flags.fading) {
            if claimed.insert(el.square, el.code).is_some() {
                return false;
            }
        }
        claimed.len() == board.piece_count()
            && board
                .occupied()
                .all(|(sq, code)| claimed.get(&sq) == Some(&code))
    }

    fn spawn(&mut self, square: Square, code: PieceCode) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.stats.created += 1;
        self.elements.insert(
            id,
            VisualElement {
                id,
                square,
                code,
                placement: Point::for_square(square),
                motion: Motion::Resting,
                flags: ElementFlags::default(),
            },
        );
        id
    }

    fn destroy(&mut self, id: ElementId) -> bool {
        let removed = self.elements.remove(&id).is_some();
        if removed {
            self.stats.destroyed += 1;
        }
        removed
    }

    /// Map `state` onto the scene. `should_animate` is true only when the
    /// snapshot's last move has not been rendered before.
    pub fn reconcile(
        &mut self,
        state: &GameState,
        should_animate: bool,
        highlights: &Highlights,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let mut by_square: BTreeMap<Square, ElementId> = BTreeMap::new();
        let mut stale = Vec::new();
        for el in self.elements.values().filter(|e| !e.flags.fading) {
            if let Some(dup) = by_square.insert(el.square, el.id) {
                stale.push(dup);
            }
        }

        let animated_move = state.last_move.filter(|_| should_animate);
        let mut sliding = None;
        let mut captured = None;
        if let Some(mv) = animated_move {
            sliding = by_square.remove(&mv.from);
            if mv.captured.is_some() {
                captured = by_square.remove(&mv.to);
            }
        }
        let slide_origin = sliding
            .and_then(|id| self.elements.get(&id))
            .map(|e| e.placement);

        let mut pool: BTreeMap<PieceCode, Vec<ElementId>> = BTreeMap::new();
        for id in by_square.values() {
            if let Some(el) = self.elements.get(id) {
                pool.entry(el.code).or_default().push(*id);
            }
        }

        let last_move_to = state.last_move.map(|m| m.to);
        let mut unplaced_slider = sliding;
        for (sq, code) in state.board.occupied() {
            let placed_slider = match (animated_move, unplaced_slider) {
                (Some(mv), Some(id)) if mv.to == sq => {
                    unplaced_slider = None;
                    Some(id)
                }
                _ => None,
            };
            let id = match placed_slider {
                Some(id) => {
                    report.reused.push(id);
                    id
                }
                None => match self.take_from_pool(&mut pool, code, sq) {
                    Some(id) => {
                        report.reused.push(id);
                        id
                    }
                    None => {
                        let id = self.spawn(sq, code);
                        report.created.push(id);
                        id
                    }
                },
            };

            let Some(el) = self.elements.get_mut(&id) else {
                continue;
            };
            el.square = sq;
            el.code = code;
            el.placement = Point::for_square(sq);
            el.motion = Motion::Resting;
            el.flags = ElementFlags {
                selected: highlights.selected == Some(sq),
                last_move_target: last_move_to == Some(sq),
                capture_target: highlights.capture_targets.contains(&sq),
                fading: false,
            };

            if placed_slider.is_some() {
                if let Some(origin) = slide_origin.filter(|o| *o != el.placement) {
                    el.motion = Motion::Held(origin.minus(el.placement));
                    el.flags.last_move_target = false;
                    report.slide = Some(SlidePlan {
                        element: id,
                        from: origin,
                        to: el.placement,
                    });
                }
            }
        }

        let leftovers: Vec<ElementId> = pool
            .into_values()
            .flatten()
            .chain(stale)
            .chain(unplaced_slider)
            .collect();
        for id in leftovers {
            if self.destroy(id) {
                report.destroyed.push(id);
            }
        }

        if let Some(id) = captured {
            if let Some(el) = self.elements.get_mut(&id) {
                el.motion = Motion::Resting;
                el.flags = ElementFlags {
                    fading: true,
                    ..ElementFlags::default()
                };
                report.captured = Some(id);
            }
        }

        report
    }

    /// Prefer an element already standing on `sq`, otherwise the most recently
    /// pooled one.
    fn take_from_pool(
        &self,
        pool: &mut BTreeMap<PieceCode, Vec<ElementId>>,
        code: PieceCode,
        sq: Square,
    ) -> Option<ElementId> {
        let bucket = pool.get_mut(&code)?;
        let in_place = bucket
            .iter()
            .position(|id| self.elements.get(id).map(|e| e.square) == Some(sq));
        match in_place {
            Some(pos) => Some(bucket.remove(pos)),
            None => bucket.pop(),
        }
    }

    /// Refresh selection markers without touching placement or motion.
    pub fn highlight(&mut self, highlights: &Highlights) {
        for el in self.elements.values_mut().filter(|e| !e.flags.fading) {
            el.flags.selected = highlights.selected == Some(el.square);
            el.flags.capture_target = highlights.capture_targets.contains(&el.square);
        }
    }

    /// Switch a held element to its transition toward the placement.
    pub fn release_hold(&mut self, id: ElementId) -> bool {
        match self.elements.get_mut(&id) {
            Some(el) => match el.motion {
                Motion::Held(offset) => {
                    el.motion = Motion::Sliding(offset);
                    true
                }
                _ => false,
            },
            None => false,
        }
    }

    /// The slide is over: the element rests on its placement and takes the
    /// last-move marker.
    pub fn settle(&mut self, id: ElementId) {
        if let Some(el) = self.elements.get_mut(&id) {
            el.motion = Motion::Resting;
            el.flags.last_move_target = true;
        }
    }

    /// Remove a captured element once its fade has run. Only fading elements
    /// are removed.
    pub fn remove_faded(&mut self, id: ElementId) -> bool {
        let fading = self.elements.get(&id).map(|e| e.flags.fading) == Some(true);
        fading && self.destroy(id)
    }
}
