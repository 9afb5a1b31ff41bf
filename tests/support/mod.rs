#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::Duration;
use xiangqi_sync::{
    AnimationPhase, ClientConfig, Effect, Frame, GameClient, GameId, GameState, Move, MoveAuthority,
    MoveOutcome, MoveRef, NewGameRequest, Notification, Phase, Side, Square, View, ViewEvent,
};

pub fn sq(row: u8, col: u8) -> Square {
    Square::new(row, col).unwrap()
}

/// Opening position, red to move, with a handful of red moves allowed.
pub fn opening() -> GameState {
    GameState::opening(
        GameId("game-1".into()),
        vec![
            MoveRef::new(sq(6, 0), sq(5, 0)),
            MoveRef::new(sq(7, 1), sq(4, 1)),
            MoveRef::new(sq(7, 1), sq(0, 1)),
            MoveRef::new(sq(9, 8), sq(8, 8)),
        ],
    )
}

/// Play `from -> to` on `state` and hand the turn over.
pub fn play(state: &GameState, from: Square, to: Square, legal: Vec<MoveRef>) -> GameState {
    let mut next = state.clone();
    let piece = next.board.get(from);
    let captured = next.board.relocate(from, to);
    next.turn = state.turn.opposite();
    next.last_move = Some(Move {
        from,
        to,
        piece,
        captured,
    });
    next.legal_moves = legal;
    next
}

type Reply<T> = (Duration, anyhow::Result<T>);

/// Move authority answering from per-call scripts, counting every call.
#[derive(Default)]
pub struct ScriptedAuthority {
    new_games: Mutex<VecDeque<Reply<GameState>>>,
    moves: Mutex<VecDeque<Reply<MoveOutcome>>>,
    fetches: Mutex<VecDeque<Reply<GameState>>>,
    undos: Mutex<VecDeque<Reply<MoveOutcome>>>,
    pub new_game_calls: AtomicUsize,
    pub submit_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub undo_calls: AtomicUsize,
}

impl ScriptedAuthority {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_new_game(&self, delay: Duration, reply: anyhow::Result<GameState>) {
        self.new_games.lock().unwrap().push_back((delay, reply));
    }

    pub fn on_submit(&self, delay: Duration, reply: anyhow::Result<MoveOutcome>) {
        self.moves.lock().unwrap().push_back((delay, reply));
    }

    pub fn on_fetch(&self, reply: anyhow::Result<GameState>) {
        self.fetches.lock().unwrap().push_back((Duration::ZERO, reply));
    }

    pub fn on_undo(&self, reply: anyhow::Result<MoveOutcome>) {
        self.undos.lock().unwrap().push_back((Duration::ZERO, reply));
    }

    pub fn submits(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn undos(&self) -> usize {
        self.undo_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.new_game_calls.load(Ordering::SeqCst) + self.submits() + self.fetches() + self.undos()
    }
}

async fn answer<T>(queue: &Mutex<VecDeque<Reply<T>>>, what: &str) -> anyhow::Result<T> {
    let next = queue.lock().unwrap().pop_front();
    match next {
        Some((delay, reply)) => {
            tokio::time::sleep(delay).await;
            reply
        }
        None => Err(anyhow::anyhow!("no scripted {} reply", what)),
    }
}

#[async_trait::async_trait]
impl MoveAuthority for ScriptedAuthority {
    async fn new_game(&self, _request: NewGameRequest) -> anyhow::Result<GameState> {
        self.new_game_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.new_games, "new game").await
    }

    async fn submit_move(&self, _game_id: &GameId, _from: Square, _to: Square) -> anyhow::Result<MoveOutcome> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.moves, "move").await
    }

    async fn fetch_state(&self, _game_id: &GameId) -> anyhow::Result<GameState> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.fetches, "fetch").await
    }

    async fn legal_moves_for(&self, _game_id: &GameId, _square: Square) -> anyhow::Result<Vec<Square>> {
        Ok(Vec::new())
    }

    async fn undo(&self, _game_id: &GameId) -> anyhow::Result<MoveOutcome> {
        self.undo_calls.fetch_add(1, Ordering::SeqCst);
        answer(&self.undos, "undo").await
    }
}

/// What the view saw of one rendered frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSummary {
    pub phase: Phase,
    pub slide: Option<AnimationPhase>,
    pub elements: usize,
}

#[derive(Debug, Default)]
pub struct Recorded {
    pub frames: Vec<FrameSummary>,
    pub notifications: Vec<Notification>,
    pub effects: Vec<Effect>,
}

/// View that records instead of drawing.
pub struct RecordingView(pub Arc<Mutex<Recorded>>);

impl View for RecordingView {
    fn render(&mut self, frame: &Frame<'_>) {
        self.0.lock().unwrap().frames.push(FrameSummary {
            phase: frame.interaction.phase(),
            slide: frame.slide.map(|s| s.phase()),
            elements: frame.scene.len(),
        });
    }

    fn notify(&mut self, notification: &Notification) {
        self.0.lock().unwrap().notifications.push(notification.clone());
    }

    fn play(&mut self, effect: Effect) {
        self.0.lock().unwrap().effects.push(effect);
    }
}

pub struct Harness {
    pub client: GameClient,
    pub events: mpsc::Sender<ViewEvent>,
    pub recorded: Arc<Mutex<Recorded>>,
    pub authority: Arc<ScriptedAuthority>,
}

impl Harness {
    /// Client playing `local` that already shows `state`.
    pub fn with_state(authority: Arc<ScriptedAuthority>, local: Side, state: GameState) -> Self {
        let (events, rx) = mpsc::channel(16);
        let recorded = Arc::new(Mutex::new(Recorded::default()));
        let mut client = GameClient::new(
            authority.clone(),
            Box::new(RecordingView(recorded.clone())),
            rx,
            ClientConfig::default(),
            local,
        );
        client.adopt(state);
        Self {
            client,
            events,
            recorded,
            authority,
        }
    }

    pub fn click(&mut self, square: Square) {
        self.client.handle_event(ViewEvent::Click(square));
    }

    pub async fn step(&mut self) {
        assert!(self.client.step().await, "client stopped unexpectedly");
    }

    pub fn effects(&self) -> Vec<Effect> {
        self.recorded.lock().unwrap().effects.clone()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.recorded.lock().unwrap().notifications.clone()
    }
}
