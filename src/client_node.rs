#![cfg(feature = "std")]

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout, Duration};

use crate::animation::{SlideAnimation, SlideSignal};
use crate::common::{ClientError, Notification};
use crate::config::ClientConfig;
use crate::domain::{GameId, GameState, MoveRef, Side, Square};
use crate::effects::{self, Effect};
use crate::interaction::{ClickOutcome, InteractionState};
use crate::poller::{poll_until_turn, PollToken, TurnPoller};
use crate::protocol::{MoveAuthority, MoveOutcome, NewGameRequest};
use crate::reconcile::{ElementId, Highlights, Scene};
use crate::store::BoardStore;
use crate::submission::{SubmissionChannel, SubmissionResult};

/// Input coming from the view layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Click(Square),
    NewGame(NewGameRequest),
    /// Take back the opponent's last ply and then the local one.
    Undo,
    /// The view finished the transition of this element.
    TransitionFinished(ElementId),
    Teardown,
}

/// Everything a view needs to draw one frame.
pub struct Frame<'a> {
    pub state: Option<&'a GameState>,
    pub interaction: &'a InteractionState,
    pub scene: &'a Scene,
    pub slide: Option<&'a SlideAnimation>,
}

/// Presentation surface driven by [`GameClient`].
pub trait View: Send {
    fn render(&mut self, frame: &Frame<'_>);
    fn notify(&mut self, notification: &Notification);
    fn play(&mut self, effect: Effect);
}

#[derive(Debug)]
struct UndoResult {
    /// Latest accepted snapshot, if any ply was taken back.
    state: Option<GameState>,
    failure: Option<ClientError>,
}

#[derive(Debug)]
enum Completion {
    Submission(SubmissionResult),
    Poll { token: PollToken, state: GameState },
    NewGame { side: Side, result: Result<GameState, ClientError> },
    Undo(UndoResult),
    FadeElapsed(ElementId),
    SlideTimeout(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// A ply was played: animate it and fire effects.
    Move,
    /// New game or undo: jump straight to the snapshot.
    Rebase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingRequest {
    NewGame,
    Undo,
}

/// One client session. All state lives here and is only touched from the
/// task running [`GameClient::run`]; background work reports back through
/// completions.
pub struct GameClient {
    authority: Arc<dyn MoveAuthority>,
    view: Box<dyn View>,
    events: mpsc::Receiver<ViewEvent>,
    config: ClientConfig,
    local: Side,
    store: BoardStore,
    interaction: InteractionState,
    scene: Scene,
    slide: Option<SlideAnimation>,
    slide_serial: u64,
    submission: SubmissionChannel,
    poller: TurnPoller,
    request: Option<PendingRequest>,
    tasks: JoinSet<Completion>,
    torn_down: bool,
}

impl GameClient {
    pub fn new(
        authority: Arc<dyn MoveAuthority>,
        view: Box<dyn View>,
        events: mpsc::Receiver<ViewEvent>,
        config: ClientConfig,
        local: Side,
    ) -> Self {
        Self {
            authority,
            view,
            events,
            submission: SubmissionChannel::new(config.request_timeout),
            config,
            local,
            store: BoardStore::new(),
            interaction: InteractionState::new(),
            scene: Scene::new(),
            slide: None,
            slide_serial: 0,
            poller: TurnPoller::new(),
            request: None,
            tasks: JoinSet::new(),
            torn_down: false,
        }
    }

    pub fn state(&self) -> Option<&GameState> {
        self.store.current()
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn slide(&self) -> Option<&SlideAnimation> {
        self.slide.as_ref()
    }

    pub fn local_side(&self) -> Side {
        self.local
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_active()
    }

    pub fn submissions_issued(&self) -> u64 {
        self.submission.issued()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Show an existing game without any transition.
    pub fn adopt(&mut self, state: GameState) {
        self.apply(state, Origin::Rebase);
    }

    /// Process events and completions until teardown.
    pub async fn run(mut self) -> anyhow::Result<()> {
        while self.step().await {}
        Ok(())
    }

    /// Wait for the next event or completion and handle it. Returns false
    /// once the client is torn down.
    pub async fn step(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        tokio::select! {
            event = self.events.recv() => match event {
                Some(event) => self.handle_event(event),
                None => {
                    self.teardown();
                    false
                }
            },
            Some(joined) = self.tasks.join_next() => {
                match joined {
                    Ok(completion) => self.complete(completion),
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => log::warn!("[GameClient] Background task failed: {}", e),
                }
                true
            }
        }
    }

    pub fn handle_event(&mut self, event: ViewEvent) -> bool {
        match event {
            ViewEvent::Click(sq) => self.on_click(sq),
            ViewEvent::NewGame(request) => self.request_new_game(request),
            ViewEvent::Undo => self.request_undo(),
            ViewEvent::TransitionFinished(id) => {
                let current = self.slide.as_ref().map(SlideAnimation::element) == Some(id);
                if current && self.finish_slide(SlideSignal::Finished) {
                    self.render();
                }
            }
            ViewEvent::Teardown => {
                self.teardown();
                return false;
            }
        }
        true
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Submission(result) => self.on_submission(result),
            Completion::Poll { token, state } => {
                if self.poller.finish(token) {
                    log::debug!("Poll loop {:?} delivered {:?} to move", token, state.turn);
                    self.apply(state, Origin::Move);
                } else {
                    log::debug!("Dropping result of retired poll loop {:?}", token);
                }
            }
            Completion::NewGame { side, result } => self.on_new_game(side, result),
            Completion::Undo(result) => self.on_undo(result),
            Completion::FadeElapsed(id) => {
                if self.scene.remove_faded(id) {
                    self.render();
                }
            }
            Completion::SlideTimeout(serial) => {
                let current = self.slide.as_ref().map(SlideAnimation::serial) == Some(serial);
                if current && self.finish_slide(SlideSignal::SafetyTimeout) {
                    log::debug!("Slide {} settled by safety timeout", serial);
                    self.render();
                }
            }
        }
    }

    fn on_click(&mut self, sq: Square) {
        match self.interaction.click(sq, self.store.current(), self.local) {
            ClickOutcome::Ignored(why) => {
                log::debug!("Click on {} ignored: {}", sq, why);
                return;
            }
            ClickOutcome::Submit(mv) => self.submit(mv),
            ClickOutcome::Selected(_) | ClickOutcome::Deselected => {}
        }
        self.scene.highlight(&Highlights::from_interaction(&self.interaction));
        self.render();
    }

    fn submit(&mut self, mv: MoveRef) {
        let Some(game_id) = self.game_id() else {
            self.interaction.submission_resolved();
            return;
        };
        match self.submission.submit(self.authority.clone(), game_id, mv) {
            Ok(request) => {
                self.tasks.spawn(async move { Completion::Submission(request.await) });
            }
            Err(err) => {
                log::debug!("{}", err);
                self.interaction.submission_resolved();
            }
        }
    }

    fn on_submission(&mut self, result: SubmissionResult) {
        self.submission.complete();
        self.interaction.submission_resolved();
        match result {
            Ok(state) => self.apply(state, Origin::Move),
            Err(err) => {
                if let Some(note) = Notification::for_move_failure(&err) {
                    self.view.notify(&note);
                }
                self.scene.highlight(&Highlights::default());
                self.render();
            }
        }
    }

    fn request_new_game(&mut self, request: NewGameRequest) {
        if self.submission.is_pending() || self.request.is_some() {
            log::debug!(
                "New game ignored: {}",
                ClientError::LocalValidation("another request is in flight")
            );
            return;
        }
        self.request = Some(PendingRequest::NewGame);
        self.interaction.begin_request();
        self.scene.highlight(&Highlights::default());

        let authority = self.authority.clone();
        let limit = self.config.request_timeout;
        let side = request.player_side;
        log::info!("Requesting new game as {} ({:?})", side, request.difficulty);
        self.tasks.spawn(async move {
            let result = within(limit, authority.new_game(request)).await;
            Completion::NewGame { side, result }
        });
        self.render();
    }

    fn on_new_game(&mut self, side: Side, result: Result<GameState, ClientError>) {
        self.request = None;
        self.interaction.submission_resolved();
        match result {
            Ok(state) => {
                log::info!("Game {} started, playing {}", state.game_id, side);
                self.local = side;
                self.apply(state, Origin::Rebase);
            }
            Err(err) => {
                log::warn!("New game failed: {}", err);
                self.view.notify(&Notification::NetworkError);
                self.render();
            }
        }
    }

    fn request_undo(&mut self) {
        let Some(game_id) = self.game_id() else {
            log::debug!("Undo ignored: no game loaded");
            return;
        };
        if self.interaction.is_locked() || self.poller.is_active() || self.request.is_some() {
            log::debug!("Undo ignored: {}", ClientError::LocalValidation("board is busy"));
            return;
        }
        self.request = Some(PendingRequest::Undo);
        self.interaction.begin_request();
        self.scene.highlight(&Highlights::default());

        let authority = self.authority.clone();
        let limit = self.config.request_timeout;
        self.tasks
            .spawn(async move { Completion::Undo(undo_two_plies(authority, game_id, limit).await) });
        self.render();
    }

    fn on_undo(&mut self, result: UndoResult) {
        self.request = None;
        self.interaction.submission_resolved();
        if let Some(err) = &result.failure {
            log::info!("Undo stopped: {}", err);
            let note = match err {
                ClientError::RemoteRejection(reason) => Notification::UndoRejected(reason.clone()),
                _ => Notification::NetworkError,
            };
            self.view.notify(&note);
        }
        match result.state {
            Some(state) => self.apply(state, Origin::Rebase),
            None => self.render(),
        }
    }

    /// Make `next` the current snapshot and bring the scene, the input state
    /// and the poller in line with it.
    fn apply(&mut self, next: GameState, origin: Origin) {
        if self.slide.as_ref().is_some_and(|s| !s.is_settled()) {
            self.finish_slide(SlideSignal::Superseded);
        }
        self.slide = None;

        let (previous, should_animate) = match origin {
            Origin::Move => {
                let transition = self.store.replace(next);
                (transition.previous, transition.should_animate)
            }
            Origin::Rebase => (self.store.rebase(next), false),
        };
        let Some(state) = self.store.current() else {
            return;
        };

        self.interaction.sync_with(state);
        let report = self.scene.reconcile(state, should_animate, &Highlights::default());
        log::debug!(
            "Reconciled game {}: {} created, {} reused, {} destroyed",
            state.game_id,
            report.created.len(),
            report.reused.len(),
            report.destroyed.len()
        );

        if origin == Origin::Move {
            if let Some(prev) = previous.as_ref().filter(|p| p.game_id == state.game_id) {
                for effect in effects::dispatch(prev, state, self.local) {
                    log::debug!("Effect {:?}", effect);
                    self.view.play(effect);
                }
            }
        }

        if let Some(id) = report.captured {
            let fade = self.config.capture_fade;
            self.tasks.spawn(async move {
                sleep(fade).await;
                Completion::FadeElapsed(id)
            });
        }
        if let Some(plan) = report.slide {
            self.slide_serial += 1;
            self.slide = Some(SlideAnimation::new(self.slide_serial, plan));
            self.interaction.begin_animation();
        }

        self.render();
        self.start_slide();
        self.sync_poller();
    }

    /// Release the held element once its starting frame has been drawn.
    fn start_slide(&mut self) {
        let Some(slide) = self.slide.as_mut() else {
            return;
        };
        if !slide.start(&mut self.scene) {
            return;
        }
        let serial = slide.serial();
        let limit = self.config.effective_safety_timeout();
        self.tasks.spawn(async move {
            sleep(limit).await;
            Completion::SlideTimeout(serial)
        });
        self.render();
    }

    fn finish_slide(&mut self, signal: SlideSignal) -> bool {
        let Some(slide) = self.slide.as_mut() else {
            return false;
        };
        if !slide.finish(&mut self.scene, signal) {
            return false;
        }
        self.interaction.end_animation();
        true
    }

    /// Poll while the opponent is to move in a live game, otherwise stop.
    fn sync_poller(&mut self) {
        let waiting = self
            .store
            .current()
            .filter(|s| s.is_live() && s.turn != self.local)
            .map(|s| s.game_id.clone());
        let Some(game_id) = waiting else {
            self.poller.cancel();
            return;
        };
        let authority = self.authority.clone();
        let local = self.local;
        let interval = self.config.poll_interval;
        let limit = self.config.request_timeout;
        let tasks = &mut self.tasks;
        let token = self.poller.start(|token| {
            tasks.spawn(async move {
                let state = poll_until_turn(authority, game_id, local, interval, limit).await;
                Completion::Poll { token, state }
            })
        });
        log::debug!("Waiting for the opponent, poll loop {:?}", token);
    }

    fn render(&mut self) {
        let frame = Frame {
            state: self.store.current(),
            interaction: &self.interaction,
            scene: &self.scene,
            slide: self.slide.as_ref(),
        };
        self.view.render(&frame);
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.poller.cancel();
        self.tasks.abort_all();
        log::info!("[GameClient] Torn down");
    }

    fn game_id(&self) -> Option<GameId> {
        self.store.current().map(|s| s.game_id.clone())
    }
}

/// Run one authority call under the request timeout.
async fn within<T, F>(limit: Duration, call: F) -> Result<T, ClientError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ClientError::TransportFailure(e.to_string())),
        Err(_) => Err(ClientError::TransportFailure(format!("no response after {:?}", limit))),
    }
}

/// Two single-ply undo calls. Stops at the first refusal, keeping whatever
/// the first call already took back.
async fn undo_two_plies(authority: Arc<dyn MoveAuthority>, game_id: GameId, limit: Duration) -> UndoResult {
    let mut state = None;
    for ply in 1..=2 {
        match within(limit, authority.undo(&game_id)).await {
            Ok(MoveOutcome::Accepted(next)) => state = Some(next),
            Ok(MoveOutcome::Rejected { reason }) => {
                log::info!("Undo of ply {} rejected: {}", ply, reason);
                return UndoResult {
                    state,
                    failure: Some(ClientError::RemoteRejection(reason)),
                };
            }
            Err(err) => {
                log::warn!("Undo of ply {} failed: {}", ply, err);
                return UndoResult {
                    state,
                    failure: Some(err),
                };
            }
        }
    }
    UndoResult { state, failure: None }
}
