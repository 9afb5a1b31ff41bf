#![cfg(feature = "std")]

use std::fmt::Write as _;
use std::io::Write;

use tokio::sync::mpsc;
use tokio::time::Duration;

use crate::animation::AnimationPhase;
use crate::client_node::{Frame, View, ViewEvent};
use crate::common::Notification;
use crate::config::{COLS, ROWS};
use crate::domain::Square;
use crate::effects::{Effect, Outcome};
use crate::interaction::{Phase, TargetTag};
use crate::protocol::NewGameRequest;

/// Parse a square written as column letter plus row digit, e.g. `E3`.
pub fn parse_square(input: &str) -> Result<Square, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("Empty input".to_string());
    }
    let mut chars = input.chars();
    let col_ch = chars.next().ok_or("No column letter")?.to_ascii_uppercase();
    if !col_ch.is_ascii_alphabetic() {
        return Err(format!("Invalid column '{}' - must be a letter A-I", col_ch));
    }
    let col = (col_ch as u8).wrapping_sub(b'A');
    if col >= COLS {
        return Err(format!("Column '{}' out of bounds - must be A-I", col_ch));
    }
    let row_str: String = chars.collect();
    let row: u8 = row_str
        .parse()
        .map_err(|_| format!("Invalid row '{}' - must be a number 0-9", row_str))?;
    Square::new(row, col).map_err(|e| e.to_string())
}

/// Turn one line of player input into a view event. Blank lines yield nothing.
pub fn parse_input(line: &str, new_game: NewGameRequest) -> Result<Option<ViewEvent>, String> {
    let line = line.trim();
    match line.to_ascii_lowercase().as_str() {
        "" => Ok(None),
        "new" => Ok(Some(ViewEvent::NewGame(new_game))),
        "undo" => Ok(Some(ViewEvent::Undo)),
        "quit" | "exit" => Ok(Some(ViewEvent::Teardown)),
        _ => parse_square(line).map(|sq| Some(ViewEvent::Click(sq))),
    }
}

/// Draw the board as text. Selected piece in brackets, capture targets in
/// parentheses, empty move targets as `+`, the last move's piece marked `*`.
pub fn render_board(frame: &Frame<'_>) -> String {
    let mut out = String::new();
    let _ = write!(out, "   ");
    for c in 0..COLS {
        let _ = write!(out, "  {} ", (b'A' + c) as char);
    }
    let _ = writeln!(out);
    for row in 0..ROWS {
        let _ = write!(out, "{:2} ", row);
        for col in 0..COLS {
            let Ok(sq) = Square::new(row, col) else {
                continue;
            };
            let cell = match frame.scene.element_at(sq) {
                Some(el) if el.flags.selected => format!("[{}]", el.code.glyph()),
                Some(el) if el.flags.capture_target => format!("({})", el.code.glyph()),
                Some(el) if el.flags.last_move_target => format!("*{} ", el.code.glyph()),
                Some(el) => format!(" {} ", el.code.glyph()),
                None if frame.interaction.target_tag(sq) == Some(TargetTag::Move) => " + ".to_string(),
                None => " . ".to_string(),
            };
            let _ = write!(out, "{} ", cell);
        }
        let _ = writeln!(out);
        if row == 4 {
            let _ = writeln!(out, "   {:^35}", "~~ river ~~");
        }
    }
    if let Some(state) = frame.state {
        let _ = write!(out, "{} to move, {:?}", state.turn, state.status);
        if let Some(side) = state.in_check {
            let _ = write!(out, " ({} in check)", side);
        }
        if let Some(reason) = &state.end_reason {
            let _ = write!(out, " - {}", reason);
        }
        let _ = writeln!(out);
    }
    if frame.interaction.phase() == Phase::Locked {
        let _ = writeln!(out, "Waiting...");
    }
    out
}

/// Text view. Terminals cannot animate, so a playing slide is reported
/// finished once its nominal duration has passed.
pub struct TerminalView<W: Write + Send> {
    out: W,
    events: mpsc::Sender<ViewEvent>,
    slide_duration: Duration,
    announced_slide: Option<u64>,
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W, events: mpsc::Sender<ViewEvent>, slide_duration: Duration) -> Self {
        Self {
            out,
            events,
            slide_duration,
            announced_slide: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> View for TerminalView<W> {
    fn render(&mut self, frame: &Frame<'_>) {
        if let Some(slide) = frame.slide {
            match slide.phase() {
                // the held frame looks identical to the last one on a terminal
                AnimationPhase::Pending => return,
                AnimationPhase::Playing if self.announced_slide != Some(slide.serial()) => {
                    self.announced_slide = Some(slide.serial());
                    let events = self.events.clone();
                    let element = slide.element();
                    let delay = self.slide_duration;
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = events.send(ViewEvent::TransitionFinished(element)).await;
                    });
                }
                _ => {}
            }
        }
        let _ = writeln!(self.out, "\n{}", render_board(frame));
        let _ = self.out.flush();
    }

    fn notify(&mut self, notification: &Notification) {
        let _ = writeln!(self.out, "!! {}", notification);
    }

    fn play(&mut self, effect: Effect) {
        let line = match effect {
            Effect::MoveCue => return,
            Effect::CaptureCue => "Capture!".to_string(),
            Effect::Check(side) => format!("{} is in check!", side),
            Effect::Outcome(Outcome::Win) => "VICTORY! You won the game.".to_string(),
            Effect::Outcome(Outcome::Lose) => "DEFEAT. You lost the game.".to_string(),
            Effect::Outcome(Outcome::Draw) => "The game is drawn.".to_string(),
        };
        let _ = writeln!(self.out, "{}", line);
    }
}
