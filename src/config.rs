use core::time::Duration;

pub const ROWS: u8 = 10;
pub const COLS: u8 = 9;

/// Pixel size of one grid cell.
pub const CELL_SIZE: i32 = 64;
/// Margin between the board edge and the outermost grid line.
pub const BOARD_PAD: i32 = 32;
/// Rendered piece diameter, 82% of a cell.
pub const PIECE_SIZE: i32 = (CELL_SIZE * 82 + 50) / 100;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_SLIDE_DURATION: Duration = Duration::from_millis(500);
/// Slightly longer than the slide so a missing finished signal never wins the race.
pub const DEFAULT_SLIDE_SAFETY_TIMEOUT: Duration = Duration::from_millis(520);
pub const DEFAULT_CAPTURE_FADE: Duration = Duration::from_millis(180);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Timing knobs for a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    pub poll_interval: Duration,
    pub slide_duration: Duration,
    pub slide_safety_timeout: Duration,
    pub capture_fade: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            slide_duration: DEFAULT_SLIDE_DURATION,
            slide_safety_timeout: DEFAULT_SLIDE_SAFETY_TIMEOUT,
            capture_fade: DEFAULT_CAPTURE_FADE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// The safety timeout never fires before the slide could have finished.
    pub fn effective_safety_timeout(&self) -> Duration {
        self.slide_safety_timeout.max(self.slide_duration)
    }
}
