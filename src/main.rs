#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use std::sync::Arc;

#[cfg(feature = "std")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "std")]
use tokio::io::{AsyncBufReadExt, BufReader};
#[cfg(feature = "std")]
use tokio::sync::mpsc;
#[cfg(feature = "std")]
use tokio::time::Duration;
#[cfg(feature = "std")]
use xiangqi_sync::{
    init_logging, parse_input, AuthorityStub, ClientConfig, Difficulty, GameClient,
    NewGameRequest, Side, TcpTransport, TerminalView, ViewEvent,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[cfg(feature = "std")]
enum SideArg {
    Red,
    Black,
}

#[cfg(feature = "std")]
impl From<SideArg> for Side {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Red => Side::Red,
            SideArg::Black => Side::Black,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[cfg(feature = "std")]
enum DifficultyArg {
    Easy,
    Normal,
    Hard,
}

#[cfg(feature = "std")]
impl From<DifficultyArg> for Difficulty {
    fn from(difficulty: DifficultyArg) -> Self {
        match difficulty {
            DifficultyArg::Easy => Difficulty::Easy,
            DifficultyArg::Normal => Difficulty::Normal,
            DifficultyArg::Hard => Difficulty::Hard,
        }
    }
}

#[derive(Parser)]
#[cfg(feature = "std")]
enum Commands {
    /// Play against a move authority reached over TCP.
    Play {
        #[arg(long, default_value = "127.0.0.1:8080")]
        connect: String,
        #[arg(long, value_enum, default_value_t = SideArg::Red)]
        side: SideArg,
        #[arg(long, value_enum, default_value_t = DifficultyArg::Normal)]
        difficulty: DifficultyArg,
        #[arg(long, default_value_t = 1000, help = "Interval between turn polls in milliseconds")]
        poll_ms: u64,
        #[arg(long, default_value_t = 500, help = "Duration of a piece slide in milliseconds")]
        slide_ms: u64,
        #[arg(long, default_value_t = 10, help = "Give up on a request after this many seconds")]
        timeout_secs: u64,
    },
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            connect,
            side,
            difficulty,
            poll_ms,
            slide_ms,
            timeout_secs,
        } => {
            let config = ClientConfig {
                poll_interval: Duration::from_millis(poll_ms),
                slide_duration: Duration::from_millis(slide_ms),
                slide_safety_timeout: Duration::from_millis(slide_ms + 20),
                request_timeout: Duration::from_secs(timeout_secs),
                ..ClientConfig::default()
            };
            let request = NewGameRequest {
                player_side: side.into(),
                difficulty: difficulty.into(),
            };

            println!("Connecting to move authority at {}...", connect);
            let tcp = TcpTransport::connect(&connect).await?;
            println!("Connected. Enter a square (e.g. B7) to select or move, 'new', 'undo' or 'quit'.");

            let (tx, rx) = mpsc::channel(64);
            let view = TerminalView::new(std::io::stdout(), tx.clone(), config.slide_duration);
            let client = GameClient::new(
                Arc::new(AuthorityStub::new(tcp)),
                Box::new(view),
                rx,
                config,
                request.player_side,
            );
            tx.send(ViewEvent::NewGame(request)).await?;

            let input = tokio::spawn(read_input(tx, request));
            if let Err(e) = client.run().await {
                eprintln!("Session ended with an error: {}", e);
            }
            input.abort();
        }
    }
    Ok(())
}

/// Forward stdin lines to the client until it goes away or input ends.
#[cfg(feature = "std")]
async fn read_input(tx: mpsc::Sender<ViewEvent>, request: NewGameRequest) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_input(&line, request) {
            Ok(Some(event)) => {
                let quit = event == ViewEvent::Teardown;
                if tx.send(event).await.is_err() || quit {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("Invalid input: {}", e),
        }
    }
    let _ = tx.send(ViewEvent::Teardown).await;
    Ok(())
}
