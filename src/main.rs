use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use climate_board::api::ApiClient;
use climate_board::config::ClientConfig;
use climate_board::game::deck::Deck;
use climate_board::game::driver::{
    BoardCommand, BoardDriver, BoardHandle, BoardNotice, GameBackend, OfflineBackend,
};
use climate_board::game::turn::BoardSession;
use climate_board::leaderboard::Leaderboard;
use climate_board::location::{FixedLocation, NoLocation};
use climate_board::metrics::{self, ClientMetrics};
use climate_board::session::{FileTokenStore, Session};

const HELP: &str = "\
Commands:
  spin         spin the wheel
  task         show the task for this square
  complete     complete the task (must be on site)
  chance       show the chance card
  claim        claim the chance card
  close        close any open card
  status       show the board
  leaderboard  show the top players
  quit         leave the game";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("cliMate board v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = ClientConfig::load_or_default();
    config.validate().map_err(anyhow::Error::msg)?;
    info!(
        "Configuration loaded: api={}, offline={}, threshold={}",
        config.api_base_url, config.offline, config.location_threshold
    );

    let metrics = Arc::new(ClientMetrics::new());

    if let Some(port) = config.metrics_port {
        let metrics = metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = metrics::start_metrics_server(metrics, port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    if config.offline {
        info!("Playing offline, progress will not be saved");
        let board = BoardSession::new(config.location_threshold, config.min_full_turns);
        run_board(&config, board, Deck::default(), Arc::new(OfflineBackend), metrics.clone(), None)
            .await?;
    } else {
        let client = Arc::new(connect(&config).await?);
        let user = client.me().await.context("Failed to load profile")?;
        let stats = user.usergamestats.clone().unwrap_or_default();
        let deck = Deck::new(client.tasks().await?, client.chances().await?);
        info!(
            "Welcome {}: {} tasks and {} chance cards loaded",
            user.username,
            deck.task_count(),
            deck.chance_count()
        );

        let board = BoardSession::restore(&stats, &deck, config.location_threshold, config.min_full_turns);
        run_board(&config, board, deck, client.clone(), metrics.clone(), Some(client)).await?;
    }

    info!("Session metrics: {:?}", metrics.snapshot());
    Ok(())
}

/// Log in unless a stored session is still present
async fn connect(config: &ClientConfig) -> anyhow::Result<ApiClient> {
    let session = match &config.token_file {
        Some(path) => Session::new(Arc::new(
            FileTokenStore::open(path).context("Failed to open token file")?,
        )),
        None => Session::in_memory(),
    };
    let client = ApiClient::new(config.api_base_url.clone(), session);

    if !client.session().is_authenticated() {
        match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                client.login(username, password).await.context("Login failed")?;
            }
            _ => anyhow::bail!(
                "Not logged in: set CLIMATE_USERNAME and CLIMATE_PASSWORD, or CLIMATE_OFFLINE=1"
            ),
        }
    }

    Ok(client)
}

async fn run_board<B: GameBackend>(
    config: &ClientConfig,
    board: BoardSession,
    deck: Deck,
    backend: Arc<B>,
    metrics: Arc<ClientMetrics>,
    client: Option<Arc<ApiClient>>,
) -> anyhow::Result<()> {
    let handle = match config.fixed_location {
        Some(sample) => BoardDriver::new(
            board,
            deck,
            backend,
            Arc::new(FixedLocation(sample)),
            config.clone(),
            metrics,
        )
        .spawn(),
        None => {
            warn!("No CLIMATE_LATITUDE/CLIMATE_LONGITUDE set, tasks can only be completed on Start");
            BoardDriver::new(board, deck, backend, Arc::new(NoLocation), config.clone(), metrics)
                .spawn()
        }
    };

    play(handle, client).await
}

async fn play(mut handle: BoardHandle, client: Option<Arc<ApiClient>>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match line.trim() {
                    "spin" => { handle.send(BoardCommand::Spin); }
                    "task" => { handle.send(BoardCommand::OpenTask); }
                    "complete" => { handle.send(BoardCommand::CompleteTask); }
                    "chance" => { handle.send(BoardCommand::OpenChance); }
                    "claim" => { handle.send(BoardCommand::ClaimChance); }
                    "close" => {
                        handle.send(BoardCommand::CloseTask);
                        handle.send(BoardCommand::CloseChance);
                    }
                    "status" => {
                        if let Some(snapshot) = handle.snapshot().await {
                            println!(
                                "On {} (square {}), score {}, gate {}, {}",
                                snapshot.square,
                                snapshot.position,
                                snapshot.score,
                                if snapshot.gate_open { "open" } else { "closed" },
                                if snapshot.can_spin { "ready to spin" } else { "task pending" },
                            );
                        }
                    }
                    "leaderboard" => show_leaderboard(client.as_deref()).await,
                    "help" => println!("{}", HELP),
                    "quit" | "exit" => break,
                    "" => {}
                    other => println!("Unknown command '{}', try 'help'", other),
                }
            }
            notice = handle.next_notice() => match notice {
                Some(notice) => println!("{}", describe(&notice)),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    if let Some(board) = handle.shutdown().await {
        info!("Left the board on {} with {} points", board.square().name, board.score());
    }
    Ok(())
}

async fn show_leaderboard(client: Option<&ApiClient>) {
    let Some(client) = client else {
        println!("Leaderboard is not available offline");
        return;
    };

    let ranked = match client.ranked_users().await {
        Ok(ranked) => ranked,
        Err(e) => {
            warn!("Failed to load leaderboard: {}", e);
            return;
        }
    };
    let me = match client.me().await {
        Ok(me) => me,
        Err(e) => {
            warn!("Failed to load profile: {}", e);
            return;
        }
    };

    let board = Leaderboard::build(&ranked, &me);
    for standing in &board.podium {
        println!("#{} {} ({} points)", standing.rank, standing.username, standing.score);
    }
    match board.position {
        Some(position) => println!("You are at position #{}", position),
        None => println!("You are not ranked yet"),
    }
    println!("Progress towards the leader: {:.0}%", board.progress);
}

fn describe(notice: &BoardNotice) -> String {
    match notice {
        BoardNotice::SpinStarted { .. } => "The wheel is spinning...".to_string(),
        BoardNotice::Landed {
            landing,
            square,
            task,
            chance,
        } => {
            let mut text = format!("Rolled a {} and moved to {}", landing.outcome.landed_number, square);
            if let Some(task) = task {
                text.push_str(&format!("\nTask: {} ({} points)", task.description, task.score_to_award));
            }
            if let Some(chance) = chance {
                text.push_str(&format!("\nChance: {} ({} points)", chance.description, chance.score_to_award));
            }
            if !landing.gate_open {
                text.push_str("\nGo to the square to complete the task");
            }
            text
        }
        BoardNotice::GateChanged { square, open: true } => format!("You are at {}", square),
        BoardNotice::GateChanged { square, open: false } => format!("You left {}", square),
        BoardNotice::TaskOpened {
            square,
            task,
            completable,
        } => {
            let description = task
                .as_ref()
                .map(|t| t.description.as_str())
                .unwrap_or("Explore the square");
            let hint = if *completable { "type 'complete' when done" } else { "get closer to complete it" };
            format!("{}: {} ({})", square, description, hint)
        }
        BoardNotice::TaskCompleted { points, score } => {
            format!("Task complete: +{} points, score {}", points, score)
        }
        BoardNotice::ChanceOpened { card } => match card {
            Some(card) => format!("Chance: {}", card.description),
            None => "No chance cards in the deck".to_string(),
        },
        BoardNotice::ChanceClaimed { points, score } => {
            format!("Chance claimed: +{} points, score {}", points, score)
        }
        BoardNotice::Refused(reason) => reason.to_string(),
    }
}
