//! Lobby Tester CLI Tool
//!
//! Command-line client for poking at a running card-lobby server.
//!
//! Usage:
//!   cargo run --bin lobby-tester -- --help
//!   cargo run --bin lobby-tester create
//!   cargo run --bin lobby-tester join --lobby a1b2c3 --player Alice
//!   cargo run --bin lobby-tester next-phase --lobby a1b2c3
//!   cargo run --bin lobby-tester run-scenario --players Alice,Bob,Carol

use anyhow::{anyhow, Result};
use card_lobby::api::{
    CreateLobbyResponse, DrawCardResponse, ErrorResponse, LobbyView, MessageResponse,
    NextPhaseResponse,
};
use card_lobby::types::{Card, Phase};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "lobby-tester")]
#[command(about = "Drive a running card-lobby server over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the card-lobby server
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    server: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new lobby
    Create,
    /// Join a player to a lobby
    Join {
        #[arg(short, long)]
        lobby: String,
        #[arg(short, long)]
        player: String,
    },
    /// Start the game in a lobby
    Start {
        #[arg(short, long)]
        lobby: String,
    },
    /// Show a player's hand
    Hand {
        #[arg(short, long)]
        player: String,
        /// Restrict the lookup to one lobby
        #[arg(short, long)]
        lobby: Option<String>,
    },
    /// Draw one card for a player
    Draw {
        #[arg(short, long)]
        lobby: String,
        #[arg(short, long)]
        player: String,
    },
    /// Advance a lobby to its next phase
    NextPhase {
        #[arg(short, long)]
        lobby: String,
    },
    /// Show a lobby overview
    Show {
        #[arg(short, long)]
        lobby: String,
    },
    /// Play one lobby from creation to showdown
    RunScenario {
        /// Comma separated player names
        #[arg(short, long, value_delimiter = ',', default_value = "Alice,Bob")]
        players: Vec<String>,
    },
    /// Show service statistics
    Stats,
}

struct LobbyTester {
    client: Client,
    server: String,
}

impl LobbyTester {
    fn new(server: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            server: server.trim_end_matches('/').to_string(),
        })
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => "no error body".to_string(),
        };
        Err(anyhow!("{} {}", status.as_u16(), message))
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.server, path))
            .json(&body)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.server, path))
            .send()
            .await?;
        Self::read(response).await
    }

    async fn create(&self) -> Result<String> {
        let body: CreateLobbyResponse = self.post("/create_lobby", json!({})).await?;
        Ok(body.lobby_code)
    }

    async fn join(&self, lobby: &str, player: &str) -> Result<String> {
        let body: MessageResponse = self
            .post(
                "/join_lobby",
                json!({"lobby_code": lobby, "player_name": player}),
            )
            .await?;
        Ok(body.message)
    }

    async fn start(&self, lobby: &str) -> Result<String> {
        let body: MessageResponse = self
            .post("/start_game", json!({"lobby_code": lobby}))
            .await?;
        Ok(body.message)
    }

    async fn hand(&self, player: &str, lobby: Option<&str>) -> Result<Vec<Card>> {
        match lobby {
            Some(lobby) => self.get(&format!("/get_hand/{}/{}", lobby, player)).await,
            None => self.get(&format!("/get_hand/{}", player)).await,
        }
    }

    async fn draw(&self, lobby: &str, player: &str) -> Result<Card> {
        let body: DrawCardResponse = self
            .post(
                "/draw_card",
                json!({"lobby_code": lobby, "player_name": player}),
            )
            .await?;
        Ok(body.card_drawn)
    }

    async fn next_phase(&self, lobby: &str) -> Result<NextPhaseResponse> {
        self.post("/next_phase", json!({"lobby_code": lobby})).await
    }

    async fn show(&self, lobby: &str) -> Result<LobbyView> {
        self.get(&format!("/lobby/{}", lobby)).await
    }

    async fn stats(&self) -> Result<Value> {
        self.get("/stats").await
    }

    /// Create, join, start, draw once each and advance to showdown
    async fn run_scenario(&self, players: &[String]) -> Result<()> {
        let started = Instant::now();

        let lobby = self.create().await?;
        println!("🆕 Created lobby {}", lobby);

        for player in players {
            println!("👤 {}", self.join(&lobby, player).await?);
        }

        println!("🃏 {}", self.start(&lobby).await?);
        for player in players {
            let hand = self.hand(player, Some(&lobby)).await?;
            if hand.len() != 2 {
                return Err(anyhow!("{} was dealt {} cards", player, hand.len()));
            }
            println!("   {}: {}", player, format_cards(&hand));
        }

        for player in players {
            let card = self.draw(&lobby, player).await?;
            println!("   {} drew {}", player, card.code);
        }

        loop {
            let update = self.next_phase(&lobby).await?;
            println!(
                "➡️  {}: {}",
                update.state,
                format_cards(&update.community_cards)
            );
            if update.state == Phase::Showdown {
                if update.community_cards.len() != 5 {
                    return Err(anyhow!(
                        "showdown reached with {} community cards",
                        update.community_cards.len()
                    ));
                }
                break;
            }
        }

        println!(
            "✅ Scenario finished in {:.2}s",
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }
}

fn format_cards(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "-".to_string();
    }
    cards
        .iter()
        .map(|card| card.code.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let tester = LobbyTester::new(&cli.server, Duration::from_secs(cli.timeout))?;

    let outcome = match cli.command {
        Commands::Create => tester
            .create()
            .await
            .map(|code| println!("✅ Created lobby {}", code)),
        Commands::Join { lobby, player } => tester
            .join(&lobby, &player)
            .await
            .map(|message| println!("✅ {}", message)),
        Commands::Start { lobby } => tester
            .start(&lobby)
            .await
            .map(|message| println!("✅ {}", message)),
        Commands::Hand { player, lobby } => tester
            .hand(&player, lobby.as_deref())
            .await
            .map(|hand| println!("🃏 {}: {}", player, format_cards(&hand))),
        Commands::Draw { lobby, player } => tester
            .draw(&lobby, &player)
            .await
            .map(|card| println!("🃏 {} drew {} ({} of {})", player, card.code, card.value, card.suit)),
        Commands::NextPhase { lobby } => tester.next_phase(&lobby).await.map(|update| {
            println!(
                "➡️  {}: {}",
                update.state,
                format_cards(&update.community_cards)
            )
        }),
        Commands::Show { lobby } => tester.show(&lobby).await.map(|view| {
            println!("📋 Lobby {}", view.lobby_code);
            println!("   Phase: {} (started: {})", view.phase, view.started);
            println!("   Players: {}", view.players.join(", "));
            for (player, size) in &view.hand_sizes {
                println!("   {}: {} cards", player, size);
            }
            println!("   Community: {}", format_cards(&view.community_cards));
        }),
        Commands::RunScenario { players } => {
            if players.is_empty() {
                Err(anyhow!("at least one player is needed"))
            } else {
                tester.run_scenario(&players).await
            }
        }
        Commands::Stats => tester.stats().await.and_then(|stats| {
            println!("📊 {}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }),
    };

    if let Err(e) = outcome {
        eprintln!("❌ {}", e);
        eprintln!("💡 Is the server running at {}?", cli.server);
        std::process::exit(1);
    }

    Ok(())
}
