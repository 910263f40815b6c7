//! Main entry point for the card-lobby service
//!
//! Loads configuration, initializes logging, serves the lobby API and
//! monitoring routes on one listener, and shuts down gracefully on SIGINT or
//! SIGTERM.

use anyhow::Result;
use card_lobby::api::create_router;
use card_lobby::config::{validate_config, AppConfig};
use card_lobby::service::{AppState, HealthCheck};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::oneshot;
use tokio::time::Duration;
use tracing::{error, info, warn};

/// Card Lobby - multiplayer card-game lobby coordinator
#[derive(Parser)]
#[command(
    name = "card-lobby",
    version,
    about = "HTTP coordinator for multiplayer card-game lobbies",
    long_about = "Card Lobby creates lobbies backed by a remote shuffled-deck service, admits \
                 players, deals two-card hands, hands out single draws and walks each lobby \
                 through preflop, flop, turn, river and showdown."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Probe a running instance and exit
    #[arg(long, help = "Query /ready on a running instance and exit with its status")]
    health_check: bool,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Bind host override
    #[arg(long, value_name = "HOST", help = "Override HTTP bind host")]
    host: Option<String>,

    /// HTTP port override
    #[arg(long, value_name = "PORT", help = "Override HTTP server port")]
    http_port: Option<u16>,

    /// Deck API base override
    #[arg(long, value_name = "URL", help = "Override deck service base URL")]
    deck_api_base: Option<String>,

    /// Reject repeated game starts
    #[arg(long, help = "Reject start_game on a lobby that already started")]
    no_redeal: bool,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Query a running instance's readiness endpoint
async fn perform_health_check(config: &AppConfig) -> Result<bool> {
    let host = match config.service.host.as_str() {
        "0.0.0.0" => "127.0.0.1",
        host => host,
    };
    let url = format!("http://{}:{}/ready", host, config.service.http_port);
    info!("Performing health check against {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;

    match client.get(&url).send().await {
        Ok(response) => {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            println!("Health Check: {} {}", status.as_u16(), body);
            Ok(status.is_success())
        }
        Err(e) => {
            println!("Health Check: unreachable ({})", e);
            Ok(false)
        }
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Log a health summary every 30 seconds
async fn health_check_task(app_state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(30));

    while app_state.is_running().await {
        interval.tick().await;

        match HealthCheck::check(app_state.clone()).await {
            Ok(health) => {
                info!(
                    "Health check: {} - {} active lobbies, {} seated players, {} games started",
                    health.status,
                    health.stats.active_lobbies,
                    health.stats.seated_players,
                    health.stats.games_started
                );
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
            }
        }
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🃏 Card Lobby Service v{}", card_lobby::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Listening on: {}", config.bind_address());
    info!("   Deck API: {}", config.deck.base_url);
    info!("   Deck timeout: {}ms", config.deck.request_timeout_ms);
    info!("   Re-deal on restart: {}", config.lobby.allow_redeal);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load and merge configuration from file or environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(host) = &args.host {
        config.service.host = host.clone();
    }

    if let Some(http_port) = args.http_port {
        config.service.http_port = http_port;
    }

    if let Some(base_url) = &args.deck_api_base {
        config.deck.base_url = base_url.clone();
    }

    if args.no_redeal {
        config.lobby.allow_redeal = false;
    }

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.health_check {
        let healthy = perform_health_check(&config).await?;
        std::process::exit(if healthy { 0 } else { 1 });
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    info!("Initializing service components...");
    let app_state = match AppState::new(config.clone()).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    let listener = match TcpListener::bind(config.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {}", config.bind_address(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    let health_task = {
        let app_state = app_state.clone();
        tokio::spawn(async move {
            health_check_task(app_state).await;
        })
    };

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let router = create_router(app_state.clone());
    let mut server_task = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
                info!("HTTP server shutdown signal received");
            })
            .await
    });

    info!("✅ Card Lobby Service is running on {}", config.bind_address());
    info!("Press Ctrl+C to shutdown gracefully...");

    let exited_early = tokio::select! {
        _ = wait_for_shutdown_signal() => false,
        result = &mut server_task => {
            match result {
                Ok(Ok(())) => warn!("HTTP server exited before a shutdown signal"),
                Ok(Err(e)) => error!("HTTP server failed: {}", e),
                Err(e) => error!("HTTP server task panicked: {}", e),
            }
            true
        }
    };

    info!("🛑 Beginning graceful shutdown...");
    health_task.abort();

    if !exited_early {
        let _ = shutdown_tx.send(());

        // In-flight requests get until the timeout to finish
        match tokio::time::timeout(config.shutdown_timeout(), &mut server_task).await {
            Ok(Ok(Ok(()))) => info!("✅ HTTP server drained"),
            Ok(Ok(Err(e))) => error!("HTTP server error during shutdown: {}", e),
            Ok(Err(e)) => error!("HTTP server task failed during shutdown: {}", e),
            Err(_) => {
                warn!("⚠️  Shutdown timeout exceeded, aborting open connections");
                server_task.abort();
            }
        }
    }

    if let Err(e) = app_state.shutdown().await {
        warn!("Service shutdown reported an error: {}", e);
    }

    info!("🛑 Card Lobby Service stopped");

    if exited_early {
        std::process::exit(1);
    }
    Ok(())
}
