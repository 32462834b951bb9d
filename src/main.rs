//! FlashSession - An In-Memory Expiring Session Store
//!
//! This is the entry point for the demo session server. It sets up the
//! session store, its expiry sweeper and the TCP listener.

use flashsession::commands::{ClientSession, CommandHandler};
use flashsession::config::{Action, Config, IdStrategy};
use flashsession::connection::{handle_connection, ConnectionStats};
use flashsession::id::{IdGenerator, RandomGenerator, SequentialGenerator};
use flashsession::storage::{ExpiryConfig, ManagedStore, MemoryStore, RecordStore, StoreConfig};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn print_help() {
    println!(
        r#"
FlashSession - An In-Memory Expiring Session Store

USAGE:
    flashsession [OPTIONS]

OPTIONS:
    -h, --host <HOST>              Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>              Port to listen on (default: 7070)
        --ttl <SECS>               Session lifetime in seconds (default: 3600)
        --sweep-interval <SECS>    Seconds between expiry sweeps (default: 3600)
        --id-size <BYTES>          Random bytes per session id (default: 32)
        --sequential               Use sequential session ids
    -v, --version                  Print version information
        --help                     Print this help message

ENVIRONMENT:
    FLASHSESSION_HOST, FLASHSESSION_PORT, FLASHSESSION_TTL_SECS,
    FLASHSESSION_SWEEP_INTERVAL_SECS, FLASHSESSION_ID_SIZE
    Command-line options take precedence. RUST_LOG sets the log filter.

PROTOCOL (one request per line):
    PING                           -> PONG
    VISIT [token]                  -> OK <token> visits=<n> user=<name|->
    LOGIN <token> <user> [name]    -> OK <token> user=<name>
    WHOAMI <token>                 -> OK <name> | ERR no session
    LOGOUT <token>                 -> OK
    SESSIONS                       -> OK <count>
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_env().parse_args(std::env::args().skip(1)) {
        Ok(Action::Serve(config)) => config,
        Ok(Action::Help) => {
            print_help();
            return Ok(());
        }
        Ok(Action::Version) => {
            println!("FlashSession version {}", flashsession::VERSION);
            return Ok(());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            print_help();
            std::process::exit(1);
        }
    };

    // Set up logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    info!(
        version = flashsession::VERSION,
        ttl_secs = config.session_ttl.as_secs(),
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "Starting FlashSession"
    );

    match config.ids {
        IdStrategy::Random { size } => serve(&config, RandomGenerator::with_size(size)).await,
        IdStrategy::Sequential => serve(&config, SequentialGenerator::new()).await,
    }
}

/// Builds the store for `generator` and serves until Ctrl+C.
async fn serve<G>(config: &Config, generator: G) -> anyhow::Result<()>
where
    G: IdGenerator + 'static,
{
    let store = MemoryStore::<G, ClientSession>::with_config(
        generator,
        StoreConfig {
            default_ttl: config.session_ttl,
        },
    );

    // The sweeper runs for as long as the managed store lives
    let managed = ManagedStore::start(
        store,
        ExpiryConfig {
            interval: config.sweep_interval,
        },
    );

    let stats = Arc::new(ConnectionStats::new());

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("Listening on {}", config.bind_address());

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping server...");
    };

    tokio::select! {
        _ = accept_loop(listener, managed.store(), Arc::clone(&stats)) => {}
        _ = shutdown => {}
    }

    info!(
        sessions = managed.len(),
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        requests = stats.requests_processed.load(Ordering::Relaxed),
        "Server shutdown complete"
    );
    managed.shutdown().await;

    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop<S>(listener: TcpListener, store: Arc<S>, stats: Arc<ConnectionStats>)
where
    S: RecordStore<Payload = ClientSession> + 'static,
{
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = CommandHandler::new(Arc::clone(&store));
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
