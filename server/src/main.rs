use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use farm_core::files::FileCache;
use farm_core::SqliteStore;

use farm_server::args::ServerConfig;
use farm_server::broker::Broker;
use farm_server::state::AppState;
use farm_server::{static_files, ws};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = ServerConfig::parse();
    info!("farmd {} starting on {}", VERSION, config.listen_address);

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    let state = AppState {
        store,
        broker: Arc::new(Broker::new()),
        files: Arc::new(FileCache::new(&config.public_root)),
    };

    let app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .route("/main", get(static_files::get_main))
        .route("/", get(static_files::get_root))
        .route("/*path", get(static_files::get_path))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_address).await?;
    let shutdown = setup_shutdown_signal();

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

/// Listens for SIGTERM and SIGINT (Ctrl+C) and triggers the returned
/// `CancellationToken` when either is received.
fn setup_shutdown_signal() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to register SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
    });

    token
}
