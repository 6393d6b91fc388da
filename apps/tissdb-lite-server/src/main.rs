//! TissDB Lite Server - a JSON command server over a collection store.
//!
//! # Usage
//!
//! ```text
//! TISSDB_LITE_LISTEN=0.0.0.0:9877 tissdb-lite-server
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TISSDB_LITE_LISTEN` | `0.0.0.0:9877` | Bind address |
//! | `TISSDB_DATA_DIR` | `lite_data` | Directory holding `tissdb.json` |
//! | `TISSDB_PERSISTENCE` | `true` | Write every mutation to disk |
//! | `TISSDB_STRICT_LEXING` | `false` | Reject unrecognized characters in conditions |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

mod command;
mod service;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tissdb_lite_store::{Database, StoreConfig};

use crate::service::CommandService;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address.
const DEFAULT_LISTEN: &str = "0.0.0.0:9877";

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to `LOG_LEVEL`.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Run the accept loop until `shutdown` resolves, then drain connections.
async fn serve(
    listener: TcpListener,
    service: CommandService,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Resolve when Ctrl-C is received.
async fn ctrl_c() {
    tokio::signal::ctrl_c().await.ok();
    info!("received shutdown signal, draining connections");
}

/// Read the listen address from a key lookup.
fn listen_addr(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup("TISSDB_LITE_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_owned())
}

/// Read the log level from a key lookup.
fn log_level(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_owned())
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = |key: &str| std::env::var(key).ok();

    init_tracing(&log_level(env))?;

    let config = StoreConfig::from_env();
    let db = Database::open(&config)
        .with_context(|| format!("failed to open database in {}", config.data_dir.display()))?;
    let db = Arc::new(db);

    let listen = listen_addr(env);
    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("invalid bind address: {listen}"))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        %addr,
        persistence = config.persistence,
        strict_lexing = config.query.strict_lexing,
        version = VERSION,
        "starting TissDB Lite server",
    );

    serve(listener, CommandService::new(Arc::clone(&db)), ctrl_c()).await?;

    db.flush().context("failed to flush database on shutdown")?;
    Ok(())
}
