//! # Tally Terminal Library
//!
//! The presentation layer of Tally: a line-oriented JSON front end over the
//! shared catalog, checkout processor and sales ledger.
//!
//! ## Module Organization
//! ```text
//! tally_terminal/
//! ├── lib.rs          ◄─── You are here (startup, read/dispatch/write loop)
//! ├── protocol.rs     ◄─── Request / response line format
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState + exports
//! │   ├── config.rs   ◄─── Configuration state
//! │   ├── store.rs    ◄─── Catalog, ledger, processor, authenticator
//! │   └── session.rs  ◄─── One CheckoutSession per login
//! ├── commands/
//! │   ├── mod.rs      ◄─── Dispatch + role checks
//! │   ├── auth.rs     ◄─── login / logout
//! │   ├── product.rs  ◄─── Search, inventory, restock
//! │   ├── cart.rs     ◄─── Cart manipulation
//! │   ├── sale.rs     ◄─── Checkout + receipts
//! │   ├── analytics.rs◄─── Sales summary / history
//! │   └── config.rs   ◄─── Configuration retrieval
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Streams
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  stdin ──► one JSON request per line ──► handle_line ──► stdout        │
//! │                                              │          one JSON        │
//! │                                              │          response        │
//! │                                              ▼          per line        │
//! │                                         tracing ──► stderr             │
//! │                                                                         │
//! │  stdout carries nothing but responses, so it can be piped straight     │
//! │  into a client.                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod protocol;
pub mod state;

use std::sync::Arc;

use tally_core::CoreError;
use tally_store::StoreError;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use protocol::Response;
use state::{AppState, ConfigState, StoreState};

/// Failures that stop the terminal from starting or serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid catalog: {0}")]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the terminal until stdin closes.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Terminal Startup                                  │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, to stderr                     │
/// │     • Default: info,tally=debug; override with RUST_LOG                 │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • Defaults, then TALLY_* environment variables                      │
/// │                                                                         │
/// │  3. Open Store ───────────────────────────────────────────────────────► │
/// │     • memory: sample catalog                                            │
/// │     • file: catalog.json + sales.jsonl in the data dir                  │
/// │     • An empty catalog is seeded with sample products                   │
/// │                                                                         │
/// │  4. Serve ────────────────────────────────────────────────────────────► │
/// │     • One response line per request line                                │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> Result<(), StartupError> {
    init_tracing();

    let config = ConfigState::from_env();
    info!(
        store = %config.store_name,
        terminal = %config.terminal_id,
        storage = ?config.storage,
        data_dir = %config.data_dir.display(),
        "Starting Tally terminal"
    );

    let store = StoreState::open(&config)?;
    let state = Arc::new(AppState::new(config, store));

    serve(state, BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    info!("Input closed, shutting down");
    Ok(())
}

/// Reads request lines from `reader` and writes one response line each to
/// `writer`. Blank lines are skipped.
pub async fn serve<R, W>(state: Arc<AppState>, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(&state, &line).await;
        let mut out = serde_json::to_string(&response)?;
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Handles one request line.
pub async fn handle_line(state: &Arc<AppState>, line: &str) -> Response {
    let envelope = match protocol::parse_line(line) {
        Ok(envelope) => envelope,
        Err((id, error)) => {
            debug!(error = %error, "Rejected request line");
            return Response::failure(id, error);
        }
    };

    let command = envelope.request.name();
    let result = commands::dispatch(state, envelope.session_id, envelope.request).await;
    if let Err(error) = &result {
        debug!(command, code = ?error.code, "Command failed");
    }
    Response::from_result(envelope.id, result)
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally_core=trace` - Show trace for the core crate only
/// - Default: INFO, DEBUG for tally crates
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tally=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
