//! # Tally Terminal Entry Point
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Terminal                                   │
//! │                                                                         │
//! │  client ──stdin──► ┌──────────────────────────────────────────────┐    │
//! │                    │  tally-terminal (this binary)                │    │
//! │  client ◄─stdout── │                                              │    │
//! │                    │  lib.rs ─────► logging, config, serve loop   │    │
//! │                    │  commands/ ──► login, add_to_cart, checkout  │    │
//! │  logs   ◄─stderr── │  state/ ─────► ConfigState, StoreState,      │    │
//! │                    │                SessionState                  │    │
//! │                    └──────────────────────────────────────────────┘    │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                    memory, or catalog.json + sales.jsonl               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Session
//! ```text
//! $ TALLY_STORAGE=file tally-terminal
//! {"id":1,"command":"login","username":"cashier","password":"cashier"}
//! {"id":2,"sessionId":"…","command":"add_to_cart","productId":1,"quantity":2}
//! {"id":3,"sessionId":"…","command":"checkout"}
//! ```

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // The actual setup is in lib.rs for better testability
    match tally_terminal::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Terminal stopped");
            ExitCode::FAILURE
        }
    }
}
