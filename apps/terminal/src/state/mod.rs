//! # State Module
//!
//! Manages application state for the terminal.
//!
//! ## Why Multiple State Types?
//! Instead of one struct holding everything behind one lock, each concern
//! gets its own state type:
//!
//! 1. **Separation of Concerns**: Each state type has a single responsibility
//! 2. **Easier Testing**: States can be built individually
//! 3. **Reduced Contention**: Independent states don't block each other
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      AppState (Arc)                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                              │                                          │
//! │          ┌──────────────────┼──────────────────┐                       │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │ ConfigState  │  │ StoreState   │  │  SessionState    │              │
//! │  │              │  │              │  │                  │              │
//! │  │ store name   │  │ Catalog      │  │ one Checkout-    │              │
//! │  │ storage kind │  │ SalesLedger  │  │ Session per      │              │
//! │  │ data dir     │  │ Processor    │  │ login            │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • ConfigState: Read-only after initialization                         │
//! │  • StoreState: Catalog and ledger lock internally                      │
//! │  • SessionState: Map lock plus one Mutex per session                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod session;
mod store;

pub use config::{ConfigState, StorageKind};
pub use session::{lock_session, Session, SessionHandle, SessionState};
pub use store::StoreState;

/// Everything a command can reach.
#[derive(Debug)]
pub struct AppState {
    pub config: ConfigState,
    pub store: StoreState,
    pub sessions: SessionState,
}

impl AppState {
    pub fn new(config: ConfigState, store: StoreState) -> Self {
        AppState {
            config,
            store,
            sessions: SessionState::new(),
        }
    }
}
