//! # tally-store: Storage and Credential Adapters for Tally
//!
//! Concrete implementations of the ports declared in `tally-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Data Flow                                  │
//! │                                                                         │
//! │  CheckoutProcessor (commit) / terminal login                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tally-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │  MemoryStore  │    │ JsonFileStore │    │ Credential   │  │   │
//! │  │   │  (memory.rs)  │    │  (file.rs)    │    │ Store        │  │   │
//! │  │   │               │    │               │    │ (argon2)     │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                               │   │
//! │  └────────────────────────────────┼───────────────────────────────┘   │
//! │                                   ▼                                     │
//! │            <data dir>/catalog.json + <data dir>/sales.jsonl            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`memory`] - In-process store
//! - [`file`] - JSON file store
//! - [`credentials`] - Password-checking authenticator
//! - [`seed`] - Sample products and users
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tally_core::PersistenceStore;
//! use tally_store::{seed, JsonFileStore};
//!
//! let store = JsonFileStore::open("./tally-data")?;
//! if !store.has_catalog() {
//!     store.save_catalog(&seed::sample_products())?;
//! }
//! let products = store.load_catalog()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod credentials;
pub mod error;
pub mod file;
pub mod memory;
pub mod seed;

// =============================================================================
// Re-exports
// =============================================================================

pub use credentials::CredentialStore;
pub use error::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
