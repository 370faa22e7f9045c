//! # Store State
//!
//! The process-wide domain objects every session shares.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  StoreState                                                            │
//! │                                                                         │
//! │  catalog: Arc<Catalog> ───────┬──► PricingEngine (quotes)              │
//! │                               └──► CheckoutProcessor ──► SalesLedger   │
//! │  ledger: Arc<SalesLedger> ────────────────────────────────┘            │
//! │  processor ──► Arc<dyn PersistenceStore> (MemoryStore | JsonFileStore) │
//! │  auth: Arc<dyn Authenticator>       (CredentialStore)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checkouts and admin stock adjustments both go through the processor,
//! which writes the catalog behind to the store one snapshot at a time.

use std::sync::Arc;

use tally_core::{
    Authenticator, Catalog, CheckoutProcessor, DateRange, PersistenceStore, PricingEngine, Product,
    ProductId, SalesLedger,
};
use tally_store::{seed, CredentialStore, JsonFileStore, MemoryStore};
use tracing::info;

use crate::error::ApiError;
use crate::state::config::{ConfigState, StorageKind};
use crate::StartupError;

pub struct StoreState {
    catalog: Arc<Catalog>,
    ledger: Arc<SalesLedger>,
    pricing: PricingEngine,
    processor: Arc<CheckoutProcessor>,
    auth: Arc<dyn Authenticator>,
}

impl std::fmt::Debug for StoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreState")
            .field("products", &self.catalog.len())
            .field("sales", &self.ledger.len())
            .finish_non_exhaustive()
    }
}

impl StoreState {
    /// Opens the configured store, seeding an empty catalog with the
    /// sample products, and rebuilds the ledger from stored sales.
    pub fn open(config: &ConfigState) -> Result<Self, StartupError> {
        let store: Arc<dyn PersistenceStore> = match config.storage {
            StorageKind::Memory => Arc::new(MemoryStore::new()),
            StorageKind::File => Arc::new(JsonFileStore::open(&config.data_dir)?),
        };
        let auth = Arc::new(seed::sample_users()?);
        Self::with_parts(store, auth)
    }

    /// Assembles state from explicit collaborators.
    pub fn with_parts(
        store: Arc<dyn PersistenceStore>,
        auth: Arc<dyn Authenticator>,
    ) -> Result<Self, StartupError> {
        let mut products = store.load_catalog()?;
        if products.is_empty() {
            products = seed::sample_products();
            store.save_catalog(&products)?;
            info!(products = products.len(), "Seeded empty catalog with sample data");
        }

        let catalog = Arc::new(Catalog::new(products)?);
        let ledger = Arc::new(SalesLedger::from_sales(store.load_sales(DateRange::all())?));
        let processor = Arc::new(
            CheckoutProcessor::new(Arc::clone(&catalog), Arc::clone(&ledger))
                .with_store(store),
        );

        info!(
            products = catalog.len(),
            sales = ledger.len(),
            "Store state ready"
        );

        Ok(StoreState {
            pricing: PricingEngine::new(Arc::clone(&catalog)),
            catalog,
            ledger,
            processor,
            auth,
        })
    }

    /// Sample catalog, in-memory store, sample users.
    pub fn in_memory() -> Result<Self, StartupError> {
        let auth: Arc<CredentialStore> = Arc::new(seed::sample_users()?);
        Self::with_parts(Arc::new(MemoryStore::new()), auth)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &SalesLedger {
        &self.ledger
    }

    pub fn pricing(&self) -> &PricingEngine {
        &self.pricing
    }

    pub fn processor(&self) -> &Arc<CheckoutProcessor> {
        &self.processor
    }

    pub fn auth(&self) -> &dyn Authenticator {
        self.auth.as_ref()
    }

    /// Applies a stock delta; the processor saves the catalog behind it.
    pub fn adjust_stock(&self, id: ProductId, delta: i64) -> Result<Product, ApiError> {
        Ok(self.processor.adjust_stock(id, delta)?)
    }
}
