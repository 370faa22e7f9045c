//! # Checkout Processor
//!
//! Turns a cart into a committed sale, atomically with respect to every
//! other checkout sharing the same catalog.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  checkout(session, key?)                                               │
//! │       │                                                                 │
//! │       ├── no key and no lines? ─────────────────────► EmptyCart        │
//! │       ▼                                                                 │
//! │  ┌─────────── catalog lock (Catalog::transact) ────────────────────┐  │
//! │  │  key seen, cart empty or same lines? ───────► replay that sale  │  │
//! │  │  key seen, different lines? ────────────────► KeyReused         │  │
//! │  │  no lines? ─────────────────────────────────► EmptyCart         │  │
//! │  │  shortfalls(lines) non-empty? ──────────────► InsufficientStock │  │
//! │  │  price lines at current catalog prices                          │  │
//! │  │  decrement_all(lines)                                            │  │
//! │  │  ledger.record_sale(..) ──► Sale #n                              │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  session: cart cleared, state = Committed{n}                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  store.append_sale / store.save_catalog (failures logged only)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lock order is catalog, then idempotency table, then ledger. No I/O
//! happens while any of them is held.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult};
use crate::ledger::SalesLedger;
use crate::ports::PersistenceStore;
use crate::pricing::CartQuote;
use crate::session::CheckoutSession;
use crate::types::{IdempotencyKey, PendingSale, Product, ProductId, Sale};

enum Outcome {
    Committed(Sale),
    Replayed(Sale),
}

/// Shared by every session of a process.
pub struct CheckoutProcessor {
    catalog: Arc<Catalog>,
    ledger: Arc<SalesLedger>,
    replays: Mutex<HashMap<IdempotencyKey, Sale>>,
    store: Option<Arc<dyn PersistenceStore>>,
    // Serializes snapshot + save so an older snapshot never overwrites a newer one.
    persist_lock: Mutex<()>,
}

impl fmt::Debug for CheckoutProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutProcessor")
            .field("catalog", &self.catalog)
            .field("ledger", &self.ledger)
            .field("has_store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

impl CheckoutProcessor {
    pub fn new(catalog: Arc<Catalog>, ledger: Arc<SalesLedger>) -> Self {
        CheckoutProcessor {
            catalog,
            ledger,
            replays: Mutex::new(HashMap::new()),
            store: None,
            persist_lock: Mutex::new(()),
        }
    }

    /// Writes every committed sale and the resulting catalog to `store`.
    pub fn with_store(mut self, store: Arc<dyn PersistenceStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn ledger(&self) -> &Arc<SalesLedger> {
        &self.ledger
    }

    /// Checks out a session's cart.
    ///
    /// On success the cart is cleared and the session moves to
    /// `Committed`. On failure the cart is untouched and the session is
    /// `Rejected`.
    ///
    /// ## Errors
    /// - `EmptyCart` if the cart has no lines
    /// - `InsufficientStock` listing every line that cannot be filled
    /// - `ProductNotFound` if a line's product has left the catalog
    /// - `IdempotencyKeyReused` if `key` already committed a sale and the
    ///   cart holds anything other than that sale's lines
    ///
    /// Keys are shared by every session of the process.
    pub fn checkout(
        &self,
        session: &mut CheckoutSession,
        key: Option<&IdempotencyKey>,
    ) -> CoreResult<Sale> {
        session.begin_validation();
        match self.run(session.cart(), key) {
            Ok(Outcome::Committed(sale)) => {
                session.commit(sale.id);
                self.persist(Some(&sale));
                Ok(sale)
            }
            Ok(Outcome::Replayed(sale)) => {
                session.commit(sale.id);
                Ok(sale)
            }
            Err(err) => {
                session.reject();
                Err(err)
            }
        }
    }

    /// Checks out a bare cart, clearing it on success.
    pub fn checkout_cart(&self, cart: &mut Cart, key: Option<&IdempotencyKey>) -> CoreResult<Sale> {
        match self.run(cart, key)? {
            Outcome::Committed(sale) => {
                cart.clear();
                self.persist(Some(&sale));
                Ok(sale)
            }
            Outcome::Replayed(sale) => {
                cart.clear();
                Ok(sale)
            }
        }
    }

    fn lock_replays(&self) -> MutexGuard<'_, HashMap<IdempotencyKey, Sale>> {
        self.replays.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run(&self, cart: &Cart, key: Option<&IdempotencyKey>) -> CoreResult<Outcome> {
        if key.is_none() && cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let result = self.catalog.transact(|tx| {
            let mut replays = self.lock_replays();
            if let Some(k) = key {
                if let Some(sale) = replays.get(k) {
                    if cart.is_empty() || same_lines(cart, sale) {
                        return Ok(Outcome::Replayed(sale.clone()));
                    }
                    return Err(CoreError::IdempotencyKeyReused(k.as_str().to_string()));
                }
            }
            if cart.is_empty() {
                return Err(CoreError::EmptyCart);
            }

            let shortfalls = tx.shortfalls(cart.lines())?;
            if !shortfalls.is_empty() {
                return Err(CoreError::InsufficientStock(shortfalls));
            }

            let quote = CartQuote::build(cart, |id| tx.find(id).cloned())?;
            tx.decrement_all(cart.lines())?;

            let sale = self.ledger.record_sale(PendingSale {
                timestamp: Utc::now(),
                channel: quote.channel,
                lines: quote.sale_lines(),
                subtotal: quote.subtotal,
                discount: quote.discount,
                total: quote.total,
            });
            if let Some(k) = key {
                replays.insert(k.clone(), sale.clone());
            }
            Ok(Outcome::Committed(sale))
        });

        match &result {
            Ok(Outcome::Committed(sale)) => info!(
                sale_id = %sale.id,
                channel = %sale.channel,
                lines = sale.lines.len(),
                total = %sale.total,
                "Sale committed"
            ),
            Ok(Outcome::Replayed(sale)) => debug!(
                sale_id = %sale.id,
                key = key.map(IdempotencyKey::as_str),
                "Checkout replayed from idempotency key"
            ),
            Err(err) => warn!(error = %err, lines = cart.line_count(), "Checkout rejected"),
        }
        result
    }

    /// Applies a stock delta outside of any sale and writes the catalog
    /// behind, like a checkout does.
    pub fn adjust_stock(&self, id: ProductId, delta: i64) -> CoreResult<Product> {
        let product = self.catalog.adjust_stock(id, delta)?;
        info!(product_id = %id, delta, stock = product.stock, "Stock adjusted");
        self.persist(None);
        Ok(product)
    }

    fn persist(&self, sale: Option<&Sale>) {
        let Some(store) = &self.store else {
            return;
        };
        let _guard = self.persist_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(sale) = sale {
            if let Err(err) = store.append_sale(sale) {
                error!(sale_id = %sale.id, error = %err, "Failed to persist sale");
            }
        }
        if let Err(err) = store.save_catalog(&self.catalog.snapshot()) {
            error!(error = %err, "Failed to persist catalog");
        }
    }
}

/// A retry carries the lines it was first sent with.
fn same_lines(cart: &Cart, sale: &Sale) -> bool {
    cart.lines().len() == sale.lines.len()
        && cart
            .lines()
            .iter()
            .zip(&sale.lines)
            .all(|(c, s)| c.product_id == s.product_id && c.quantity == s.quantity)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StockShortfall;
    use crate::money::Money;
    use crate::session::CheckoutState;
    use crate::types::{Channel, DateRange, Product, ProductId};

    fn processor() -> CheckoutProcessor {
        let catalog = Catalog::new(vec![
            Product::new(1, "Coffee", 350, 100),
            Product::new(2, "Sandwich", 599, 1),
            Product::new(3, "Salad", 799, 30),
        ])
        .unwrap();
        CheckoutProcessor::new(Arc::new(catalog), Arc::new(SalesLedger::new()))
    }

    #[derive(Default)]
    struct RecordingStore {
        sales: Mutex<Vec<Sale>>,
        catalogs: Mutex<Vec<Vec<Product>>>,
        fail: bool,
    }

    impl PersistenceStore for RecordingStore {
        fn load_catalog(&self) -> CoreResult<Vec<Product>> {
            Ok(self.catalogs.lock().unwrap().last().cloned().unwrap_or_default())
        }

        fn save_catalog(&self, products: &[Product]) -> CoreResult<()> {
            if self.fail {
                return Err(CoreError::Store("disk full".to_string()));
            }
            self.catalogs.lock().unwrap().push(products.to_vec());
            Ok(())
        }

        fn append_sale(&self, sale: &Sale) -> CoreResult<()> {
            if self.fail {
                return Err(CoreError::Store("disk full".to_string()));
            }
            self.sales.lock().unwrap().push(sale.clone());
            Ok(())
        }

        fn load_sales(&self, range: DateRange) -> CoreResult<Vec<Sale>> {
            Ok(self
                .sales
                .lock()
                .unwrap()
                .iter()
                .filter(|s| range.contains(s.timestamp))
                .cloned()
                .collect())
        }
    }

    #[test]
    fn test_coffee_checkout() {
        let processor = processor();
        let mut session = CheckoutSession::new();
        session.add_item(processor.catalog(), ProductId::new(1), 2).unwrap();
        session.set_discount(10.0).unwrap();

        let sale = processor.checkout(&mut session, None).unwrap();

        assert_eq!(sale.id.get(), 1);
        assert_eq!(sale.subtotal, Money::from_cents(700));
        assert_eq!(sale.total, Money::from_cents(630));
        assert_eq!(sale.lines[0].name, "Coffee");
        assert_eq!(processor.catalog().find(ProductId::new(1)).unwrap().stock, 98);
        assert_eq!(processor.ledger().len(), 1);
        assert!(session.cart().is_empty());
        assert!(session.cart().discount().is_zero());
        assert_eq!(session.state(), CheckoutState::Committed { sale_id: sale.id });
    }

    #[test]
    fn test_empty_cart_rejected() {
        let processor = processor();
        let mut session = CheckoutSession::new();

        assert!(matches!(
            processor.checkout(&mut session, None),
            Err(CoreError::EmptyCart)
        ));
        assert_eq!(session.state(), CheckoutState::Rejected);
        assert!(processor.ledger().is_empty());
    }

    #[test]
    fn test_insufficient_stock_changes_nothing() {
        let processor = processor();
        let mut session = CheckoutSession::new();
        session.add_item(processor.catalog(), ProductId::new(1), 3).unwrap();
        session.add_item(processor.catalog(), ProductId::new(2), 2).unwrap();
        let cart_before = session.cart().clone();

        let err = processor.checkout(&mut session, None).unwrap_err();
        match err {
            CoreError::InsufficientStock(shortfalls) => assert_eq!(
                shortfalls,
                vec![StockShortfall {
                    product_id: ProductId::new(2),
                    requested: 2,
                    available: 1
                }]
            ),
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(processor.catalog().find(ProductId::new(1)).unwrap().stock, 100);
        assert_eq!(processor.catalog().find(ProductId::new(2)).unwrap().stock, 1);
        assert!(processor.ledger().is_empty());
        assert_eq!(session.cart(), &cart_before);
        assert_eq!(session.state(), CheckoutState::Rejected);
    }

    #[test]
    fn test_every_short_line_reported() {
        let processor = processor();
        let mut cart = Cart::new();
        cart.add_item(processor.catalog(), ProductId::new(2), 5).unwrap();
        cart.add_item(processor.catalog(), ProductId::new(3), 31).unwrap();

        let Err(CoreError::InsufficientStock(shortfalls)) = processor.checkout_cart(&mut cart, None)
        else {
            panic!("expected InsufficientStock");
        };
        let ids: Vec<u32> = shortfalls.iter().map(|s| s.product_id.get()).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_charges_price_current_at_checkout() {
        let processor = processor();
        let mut cart = Cart::new();
        cart.add_item(processor.catalog(), ProductId::new(3), 1).unwrap();
        processor
            .catalog()
            .upsert(Product::new(3, "Salad", 849, 0))
            .unwrap();

        let sale = processor.checkout_cart(&mut cart, None).unwrap();
        assert_eq!(sale.total, Money::from_cents(849));
    }

    #[test]
    fn test_idempotent_retry_returns_same_sale() {
        let processor = processor();
        let key = IdempotencyKey::new("till-1-0001");
        let mut session = CheckoutSession::for_channel(Channel::Online);
        session.add_item(processor.catalog(), ProductId::new(1), 2).unwrap();

        let first = processor.checkout(&mut session, Some(&key)).unwrap();
        let retry = processor.checkout(&mut session, Some(&key)).unwrap();

        assert_eq!(first, retry);
        assert_eq!(processor.ledger().len(), 1);
        assert_eq!(processor.catalog().find(ProductId::new(1)).unwrap().stock, 98);

        let other = IdempotencyKey::new("till-1-0002");
        assert!(matches!(
            processor.checkout(&mut session, Some(&other)),
            Err(CoreError::EmptyCart)
        ));
    }

    #[test]
    fn test_retry_with_unchanged_cart_replays() {
        let processor = processor();
        let key = IdempotencyKey::new("web-77");
        let mut cart = Cart::new();
        cart.add_item(processor.catalog(), ProductId::new(3), 2).unwrap();
        let mut resent = cart.clone();

        let first = processor.checkout_cart(&mut cart, Some(&key)).unwrap();
        let retry = processor.checkout_cart(&mut resent, Some(&key)).unwrap();

        assert_eq!(first, retry);
        assert!(resent.is_empty());
        assert_eq!(processor.ledger().len(), 1);
        assert_eq!(processor.catalog().find(ProductId::new(3)).unwrap().stock, 28);
    }

    #[test]
    fn test_key_reused_by_another_session_keeps_its_cart() {
        let processor = processor();
        let key = IdempotencyKey::new("k1");

        let mut first = CheckoutSession::new();
        first.add_item(processor.catalog(), ProductId::new(1), 2).unwrap();
        let sale = processor.checkout(&mut first, Some(&key)).unwrap();

        let mut second = CheckoutSession::new();
        second.add_item(processor.catalog(), ProductId::new(3), 5).unwrap();
        let cart_before = second.cart().clone();

        let err = processor.checkout(&mut second, Some(&key)).unwrap_err();
        assert!(matches!(err, CoreError::IdempotencyKeyReused(ref k) if k == "k1"));
        assert_eq!(second.cart(), &cart_before);
        assert_eq!(second.state(), CheckoutState::Rejected);
        assert_eq!(processor.catalog().find(ProductId::new(3)).unwrap().stock, 30);
        assert_eq!(processor.ledger().len(), 1);

        // The original till still gets its receipt back.
        assert_eq!(processor.checkout(&mut first, Some(&key)).unwrap(), sale);
    }

    #[test]
    fn test_write_behind_persistence() {
        let store = Arc::new(RecordingStore::default());
        let processor = processor().with_store(store.clone());
        let mut cart = Cart::new();
        cart.add_item(processor.catalog(), ProductId::new(1), 4).unwrap();

        let sale = processor.checkout_cart(&mut cart, None).unwrap();

        assert_eq!(store.load_sales(DateRange::all()).unwrap(), vec![sale]);
        let saved = store.load_catalog().unwrap();
        assert_eq!(saved[0].stock, 96);
    }

    #[test]
    fn test_adjust_stock_is_saved() {
        let store = Arc::new(RecordingStore::default());
        let processor = processor().with_store(store.clone());

        let product = processor.adjust_stock(ProductId::new(2), 9).unwrap();
        assert_eq!(product.stock, 10);
        assert_eq!(store.load_catalog().unwrap()[1].stock, 10);
        assert!(store.load_sales(DateRange::all()).unwrap().is_empty());

        assert!(matches!(
            processor.adjust_stock(ProductId::new(2), -11),
            Err(CoreError::InsufficientStock(_))
        ));
        assert_eq!(store.catalogs.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_persistence_failure_keeps_commit() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..RecordingStore::default()
        });
        let processor = processor().with_store(store);
        let mut cart = Cart::new();
        cart.add_item(processor.catalog(), ProductId::new(1), 1).unwrap();

        assert!(processor.checkout_cart(&mut cart, None).is_ok());
        assert_eq!(processor.ledger().len(), 1);
        assert_eq!(processor.catalog().find(ProductId::new(1)).unwrap().stock, 99);
    }
}
