//! # Catalog
//!
//! The one shared, mutable resource of the system: product records and
//! their stock levels.
//!
//! ## Concurrency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Catalog Locking                                      │
//! │                                                                         │
//! │  Terminal A ──► checkout ──┐                                            │
//! │                            ├──► Catalog::transact ──► Mutex<Inner>     │
//! │  Terminal B ──► checkout ──┘        (validate + decrement, one guard)   │
//! │                                                                         │
//! │  A single global lock: every critical section is in-memory work only,  │
//! │  so contention is measured in microseconds and nothing blocks on I/O.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Readers (`find`, `search`, `list`) take the same lock briefly and return
//! owned clones, so callers never hold a guard.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{CoreError, CoreResult, StockShortfall, ValidationError};
use crate::types::{CartLine, Product, ProductId};
use crate::validation::{validate_product, validate_search_query};

/// Product records indexed by id and barcode, in catalog order.
#[derive(Debug, Default)]
struct CatalogInner {
    products: Vec<Product>,
    by_id: HashMap<ProductId, usize>,
    by_barcode: HashMap<String, usize>,
}

impl CatalogInner {
    fn get(&self, id: ProductId) -> Option<&Product> {
        self.by_id.get(&id).and_then(|&idx| self.products.get(idx))
    }

    fn get_mut(&mut self, id: ProductId) -> Option<&mut Product> {
        let idx = *self.by_id.get(&id)?;
        self.products.get_mut(idx)
    }

    fn insert(&mut self, product: Product) -> CoreResult<()> {
        if self.by_id.contains_key(&product.id) {
            return Err(CoreError::DuplicateProduct {
                field: "id".to_string(),
                value: product.id.to_string(),
            });
        }
        if let Some(barcode) = &product.barcode {
            if self.by_barcode.contains_key(barcode) {
                return Err(CoreError::DuplicateProduct {
                    field: "barcode".to_string(),
                    value: barcode.clone(),
                });
            }
        }

        let idx = self.products.len();
        self.by_id.insert(product.id, idx);
        if let Some(barcode) = &product.barcode {
            self.by_barcode.insert(barcode.clone(), idx);
        }
        self.products.push(product);
        Ok(())
    }
}

/// In-memory product catalog, safe to share across sessions via `Arc`.
#[derive(Debug, Default)]
pub struct Catalog {
    inner: Mutex<CatalogInner>,
}

impl Catalog {
    /// Builds a catalog, rejecting invalid records and duplicate ids/barcodes.
    ///
    /// ```rust
    /// use tally_core::{Catalog, Product};
    ///
    /// let catalog = Catalog::new(vec![
    ///     Product::new(1, "Coffee", 350, 100).with_barcode("123456"),
    ///     Product::new(2, "Sandwich", 599, 50).with_barcode("234567"),
    /// ]).unwrap();
    /// assert_eq!(catalog.len(), 2);
    /// ```
    pub fn new(products: Vec<Product>) -> CoreResult<Self> {
        let mut inner = CatalogInner::default();
        for product in products {
            validate_product(&product)?;
            inner.insert(product)?;
        }
        Ok(Catalog {
            inner: Mutex::new(inner),
        })
    }

    // A panic while holding the guard cannot leave stock half-applied:
    // mutations are computed first and written in one pass.
    fn lock(&self) -> MutexGuard<'_, CatalogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up a product by id.
    pub fn find(&self, id: ProductId) -> CoreResult<Product> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or(CoreError::ProductNotFound(id))
    }

    /// Looks up a product by exact barcode.
    pub fn find_by_barcode(&self, barcode: &str) -> Option<Product> {
        let inner = self.lock();
        inner
            .by_barcode
            .get(barcode)
            .and_then(|&idx| inner.products.get(idx))
            .cloned()
    }

    /// Searches by case-insensitive name substring OR exact barcode.
    ///
    /// An empty (or whitespace-only) query returns every product. Results
    /// keep catalog order.
    ///
    /// ## Errors
    /// Queries longer than 100 characters are rejected.
    pub fn search(&self, query: &str) -> CoreResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        let inner = self.lock();

        if query.is_empty() {
            return Ok(inner.products.clone());
        }

        let needle = query.to_lowercase();
        Ok(inner
            .products
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.barcode.as_deref() == Some(query.as_str())
            })
            .cloned()
            .collect())
    }

    /// Every product in catalog order (the inventory table).
    pub fn list(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    /// Alias of [`Catalog::list`] used when handing products to a store.
    pub fn snapshot(&self) -> Vec<Product> {
        self.list()
    }

    pub fn len(&self) -> usize {
        self.lock().products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().products.is_empty()
    }

    /// Adds a new product or replaces name/price/barcode of an existing one.
    ///
    /// Stock of an existing product is left alone; stock only moves through
    /// [`Catalog::adjust_stock`] and checkout.
    pub fn upsert(&self, product: Product) -> CoreResult<Product> {
        validate_product(&product)?;
        let mut inner = self.lock();

        let existing_idx = inner.by_id.get(&product.id).copied();
        let Some(idx) = existing_idx else {
            inner.insert(product.clone())?;
            return Ok(product);
        };

        if let Some(barcode) = &product.barcode {
            if let Some(&owner) = inner.by_barcode.get(barcode) {
                if owner != idx {
                    return Err(CoreError::DuplicateProduct {
                        field: "barcode".to_string(),
                        value: barcode.clone(),
                    });
                }
            }
        }

        let old_barcode = inner.products.get(idx).and_then(|p| p.barcode.clone());
        if let Some(old) = old_barcode {
            inner.by_barcode.remove(&old);
        }
        if let Some(barcode) = &product.barcode {
            inner.by_barcode.insert(barcode.clone(), idx);
        }

        let existing = inner
            .products
            .get_mut(idx)
            .ok_or(CoreError::ProductNotFound(product.id))?;
        existing.name = product.name;
        existing.price_cents = product.price_cents;
        existing.barcode = product.barcode;
        Ok(existing.clone())
    }

    /// Applies `delta` to a product's stock atomically.
    ///
    /// ## Errors
    /// - `ProductNotFound` for an unknown id
    /// - `InsufficientStock` if the result would be negative; nothing changes
    ///
    /// ```rust
    /// use tally_core::{Catalog, Product, ProductId};
    ///
    /// let catalog = Catalog::new(vec![Product::new(1, "Coffee", 350, 3)]).unwrap();
    /// assert_eq!(catalog.adjust_stock(ProductId::new(1), -2).unwrap().stock, 1);
    /// assert!(catalog.adjust_stock(ProductId::new(1), -2).is_err());
    /// assert_eq!(catalog.find(ProductId::new(1)).unwrap().stock, 1);
    /// ```
    pub fn adjust_stock(&self, id: ProductId, delta: i64) -> CoreResult<Product> {
        let mut inner = self.lock();
        let product = inner.get_mut(id).ok_or(CoreError::ProductNotFound(id))?;

        let new_stock = product
            .stock
            .checked_add(delta)
            .ok_or_else(|| ValidationError::OutOfRange {
                field: "stock".to_string(),
                min: 0,
                max: i64::MAX,
            })?;

        if new_stock < 0 {
            return Err(CoreError::InsufficientStock(vec![StockShortfall {
                product_id: id,
                requested: delta.saturating_neg(),
                available: product.stock,
            }]));
        }

        product.stock = new_stock;
        Ok(product.clone())
    }

    /// Runs `f` while holding the catalog lock.
    ///
    /// Everything done through the [`StockTransaction`] is observed by other
    /// sessions as a single step.
    pub fn transact<R>(&self, f: impl FnOnce(&mut StockTransaction<'_>) -> R) -> R {
        let mut inner = self.lock();
        let mut tx = StockTransaction { inner: &mut *inner };
        f(&mut tx)
    }
}

// =============================================================================
// Stock Transaction
// =============================================================================

/// Exclusive view of the catalog for one validate-and-decrement step.
#[derive(Debug)]
pub struct StockTransaction<'a> {
    inner: &'a mut CatalogInner,
}

impl StockTransaction<'_> {
    /// Current record for `id` under the lock.
    pub fn find(&self, id: ProductId) -> CoreResult<&Product> {
        self.inner.get(id).ok_or(CoreError::ProductNotFound(id))
    }

    /// Every line whose quantity exceeds current stock.
    ///
    /// Quantities for the same product are summed before comparing, so a
    /// caller cannot slip past the check by splitting a line.
    pub fn shortfalls(&self, lines: &[CartLine]) -> CoreResult<Vec<StockShortfall>> {
        let mut shortfalls = Vec::new();
        for (product_id, requested) in merge_lines(lines) {
            let product = self.find(product_id)?;
            if !product.can_sell(requested) {
                shortfalls.push(StockShortfall {
                    product_id,
                    requested,
                    available: product.stock,
                });
            }
        }
        Ok(shortfalls)
    }

    /// Decrements stock for every line, or for none of them.
    ///
    /// ## Errors
    /// `InsufficientStock` listing every failing line; `ProductNotFound` for
    /// an unknown id. On error the catalog is untouched.
    pub fn decrement_all(&mut self, lines: &[CartLine]) -> CoreResult<()> {
        let shortfalls = self.shortfalls(lines)?;
        if !shortfalls.is_empty() {
            return Err(CoreError::InsufficientStock(shortfalls));
        }

        for (product_id, quantity) in merge_lines(lines) {
            let product = self
                .inner
                .get_mut(product_id)
                .ok_or(CoreError::ProductNotFound(product_id))?;
            product.stock -= quantity;
        }
        Ok(())
    }
}

/// Sums quantities per product, keeping first-seen order.
fn merge_lines(lines: &[CartLine]) -> Vec<(ProductId, i64)> {
    let mut merged: Vec<(ProductId, i64)> = Vec::with_capacity(lines.len());
    for line in lines {
        match merged.iter_mut().find(|(id, _)| *id == line.product_id) {
            Some((_, qty)) => *qty += line.quantity,
            None => merged.push((line.product_id, line.quantity)),
        }
    }
    merged
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::new(vec![
            Product::new(1, "Coffee", 350, 100).with_barcode("123456"),
            Product::new(2, "Sandwich", 599, 50).with_barcode("234567"),
            Product::new(3, "Salad", 799, 30).with_barcode("345678"),
        ])
        .unwrap()
    }

    fn line(id: u32, quantity: i64) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            quantity,
        }
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let dup_id = Catalog::new(vec![
            Product::new(1, "Coffee", 350, 1),
            Product::new(1, "Tea", 300, 1),
        ]);
        assert!(matches!(dup_id, Err(CoreError::DuplicateProduct { .. })));

        let dup_barcode = Catalog::new(vec![
            Product::new(1, "Coffee", 350, 1).with_barcode("111"),
            Product::new(2, "Tea", 300, 1).with_barcode("111"),
        ]);
        assert!(matches!(dup_barcode, Err(CoreError::DuplicateProduct { .. })));
    }

    #[test]
    fn test_new_rejects_invalid_records() {
        let negative = Catalog::new(vec![Product::new(1, "Coffee", -1, 1)]);
        assert!(matches!(negative, Err(CoreError::Validation(_))));

        let huge = Catalog::new(vec![Product::new(1, "Gold bar", i64::MAX / 10, 1000)]);
        assert!(matches!(huge, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_upsert_rejects_price_above_bound() {
        let catalog = sample();
        let result = catalog.upsert(Product::new(4, "Gold bar", crate::MAX_PRICE_CENTS + 1, 1));
        assert!(matches!(result, Err(CoreError::Validation(_))));
        assert!(catalog.find(ProductId::new(4)).is_err());
    }

    #[test]
    fn test_find() {
        let catalog = sample();
        assert_eq!(catalog.find(ProductId::new(2)).unwrap().name, "Sandwich");
        assert!(matches!(
            catalog.find(ProductId::new(9)),
            Err(CoreError::ProductNotFound(id)) if id == ProductId::new(9)
        ));
        assert_eq!(catalog.find_by_barcode("345678").unwrap().name, "Salad");
        assert!(catalog.find_by_barcode("999999").is_none());
    }

    #[test]
    fn test_search_by_name_and_barcode() {
        let catalog = sample();

        let names = |query: &str| -> Vec<String> {
            catalog
                .search(query)
                .unwrap()
                .into_iter()
                .map(|p| p.name)
                .collect()
        };

        assert_eq!(names("SAND"), vec!["Sandwich"]);
        assert_eq!(names("a"), vec!["Sandwich", "Salad"]);
        assert_eq!(names("234567"), vec!["Sandwich"]);
        // Barcodes must match exactly, not as a substring.
        assert!(names("2345").is_empty());
        assert_eq!(names(""), vec!["Coffee", "Sandwich", "Salad"]);
        assert_eq!(names("   "), vec!["Coffee", "Sandwich", "Salad"]);
    }

    #[test]
    fn test_adjust_stock() {
        let catalog = sample();
        let coffee = ProductId::new(1);

        assert_eq!(catalog.adjust_stock(coffee, -10).unwrap().stock, 90);
        assert_eq!(catalog.adjust_stock(coffee, 5).unwrap().stock, 95);

        let err = catalog.adjust_stock(coffee, -96).unwrap_err();
        match err {
            CoreError::InsufficientStock(shortfalls) => {
                assert_eq!(
                    shortfalls,
                    vec![StockShortfall {
                        product_id: coffee,
                        requested: 96,
                        available: 95
                    }]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(catalog.find(coffee).unwrap().stock, 95);

        assert!(matches!(
            catalog.adjust_stock(ProductId::new(42), 1),
            Err(CoreError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_adjust_stock_to_exactly_zero() {
        let catalog = sample();
        assert_eq!(catalog.adjust_stock(ProductId::new(3), -30).unwrap().stock, 0);
    }

    #[test]
    fn test_upsert_keeps_stock_and_reindexes_barcode() {
        let catalog = sample();
        let updated = catalog
            .upsert(Product::new(1, "Espresso", 400, 0).with_barcode("999000"))
            .unwrap();
        assert_eq!(updated.name, "Espresso");
        assert_eq!(updated.stock, 100);
        assert!(catalog.find_by_barcode("123456").is_none());
        assert_eq!(catalog.find_by_barcode("999000").unwrap().id, ProductId::new(1));

        let clash = catalog.upsert(Product::new(2, "Sandwich", 599, 0).with_barcode("999000"));
        assert!(matches!(clash, Err(CoreError::DuplicateProduct { .. })));

        catalog.upsert(Product::new(4, "Juice", 250, 12)).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.find(ProductId::new(4)).unwrap().stock, 12);
    }

    #[test]
    fn test_decrement_all_is_all_or_nothing() {
        let catalog = sample();
        let before = catalog.snapshot();

        let result =
            catalog.transact(|tx| tx.decrement_all(&[line(1, 5), line(3, 31), line(2, 51)]));
        match result {
            Err(CoreError::InsufficientStock(shortfalls)) => {
                let ids: Vec<u32> = shortfalls.iter().map(|s| s.product_id.get()).collect();
                assert_eq!(ids, vec![3, 2]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(catalog.snapshot(), before);

        catalog
            .transact(|tx| tx.decrement_all(&[line(1, 5), line(3, 30)]))
            .unwrap();
        assert_eq!(catalog.find(ProductId::new(1)).unwrap().stock, 95);
        assert_eq!(catalog.find(ProductId::new(3)).unwrap().stock, 0);
    }

    #[test]
    fn test_shortfalls_merge_split_lines() {
        let catalog = sample();
        let shortfalls = catalog
            .transact(|tx| tx.shortfalls(&[line(3, 20), line(3, 20)]))
            .unwrap();
        assert_eq!(
            shortfalls,
            vec![StockShortfall {
                product_id: ProductId::new(3),
                requested: 40,
                available: 30
            }]
        );
    }

    #[test]
    fn test_decrement_unknown_product() {
        let catalog = sample();
        let result = catalog.transact(|tx| tx.decrement_all(&[line(1, 1), line(7, 1)]));
        assert!(matches!(result, Err(CoreError::ProductNotFound(_))));
        assert_eq!(catalog.find(ProductId::new(1)).unwrap().stock, 100);
    }
}
