//! In-process [`PersistenceStore`], used when `TALLY_STORAGE=memory` and in
//! tests. Nothing survives a restart.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tally_core::{CoreResult, DateRange, PersistenceStore, Product, Sale};
use tracing::debug;

#[derive(Debug, Default)]
pub struct MemoryStore {
    products: Mutex<Vec<Product>>,
    sales: Mutex<Vec<Sale>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// A store whose catalog starts as `products`.
    pub fn with_catalog(products: Vec<Product>) -> Self {
        MemoryStore {
            products: Mutex::new(products),
            sales: Mutex::new(Vec::new()),
        }
    }

    pub fn sale_count(&self) -> usize {
        lock(&self.sales).len()
    }
}

impl PersistenceStore for MemoryStore {
    fn load_catalog(&self) -> CoreResult<Vec<Product>> {
        Ok(lock(&self.products).clone())
    }

    fn save_catalog(&self, products: &[Product]) -> CoreResult<()> {
        debug!(products = products.len(), "Saving catalog in memory");
        *lock(&self.products) = products.to_vec();
        Ok(())
    }

    fn append_sale(&self, sale: &Sale) -> CoreResult<()> {
        lock(&self.sales).push(sale.clone());
        Ok(())
    }

    fn load_sales(&self, range: DateRange) -> CoreResult<Vec<Sale>> {
        Ok(lock(&self.sales)
            .iter()
            .filter(|s| range.contains(s.timestamp))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tally_core::{Channel, DiscountRate, Money, PendingSale, SaleId};

    fn sale(id: u32, hours_ago: i64) -> Sale {
        PendingSale {
            timestamp: Utc::now() - Duration::hours(hours_ago),
            channel: Channel::InStore,
            lines: Vec::new(),
            subtotal: Money::from_cents(100),
            discount: DiscountRate::zero(),
            total: Money::from_cents(100),
        }
        .into_sale(SaleId::new(id))
    }

    #[test]
    fn test_catalog_round_trip() {
        let store = MemoryStore::new();
        assert!(store.load_catalog().unwrap().is_empty());

        let products = vec![Product::new(1, "Coffee", 350, 100)];
        store.save_catalog(&products).unwrap();
        assert_eq!(store.load_catalog().unwrap(), products);
    }

    #[test]
    fn test_load_sales_by_range() {
        let store = MemoryStore::new();
        store.append_sale(&sale(1, 48)).unwrap();
        store.append_sale(&sale(2, 1)).unwrap();

        let since_yesterday = DateRange {
            from: Some(Utc::now() - Duration::hours(24)),
            to: None,
        };
        let recent = store.load_sales(since_yesterday).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, SaleId::new(2));
        assert_eq!(store.load_sales(DateRange::all()).unwrap().len(), 2);
        assert_eq!(store.sale_count(), 2);
    }
}
