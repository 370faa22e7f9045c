//! # Sales Ledger
//!
//! Append-only record of committed sales plus the analytics computed from it.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CheckoutProcessor ──► record(PendingSale) ──► Sale #n appended        │
//! │                                                   │                     │
//! │                                                   ▼                     │
//! │  Analytics ◄── total_revenue / average_sale / recent(n) / summary      │
//! │                                                                         │
//! │  Sales are never mutated or removed. Ids are assigned here, strictly   │
//! │  increasing in append order.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Channel, DateRange, PendingSale, ProductId, Sale, SaleId};

#[derive(Debug)]
struct LedgerInner {
    sales: Vec<Sale>,
    next_id: SaleId,
}

impl Default for LedgerInner {
    fn default() -> Self {
        LedgerInner {
            sales: Vec::new(),
            next_id: SaleId::new(1),
        }
    }
}

/// Headline numbers for the analytics screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub sale_count: usize,
    pub total_revenue: Money,
    /// `None` when there are no sales yet.
    pub average_sale: Option<Money>,
}

/// Revenue attributed to one sales channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRevenue {
    pub channel: Channel,
    pub sale_count: usize,
    pub revenue: Money,
}

/// Units of one product sold across the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductUnits {
    pub product_id: ProductId,
    pub name: String,
    pub units: i64,
}

/// Process-wide ledger, shared across sessions via `Arc`.
#[derive(Debug, Default)]
pub struct SalesLedger {
    inner: Mutex<LedgerInner>,
}

impl SalesLedger {
    pub fn new() -> Self {
        SalesLedger::default()
    }

    /// Rebuilds a ledger from previously persisted sales.
    ///
    /// Sales are ordered by id; numbering continues after the highest one.
    pub fn from_sales(mut sales: Vec<Sale>) -> Self {
        sales.sort_by_key(|s| s.id);
        let next_id = sales
            .last()
            .map_or(SaleId::new(1), |last| last.id.next());
        SalesLedger {
            inner: Mutex::new(LedgerInner { sales, next_id }),
        }
    }

    // Appends are single pushes; a poisoned guard still holds a whole ledger.
    fn lock(&self) -> MutexGuard<'_, LedgerInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a sale and returns the id it was given.
    pub fn record(&self, pending: PendingSale) -> SaleId {
        self.record_sale(pending).id
    }

    /// Appends a sale and returns the stored record.
    pub fn record_sale(&self, pending: PendingSale) -> Sale {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id = id.next();
        let sale = pending.into_sale(id);
        inner.sales.push(sale.clone());
        sale
    }

    pub fn get(&self, id: SaleId) -> Option<Sale> {
        let inner = self.lock();
        inner
            .sales
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .and_then(|idx| inner.sales.get(idx))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().sales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().sales.is_empty()
    }

    /// Every sale, oldest first.
    pub fn all(&self) -> Vec<Sale> {
        self.lock().sales.clone()
    }

    /// The `n` most recent sales, newest first.
    pub fn recent(&self, n: usize) -> Vec<Sale> {
        self.lock().sales.iter().rev().take(n).cloned().collect()
    }

    /// Sales whose timestamp falls in `range`, oldest first.
    pub fn between(&self, range: DateRange) -> Vec<Sale> {
        self.lock()
            .sales
            .iter()
            .filter(|s| range.contains(s.timestamp))
            .cloned()
            .collect()
    }

    /// Σ of every sale total.
    pub fn total_revenue(&self) -> Money {
        self.lock().sales.iter().map(|s| s.total).sum()
    }

    /// Mean sale total, or `None` for an empty ledger.
    pub fn average_sale(&self) -> Option<Money> {
        self.summary().average_sale
    }

    /// Count, revenue and average, read under one lock.
    pub fn summary(&self) -> SalesSummary {
        let inner = self.lock();
        let total_revenue: Money = inner.sales.iter().map(|s| s.total).sum();
        SalesSummary {
            sale_count: inner.sales.len(),
            total_revenue,
            average_sale: total_revenue.average_over(inner.sales.len()),
        }
    }

    /// Revenue per channel, one entry per channel (zero if unused).
    pub fn revenue_by_channel(&self) -> Vec<ChannelRevenue> {
        let inner = self.lock();
        Channel::ALL
            .into_iter()
            .map(|channel| {
                let sales = inner.sales.iter().filter(|s| s.channel == channel);
                let (sale_count, revenue) = sales.fold((0, Money::zero()), |(n, sum), s| {
                    (n + 1, sum + s.total)
                });
                ChannelRevenue {
                    channel,
                    sale_count,
                    revenue,
                }
            })
            .collect()
    }

    /// Units sold per product, ordered by product id. Names come from the
    /// most recent sale of each product.
    pub fn units_sold(&self) -> Vec<ProductUnits> {
        let inner = self.lock();
        let mut by_product: BTreeMap<ProductId, ProductUnits> = BTreeMap::new();
        for line in inner.sales.iter().flat_map(|s| s.lines.iter()) {
            let entry = by_product
                .entry(line.product_id)
                .or_insert_with(|| ProductUnits {
                    product_id: line.product_id,
                    name: line.name.clone(),
                    units: 0,
                });
            entry.units += line.quantity;
            entry.name.clone_from(&line.name);
        }
        by_product.into_values().collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
