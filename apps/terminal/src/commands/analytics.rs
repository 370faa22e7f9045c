//! # Analytics Commands
//!
//! Read-only views over the sales ledger for the admin dashboard.

use serde::Serialize;
use tally_core::{ChannelRevenue, ProductUnits, SalesSummary};
use tracing::debug;

use crate::commands::sale::ReceiptResponse;
use crate::state::AppState;

/// Upper bound for `recent_sales`.
pub const MAX_RECENT_SALES: usize = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: SalesSummary,
    pub total_revenue_display: String,
    pub average_sale_display: Option<String>,
    pub by_channel: Vec<ChannelRevenue>,
    pub units_sold: Vec<ProductUnits>,
}

/// Sale count, revenue, average sale, revenue per channel and units per
/// product. The average is absent until the first sale.
pub fn sales_summary(state: &AppState) -> SummaryResponse {
    debug!("sales_summary command");

    let ledger = state.store.ledger();
    let summary = ledger.summary();
    let config = &state.config;

    SummaryResponse {
        total_revenue_display: config.format_currency(summary.total_revenue.cents()),
        average_sale_display: summary
            .average_sale
            .map(|avg| config.format_currency(avg.cents())),
        by_channel: ledger.revenue_by_channel(),
        units_sold: ledger.units_sold(),
        summary,
    }
}

/// The last `limit` sales, newest first (capped at [`MAX_RECENT_SALES`]).
pub fn recent_sales(state: &AppState, limit: usize) -> Vec<ReceiptResponse> {
    debug!(limit, "recent_sales command");

    state
        .store
        .ledger()
        .recent(limit.min(MAX_RECENT_SALES))
        .iter()
        .map(|sale| ReceiptResponse::new(sale, &state.config))
        .collect()
}
