//! # Product Commands
//!
//! Product search, lookup, the inventory table and restocking.
//!
//! ## Search Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Search Flow                                  │
//! │                                                                         │
//! │  Cashier types "sand" or scans "234567"                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  {"command":"search_products","query":"sand"}                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────────────────────────┐                         │
//! │  │  Catalog::search                          │                         │
//! │  │  name contains query (case-insensitive)   │                         │
//! │  │  OR barcode == query                      │                         │
//! │  │  empty query → whole catalog              │                         │
//! │  └───────────────────────────────────────────┘                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Vec<ProductDto> in catalog order                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tally_core::{Product, ProductId};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{AppState, ConfigState};

/// Product DTO (Data Transfer Object) for display.
///
/// ## Why DTO?
/// - Adds the formatted price so clients need no currency logic
/// - Flags out-of-stock products for the product grid
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: ProductId,
    pub name: String,
    pub price_cents: i64,
    pub price: String,
    pub stock: i64,
    pub in_stock: bool,
    pub barcode: Option<String>,
}

impl ProductDto {
    pub fn new(product: Product, config: &ConfigState) -> Self {
        ProductDto {
            id: product.id,
            price: config.format_currency(product.price_cents),
            in_stock: product.stock > 0,
            name: product.name,
            price_cents: product.price_cents,
            stock: product.stock,
            barcode: product.barcode,
        }
    }
}

fn to_dtos(products: Vec<Product>, config: &ConfigState) -> Vec<ProductDto> {
    products
        .into_iter()
        .map(|p| ProductDto::new(p, config))
        .collect()
}

/// Searches by name substring or exact barcode.
pub fn search_products(state: &AppState, query: &str) -> Result<Vec<ProductDto>, ApiError> {
    debug!(query = %query, "search_products command");

    let products = state.store.catalog().search(query)?;
    debug!(count = products.len(), "Search complete");
    Ok(to_dtos(products, &state.config))
}

/// Looks a product up by id, or by barcode when no id is given.
///
/// ## Errors
/// - `BAD_REQUEST` if neither `productId` nor `barcode` is present
/// - `NOT_FOUND` if nothing matches
pub fn get_product(
    state: &AppState,
    product_id: Option<u32>,
    barcode: Option<&str>,
) -> Result<ProductDto, ApiError> {
    debug!(?product_id, ?barcode, "get_product command");

    let catalog = state.store.catalog();
    let product = match (product_id, barcode) {
        (Some(id), _) => catalog.find(ProductId::new(id))?,
        (None, Some(code)) => catalog
            .find_by_barcode(code)
            .ok_or_else(|| ApiError::not_found("Product with barcode", code))?,
        (None, None) => return Err(ApiError::bad_request("Provide productId or barcode")),
    };

    Ok(ProductDto::new(product, &state.config))
}

/// Every product, for the inventory table.
pub fn list_inventory(state: &AppState) -> Vec<ProductDto> {
    debug!("list_inventory command");
    to_dtos(state.store.catalog().list(), &state.config)
}

/// Restocks (positive delta) or writes off (negative delta) a product.
///
/// Stock may not go below zero (`INSUFFICIENT_STOCK`). Admin only; the
/// role check happens in dispatch.
pub fn adjust_stock(state: &AppState, product_id: u32, delta: i64) -> Result<ProductDto, ApiError> {
    debug!(product_id, delta, "adjust_stock command");

    let product = state.store.adjust_stock(ProductId::new(product_id), delta)?;
    info!(product_id, stock = product.stock, "Stock adjusted from terminal");
    Ok(ProductDto::new(product, &state.config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::StoreState;

    fn app() -> AppState {
        AppState::new(ConfigState::default(), StoreState::in_memory().unwrap())
    }

    #[test]
    fn test_search_by_name_and_barcode() {
        let state = app();

        let hits = search_products(&state, "sand").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Sandwich");
        assert_eq!(hits[0].price, "$5.99");

        let hits = search_products(&state, "345678").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Salad");

        assert_eq!(search_products(&state, "").unwrap().len(), 3);
    }

    #[test]
    fn test_get_product() {
        let state = app();

        let coffee = get_product(&state, Some(1), None).unwrap();
        assert_eq!(coffee.name, "Coffee");

        let by_code = get_product(&state, None, Some("123456")).unwrap();
        assert_eq!(by_code.id, coffee.id);

        let err = get_product(&state, Some(99), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = get_product(&state, None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::BadRequest);
    }

    #[test]
    fn test_adjust_stock() {
        let state = app();

        let salad = adjust_stock(&state, 3, -30).unwrap();
        assert_eq!(salad.stock, 0);
        assert!(!salad.in_stock);

        let err = adjust_stock(&state, 3, -1).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.shortfalls[0].available, 0);

        let listed = list_inventory(&state);
        assert_eq!(listed[2].stock, 0);
    }
}
