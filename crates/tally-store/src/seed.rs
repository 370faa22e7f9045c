//! # Sample Data
//!
//! The starter data set a fresh terminal boots with.
//!
//! | id | name     | price | stock | barcode |
//! |----|----------|-------|-------|---------|
//! | 1  | Coffee   | $3.50 | 100   | 123456  |
//! | 2  | Sandwich | $5.99 | 50    | 234567  |
//! | 3  | Salad    | $7.99 | 30    | 345678  |
//!
//! Users: `admin`/`admin` (Admin) and `cashier`/`cashier` (Cashier).

use tally_core::{Product, Role};

use crate::credentials::CredentialStore;
use crate::error::StoreResult;

/// (id, name, price in cents, stock, barcode)
const PRODUCTS: &[(u32, &str, i64, i64, &str)] = &[
    (1, "Coffee", 350, 100, "123456"),
    (2, "Sandwich", 599, 50, "234567"),
    (3, "Salad", 799, 30, "345678"),
];

/// (username, password, role)
const USERS: &[(&str, &str, Role)] = &[
    ("admin", "admin", Role::Admin),
    ("cashier", "cashier", Role::Cashier),
];

pub fn sample_products() -> Vec<Product> {
    PRODUCTS
        .iter()
        .map(|&(id, name, price_cents, stock, barcode)| {
            Product::new(id, name, price_cents, stock).with_barcode(barcode)
        })
        .collect()
}

pub fn sample_users() -> StoreResult<CredentialStore> {
    let mut store = CredentialStore::new();
    for &(username, password, role) in USERS {
        store.add_user(username, password, role)?;
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{Authenticator, Catalog};

    #[test]
    fn test_sample_products_form_a_valid_catalog() {
        let catalog = Catalog::new(sample_products()).unwrap();
        assert_eq!(catalog.len(), 3);
        let coffee = catalog.find_by_barcode("123456").unwrap();
        assert_eq!(coffee.name, "Coffee");
        assert_eq!(coffee.stock, 100);
    }

    #[test]
    fn test_sample_users_can_sign_in() {
        let users = sample_users().unwrap();
        assert_eq!(users.authenticate("admin", "admin").unwrap().role, Role::Admin);
        assert_eq!(users.authenticate("cashier", "cashier").unwrap().role, Role::Cashier);
    }
}
