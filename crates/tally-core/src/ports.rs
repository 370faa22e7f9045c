//! # Ports
//!
//! Narrow interfaces the core calls out through. Adapters live in
//! `tally-store`; the core never touches a file or a hash function itself.
//!
//! ```text
//! ┌──────────────────────┐        ┌──────────────────────────────┐
//! │  CheckoutProcessor   │──────► │  PersistenceStore            │
//! │  (after commit)      │        │  MemoryStore / JsonFileStore │
//! └──────────────────────┘        └──────────────────────────────┘
//! ┌──────────────────────┐        ┌──────────────────────────────┐
//! │  Terminal login      │──────► │  Authenticator               │
//! │                      │        │  CredentialStore (argon2)    │
//! └──────────────────────┘        └──────────────────────────────┘
//! ```
//!
//! Both traits are synchronous. Calls happen outside the catalog lock, so an
//! implementation may block briefly on I/O.

use crate::error::CoreResult;
use crate::types::{DateRange, Product, Sale, UserIdentity};

/// Durable home for the catalog and the sales history.
///
/// Implementations convert their own failures to [`CoreError::Store`].
///
/// [`CoreError::Store`]: crate::error::CoreError::Store
pub trait PersistenceStore: Send + Sync {
    /// Every product, in catalog order. Empty if nothing has been saved.
    fn load_catalog(&self) -> CoreResult<Vec<Product>>;

    /// Replaces the stored catalog with `products`.
    fn save_catalog(&self, products: &[Product]) -> CoreResult<()>;

    /// Appends one committed sale.
    fn append_sale(&self, sale: &Sale) -> CoreResult<()>;

    /// Sales whose timestamp falls in `range`, oldest first.
    fn load_sales(&self, range: DateRange) -> CoreResult<Vec<Sale>>;
}

/// Checks a username/password pair.
pub trait Authenticator: Send + Sync {
    /// ## Errors
    /// `InvalidCredentials` when the user is unknown or the password is wrong.
    /// The two cases are not distinguished.
    fn authenticate(&self, username: &str, password: &str) -> CoreResult<UserIdentity>;
}
