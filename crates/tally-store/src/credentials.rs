//! # Credential Store
//!
//! [`Authenticator`] backed by argon2 password hashes held in memory.
//!
//! ```text
//! add_user("cashier", "cashier", Cashier)
//!      │  argon2id + 16-byte random salt
//!      ▼
//! "$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>"   ← only this is kept
//!
//! authenticate("cashier", "cashier")
//!      │  PasswordHash::new(stored) → verify_password
//!      ▼
//! Ok(UserIdentity { id: 2, username: "cashier", role: Cashier })
//! ```

use std::collections::HashMap;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tally_core::{Authenticator, CoreError, CoreResult, Role, UserIdentity};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
struct StoredUser {
    identity: UserIdentity,
    password_hash: String,
}

/// Usernames are matched exactly (case-sensitive).
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    users: HashMap<String, StoredUser>,
    next_id: u32,
}

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> StoreResult<String> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
        .map_err(|e| StoreError::Hash(format!("Failed to encode salt: {e}")))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::Hash(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored hash. A malformed hash never matches.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

impl CredentialStore {
    pub fn new() -> Self {
        CredentialStore::default()
    }

    /// Registers a user; ids are assigned from 1 in registration order.
    ///
    /// Re-registering a username replaces its password and role but keeps
    /// its id.
    pub fn add_user(&mut self, username: &str, password: &str, role: Role) -> StoreResult<UserIdentity> {
        let password_hash = hash_password(password)?;
        let id = match self.users.get(username) {
            Some(existing) => existing.identity.id,
            None => {
                self.next_id += 1;
                self.next_id
            }
        };

        let identity = UserIdentity {
            id,
            username: username.to_string(),
            role,
        };
        self.users.insert(
            username.to_string(),
            StoredUser {
                identity: identity.clone(),
                password_hash,
            },
        );
        debug!(user_id = id, username, ?role, "User registered");
        Ok(identity)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Authenticator for CredentialStore {
    fn authenticate(&self, username: &str, password: &str) -> CoreResult<UserIdentity> {
        match self.users.get(username) {
            Some(user) if verify_password(password, &user.password_hash) => {
                debug!(user_id = user.identity.id, "Authenticated");
                Ok(user.identity.clone())
            }
            _ => {
                warn!(username, "Authentication failed");
                Err(CoreError::InvalidCredentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_salted() {
        let a = hash_password("admin").unwrap();
        let b = hash_password("admin").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(verify_password("admin", &a));
        assert!(verify_password("admin", &b));
        assert!(!verify_password("Admin", &a));
        assert!(!verify_password("admin", "not-a-hash"));
    }

    #[test]
    fn test_authenticate() {
        let mut store = CredentialStore::new();
        store.add_user("admin", "admin", Role::Admin).unwrap();
        store.add_user("cashier", "cashier", Role::Cashier).unwrap();

        let cashier = store.authenticate("cashier", "cashier").unwrap();
        assert_eq!(cashier.id, 2);
        assert_eq!(cashier.role, Role::Cashier);

        assert!(matches!(
            store.authenticate("cashier", "admin"),
            Err(CoreError::InvalidCredentials)
        ));
        assert!(matches!(
            store.authenticate("nobody", "admin"),
            Err(CoreError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_re_register_keeps_id() {
        let mut store = CredentialStore::new();
        store.add_user("admin", "admin", Role::Admin).unwrap();
        let again = store.add_user("admin", "s3cret", Role::Admin).unwrap();

        assert_eq!(again.id, 1);
        assert_eq!(store.len(), 1);
        assert!(store.authenticate("admin", "admin").is_err());
        assert!(store.authenticate("admin", "s3cret").is_ok());
    }
}
