//! # Session State
//!
//! One entry per signed-in cashier, each owning its own checkout session.
//!
//! ## Thread Safety
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session State                                        │
//! │                                                                         │
//! │  SessionState                                                          │
//! │    Mutex<HashMap<Uuid, Arc<Mutex<Session>>>>                           │
//! │         │  held only to look up / insert / remove                      │
//! │         ▼                                                               │
//! │  Session (one per login)                                               │
//! │    user: UserIdentity                                                  │
//! │    checkout: CheckoutSession   ◄── the cart lives here                 │
//! │                                                                         │
//! │  Two commands for the same session are serialized by the inner Mutex. │
//! │  Commands for different sessions only meet at the Catalog lock.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tally_core::{Channel, CheckoutSession, UserIdentity};
use tracing::info;
use uuid::Uuid;

use crate::error::ApiError;

/// A signed-in user and their cart.
#[derive(Debug)]
pub struct Session {
    pub user: UserIdentity,
    pub signed_in_at: DateTime<Utc>,
    pub checkout: CheckoutSession,
}

/// Shared handle to one session.
pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Debug, Default)]
pub struct SessionState {
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionState {
    pub fn new() -> Self {
        SessionState::default()
    }

    /// Opens a session with an empty cart on `channel`.
    pub fn open(&self, user: UserIdentity, channel: Channel) -> Uuid {
        let id = Uuid::new_v4();
        info!(session_id = %id, user_id = user.id, role = ?user.role, "Session opened");
        let session = Session {
            user,
            signed_in_at: Utc::now(),
            checkout: CheckoutSession::for_channel(channel),
        };
        lock(&self.sessions).insert(id, Arc::new(Mutex::new(session)));
        id
    }

    /// Ends a session; its cart is discarded.
    pub fn close(&self, id: Uuid) -> Result<(), ApiError> {
        match lock(&self.sessions).remove(&id) {
            Some(_) => {
                info!(session_id = %id, "Session closed");
                Ok(())
            }
            None => Err(unknown_session()),
        }
    }

    pub fn get(&self, id: Uuid) -> Result<SessionHandle, ApiError> {
        lock(&self.sessions)
            .get(&id)
            .cloned()
            .ok_or_else(unknown_session)
    }

    pub fn len(&self) -> usize {
        lock(&self.sessions).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.sessions).is_empty()
    }
}

/// Locks a session handle obtained from [`SessionState::get`].
pub fn lock_session(handle: &SessionHandle) -> MutexGuard<'_, Session> {
    lock(handle)
}

fn unknown_session() -> ApiError {
    ApiError::unauthorized("Unknown or expired session")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_core::Role;

    fn cashier() -> UserIdentity {
        UserIdentity {
            id: 2,
            username: "cashier".to_string(),
            role: Role::Cashier,
        }
    }

    #[test]
    fn test_open_and_close() {
        let sessions = SessionState::new();
        let id = sessions.open(cashier(), Channel::Online);
        assert_eq!(sessions.len(), 1);

        let handle = sessions.get(id).unwrap();
        assert_eq!(lock_session(&handle).checkout.cart().channel(), Channel::Online);

        sessions.close(id).unwrap();
        assert!(sessions.is_empty());
        assert_eq!(sessions.close(id).unwrap_err().code, ErrorCode::Unauthorized);
    }

    #[test]
    fn test_sessions_have_separate_carts() {
        let sessions = SessionState::new();
        let a = sessions.open(cashier(), Channel::InStore);
        let b = sessions.open(cashier(), Channel::InStore);
        assert_ne!(a, b);

        let handle_a = sessions.get(a).unwrap();
        lock_session(&handle_a).checkout.set_discount(10.0).unwrap();
        let handle_b = sessions.get(b).unwrap();
        assert!(lock_session(&handle_b).checkout.cart().discount().is_zero());
    }

    #[test]
    fn test_unknown_session() {
        let sessions = SessionState::new();
        let err = sessions.get(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }
}
