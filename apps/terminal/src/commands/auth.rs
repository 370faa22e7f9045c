//! # Auth Commands
//!
//! Sign-in opens a session with its own cart; sign-out discards it.

use std::sync::Arc;

use serde::Serialize;
use tally_core::UserIdentity;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub session_id: Uuid,
    pub user: UserIdentity,
    pub can_manage_inventory: bool,
    pub can_view_analytics: bool,
}

/// Verifies credentials and opens a session.
///
/// Argon2 verification is CPU bound, so it runs on the blocking pool.
///
/// ## Errors
/// `UNAUTHORIZED` for an unknown user or wrong password; the two are not
/// distinguished.
pub async fn login(
    state: Arc<AppState>,
    username: String,
    password: String,
) -> Result<LoginResponse, ApiError> {
    debug!(username = %username, "login command");

    let auth_state = Arc::clone(&state);
    let user = tokio::task::spawn_blocking(move || {
        auth_state.store.auth().authenticate(&username, &password)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Login task failed: {e}")))??;

    let session_id = state
        .sessions
        .open(user.clone(), state.config.default_channel);

    Ok(LoginResponse {
        session_id,
        can_manage_inventory: user.role.can_manage_inventory(),
        can_view_analytics: user.role.can_view_analytics(),
        user,
    })
}

pub fn logout(state: &AppState, session_id: Uuid) -> Result<(), ApiError> {
    debug!(session_id = %session_id, "logout command");
    state.sessions.close(session_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::{ConfigState, StoreState};
    use tally_core::Role;

    fn app() -> Arc<AppState> {
        Arc::new(AppState::new(
            ConfigState::default(),
            StoreState::in_memory().unwrap(),
        ))
    }

    #[tokio::test]
    async fn test_login_opens_session() {
        let state = app();
        let resp = login(Arc::clone(&state), "admin".into(), "admin".into())
            .await
            .unwrap();

        assert_eq!(resp.user.role, Role::Admin);
        assert!(resp.can_view_analytics);
        assert_eq!(state.sessions.len(), 1);

        logout(&state, resp.session_id).unwrap();
        assert!(state.sessions.is_empty());
    }

    #[tokio::test]
    async fn test_bad_password() {
        let state = app();
        let err = login(Arc::clone(&state), "cashier".into(), "nope".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert!(state.sessions.is_empty());
    }
}
