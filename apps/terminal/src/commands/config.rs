//! # Config Commands
//!
//! Retrieving terminal configuration.

use tracing::debug;

use crate::state::{AppState, ConfigState};

/// Gets the current terminal configuration.
///
/// ## When Used
/// - Client startup (store name, default channel)
/// - Receipt printing
/// - Currency formatting
///
/// Available without signing in.
pub fn get_config(state: &AppState) -> ConfigState {
    debug!("get_config command");
    state.config.clone()
}
