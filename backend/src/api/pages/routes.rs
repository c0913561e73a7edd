//! Defines the HTTP routes for page access and navigation.
//!
//! `/pages` answers for anonymous visitors too (with a redirect); the menu and
//! subscription endpoints need a resolved user.

use axum::middleware::from_fn_with_state;
use axum::{routing::get, Router};

use super::handlers::{navigation, page, subscription};
use crate::auth::require_user;
use crate::AppState;

pub fn pages_router(state: AppState) -> Router<AppState> {
    let signed_in = Router::new()
        .route("/navigation", get(navigation))
        .route("/subscription", get(subscription))
        .route_layer(from_fn_with_state(state, require_user));

    Router::new().route("/pages", get(page)).merge(signed_in)
}
