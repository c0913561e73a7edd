//! Handler functions for the page access API.
//!
//! These functions read the session snapshot, load the subscription lock for
//! the signed-in user through `services::subscription`, and delegate the
//! decision to `services::navigation`.

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::ResolvedUser;
use crate::services::navigation::{navigation_for, page_outcome, NavGroupView, PageOutcome};
use crate::services::subscription::LockState;
use crate::AppState;

#[derive(Deserialize, Debug)]
pub struct PageQuery {
    pub path: String,
}

pub async fn page(State(state): State<AppState>, Query(query): Query<PageQuery>) -> Json<PageOutcome> {
    let session = state.session.snapshot();
    let lock = match session.user.as_ref() {
        Some(user) if !session.loading => Some(state.subscription.lock_state(user).await),
        _ => None,
    };
    let outcome = page_outcome(&session, lock.as_ref(), &query.path);
    tracing::debug!(path = %query.path, ?outcome, "page decision");
    Json(outcome)
}

pub async fn navigation(State(state): State<AppState>, Extension(user): Extension<ResolvedUser>) -> Json<Vec<NavGroupView>> {
    let lock = state.subscription.lock_state(&user).await;
    Json(navigation_for(&user, &lock))
}

pub async fn subscription(State(state): State<AppState>, Extension(user): Extension<ResolvedUser>) -> Json<LockState> {
    Json(state.subscription.lock_state(&user).await)
}
