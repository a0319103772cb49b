//! Route handlers

pub mod health;
pub mod task;
pub mod week;

use axum::Router;

use crate::state::AppState;

/// All REST routes, awaiting application state
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(task::router())
        .merge(week::router())
}
