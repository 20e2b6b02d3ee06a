//! API endpoints.

mod following;
mod messaging;
mod posts;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/following", following::router())
        .nest("/posts", posts::router())
        .nest("/messaging", messaging::router())
        .nest("/users", users::router())
}
