//! API middleware.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use pictogram_core::{
    FollowingService, InteractionService, MessagingService, PostService, PresenceRouter,
    UserService,
};

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// User lookup and profile service.
    pub user_service: UserService,
    /// Post service.
    pub post_service: PostService,
    /// Follow graph service.
    pub following_service: FollowingService,
    /// Like and comment service.
    pub interaction_service: InteractionService,
    /// Direct messaging service.
    pub messaging_service: MessagingService,
    /// Streaming connection registry.
    pub presence: PresenceRouter,
}

/// Authentication middleware.
///
/// Resolves a `Bearer` token to a user row and stores it in the request
/// extensions for the [`crate::extractors::AuthUser`] extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user) = state.user_service.authenticate_by_token(token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
