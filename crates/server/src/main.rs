//! Pictogram server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use pictogram_api::{AppState, router as api_router, streaming_handler};
use pictogram_common::Config;
use pictogram_core::{
    EventPublisherService, FollowingService, InteractionService, MessagingService, PostService,
    PresenceRouter, UserService,
};
use pictogram_db::repositories::{
    CommentRepository, FollowingRepository, LikeRepository, MessageRepository, PostRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pictogram=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting pictogram server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = pictogram_db::connect(&config.database).await?;

    // Run migrations
    info!("Running database migrations...");
    pictogram_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let following_repo = FollowingRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let message_repo = MessageRepository::new(Arc::clone(&db));

    // The presence router delivers real-time events to live streaming
    // connections and doubles as the event publisher for core services
    let presence = PresenceRouter::new();
    let event_publisher: EventPublisherService = Arc::new(presence.clone());

    // Initialize services
    let user_service = UserService::new(user_repo.clone());
    let post_service = PostService::new(post_repo.clone(), user_repo.clone());

    let mut following_service = FollowingService::new(following_repo, user_repo.clone());
    following_service.set_event_publisher(event_publisher.clone());

    let interaction_service = InteractionService::new(like_repo, comment_repo, post_repo);

    let mut messaging_service = MessagingService::new(message_repo, user_repo);
    messaging_service.set_event_publisher(event_publisher);

    // Create app state
    let state = AppState {
        user_service,
        post_service,
        following_service,
        interaction_service,
        messaging_service,
        presence,
    };

    // Build router
    let app = Router::new()
        .route("/streaming", get(streaming_handler))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            pictogram_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
