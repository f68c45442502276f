//! Quill server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use fred::interfaces::ClientLike;
use quill_api::{middleware::AppState, router as api_router};
use quill_common::Config;
use quill_core::RedisCache;
use quill_core::services::{
    AccountService, CommentService, LikeService, MailerService, NotificationService, PostService,
    StatsService, TaxonomyService, TokenService,
};
use quill_db::repositories::{
    CategoryRepository, CommentRepository, LikeRepository, NotificationPreferenceRepository,
    NotificationRepository, PasswordResetRepository, PostRepository, TagRepository, UserRepository,
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
                .unwrap_or_else(|_| "quill=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting quill server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = quill_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    quill_db::migrate(&db).await?;
    info!("Migrations completed");

    // Connect to Redis
    info!("Connecting to Redis...");
    let fred_config = fred::types::config::Config::from_url(&config.redis.url)?;
    let redis_client = fred::clients::Client::new(fred_config, None, None, None);
    redis_client.connect();
    redis_client.wait_for_connect().await?;
    let redis_client = Arc::new(redis_client);
    info!("Connected to Redis");

    let cache = Arc::new(RedisCache::new(
        redis_client,
        config.redis.prefix.clone(),
        config.cache.post_ttl_secs,
    ));

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));
    let category_repo = CategoryRepository::new(Arc::clone(&db));
    let tag_repo = TagRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));
    let like_repo = LikeRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));
    let preference_repo = NotificationPreferenceRepository::new(Arc::clone(&db));
    let reset_repo = PasswordResetRepository::new(Arc::clone(&db));

    // Initialize services
    let token_service = TokenService::new(
        config.auth.jwt_secret.clone(),
        config.auth.access_token_ttl_secs,
        config.auth.refresh_token_ttl_secs,
    );
    let mailer = MailerService::new(config.email.clone());
    if mailer.is_enabled() {
        info!("SMTP delivery enabled");
    } else {
        info!("SMTP delivery disabled, emails will be logged");
    }

    let account_service = AccountService::new(
        user_repo.clone(),
        reset_repo,
        token_service.clone(),
        mailer.clone(),
        config.auth.reset_token_ttl_secs,
    );
    let taxonomy_service = TaxonomyService::new(category_repo.clone(), tag_repo.clone());
    let post_service = PostService::new(
        post_repo.clone(),
        category_repo,
        tag_repo,
        taxonomy_service.clone(),
        cache,
    );
    let notification_service = NotificationService::new(
        notification_repo,
        preference_repo,
        user_repo.clone(),
        mailer,
    );
    let comment_service = CommentService::new(
        comment_repo.clone(),
        post_repo.clone(),
        notification_service.clone(),
    );
    let like_service = LikeService::new(
        like_repo.clone(),
        post_repo.clone(),
        post_service.clone(),
        notification_service.clone(),
    );
    let stats_service = StatsService::new(user_repo.clone(), post_repo, comment_repo, like_repo);

    // Create app state
    let state = AppState {
        account_service,
        post_service,
        comment_service,
        like_service,
        notification_service,
        taxonomy_service,
        stats_service,
        token_service,
        user_repo,
    };

    // Build router
    let app = Router::new()
        .merge(api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            quill_api::middleware::auth_middleware,
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
    let addr = SocketAddr::from((config.server.host.parse::<std::net::IpAddr>()?, config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
