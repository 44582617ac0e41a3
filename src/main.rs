use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use connectup::{
    api::{create_router, AppState, RateLimiter},
    config::Config,
    db::{self, SessionRepository},
    error::AppError,
    MIGRATOR,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,connectup=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("🚀 Starting ConnectUp server v{}...", env!("CARGO_PKG_VERSION"));

    let config = Arc::new(Config::from_env()?);
    tracing::info!("✅ Configuration loaded (match writes: {})", config.match_write_mode);

    let pool = db::connect(&config).await?;
    tracing::info!("✅ Database connected: {}", config.database_url);

    MIGRATOR.run(&pool).await?;
    tracing::info!("✅ Database migrations completed");

    let rate_limiter = Arc::new(RateLimiter::from_config(&config));
    tracing::info!(
        "✅ Rate limiter configured ({} req / {}s per IP)",
        config.rate_limit_max,
        config.rate_limit_window_secs
    );

    let state = AppState::new(pool.clone(), config.clone());

    // Spawn background task for session cleanup
    {
        let pool = pool.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(3600)); // Every hour
            loop {
                interval.tick().await;
                match SessionRepository::cleanup_expired(&pool).await {
                    Ok(removed) => tracing::debug!("🧹 {} expired sessions cleaned up", removed),
                    Err(e) => tracing::error!("❌ Session cleanup failed: {}", e),
                }
            }
        });
        tracing::info!("✅ Session cleanup task started (runs hourly)");
    }

    // Spawn background task for rate limiter and pair lock cleanup
    {
        let limiter = rate_limiter.clone();
        let locks = state.matchmaker.locks().clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300)); // Every 5 minutes
            loop {
                interval.tick().await;
                limiter.cleanup().await;
                locks.cleanup().await;
                tracing::debug!("🧹 Rate limiter and pair locks cleaned up");
            }
        });
        tracing::info!("✅ Rate limiter cleanup task started");
    }

    let app = create_router(state, rate_limiter);

    let addr = config.server_address();
    tracing::info!("🌐 Server listening on http://{}", addr);
    tracing::info!("🏥 Health check: http://{}/api/v1/health", addr);
    tracing::info!("");
    tracing::info!("📚 API Endpoints:");
    tracing::info!("  POST   /api/v1/auth/signup                - Register new user");
    tracing::info!("  POST   /api/v1/auth/login                 - Login");
    tracing::info!("  POST   /api/v1/auth/logout                - Logout (requires auth)");
    tracing::info!("  GET    /api/v1/auth/me                    - Current profile (requires auth)");
    tracing::info!("  GET    /api/v1/users                      - Browse users (requires auth)");
    tracing::info!("  POST   /api/v1/users/like/:id             - Like a user (requires auth)");
    tracing::info!("  POST   /api/v1/users/dislike/:id          - Pass on a user (requires auth)");
    tracing::info!("  GET    /api/v1/users/matches              - Matched users (requires auth)");
    tracing::info!("  POST   /api/v1/messages                   - Send message (requires auth)");
    tracing::info!("  GET    /api/v1/messages/conversations     - Conversations (requires auth)");
    tracing::info!("  GET    /api/v1/matches                    - Match records (requires auth)");
    tracing::info!("  GET    /api/v1/mentors                    - Mentor directory (requires auth)");
    tracing::info!("  POST   /api/v1/mentors/:id/request        - Ask for mentorship (requires auth)");
    tracing::info!("  POST   /api/v1/mentors/me/accept-request  - Accept a mentee (requires auth)");
    tracing::info!("  GET    /ws                                - Real-time relay socket");
    tracing::info!("");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
