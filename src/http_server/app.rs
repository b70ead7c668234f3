use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use color_eyre::eyre::{Context, Result, eyre};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http_server::http_routes::{
    generate_playlist::generate_playlist,
    health::health,
    spotify_auth::{exchange_token, refresh_token},
};
use crate::http_server::state::{AuthProxyState, GenerationProxyState};

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

pub struct HttpServerConfig {
    pub port: u16,
    pub allowed_origins: Vec<String>,
    /// `None` leaves the token exchange routes out
    pub auth: Option<Arc<AuthProxyState>>,
    /// `None` leaves the generation route out
    pub generation: Option<Arc<GenerationProxyState>>,
}

/// Token exchange proxy routes
pub fn auth_router(state: Arc<AuthProxyState>) -> Router {
    Router::new()
        .route("/", post(exchange_token))
        .route("/auth/spotify", post(exchange_token))
        .route("/auth/spotify/refresh", post(refresh_token))
        .route("/health", get(health))
        .with_state(state)
}

/// Playlist generation proxy routes
pub fn generation_router(state: Arc<GenerationProxyState>) -> Router {
    Router::new()
        .route("/api/generate-playlist", post(generate_playlist))
        .route("/health", get(health))
        .with_state(state)
}

/// `*` allows any origin, otherwise only the listed ones.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer> {
    if allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(CorsLayer::permissive());
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .wrap_err_with(|| format!("Invalid allowed origin: {}", origin))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

pub fn build_router(config: &HttpServerConfig) -> Result<Router> {
    let router = match (&config.auth, &config.generation) {
        (Some(auth), Some(generation)) => {
            // Both define /health, keep a single one
            let generation = Router::new()
                .route("/api/generate-playlist", post(generate_playlist))
                .with_state(generation.clone());
            auth_router(auth.clone()).merge(generation)
        }
        (Some(auth), None) => auth_router(auth.clone()),
        (None, Some(generation)) => generation_router(generation.clone()),
        (None, None) => return Err(eyre!("No proxy service selected")),
    };

    Ok(router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.allowed_origins)?),
    ))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down HTTP server");
}

pub async fn start(config: HttpServerConfig) -> Result<()> {
    let app = build_router(&config)?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", config.port))?;
    log::info!("Proxy running on port {}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}
