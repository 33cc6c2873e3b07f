//! HTTP surface for Wayfarer
//!
//! Assembles the router, the middleware stack and the error envelope
//! adapter around a shared [`CacheContext`].

#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod auth;
mod cors;
mod envelope;
mod error;
mod extract;
mod hardening;
mod health;
mod rate_limit;
mod request_context;
mod request_log;
pub mod trips;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request};
use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::compression::CompressionLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use wayfarer_cache::CacheContext;
use wayfarer_config::{Config, Environment};

use self::request_context::ClientIpResolver;

pub use self::auth::{Principal, TokenVerifier, UserClaims};
pub use self::error::{ApiResult, HandlerError};
pub use self::extract::{ApiJson, ApiPath};

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheContext,
    pub environment: Environment,
    pub started_at: Instant,
}

/// Assembled server with all routes and middleware
pub struct Server {
    router: Router,
    listen_address: SocketAddr,
}

impl Server {
    /// Build the server from configuration and a connected cache
    ///
    /// # Errors
    ///
    /// Returns an error if rate-limiter or security header construction fails
    pub fn new(config: Config, cache: CacheContext) -> anyhow::Result<Self> {
        let server = config.server;
        let listen_address = server
            .listen_address
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));
        let environment = server.environment;
        let client_ip = ClientIpResolver::new(server.client_ip.as_ref());

        let state = AppState {
            cache,
            environment,
            started_at: Instant::now(),
        };

        // Build base router with feature routes
        let mut app = Router::new();

        // Health check
        if server.health.enabled {
            app = app.route(&server.health.path, axum::routing::get(health::health_handler));
        }

        // API routes
        app = app.nest(&format!("/api/{}", server.api_version), trips::trip_routes());

        let mut app = app.fallback(route_not_found).with_state(state);

        // Apply middleware layers (innermost first)

        // Request body size cap for extractors
        app = app.layer(DefaultBodyLimit::max(server.http.body_limit_bytes));

        // Panics become INTERNAL_ERROR envelopes
        app = app.layer(CatchPanicLayer::custom(error::panic_response));

        // Bearer token authentication
        if let Some(ref auth_config) = server.auth
            && auth_config.enabled
        {
            let verifier = TokenVerifier::new(&auth_config.secret);
            let public_paths: Arc<[String]> = auth_config.public_paths.clone().into();
            app = app.layer(axum::middleware::from_fn(move |req, next| {
                let verifier = verifier.clone();
                let public_paths = Arc::clone(&public_paths);
                async move { auth::auth_middleware(verifier, public_paths, req, next).await }
            }));
        }

        // Rate limiting
        if let Some(ref rl_config) = server.rate_limit {
            let limiter = Arc::new(rate_limit::RequestLimiter::new(rl_config)?);
            app = app.layer(axum::middleware::from_fn(move |req, next| {
                let limiter = Arc::clone(&limiter);
                async move { rate_limit::rate_limit_middleware(limiter, client_ip, req, next).await }
            }));
        }

        // Error envelopes (outside everything that can fail)
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            envelope::envelope_middleware(environment, client_ip, req, next)
        }));

        // Request logging
        app = app.layer(axum::middleware::from_fn(move |req, next| {
            request_log::request_log_middleware(environment, client_ip, req, next)
        }));

        // Security headers
        if server.http.security_headers {
            for (name, value) in hardening::security_headers(&server.http)? {
                app = app.layer(SetResponseHeaderLayer::if_not_present(name, value));
            }
        }

        // Tracing
        app = app.layer(TraceLayer::new_for_http());

        // CORS
        if let Some(ref cors_config) = server.cors {
            app = app.layer(cors::cors_layer(cors_config));
        }

        // Response compression
        if server.http.compression {
            app = app.layer(CompressionLayer::new());
        }

        Ok(Self {
            router: app,
            listen_address,
        })
    }

    /// Get the configured listen address
    #[must_use]
    pub const fn listen_address(&self) -> SocketAddr {
        self.listen_address
    }

    /// Consume the server and return the inner router
    ///
    /// Useful for testing when the caller manages the listener
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Start serving requests
    ///
    /// Blocks until the cancellation token is triggered.
    ///
    /// # Errors
    ///
    /// Returns an error if binding the TCP listener or serving fails
    pub async fn serve(self, shutdown: tokio_util::sync::CancellationToken) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_address).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!(%local_addr, "server listening");

        axum::serve(
            listener,
            self.router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
            tracing::info!("graceful shutdown initiated");
        })
        .await?;

        Ok(())
    }
}

async fn route_not_found(request: Request) -> Response {
    HandlerError::route_not_found(request.method(), request.uri().path()).into_response()
}
