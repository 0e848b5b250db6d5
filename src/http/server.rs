//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared `AppState` once at startup
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, metrics, origin, rate limit)
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::{HeaderTokenSource, SessionGuard, SessionStore, UserDirectory};
use crate::config::GateConfig;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::routes;
use crate::lifecycle::shutdown::recv_shutdown;
use crate::observability::metrics;
use crate::points::{LedgerStore, PointsBalance};
use crate::security::origin::{same_origin_middleware, OriginConfigError, SameOriginEnforcer};
use crate::security::rate_limit::{rate_limit_middleware, RateLimiter};
use crate::store::MemoryStore;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ArcSwap<GateConfig>>,
    pub guard: SessionGuard,
    pub rate_limiter: Arc<RateLimiter>,
    pub origin: Arc<SameOriginEnforcer>,
    pub balances: PointsBalance,
    pub sessions: Arc<dyn SessionStore>,
    pub ledger: Arc<dyn LedgerStore>,
    pub users: Arc<dyn UserDirectory>,
    pub started_at: Instant,
}

impl AppState {
    /// Build state over a single in-memory store.
    pub fn new(config: GateConfig, store: Arc<MemoryStore>) -> Result<Self, OriginConfigError> {
        Self::with_stores(config, store.clone(), store.clone(), store)
    }

    /// Build state over arbitrary store implementations.
    pub fn with_stores(
        config: GateConfig,
        sessions: Arc<dyn SessionStore>,
        ledger: Arc<dyn LedgerStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Result<Self, OriginConfigError> {
        let origin = Arc::new(SameOriginEnforcer::new(&config.app.base_url)?);
        let tokens = Arc::new(HeaderTokenSource::new(
            config.session.cookie_name.clone(),
            config.session.allow_bearer,
        ));
        let rate_limiter = Arc::new(RateLimiter::new(Duration::from_secs(
            config.rate_limit.sweep_interval_secs,
        )));

        tracing::info!(base_origin = %origin.base_origin(), "Same-origin enforcer configured");

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            guard: SessionGuard::new(sessions.clone(), tokens),
            rate_limiter,
            origin,
            balances: PointsBalance::new(ledger.clone()),
            sessions,
            ledger,
            users,
            started_at: Instant::now(),
        })
    }
}

/// Build the public API router.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let request_secs = state.config.load().timeouts.request_secs;

    let api = Router::new()
        .route("/api/me", get(routes::me))
        .route("/api/points/balance", get(routes::points_balance))
        .route("/api/auth/logout", post(routes::logout))
        .route("/api/seller/overview", get(routes::seller_overview))
        .route("/api/admin/points/adjust", post(routes::adjust_points))
        .route("/api/admin/plans/renewal-points", post(routes::preview_renewal_points))
        .route("/api/admin/users/{user_id}/renewals", post(routes::apply_renewal))
        .route("/api/admin/users/{user_id}/points", get(routes::user_points))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), same_origin_middleware));

    Router::new()
        .route("/health", get(routes::health))
        .merge(api)
        .with_state(state)
        .layer(middleware::from_fn(track_metrics))
        .layer(TimeoutLayer::new(Duration::from_secs(request_secs)))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(set_request_id_layer())
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

/// HTTP server for the public API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        Self {
            router: build_router(state),
        }
    }

    /// Serve until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(recv_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
