//! `ParlorServer` — Axum HTTP + WebSocket server assembly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::motd;
use crate::origin::OriginPolicy;
use crate::pages;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::hub::ChatHub;
use crate::websocket::registry::SessionRegistry;
use crate::websocket::session::run_chat_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Admission and membership for chat connections.
    pub registry: Arc<SessionRegistry>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Rendered by the `/metrics` endpoint.
    pub metrics: PrometheusHandle,
    /// Whether chat URLs use the secure scheme.
    pub production: bool,
    /// Interval between liveness pings.
    pub ping_interval: Duration,
    /// Disconnect after this long without a pong.
    pub pong_timeout: Duration,
}

/// The parlor chat server.
pub struct ParlorServer {
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    metrics: PrometheusHandle,
}

impl ParlorServer {
    /// Create a new server from configuration.
    pub fn new(config: ServerConfig, metrics: PrometheusHandle) -> Self {
        let hub = Arc::new(ChatHub::new(config.max_drops));
        let policy = OriginPolicy::from_allowed(config.allowed_origins.clone());
        let registry = Arc::new(SessionRegistry::new(hub, policy, config.send_buffer));
        Self {
            config,
            registry,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics,
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            shutdown: self.shutdown.clone(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
            production: self.config.production,
            ping_interval: Duration::from_secs(self.config.ping_interval_secs),
            pong_timeout: Duration::from_secs(self.config.pong_timeout_secs),
        };

        Router::new()
            .route("/", get(pages::index_handler))
            .route("/chat", get(chat_handler))
            .route("/motd", get(motd::motd_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind and serve. Returns the bound address and the serve task handle;
    /// the task runs until the shutdown token cancels.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let bind = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&bind).await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let token = self.shutdown.token();

        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "server error");
            }
        });

        Ok((addr, handle))
    }

    /// The session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// The shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /chat — origin-gated WebSocket upgrade.
async fn chat_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
) -> Response {
    let origin = headers.get(header::ORIGIN).and_then(|v| v.to_str().ok());
    match state.registry.admit(origin).await {
        Ok(admitted) => {
            let registry = state.registry.clone();
            let ping = state.ping_interval;
            let pong = state.pong_timeout;
            ws.on_upgrade(move |socket| run_chat_session(socket, admitted, registry, ping, pong))
        }
        Err(rejection) => {
            warn!(%rejection, "chat upgrade rejected");
            (StatusCode::FORBIDDEN, rejection.to_string()).into_response()
        }
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.registry.hub().connection_count();
    Json(health::health_check(state.start_time, connections))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}
