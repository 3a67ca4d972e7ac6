use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use crate::bot::dispatcher::{DispatchStats, StatsSnapshot};
use crate::database::store::Store;
use chrono::{DateTime, Utc};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub database: DatabaseHealth,
    pub uptime_seconds: u64,
    pub updates: UpdateCounters,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseHealth {
    pub status: String,
    pub connection_pool_size: u32,
    pub response_time_ms: u64,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateCounters {
    pub received: u64,
    pub handled: u64,
    pub fallbacks: u64,
    pub ignored: u64,
    pub failed: u64,
}

impl From<StatsSnapshot> for UpdateCounters {
    fn from(s: StatsSnapshot) -> Self {
        Self {
            received: s.received,
            handled: s.handled,
            fallbacks: s.fallbacks,
            ignored: s.ignored,
            failed: s.failed,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub stats: Arc<DispatchStats>,
    pub start_time: DateTime<Utc>,
}

pub struct HealthService {
    pub router: Router,
}

impl HealthService {
    pub fn new(store: Store, stats: Arc<DispatchStats>) -> Self {
        let state = AppState {
            store,
            stats,
            start_time: Utc::now(),
        };

        let router = Router::new()
            .route("/health", get(health_check))
            .route("/health/ready", get(readiness_check))
            .route("/health/live", get(liveness_check))
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

        Self { router }
    }

    /// Serves until `shutdown` resolves.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<()> {
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

type HealthResult = Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)>;

async fn health_check(State(state): State<AppState>) -> HealthResult {
    let start = std::time::Instant::now();

    let db_status = match state.store.ping().await {
        Ok(()) => "healthy",
        Err(e) => {
            tracing::warn!("Health check database probe failed: {}", e);
            "unhealthy"
        }
    };

    let response_time_ms = start.elapsed().as_millis() as u64;
    let uptime = Utc::now()
        .signed_duration_since(state.start_time)
        .num_seconds()
        .max(0) as u64;

    let health_response = HealthResponse {
        status: db_status.to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: DatabaseHealth {
            status: db_status.to_string(),
            connection_pool_size: state.store.pool().size(),
            response_time_ms,
        },
        uptime_seconds: uptime,
        updates: state.stats.snapshot().into(),
    };

    if db_status == "healthy" {
        Ok(Json(health_response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(health_response)))
    }
}

async fn readiness_check(State(state): State<AppState>) -> Result<Json<&'static str>, StatusCode> {
    match state.store.ping().await {
        Ok(()) => Ok(Json("ready")),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}

async fn liveness_check() -> Json<&'static str> {
    Json("alive")
}
