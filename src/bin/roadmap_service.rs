//! Roadmap Service Binary
//!
//! Runs the roadmap kernel as a REST API service:
//! - Structured JSON logging
//! - Request tracing with correlation IDs
//! - Graceful shutdown handling
//! - Health check endpoints
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (in-memory store when unset)
//! - `PORT`: Service port (default: 8001)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... cargo run --bin roadmap_service --features service
//! ```

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, info_span, warn, Instrument};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use roadmap_kernel::service::{
    create_router, metrics_middleware, LogFormat, ServiceConfig, ServiceState, REQUEST_ID_HEADER,
};
use roadmap_kernel::{InMemoryRoadmapStore, PostgresRoadmapStore};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            "roadmap_service=info,roadmap_kernel=info,tower_http=info,sqlx=warn".into()
        });

    match format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_current_span(true)
                        .with_span_events(FmtSpan::CLOSE)
                        .flatten_event(true),
                )
                .init();
        }
    }
}

/// Request logging middleware that assigns a request id and records timing
async fn request_logging_middleware(mut request: Request, next: Next) -> Response {
    let start = Instant::now();

    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        request.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    let method = request.method().clone();
    let uri = request.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = tracing::field::Empty,
        latency_ms = tracing::field::Empty,
    );

    let mut response = next.run(request).instrument(span.clone()).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    span.record("status", status);
    span.record("latency_ms", latency.as_millis() as u64);

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    info!(
        target: "roadmap_service::access",
        request_id = %request_id,
        method = %method,
        path = %uri,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request completed"
    );

    response
}

/// Build the router over PostgreSQL when configured, otherwise in memory.
async fn build_router() -> Result<Router, Box<dyn std::error::Error>> {
    if std::env::var("DATABASE_URL").is_err() {
        warn!("DATABASE_URL not set; using in-memory store. Data is lost on restart!");
        return Ok(create_router(ServiceState::new(InMemoryRoadmapStore::new())));
    }

    info!("Connecting to PostgreSQL...");
    let connect_start = Instant::now();

    let connect = tokio::time::timeout(Duration::from_secs(30), PostgresRoadmapStore::from_env());
    let store = match connect.await {
        Ok(Ok(store)) => store,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to connect to PostgreSQL");
            return Err(e.into());
        }
        Err(_) => {
            tracing::error!("PostgreSQL connection timeout after 30s");
            return Err("Database connection timeout".into());
        }
    };
    store.migrate().await?;

    info!(
        latency_ms = connect_start.elapsed().as_millis() as u64,
        "PostgreSQL connection established"
    );

    Ok(create_router(ServiceState::new(store)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env();
    init_tracing(config.log_format);

    let version = env!("CARGO_PKG_VERSION");
    let build_sha = option_env!("BUILD_SHA").unwrap_or("dev");

    info!(version = version, build_sha = build_sha, "Starting Roadmap Service");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = build_router()
        .await?
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = config.bind_address().parse()?;
    info!(address = %addr, version = version, "Roadmap Service listening");

    let listener = TcpListener::bind(addr).await?;

    info!("Ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Roadmap Service shutdown complete");

    Ok(())
}
