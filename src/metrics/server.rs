//! HTTP exporter for the capture metrics.
//!
//! `/metrics` serves the Prometheus text format. `/health` summarizes the
//! running capture as JSON and answers 503 while frames are being
//! converted with stale buffers (the preview was resized mid-capture and
//! not restarted).

use crate::metrics::{CaptureMetrics, MetricsSnapshot};
use axum::{extract::State, http::header, http::StatusCode, routing::get, Json, Router};
use prometheus::{Encoder, TextEncoder};
use serde::Serialize;
use std::net::SocketAddr;
use thiserror::Error;
use tower_http::cors::CorsLayer;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind metrics listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("metrics server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Coarse state of the capture as seen from its metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStatus {
    /// No preview running.
    Idle,
    /// Preview running and frames match the allocated buffers.
    Streaming,
    /// Preview running but frames no longer match the allocated buffers.
    Stale,
}

/// Body of the `/health` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: CaptureStatus,
    pub buffer_width: i64,
    pub buffer_height: i64,
    pub frames_converted: u64,
    pub stale_frames: i64,
    pub exceptions_reported: u64,
}

impl HealthReport {
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        let status = match (snapshot.previewing, snapshot.stale_frames) {
            (false, _) => CaptureStatus::Idle,
            (true, 0) => CaptureStatus::Streaming,
            (true, _) => CaptureStatus::Stale,
        };
        Self {
            status,
            buffer_width: snapshot.buffer_width,
            buffer_height: snapshot.buffer_height,
            frames_converted: snapshot.frames_converted,
            stale_frames: snapshot.stale_frames,
            exceptions_reported: snapshot.exceptions_reported,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.status {
            CaptureStatus::Idle | CaptureStatus::Streaming => StatusCode::OK,
            CaptureStatus::Stale => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Serves one [`CaptureMetrics`] registry over HTTP.
pub struct MetricsServer {
    addr: SocketAddr,
    metrics: CaptureMetrics,
}

impl MetricsServer {
    /// Creates a server listening on all interfaces at `port`.
    pub fn on_port(port: u16, metrics: CaptureMetrics) -> Self {
        Self {
            addr: ([0, 0, 0, 0], port).into(),
            metrics,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    fn router(metrics: CaptureMetrics) -> Router {
        Router::new()
            .route("/metrics", get(metrics_handler))
            .route("/health", get(health_handler))
            .layer(CorsLayer::permissive())
            .with_state(metrics)
    }

    /// Serves requests until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.addr;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        tracing::info!(%addr, "Serving capture metrics");

        axum::serve(listener, Self::router(self.metrics))
            .await
            .map_err(ServerError::Serve)
    }
}

async fn metrics_handler(
    State(metrics): State<CaptureMetrics>,
) -> (StatusCode, [(header::HeaderName, String); 1], String) {
    let content_type = TextEncoder::new().format_type().to_string();
    match metrics.encode() {
        Ok(body) => (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode capture metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain".to_string())],
                e.to_string(),
            )
        }
    }
}

async fn health_handler(
    State(metrics): State<CaptureMetrics>,
) -> (StatusCode, Json<HealthReport>) {
    let report = HealthReport::from_snapshot(&metrics.snapshot());
    (report.status_code(), Json(report))
}
