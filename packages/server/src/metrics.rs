//! Prometheus counters for the intercepting handlers.
//!
//! A `ProxyMetrics` is created once at startup, stored in [`AppState`], and
//! handed to every handler through axum state. Nothing here is global: tests
//! build their own instance and read counters back.
//!
//! [`AppState`]: crate::state::AppState

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use common::protocol::{ADD_PATH, DAG_IMPORT_PATH, PIN_LS_PATH, PIN_RM_PATH};
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::state::AppState;

#[derive(Clone)]
pub struct ProxyMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,
    responses_total: IntCounterVec,
    invalid_query_params_total: IntCounterVec,
    errors_total: IntCounterVec,
    store_rows_total: IntCounterVec,
}

impl std::fmt::Debug for ProxyMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyMetrics").finish_non_exhaustive()
    }
}

impl ProxyMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let responses_total = IntCounterVec::new(
            Opts::new(
                "pin_proxy_responses_total",
                "Responses returned to callers, by handler and status code",
            ),
            &["handler", "code"],
        )
        .expect("metric can be created");

        let invalid_query_params_total = IntCounterVec::new(
            Opts::new(
                "pin_proxy_invalid_query_params_total",
                "Requests rejected for a disallowed query parameter",
            ),
            &["handler", "param"],
        )
        .expect("metric can be created");

        let errors_total = IntCounterVec::new(
            Opts::new(
                "pin_proxy_errors_total",
                "Handler failures, by handler and failure kind",
            ),
            &["handler", "kind"],
        )
        .expect("metric can be created");

        let store_rows_total = IntCounterVec::new(
            Opts::new(
                "pin_proxy_store_rows_total",
                "Ownership rows affected by store writes",
            ),
            &["op"],
        )
        .expect("metric can be created");

        for collector in [
            &responses_total,
            &invalid_query_params_total,
            &errors_total,
            &store_rows_total,
        ] {
            registry
                .register(Box::new(collector.clone()))
                .expect("metric can be registered");
        }

        Self {
            inner: Arc::new(Inner {
                registry,
                responses_total,
                invalid_query_params_total,
                errors_total,
                store_rows_total,
            }),
        }
    }

    pub fn record_response(&self, handler: &str, code: StatusCode) {
        self.inner
            .responses_total
            .with_label_values(&[handler, code.as_str()])
            .inc();
    }

    pub fn record_invalid_param(&self, handler: &str, param: &str) {
        self.inner
            .invalid_query_params_total
            .with_label_values(&[handler, param])
            .inc();
    }

    pub fn record_error(&self, handler: &str, kind: &str) {
        self.inner
            .errors_total
            .with_label_values(&[handler, kind])
            .inc();
    }

    pub fn record_store_rows(&self, op: &str, rows: u64) {
        self.inner
            .store_rows_total
            .with_label_values(&[op])
            .inc_by(rows);
    }

    pub fn response_count(&self, handler: &str, code: StatusCode) -> u64 {
        self.inner
            .responses_total
            .with_label_values(&[handler, code.as_str()])
            .get()
    }

    pub fn error_count(&self, handler: &str, kind: &str) -> u64 {
        self.inner
            .errors_total
            .with_label_values(&[handler, kind])
            .get()
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ProxyMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Handler label for a request path.
pub fn handler_label(path: &str) -> &'static str {
    match path {
        ADD_PATH => "add",
        DAG_IMPORT_PATH => "dag_import",
        PIN_LS_PATH => "pin_ls",
        PIN_RM_PATH => "pin_rm",
        _ => "other",
    }
}

/// Middleware that counts final response codes per handler, including
/// requests rejected by extractors before a handler runs.
pub async fn track_responses(
    State(metrics): State<ProxyMetrics>,
    request: Request,
    next: Next,
) -> Response {
    let handler = handler_label(request.uri().path());
    let response = next.run(request).await;
    metrics.record_response(handler, response.status());
    response
}

/// GET /metrics: Prometheus scrape endpoint.
pub async fn prometheus_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.gather_and_encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("{e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
