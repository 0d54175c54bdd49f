//! HTTP ingress and bootstrap for the order fulfillment saga orchestrator.
//!
//! Exposes `create_order`/`cancel_order` over HTTP, with structured logging
//! (`tracing`) and Prometheus metrics, mirroring the shape of the teacher's
//! API crate but fronting a [`saga::SagaCoordinator`] instead of a
//! synchronous domain service.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use bus::MessageBus;
use metrics_exporter_prometheus::PrometheusHandle;
use store::SagaStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S, B>(state: Arc<AppState<S, B>>, metrics_handle: PrometheusHandle) -> Router
where
    S: SagaStore + 'static,
    B: MessageBus + 'static,
{
    let metrics_router = Router::new().route("/metrics", get(routes::system::metrics)).with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/orders/create_order", post(routes::orders::create_order::<S, B>))
        .route("/orders/cancel_order", post(routes::orders::cancel_order::<S, B>))
        .with_state(state)
        .merge(metrics_router)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
