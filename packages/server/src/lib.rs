pub mod backend;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod store;

use axum::middleware;
use axum::routing::get;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable as ScalarServable};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Pin Proxy API",
        version = "0.1.0",
        description = "Ownership-tracking proxy in front of a content-addressed storage node. \
            Each Basic-auth user sees and removes only the content they uploaded."
    ),
    tags(
        (name = "Content", description = "Uploads and archive imports"),
        (name = "Pins", description = "Per-user pin listing and removal"),
    ),
    modifiers(&SecurityAddon),
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "basic",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
        );
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .nest("/api", routes::api_routes())
        .split_for_parts();

    let proxy_metrics = state.metrics.clone();

    router
        .route("/metrics", get(metrics::prometheus_metrics))
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api.clone()))
        .merge(Scalar::with_url("/scalar", api))
        .layer(middleware::from_fn_with_state(
            proxy_metrics,
            metrics::track_responses,
        ))
        .layer(TraceLayer::new_for_http())
}
