use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::add::add))
        .routes(routes!(handlers::dag_import::dag_import))
        .routes(routes!(handlers::pin_ls::pin_ls))
        .routes(routes!(handlers::pin_rm::pin_rm))
}
