mod v0;

use utoipa_axum::router::OpenApiRouter;

use crate::state::AppState;

pub fn api_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/v0", v0::routes())
}
