use axum::Json;
use axum::extract::State;
use common::protocol::{PinInfo, PinLsResponse};
use tracing::instrument;

use super::reject_disallowed;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::AppQuery;
use crate::state::AppState;

const HANDLER: &str = "pin_ls";

#[utoipa::path(
    post,
    path = "/pin/ls",
    tag = "Pins",
    operation_id = "pinLs",
    summary = "List the caller's pins",
    description = "Lists the content ids the caller currently has pinned, served from the proxy's own records. \
        The storage node is not contacted. Query parameters are not accepted.",
    responses(
        (status = 200, description = "Caller's pins, all reported as recursive", body = PinLsResponse),
        (status = 400, description = "Query parameter given (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing credentials (AUTH_MISSING)", body = ErrorBody),
        (status = 500, description = "Store failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all, fields(user = %auth_user.username))]
pub async fn pin_ls(
    auth_user: AuthUser,
    State(state): State<AppState>,
    query: AppQuery,
) -> Result<Json<PinLsResponse>, AppError> {
    reject_disallowed(&state, HANDLER, &query, &[], "no arguments are allowed")?;

    let content_ids = state
        .store
        .list_active_by_identity(&auth_user.username)
        .await
        .map_err(|e| {
            state.metrics.record_error(HANDLER, "store");
            AppError::from(e)
        })?;

    let keys = content_ids
        .into_iter()
        .map(|content_id| (content_id, PinInfo::recursive()))
        .collect();

    Ok(Json(PinLsResponse { keys }))
}
