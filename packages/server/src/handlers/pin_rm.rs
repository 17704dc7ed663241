use std::collections::HashSet;

use axum::Json;
use axum::extract::State;
use common::protocol::PinRmResponse;
use tracing::{info, instrument, warn};

use super::reject_disallowed;
use crate::backend::ResponseCapture;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::AppQuery;
use crate::state::AppState;
use crate::store::Ownership;

const HANDLER: &str = "pin_rm";
const ARG: &str = "arg";

/// Outcome of checking a removal request against current ownership.
#[derive(Debug, PartialEq, Eq)]
pub struct RemovalPlan {
    /// Ids no other identity holds; these are unpinned on the node.
    pub forward: Vec<String>,
}

/// Decide which of the caller's `requested` ids must also be unpinned on the
/// storage node, given every active ownership of those ids.
///
/// Fails with the ids the caller does not actively own; in that case nothing
/// may be changed. Ids held by another identity stay pinned on the node.
/// `requested` must be free of duplicates; output keeps its order.
pub fn reconcile(
    caller: &str,
    requested: &[String],
    active: &[Ownership],
) -> Result<RemovalPlan, Vec<String>> {
    let mut unconfirmed: HashSet<&str> = requested.iter().map(String::as_str).collect();
    let mut shared: HashSet<&str> = HashSet::new();

    for ownership in active {
        if ownership.identity == caller {
            unconfirmed.remove(ownership.content_id.as_str());
        } else {
            shared.insert(ownership.content_id.as_str());
        }
    }

    if !unconfirmed.is_empty() {
        return Err(requested
            .iter()
            .filter(|id| unconfirmed.contains(id.as_str()))
            .cloned()
            .collect());
    }

    Ok(RemovalPlan {
        forward: requested
            .iter()
            .filter(|id| !shared.contains(id.as_str()))
            .cloned()
            .collect(),
    })
}

/// Drop repeated ids, keeping the first occurrence.
fn unique_in_order(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if seen.insert(id.as_str()) {
            unique.push(id.clone());
        }
    }
    unique
}

#[utoipa::path(
    post,
    path = "/pin/rm",
    tag = "Pins",
    operation_id = "pinRm",
    summary = "Remove pins owned by the caller",
    description = "Marks the given content ids as removed for the caller. Fails with 404 unless the caller \
        actively owns every id. Ids still pinned by another user are not unpinned on the storage node; \
        if every id is shared, the node is not contacted. An unreachable node does not fail the request.",
    params(
        ("arg" = Vec<String>, Query, description = "Content id to unpin; repeat for several"),
    ),
    responses(
        (status = 200, description = "Ids removed, as requested", body = PinRmResponse),
        (status = 400, description = "Invalid or missing query parameter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing credentials (AUTH_MISSING)", body = ErrorBody),
        (status = 404, description = "Caller does not own an id (NOT_FOUND)", body = ErrorBody),
        (status = 500, description = "Store failure (INTERNAL_ERROR), or the node's error relayed after local removal", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all, fields(user = %auth_user.username))]
pub async fn pin_rm(
    auth_user: AuthUser,
    State(state): State<AppState>,
    query: AppQuery,
) -> Result<Json<PinRmResponse>, AppError> {
    reject_disallowed(&state, HANDLER, &query, &[ARG], "only arg arguments are allowed")?;

    let requested: Vec<String> = query.values(ARG).map(str::to_string).collect();
    if requested.is_empty() {
        state.metrics.record_error(HANDLER, "no_args");
        return Err(AppError::Validation(
            "argument \"ipfs-path\" is required".to_string(),
        ));
    }
    let unique = unique_in_order(&requested);

    let active = state
        .store
        .list_active_by_content_ids(&unique)
        .await
        .map_err(|e| {
            state.metrics.record_error(HANDLER, "store");
            AppError::from(e)
        })?;

    let plan = reconcile(&auth_user.username, &unique, &active).map_err(|unowned| {
        state.metrics.record_error(HANDLER, "not_pinned");
        AppError::NotFound(format!(
            "not pinned or pinned indirectly: {}",
            unowned.join(", ")
        ))
    })?;

    let rows = state
        .store
        .deactivate(&auth_user.username, &unique)
        .await
        .map_err(|e| {
            state.metrics.record_error(HANDLER, "store");
            AppError::from(e)
        })?;
    state.metrics.record_store_rows("deactivate", rows);

    let removed = Json(PinRmResponse { pins: requested });

    if plan.forward.is_empty() {
        info!(pins = unique.len(), "Removed shared pins; node not contacted");
        return Ok(removed);
    }

    let response = match state.backend.pin_rm(&plan.forward).await {
        Ok(response) => response,
        Err(e) => {
            state.metrics.record_error(HANDLER, "backend_request");
            warn!(error = %e, "Could not reach backend; removal kept locally");
            return Ok(removed);
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let capture = match ResponseCapture::record(response).await {
            Ok(capture) => capture,
            Err(e) => {
                state.metrics.record_error(HANDLER, "discard_body");
                warn!(
                    error = %e,
                    %status,
                    "Failed to read backend error body; relaying status only"
                );
                let mut capture = ResponseCapture::new();
                capture.set_status(status);
                capture
            }
        };
        return Err(AppError::Backend(capture));
    }

    if let Err(e) = response.bytes().await {
        state.metrics.record_error(HANDLER, "discard_body");
        warn!(error = %e, "Failed to read backend response");
    }

    info!(
        pins = unique.len(),
        unpinned = plan.forward.len(),
        "Removed pins"
    );
    Ok(removed)
}
