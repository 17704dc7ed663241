use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use common::JsonStream;
use common::protocol::{DAG_IMPORT_PATH, DagImportMessage};
use thiserror::Error;
use tracing::{info, instrument, warn};

use super::{backend_unavailable, reject_disallowed};
use crate::backend::ResponseCapture;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::{AppQuery, flag_enabled};
use crate::state::AppState;

const HANDLER: &str = "dag_import";
const STATS: &str = "stats";

pub const IMPORT_LABEL_SUFFIX: &str = " (dag import)";

/// Roots reported by one import, all sharing the request's total size.
#[derive(Debug, PartialEq, Eq)]
pub struct ImportedRoots {
    pub content_ids: Vec<String>,
    pub byte_size: i64,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Unmarshal(#[from] common::DecodeError),
    #[error("{0}")]
    PinError(String),
    #[error("no root CID in response")]
    NoRootCid,
}

impl ImportError {
    fn kind(&self) -> &'static str {
        match self {
            ImportError::Unmarshal(_) => "unmarshal",
            ImportError::PinError(_) => "pin_error",
            ImportError::NoRootCid => "no_root_cid",
        }
    }
}

/// Collect root content ids up to the stats message.
///
/// The node sends one message per root, then a single stats message for the
/// whole request; anything after it is ignored. Every root gets the total
/// byte count, since the node reports no per-root size. Returns `None` if
/// the stream ends without stats.
pub fn collect_roots(body: &[u8]) -> Result<Option<ImportedRoots>, ImportError> {
    let mut content_ids = Vec::new();

    for message in JsonStream::<DagImportMessage>::new(body) {
        let message = message?;

        if let Some(root) = message.root {
            if !root.pin_error_msg.is_empty() {
                return Err(ImportError::PinError(root.pin_error_msg));
            }
            let cid = root.root_cid().ok_or(ImportError::NoRootCid)?;
            content_ids.push(cid.to_string());
        }

        if let Some(stats) = message.stats {
            return Ok(Some(ImportedRoots {
                content_ids,
                byte_size: stats.block_bytes_count,
            }));
        }
    }

    Ok(None)
}

pub fn import_label(content_id: &str) -> String {
    format!("{content_id}{IMPORT_LABEL_SUFFIX}")
}

/// Import archives through the node and record every reported root.
///
/// Known limitation: roots are pinned on the node before ownership is
/// written, one upsert per root. If an upsert fails the node keeps every
/// root, nothing is rolled back, and rows written before the failure stay.
#[utoipa::path(
    post,
    path = "/dag/import",
    tag = "Content",
    operation_id = "dagImport",
    summary = "Import CAR archives and record their roots for the caller",
    description = "Forwards the multipart upload to the storage node with `stats=true` and relays its response. \
        Every imported root is recorded as owned by the caller, sized with the import's total byte count. \
        Only `stats` is accepted as a query parameter, and it must not be `false`.",
    params(
        ("stats" = Option<bool>, Query, description = "Must be absent or true; forced on before forwarding"),
    ),
    request_body(content_type = "multipart/form-data", description = "CAR files to import"),
    responses(
        (status = 200, description = "Stream of root and stats messages", body = DagImportMessage),
        (status = 400, description = "Invalid query parameter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing credentials (AUTH_MISSING)", body = ErrorBody),
        (status = 500, description = "Pin error, missing root or unreadable response (DECODE_ERROR), or store failure (INTERNAL_ERROR). \
            On a store failure the node keeps the imported roots and nothing is rolled back.", body = ErrorBody),
        (status = 502, description = "Storage node unreachable (BAD_GATEWAY)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all, fields(user = %auth_user.username))]
pub async fn dag_import(
    auth_user: AuthUser,
    State(state): State<AppState>,
    query: AppQuery,
    headers: HeaderMap,
    body: Body,
) -> Result<ResponseCapture, AppError> {
    reject_disallowed(
        &state,
        HANDLER,
        &query,
        &[STATS],
        "only stats argument is allowed",
    )?;
    if query.get(STATS).is_some_and(|value| !flag_enabled(value)) {
        state.metrics.record_invalid_param(HANDLER, STATS);
        return Err(AppError::Validation(
            "stats argument cannot be false".to_string(),
        ));
    }

    let mut pairs = query.into_pairs();
    if pairs.is_empty() {
        pairs.push((STATS.to_string(), "true".to_string()));
    }

    let capture = state
        .backend
        .forward(DAG_IMPORT_PATH, &pairs, &headers, body)
        .await
        .map_err(|e| backend_unavailable(&state, HANDLER, e))?;

    if !capture.is_success() {
        return Err(AppError::Backend(capture));
    }

    let imported = collect_roots(capture.body()).map_err(|e| {
        state.metrics.record_error(HANDLER, e.kind());
        AppError::Decode(e.to_string())
    })?;

    let Some(imported) = imported else {
        warn!("Import response ended without stats; nothing recorded");
        return Ok(capture);
    };

    for content_id in &imported.content_ids {
        let rows = state
            .store
            .upsert_active(
                &auth_user.username,
                content_id,
                &import_label(content_id),
                imported.byte_size,
            )
            .await
            .map_err(|e| {
                state.metrics.record_error(HANDLER, "store");
                AppError::from(e)
            })?;
        state.metrics.record_store_rows("upsert", rows);
    }

    info!(
        roots = imported.content_ids.len(),
        size = imported.byte_size,
        "Recorded import"
    );

    Ok(capture)
}
