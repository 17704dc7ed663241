use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use common::JsonStream;
use common::protocol::{ADD_PATH, AddResponseMessage};
use thiserror::Error;
use tracing::{info, instrument};

use super::{backend_unavailable, reject_disallowed};
use crate::backend::ResponseCapture;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::AppQuery;
use crate::state::AppState;

const HANDLER: &str = "add";
const WRAP_WITH_DIRECTORY: &str = "wrap-with-directory";

/// Appended to the first entry's name when the upload was wrapped in a
/// directory.
pub const WRAPPED_SUFFIX: &str = " (wrapped)";

/// What gets recorded for one add request.
#[derive(Debug, PartialEq, Eq)]
pub struct AddedContent {
    pub content_id: String,
    pub label: String,
    pub byte_size: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CanonicalError {
    #[error("no response message")]
    NoMessage,
    #[error("invalid size '{0}' in response message")]
    ParseSize(String),
}

impl CanonicalError {
    fn kind(&self) -> &'static str {
        match self {
            CanonicalError::NoMessage => "no_message",
            CanonicalError::ParseSize(_) => "parse_size",
        }
    }
}

/// Reduce an add response stream to the single record kept for it.
///
/// The last message describes the top-level object (the last file, or the
/// wrapping directory), so its hash and size are used. Its name is used too,
/// except for wrapped uploads where the directory has no name of its own and
/// the first entry's name is used instead.
pub fn canonicalize(
    messages: &[AddResponseMessage],
    wrapped: bool,
) -> Result<AddedContent, CanonicalError> {
    let (Some(first), Some(last)) = (messages.first(), messages.last()) else {
        return Err(CanonicalError::NoMessage);
    };

    let label = if wrapped {
        format!("{}{}", first.name, WRAPPED_SUFFIX)
    } else {
        last.name.clone()
    };

    let byte_size = last
        .size
        .parse::<i64>()
        .map_err(|_| CanonicalError::ParseSize(last.size.clone()))?;

    Ok(AddedContent {
        content_id: last.hash.clone(),
        label,
        byte_size,
    })
}

/// Upload files through the node and record the top-level entry.
///
/// Known limitation: the upload is committed on the node before ownership is
/// written. If the upsert fails the node keeps the content, nothing is rolled
/// back, and the caller gets a 500 with no ownership recorded.
#[utoipa::path(
    post,
    path = "/add",
    tag = "Content",
    operation_id = "add",
    summary = "Upload files and record them for the caller",
    description = "Forwards the multipart upload to the storage node unchanged and relays its response. \
        On success the top-level object (last result, or the wrapping directory) is recorded as owned by the caller. \
        Only `wrap-with-directory` is accepted as a query parameter.",
    params(
        ("wrap-with-directory" = Option<bool>, Query, description = "Wrap the uploaded files in a directory"),
    ),
    request_body(content_type = "multipart/form-data", description = "Files to upload"),
    responses(
        (status = 200, description = "Stream of add results, one JSON object per entry", body = AddResponseMessage),
        (status = 400, description = "Invalid query parameter (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing credentials (AUTH_MISSING)", body = ErrorBody),
        (status = 500, description = "Unreadable backend response (DECODE_ERROR) or store failure (INTERNAL_ERROR). \
            On a store failure the node keeps the uploaded content and nothing is rolled back.", body = ErrorBody),
        (status = 502, description = "Storage node unreachable (BAD_GATEWAY)", body = ErrorBody),
    ),
    security(("basic" = [])),
)]
#[instrument(skip_all, fields(user = %auth_user.username))]
pub async fn add(
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
        &[WRAP_WITH_DIRECTORY],
        "only wrap-with-directory argument is allowed",
    )?;
    let wrapped = query.flag(WRAP_WITH_DIRECTORY);

    let capture = state
        .backend
        .forward(ADD_PATH, &query.0, &headers, body)
        .await
        .map_err(|e| backend_unavailable(&state, HANDLER, e))?;

    if !capture.is_success() {
        return Err(AppError::Backend(capture));
    }

    let messages = JsonStream::<AddResponseMessage>::collect_all(capture.body()).map_err(|e| {
        state.metrics.record_error(HANDLER, "unmarshal");
        AppError::from(e)
    })?;

    let added = canonicalize(&messages, wrapped).map_err(|e| {
        state.metrics.record_error(HANDLER, e.kind());
        AppError::Decode(e.to_string())
    })?;

    let rows = state
        .store
        .upsert_active(
            &auth_user.username,
            &added.content_id,
            &added.label,
            added.byte_size,
        )
        .await
        .map_err(|e| {
            state.metrics.record_error(HANDLER, "store");
            AppError::from(e)
        })?;
    state.metrics.record_store_rows("upsert", rows);

    info!(
        hash = %added.content_id,
        name = %added.label,
        size = added.byte_size,
        "Recorded upload"
    );

    Ok(capture)
}
