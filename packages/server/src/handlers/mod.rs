pub mod add;
pub mod dag_import;
pub mod pin_ls;
pub mod pin_rm;

use crate::error::AppError;
use crate::extractors::query::AppQuery;
use crate::state::AppState;

/// Fail with a validation error if the query carries a parameter outside
/// `allowed`.
fn reject_disallowed(
    state: &AppState,
    handler: &str,
    query: &AppQuery,
    allowed: &[&str],
    message: &str,
) -> Result<(), AppError> {
    match query.first_disallowed(allowed) {
        Some(param) => {
            state.metrics.record_invalid_param(handler, param);
            Err(AppError::Validation(message.to_string()))
        }
        None => Ok(()),
    }
}

/// The storage node could not be reached or did not answer in time.
fn backend_unavailable(state: &AppState, handler: &str, err: reqwest::Error) -> AppError {
    state.metrics.record_error(handler, "backend_request");
    AppError::BackendUnavailable(err.to_string())
}
