use axum::extract::{FromRequestParts, Query, rejection::QueryRejection};
use axum::http::request::Parts;

use crate::error::AppError;

/// Query string as ordered `(name, value)` pairs.
///
/// Repeated names and value-less flags (`?stats`) are kept as sent.
/// A malformed query string is rejected as `AppError::Validation`.
#[derive(Debug, Clone, Default)]
pub struct AppQuery(pub Vec<(String, String)>);

impl<S> FromRequestParts<S> for AppQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|e: QueryRejection| AppError::Validation(e.body_text()))?;
        Ok(AppQuery(pairs))
    }
}

impl AppQuery {
    /// The first parameter whose name is not in `allowed`.
    pub fn first_disallowed(&self, allowed: &[&str]) -> Option<&str> {
        self.0
            .iter()
            .map(|(name, _)| name.as_str())
            .find(|name| !allowed.contains(name))
    }

    /// Value of the first occurrence of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value of `name`, in request order.
    pub fn values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the flag `name` is on: present with any value other than
    /// the literal `false`. An empty value counts as on.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(flag_enabled)
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

pub fn flag_enabled(value: &str) -> bool {
    value != "false"
}
