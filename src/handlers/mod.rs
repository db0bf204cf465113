pub mod artists;
pub mod pages;
pub mod shows;
pub mod venues;

use crate::error::AppError;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::Deserialize;

/// Raw urlencoded pairs, repeated keys preserved for multi-selects.
pub type FormPairs = Vec<(String, String)>;

#[derive(Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub search_term: String,
}

/// Numeric record id from the path. Anything that is not an `i64` names no
/// record, so it is rejected as not found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityId(pub i64);

impl<S> FromRequestParts<S> for EntityId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<i64>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(EntityId(id)),
            Err(rejection) => Err(AppError::NotFound(format!(
                "unusable record id: {}",
                rejection.body_text()
            ))),
        }
    }
}
