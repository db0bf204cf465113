use crate::views;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database error: {0}")]
    DbError(#[from] sqlx::Error),
    #[error("template error: {0}")]
    RenderError(#[from] askama::Error),
    #[error("{0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => {
                tracing::debug!(%msg, "not found");
                views::not_found_page()
            }
            AppError::DbError(e) => {
                tracing::error!(error = %e, "database error");
                views::server_error_page()
            }
            AppError::RenderError(e) => {
                tracing::error!(error = %e, "template error");
                views::server_error_page()
            }
        }
    }
}
