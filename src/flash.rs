//! One-shot notices that survive a redirect.
//!
//! Notices are written to the store under a random token and the token is
//! handed to the browser in the `flash` cookie. The next page that extracts
//! [`Flash`] consumes them and clears the cookie.

use crate::{db, error::AppError, state::AppState};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, IntoResponseParts, Redirect, Response, ResponseParts},
};
use nanoid::nanoid;
use sqlx::SqlitePool;
use std::convert::Infallible;

pub const FLASH_COOKIE: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
    Info,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
            Level::Info => "info",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "success" => Level::Success,
            "error" => Level::Error,
            _ => Level::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self.level {
            Level::Success => "notice notice-success",
            Level::Error => "notice notice-error",
            Level::Info => "notice notice-info",
        }
    }
}

/// Notices carried over from the previous request.
#[derive(Debug, Default)]
pub struct Flash {
    token: Option<String>,
    notices: Vec<Notice>,
}

impl Flash {
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl FromRequestParts<AppState> for Flash {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        app_state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = flash_token(&parts.headers) else {
            return Ok(Flash::default());
        };
        let notices = db::take_notices(&app_state.pool, &token).await?;
        Ok(Flash {
            token: Some(token),
            notices,
        })
    }
}

impl IntoResponseParts for Flash {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if self.token.is_some() {
            res.headers_mut().append(
                header::SET_COOKIE,
                HeaderValue::from_static("flash=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"),
            );
        }
        Ok(res)
    }
}

/// `303 See Other` to `to`, with `notice` shown on the target page.
pub async fn redirect_with(pool: &SqlitePool, to: &str, notice: Notice) -> Result<Response, AppError> {
    let token = nanoid!();
    db::store_notices(pool, &token, std::slice::from_ref(&notice)).await?;
    let cookie = format!("{FLASH_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax");
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to(to)).into_response())
}

pub fn flash_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == FLASH_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_read_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; flash=abc123; other=1"),
        );
        assert_eq!(flash_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn empty_or_missing_cookie_yields_no_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(flash_token(&headers), None);
        headers.insert(header::COOKIE, HeaderValue::from_static("flash="));
        assert_eq!(flash_token(&headers), None);
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(Level::parse("success"), Level::Success);
        assert_eq!(Level::parse("warning"), Level::Info);
        assert_eq!(Level::parse(Level::Error.as_str()), Level::Error);
    }
}
