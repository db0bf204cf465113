pub mod config;
pub mod db;
pub mod error;
pub mod flash;
pub mod forms;
pub mod handlers;
pub mod listing;
pub mod models;
pub mod state;
pub mod views;

use axum::{
    routing::{get, post},
    Router,
};
use config::Config;
use error::AppError;
use handlers::{artists, pages, shows, venues};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use state::AppState;
use std::str::FromStr;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub fn router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/venues", get(venues::list_venues))
        .route("/venues/search", post(venues::search_venues))
        .route(
            "/venues/create",
            get(venues::create_venue_form).post(venues::create_venue_submission),
        )
        .route(
            "/venues/{venue_id}",
            get(venues::show_venue).delete(venues::delete_venue),
        )
        .route(
            "/venues/{venue_id}/edit",
            get(venues::edit_venue).post(venues::edit_venue_submission),
        )
        .route("/artists", get(artists::list_artists))
        .route("/artists/search", post(artists::search_artists))
        .route(
            "/artists/create",
            get(artists::create_artist_form).post(artists::create_artist_submission),
        )
        .route(
            "/artists/{artist_id}",
            get(artists::show_artist).delete(artists::delete_artist),
        )
        .route(
            "/artists/{artist_id}/edit",
            get(artists::edit_artist).post(artists::edit_artist_submission),
        )
        .route("/shows", get(shows::list_shows))
        .route(
            "/shows/create",
            get(shows::create_show_form).post(shows::create_show_submission),
        )
        .nest_service("/static", ServeDir::new("static"))
        .fallback(pages::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn connect(config: &Config) -> Result<SqlitePool, sqlx::Error> {
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connect_options)
        .await
}

/// A private in-memory store with the schema applied.
///
/// Every connection to `sqlite::memory:` opens a fresh database, so the pool
/// is pinned to one connection that is never recycled.
pub async fn connect_in_memory() -> Result<SqlitePool, AppError> {
    let connect_options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(connect_options)
        .await?;
    db::init_schema(&pool).await?;
    Ok(pool)
}
