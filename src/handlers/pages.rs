use crate::{db, error::AppError, flash::Flash, state::AppState, views};
use axum::{extract::State, response::Html};

const RECENT_LIMIT: i64 = 10;

pub async fn home(
    State(app_state): State<AppState>,
    mut flash: Flash,
) -> Result<(Flash, Html<String>), AppError> {
    let venues = db::recent_venues(&app_state.pool, RECENT_LIMIT).await?;
    let artists = db::recent_artists(&app_state.pool, RECENT_LIMIT).await?;
    let page = views::HomePage {
        notices: flash.take_notices(),
        venues,
        artists,
    };
    Ok((flash, views::render(&page)?))
}

pub async fn not_found() -> AppError {
    AppError::NotFound("no such page".to_string())
}
