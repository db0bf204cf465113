use crate::{
    db,
    error::AppError,
    flash::{self, Flash, Notice},
    forms::ShowForm,
    handlers::FormPairs,
    listing,
    state::AppState,
    views::{self, ShowFormPage},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Response},
    Form,
};
use chrono::Utc;

pub async fn list_shows(
    State(app_state): State<AppState>,
    mut flash: Flash,
) -> Result<(Flash, Html<String>), AppError> {
    let shows = db::list_show_details(&app_state.pool).await?;
    let page = views::ShowsPage {
        notices: flash.take_notices(),
        shows: listing::upcoming_listing(shows, Utc::now()),
    };
    Ok((flash, views::render(&page)?))
}

pub async fn create_show_form(mut flash: Flash) -> Result<(Flash, Html<String>), AppError> {
    let page = ShowFormPage {
        notices: flash.take_notices(),
        form: ShowForm::starting_at(Utc::now()),
        errors: Vec::new(),
    };
    Ok((flash, views::render(&page)?))
}

pub async fn create_show_submission(
    State(app_state): State<AppState>,
    Form(pairs): Form<FormPairs>,
) -> Result<Response, AppError> {
    let form = ShowForm::from_pairs(&pairs);
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let page = ShowFormPage {
                notices: vec![Notice::error(format!(
                    "An error occurred. Show could not be listed. {errors}"
                ))],
                errors: errors.messages(),
                form,
            };
            return views::render_with_status(StatusCode::UNPROCESSABLE_ENTITY, &page);
        }
    };

    let notice = match db::create_show(&app_state.pool, &draft).await {
        Ok(show) => {
            tracing::info!(show_id = show.id, venue_id = show.venue_id, artist_id = show.artist_id, "show listed");
            Notice::success("Show was successfully listed!")
        }
        Err(AppError::NotFound(missing)) => {
            let page = ShowFormPage {
                notices: vec![Notice::error(format!(
                    "An error occurred. Show could not be listed. {missing}"
                ))],
                errors: vec![missing],
                form,
            };
            return views::render_with_status(StatusCode::UNPROCESSABLE_ENTITY, &page);
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to list show");
            Notice::error("An error occurred. Show could not be listed.")
        }
    };
    flash::redirect_with(&app_state.pool, "/", notice).await
}
