use crate::{
    db,
    error::AppError,
    flash::{self, Flash, Notice},
    forms::ArtistForm,
    handlers::{EntityId, FormPairs, SearchForm},
    listing,
    state::AppState,
    views::{self, ArtistFormPage},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Response},
    Form,
};
use chrono::Utc;

pub async fn list_artists(
    State(app_state): State<AppState>,
    mut flash: Flash,
) -> Result<(Flash, Html<String>), AppError> {
    let artists = db::list_artist_names(&app_state.pool).await?;
    let shows = db::list_shows(&app_state.pool).await?;
    let counts = listing::upcoming_counts(&shows, Utc::now(), |s| s.artist_id);
    let page = views::ArtistsPage {
        notices: flash.take_notices(),
        artists: listing::with_counts(artists, &counts),
    };
    Ok((flash, views::render(&page)?))
}

pub async fn search_artists(
    State(app_state): State<AppState>,
    Form(search): Form<SearchForm>,
) -> Result<Html<String>, AppError> {
    let artists = db::list_artist_names(&app_state.pool).await?;
    let shows = db::list_shows(&app_state.pool).await?;
    let counts = listing::upcoming_counts(&shows, Utc::now(), |s| s.artist_id);
    let results = listing::search(artists, &search.search_term, &counts);
    tracing::debug!(term = %search.search_term, count = results.count, "artist search");
    views::render(&views::SearchPage {
        notices: Vec::new(),
        kind: "artists",
        search_term: search.search_term,
        results,
    })
}

pub async fn show_artist(
    State(app_state): State<AppState>,
    mut flash: Flash,
    EntityId(artist_id): EntityId,
) -> Result<(Flash, Html<String>), AppError> {
    let artist = db::get_artist(&app_state.pool, artist_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("artist {artist_id} does not exist")))?;
    let shows = db::shows_for_artist(&app_state.pool, artist_id).await?;
    let page = views::ArtistPage {
        notices: flash.take_notices(),
        artist: listing::artist_detail(artist, shows, Utc::now()),
    };
    Ok((flash, views::render(&page)?))
}

pub async fn create_artist_form(mut flash: Flash) -> Result<(Flash, Html<String>), AppError> {
    let mut page =
        ArtistFormPage::new("List a new artist", "/artists/create", ArtistForm::default());
    page.notices = flash.take_notices();
    Ok((flash, views::render(&page)?))
}

pub async fn create_artist_submission(
    State(app_state): State<AppState>,
    Form(pairs): Form<FormPairs>,
) -> Result<Response, AppError> {
    let form = ArtistForm::from_pairs(&pairs);
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let notice = Notice::error(format!(
                "An error occurred. Artist {} could not be listed: {errors}",
                form.name
            ));
            let page = ArtistFormPage::new("List a new artist", "/artists/create", form)
                .rejected(notice, &errors);
            return views::render_with_status(StatusCode::UNPROCESSABLE_ENTITY, &page);
        }
    };

    let notice = match db::create_artist(&app_state.pool, &draft).await {
        Ok(artist) => {
            tracing::info!(artist_id = artist.id, "artist listed");
            Notice::success(format!("Artist {} was successfully listed!", artist.name))
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to list artist");
            Notice::error(format!(
                "An error occurred. Artist {} could not be listed.",
                draft.name
            ))
        }
    };
    flash::redirect_with(&app_state.pool, "/", notice).await
}

pub async fn edit_artist(
    State(app_state): State<AppState>,
    mut flash: Flash,
    EntityId(artist_id): EntityId,
) -> Result<(Flash, Html<String>), AppError> {
    let artist = db::get_artist(&app_state.pool, artist_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("artist {artist_id} does not exist")))?;
    let mut page = ArtistFormPage::new(
        format!("Edit artist {}", artist.name),
        format!("/artists/{artist_id}/edit"),
        ArtistForm::from_artist(&artist),
    );
    page.notices = flash.take_notices();
    Ok((flash, views::render(&page)?))
}

pub async fn edit_artist_submission(
    State(app_state): State<AppState>,
    EntityId(artist_id): EntityId,
    Form(pairs): Form<FormPairs>,
) -> Result<Response, AppError> {
    let artist = db::get_artist(&app_state.pool, artist_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("artist {artist_id} does not exist")))?;

    let form = ArtistForm::from_pairs(&pairs);
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let notice = Notice::error(format!(
                "An error occurred. Artist {} could not be updated: {errors}",
                artist.name
            ));
            let page = ArtistFormPage::new(
                format!("Edit artist {}", artist.name),
                format!("/artists/{artist_id}/edit"),
                form,
            )
            .rejected(notice, &errors);
            return views::render_with_status(StatusCode::UNPROCESSABLE_ENTITY, &page);
        }
    };

    let notice = match db::update_artist(&app_state.pool, artist_id, &draft).await {
        Ok(Some(updated)) => {
            tracing::info!(artist_id, "artist updated");
            Notice::success(format!("Artist: {} has been successfully updated!", updated.name))
        }
        Ok(None) => {
            return Err(AppError::NotFound(format!("artist {artist_id} does not exist")));
        }
        Err(e) => {
            tracing::error!(error = %e, artist_id, "failed to update artist");
            Notice::error(format!(
                "An error occurred. Artist {} could not be updated.",
                draft.name
            ))
        }
    };
    flash::redirect_with(&app_state.pool, &format!("/artists/{artist_id}"), notice).await
}

pub async fn delete_artist(
    State(app_state): State<AppState>,
    EntityId(artist_id): EntityId,
) -> Result<Response, AppError> {
    let notice = match db::delete_artist(&app_state.pool, artist_id).await {
        Ok(Some(name)) => {
            tracing::info!(artist_id, "artist deleted");
            Notice::success(format!("{name} has been successfully deleted."))
        }
        Ok(None) => {
            return Err(AppError::NotFound(format!("artist {artist_id} does not exist")));
        }
        Err(e) => {
            tracing::error!(error = %e, artist_id, "failed to delete artist");
            Notice::error(format!("Artist {artist_id} could not be deleted."))
        }
    };
    flash::redirect_with(&app_state.pool, "/", notice).await
}
