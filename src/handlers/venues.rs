use crate::{
    db,
    error::AppError,
    flash::{self, Flash, Notice},
    forms::VenueForm,
    handlers::{EntityId, FormPairs, SearchForm},
    listing,
    state::AppState,
    views::{self, VenueFormPage},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, Response},
    Form,
};
use chrono::Utc;

pub async fn list_venues(
    State(app_state): State<AppState>,
    mut flash: Flash,
) -> Result<(Flash, Html<String>), AppError> {
    let venues = db::list_venue_locations(&app_state.pool).await?;
    let shows = db::list_shows(&app_state.pool).await?;
    let counts = listing::upcoming_counts(&shows, Utc::now(), |s| s.venue_id);
    let page = views::VenuesPage {
        notices: flash.take_notices(),
        areas: listing::group_by_area(venues, &counts),
    };
    Ok((flash, views::render(&page)?))
}

pub async fn search_venues(
    State(app_state): State<AppState>,
    Form(search): Form<SearchForm>,
) -> Result<Html<String>, AppError> {
    let venues = db::list_venue_names(&app_state.pool).await?;
    let shows = db::list_shows(&app_state.pool).await?;
    let counts = listing::upcoming_counts(&shows, Utc::now(), |s| s.venue_id);
    let results = listing::search(venues, &search.search_term, &counts);
    tracing::debug!(term = %search.search_term, count = results.count, "venue search");
    views::render(&views::SearchPage {
        notices: Vec::new(),
        kind: "venues",
        search_term: search.search_term,
        results,
    })
}

pub async fn show_venue(
    State(app_state): State<AppState>,
    mut flash: Flash,
    EntityId(venue_id): EntityId,
) -> Result<(Flash, Html<String>), AppError> {
    let venue = db::get_venue(&app_state.pool, venue_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("venue {venue_id} does not exist")))?;
    let shows = db::shows_for_venue(&app_state.pool, venue_id).await?;
    let page = views::VenuePage {
        notices: flash.take_notices(),
        venue: listing::venue_detail(venue, shows, Utc::now()),
    };
    Ok((flash, views::render(&page)?))
}

pub async fn create_venue_form(mut flash: Flash) -> Result<(Flash, Html<String>), AppError> {
    let mut page = VenueFormPage::new("List a new venue", "/venues/create", VenueForm::default());
    page.notices = flash.take_notices();
    Ok((flash, views::render(&page)?))
}

pub async fn create_venue_submission(
    State(app_state): State<AppState>,
    Form(pairs): Form<FormPairs>,
) -> Result<Response, AppError> {
    let form = VenueForm::from_pairs(&pairs);
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let notice = Notice::error(format!(
                "An error occurred. Venue {} could not be listed: {errors}",
                form.name
            ));
            let page = VenueFormPage::new("List a new venue", "/venues/create", form)
                .rejected(notice, &errors);
            return views::render_with_status(StatusCode::UNPROCESSABLE_ENTITY, &page);
        }
    };

    let notice = match db::create_venue(&app_state.pool, &draft).await {
        Ok(venue) => {
            tracing::info!(venue_id = venue.id, "venue listed");
            Notice::success(format!("Venue {} was successfully listed!", venue.name))
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to list venue");
            Notice::error(format!(
                "An error occurred. Venue {} could not be listed.",
                draft.name
            ))
        }
    };
    flash::redirect_with(&app_state.pool, "/", notice).await
}

pub async fn edit_venue(
    State(app_state): State<AppState>,
    mut flash: Flash,
    EntityId(venue_id): EntityId,
) -> Result<(Flash, Html<String>), AppError> {
    let venue = db::get_venue(&app_state.pool, venue_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("venue {venue_id} does not exist")))?;
    let mut page = VenueFormPage::new(
        format!("Edit venue {}", venue.name),
        format!("/venues/{venue_id}/edit"),
        VenueForm::from_venue(&venue),
    );
    page.notices = flash.take_notices();
    Ok((flash, views::render(&page)?))
}

pub async fn edit_venue_submission(
    State(app_state): State<AppState>,
    EntityId(venue_id): EntityId,
    Form(pairs): Form<FormPairs>,
) -> Result<Response, AppError> {
    let venue = db::get_venue(&app_state.pool, venue_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("venue {venue_id} does not exist")))?;

    let form = VenueForm::from_pairs(&pairs);
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let notice = Notice::error(format!(
                "An error occurred. Venue {} could not be updated: {errors}",
                venue.name
            ));
            let page = VenueFormPage::new(
                format!("Edit venue {}", venue.name),
                format!("/venues/{venue_id}/edit"),
                form,
            )
            .rejected(notice, &errors);
            return views::render_with_status(StatusCode::UNPROCESSABLE_ENTITY, &page);
        }
    };

    let notice = match db::update_venue(&app_state.pool, venue_id, &draft).await {
        Ok(Some(updated)) => {
            tracing::info!(venue_id, "venue updated");
            Notice::success(format!("Venue: {} has been successfully updated!", updated.name))
        }
        Ok(None) => {
            return Err(AppError::NotFound(format!("venue {venue_id} does not exist")));
        }
        Err(e) => {
            tracing::error!(error = %e, venue_id, "failed to update venue");
            Notice::error(format!(
                "An error occurred. Venue {} could not be updated.",
                draft.name
            ))
        }
    };
    flash::redirect_with(&app_state.pool, &format!("/venues/{venue_id}"), notice).await
}

pub async fn delete_venue(
    State(app_state): State<AppState>,
    EntityId(venue_id): EntityId,
) -> Result<Response, AppError> {
    let notice = match db::delete_venue(&app_state.pool, venue_id).await {
        Ok(Some(name)) => {
            tracing::info!(venue_id, "venue deleted");
            Notice::success(format!("{name} venue has been successfully deleted."))
        }
        Ok(None) => {
            return Err(AppError::NotFound(format!("venue {venue_id} does not exist")));
        }
        Err(e) => {
            tracing::error!(error = %e, venue_id, "failed to delete venue");
            Notice::error(format!("Venue {venue_id} could not be deleted."))
        }
    };
    flash::redirect_with(&app_state.pool, "/", notice).await
}
