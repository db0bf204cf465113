use crate::error::AppError;
use crate::flash::Notice;
use crate::forms::{genre_choices, state_choices, ArtistForm, Choice, FieldErrors, ShowForm, VenueForm};
use crate::listing::{AreaGroup, ArtistDetail, ListedRecord, SearchResults, ShowListing, VenueDetail};
use crate::models::NamedRecord;
use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

pub fn render<T: Template>(page: &T) -> Result<Html<String>, AppError> {
    Ok(Html(page.render()?))
}

/// Renders `page` with `status`; a form redisplayed after rejected input, for example.
pub fn render_with_status<T: Template>(status: StatusCode, page: &T) -> Result<Response, AppError> {
    Ok((status, render(page)?).into_response())
}

pub fn not_found_page() -> Response {
    error_page(StatusCode::NOT_FOUND, &NotFoundPage { notices: Vec::new() })
}

pub fn server_error_page() -> Response {
    error_page(
        StatusCode::INTERNAL_SERVER_ERROR,
        &ServerErrorPage { notices: Vec::new() },
    )
}

fn error_page<T: Template>(status: StatusCode, page: &T) -> Response {
    match page.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "failed to render error page");
            (status, status.canonical_reason().unwrap_or("error")).into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomePage {
    pub notices: Vec<Notice>,
    pub venues: Vec<NamedRecord>,
    pub artists: Vec<NamedRecord>,
}

#[derive(Template)]
#[template(path = "pages/venues.html")]
pub struct VenuesPage {
    pub notices: Vec<Notice>,
    pub areas: Vec<AreaGroup>,
}

#[derive(Template)]
#[template(path = "pages/artists.html")]
pub struct ArtistsPage {
    pub notices: Vec<Notice>,
    pub artists: Vec<ListedRecord>,
}

#[derive(Template)]
#[template(path = "pages/search.html")]
pub struct SearchPage {
    pub notices: Vec<Notice>,
    /// Path segment of the searched collection, `venues` or `artists`.
    pub kind: &'static str,
    pub search_term: String,
    pub results: SearchResults,
}

#[derive(Template)]
#[template(path = "pages/show_venue.html")]
pub struct VenuePage {
    pub notices: Vec<Notice>,
    pub venue: VenueDetail,
}

#[derive(Template)]
#[template(path = "pages/show_artist.html")]
pub struct ArtistPage {
    pub notices: Vec<Notice>,
    pub artist: ArtistDetail,
}

#[derive(Template)]
#[template(path = "pages/shows.html")]
pub struct ShowsPage {
    pub notices: Vec<Notice>,
    pub shows: Vec<ShowListing>,
}

#[derive(Template)]
#[template(path = "forms/venue.html")]
pub struct VenueFormPage {
    pub notices: Vec<Notice>,
    pub heading: String,
    pub action: String,
    pub form: VenueForm,
    pub errors: Vec<String>,
    pub states: Vec<Choice>,
    pub genres: Vec<Choice>,
}

impl VenueFormPage {
    pub fn new(heading: impl Into<String>, action: impl Into<String>, form: VenueForm) -> Self {
        VenueFormPage {
            notices: Vec::new(),
            heading: heading.into(),
            action: action.into(),
            states: state_choices(&form.state),
            genres: genre_choices(&form.genres),
            form,
            errors: Vec::new(),
        }
    }

    pub fn rejected(mut self, notice: Notice, errors: &FieldErrors) -> Self {
        self.notices.push(notice);
        self.errors = errors.messages();
        self
    }
}

#[derive(Template)]
#[template(path = "forms/artist.html")]
pub struct ArtistFormPage {
    pub notices: Vec<Notice>,
    pub heading: String,
    pub action: String,
    pub form: ArtistForm,
    pub errors: Vec<String>,
    pub states: Vec<Choice>,
    pub genres: Vec<Choice>,
}

impl ArtistFormPage {
    pub fn new(heading: impl Into<String>, action: impl Into<String>, form: ArtistForm) -> Self {
        ArtistFormPage {
            notices: Vec::new(),
            heading: heading.into(),
            action: action.into(),
            states: state_choices(&form.state),
            genres: genre_choices(&form.genres),
            form,
            errors: Vec::new(),
        }
    }

    pub fn rejected(mut self, notice: Notice, errors: &FieldErrors) -> Self {
        self.notices.push(notice);
        self.errors = errors.messages();
        self
    }
}

#[derive(Template)]
#[template(path = "forms/show.html")]
pub struct ShowFormPage {
    pub notices: Vec<Notice>,
    pub form: ShowForm,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "errors/404.html")]
pub struct NotFoundPage {
    pub notices: Vec<Notice>,
}

#[derive(Template)]
#[template(path = "errors/500.html")]
pub struct ServerErrorPage {
    pub notices: Vec<Notice>,
}
