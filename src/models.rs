use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Genres are kept as a single delimited column.
pub const GENRE_SEPARATOR: char = ',';

#[derive(Debug, Clone, FromRow)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub genres: String,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

impl Venue {
    pub fn genre_list(&self) -> Vec<String> {
        split_genres(&self.genres)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub genres: String,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

impl Artist {
    pub fn genre_list(&self) -> Vec<String> {
        split_genres(&self.genres)
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Show {
    pub id: i64,
    pub venue_id: i64,
    pub artist_id: i64,
    pub start_time: DateTime<Utc>,
}

/// A show joined with both sides of the booking.
#[derive(Debug, Clone, FromRow)]
pub struct ShowDetail {
    pub show_id: i64,
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: DateTime<Utc>,
}

/// Minimal projection used by listings and search.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct NamedRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct VenueLocation {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VenueDraft {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub genres: Vec<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArtistDraft {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub genres: Vec<String>,
    pub website: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowDraft {
    pub venue_id: i64,
    pub artist_id: i64,
    pub start_time: DateTime<Utc>,
}

pub fn split_genres(stored: &str) -> Vec<String> {
    stored
        .split(GENRE_SEPARATOR)
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(ToString::to_string)
        .collect()
}

pub fn join_genres(genres: &[String]) -> String {
    genres.join(&GENRE_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genres_are_split_on_separator_and_trimmed() {
        assert_eq!(
            split_genres("Jazz, Reggae,,Swing "),
            vec!["Jazz".to_string(), "Reggae".to_string(), "Swing".to_string()]
        );
        assert!(split_genres("").is_empty());
    }

    #[test]
    fn joined_genres_split_back_to_same_list() {
        let genres = vec!["Rock n Roll".to_string(), "R&B".to_string()];
        assert_eq!(join_genres(&genres), "Rock n Roll,R&B");
        assert_eq!(split_genres(&join_genres(&genres)), genres);
    }
}
