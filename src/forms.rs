//! Submitted form fields and the rules they are validated against.

use crate::models::{Artist, ArtistDraft, ShowDraft, Venue, VenueDraft};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

pub const STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MT", "NE", "NV", "NH", "NJ", "NM", "NY", "NC", "ND", "OH",
    "OK", "OR", "MD", "MA", "MI", "MN", "MS", "MO", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

pub const GENRES: &[&str] = &[
    "Alternative",
    "Blues",
    "Classical",
    "Country",
    "Electronic",
    "Folk",
    "Funk",
    "Hip-Hop",
    "Heavy Metal",
    "Instrumental",
    "Jazz",
    "Musical Theatre",
    "Pop",
    "Punk",
    "R&B",
    "Reggae",
    "Rock n Roll",
    "Soul",
    "Swing",
    "Other",
];

const START_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub Vec<FieldError>);

impl FieldErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join(", "))
    }
}

/// One entry of a `<select>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: &'static str,
    pub selected: bool,
}

pub fn state_choices(selected: &str) -> Vec<Choice> {
    STATES
        .iter()
        .map(|&value| Choice {
            value,
            selected: value == selected,
        })
        .collect()
}

pub fn genre_choices(selected: &[String]) -> Vec<Choice> {
    GENRES
        .iter()
        .map(|&value| Choice {
            value,
            selected: selected.iter().any(|g| g == value),
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VenueForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub genres: Vec<String>,
    pub facebook_link: String,
    pub image_link: String,
    pub website_link: String,
    pub seeking_talent: bool,
    pub seeking_description: String,
}

impl VenueForm {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        VenueForm {
            name: field(pairs, "name"),
            city: field(pairs, "city"),
            state: field(pairs, "state"),
            address: field(pairs, "address"),
            phone: field(pairs, "phone"),
            genres: multi_field(pairs, "genres"),
            facebook_link: field(pairs, "facebook_link"),
            image_link: field(pairs, "image_link"),
            website_link: field(pairs, "website_link"),
            seeking_talent: checkbox(pairs, "seeking_talent"),
            seeking_description: field(pairs, "seeking_description"),
        }
    }

    pub fn from_venue(venue: &Venue) -> Self {
        VenueForm {
            name: venue.name.clone(),
            city: venue.city.clone(),
            state: venue.state.clone(),
            address: venue.address.clone(),
            phone: venue.phone.clone().unwrap_or_default(),
            genres: venue.genre_list(),
            facebook_link: venue.facebook_link.clone().unwrap_or_default(),
            image_link: venue.image_link.clone().unwrap_or_default(),
            website_link: venue.website.clone().unwrap_or_default(),
            seeking_talent: venue.seeking_talent,
            seeking_description: venue.seeking_description.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<VenueDraft, FieldErrors> {
        let mut errors = FieldErrors::default();
        required(&mut errors, "name", &self.name);
        required(&mut errors, "city", &self.city);
        check_state(&mut errors, &self.state);
        required(&mut errors, "address", &self.address);
        check_phone(&mut errors, &self.phone);
        check_genres(&mut errors, &self.genres);
        check_url(&mut errors, "image_link", &self.image_link);
        check_url(&mut errors, "facebook_link", &self.facebook_link);
        check_url(&mut errors, "website_link", &self.website_link);
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(VenueDraft {
            name: self.name.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            address: self.address.trim().to_string(),
            phone: optional(&self.phone),
            genres: self.genres.clone(),
            website: optional(&self.website_link),
            facebook_link: optional(&self.facebook_link),
            image_link: optional(&self.image_link),
            seeking_talent: self.seeking_talent,
            seeking_description: optional(&self.seeking_description),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistForm {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub genres: Vec<String>,
    pub facebook_link: String,
    pub image_link: String,
    pub website_link: String,
    pub seeking_venue: bool,
    pub seeking_description: String,
}

impl ArtistForm {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        ArtistForm {
            name: field(pairs, "name"),
            city: field(pairs, "city"),
            state: field(pairs, "state"),
            phone: field(pairs, "phone"),
            genres: multi_field(pairs, "genres"),
            facebook_link: field(pairs, "facebook_link"),
            image_link: field(pairs, "image_link"),
            website_link: field(pairs, "website_link"),
            seeking_venue: checkbox(pairs, "seeking_venue"),
            seeking_description: field(pairs, "seeking_description"),
        }
    }

    pub fn from_artist(artist: &Artist) -> Self {
        ArtistForm {
            name: artist.name.clone(),
            city: artist.city.clone(),
            state: artist.state.clone(),
            phone: artist.phone.clone().unwrap_or_default(),
            genres: artist.genre_list(),
            facebook_link: artist.facebook_link.clone().unwrap_or_default(),
            image_link: artist.image_link.clone().unwrap_or_default(),
            website_link: artist.website.clone().unwrap_or_default(),
            seeking_venue: artist.seeking_venue,
            seeking_description: artist.seeking_description.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<ArtistDraft, FieldErrors> {
        let mut errors = FieldErrors::default();
        required(&mut errors, "name", &self.name);
        required(&mut errors, "city", &self.city);
        check_state(&mut errors, &self.state);
        check_phone(&mut errors, &self.phone);
        check_genres(&mut errors, &self.genres);
        check_url(&mut errors, "image_link", &self.image_link);
        check_url(&mut errors, "facebook_link", &self.facebook_link);
        check_url(&mut errors, "website_link", &self.website_link);
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(ArtistDraft {
            name: self.name.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            phone: optional(&self.phone),
            genres: self.genres.clone(),
            website: optional(&self.website_link),
            facebook_link: optional(&self.facebook_link),
            image_link: optional(&self.image_link),
            seeking_venue: self.seeking_venue,
            seeking_description: optional(&self.seeking_description),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShowForm {
    pub artist_id: String,
    pub venue_id: String,
    pub start_time: String,
}

impl ShowForm {
    /// Blank form with the start time prefilled to `now`.
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        ShowForm {
            start_time: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            ..ShowForm::default()
        }
    }

    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        ShowForm {
            artist_id: field(pairs, "artist_id"),
            venue_id: field(pairs, "venue_id"),
            start_time: field(pairs, "start_time"),
        }
    }

    pub fn validate(&self) -> Result<ShowDraft, FieldErrors> {
        let mut errors = FieldErrors::default();
        let artist_id = check_id(&mut errors, "artist_id", &self.artist_id);
        let venue_id = check_id(&mut errors, "venue_id", &self.venue_id);
        let start_time = if self.start_time.trim().is_empty() {
            errors.push("start_time", "This field is required.");
            None
        } else {
            let parsed = parse_start_time(&self.start_time);
            if parsed.is_none() {
                errors.push("start_time", "Not a valid datetime value.");
            }
            parsed
        };

        match (artist_id, venue_id, start_time) {
            (Some(artist_id), Some(venue_id), Some(start_time)) if errors.is_empty() => {
                Ok(ShowDraft {
                    venue_id,
                    artist_id,
                    start_time,
                })
            }
            _ => Err(errors),
        }
    }
}

pub fn parse_start_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    START_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn field(pairs: &[(String, String)], name: &str) -> String {
    pairs
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

fn multi_field(pairs: &[(String, String)], name: &str) -> Vec<String> {
    pairs
        .iter()
        .filter(|(k, v)| k == name && !v.trim().is_empty())
        .map(|(_, v)| v.trim().to_string())
        .collect()
}

fn checkbox(pairs: &[(String, String)], name: &str) -> bool {
    pairs
        .iter()
        .filter(|(k, _)| k == name)
        .any(|(_, v)| matches!(v.trim(), "y" | "on" | "true" | "1"))
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn required(errors: &mut FieldErrors, name: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(name, "This field is required.");
    }
}

fn check_state(errors: &mut FieldErrors, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.push("state", "This field is required.");
    } else if !STATES.contains(&value) {
        errors.push("state", "Not a valid choice.");
    }
}

fn check_genres(errors: &mut FieldErrors, genres: &[String]) {
    if genres.is_empty() {
        errors.push("genres", "This field is required.");
        return;
    }
    for genre in genres {
        if !GENRES.contains(&genre.as_str()) {
            errors.push("genres", format!("'{genre}' is not a valid choice."));
        }
    }
}

fn check_phone(errors: &mut FieldErrors, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.'));
    let digits = value.chars().filter(char::is_ascii_digit).count();
    if !allowed || digits != 10 {
        errors.push("phone", "Invalid phone number.");
    }
}

fn check_url(errors: &mut FieldErrors, name: &'static str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.contains(char::is_whitespace) => {}
        _ => errors.push(name, "Invalid URL."),
    }
}

fn check_id(errors: &mut FieldErrors, name: &'static str, value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        errors.push(name, "This field is required.");
        return None;
    }
    match value.parse::<i64>() {
        Ok(id) if id > 0 => Some(id),
        _ => {
            errors.push(name, "Not a valid id.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn venue_pairs() -> Vec<(String, String)> {
        pairs(&[
            ("name", "The Musical Hop"),
            ("city", "San Francisco"),
            ("state", "CA"),
            ("address", "1015 Folsom Street"),
            ("phone", "123-123-1234"),
            ("genres", "Jazz"),
            ("genres", "Reggae"),
            ("facebook_link", "https://www.facebook.com/TheMusicalHop"),
            ("image_link", ""),
            ("website_link", "https://www.themusicalhop.com"),
            ("seeking_talent", "y"),
            ("seeking_description", "Looking for locals."),
        ])
    }

    #[test]
    fn complete_venue_form_validates() {
        let draft = VenueForm::from_pairs(&venue_pairs()).validate().unwrap();
        assert_eq!(draft.name, "The Musical Hop");
        assert_eq!(draft.genres, vec!["Jazz".to_string(), "Reggae".to_string()]);
        assert_eq!(draft.website.as_deref(), Some("https://www.themusicalhop.com"));
        assert_eq!(draft.image_link, None);
        assert!(draft.seeking_talent);
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let mut submitted = venue_pairs();
        submitted.retain(|(k, _)| k != "name" && k != "genres" && k != "address");
        let errors = VenueForm::from_pairs(&submitted).validate().unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("genres"));
        assert!(errors.has("address"));
        assert!(!errors.has("city"));
        assert!(errors.to_string().contains("name This field is required."));
    }

    #[test]
    fn bad_choices_and_formats_are_rejected() {
        let mut submitted = venue_pairs();
        for (k, v) in submitted.iter_mut() {
            match k.as_str() {
                "state" => *v = "ZZ".to_string(),
                "phone" => *v = "12345".to_string(),
                "website_link" => *v = "not a url".to_string(),
                _ => {}
            }
        }
        submitted.push(("genres".to_string(), "Polka".to_string()));
        let errors = VenueForm::from_pairs(&submitted).validate().unwrap_err();
        assert!(errors.has("state"));
        assert!(errors.has("phone"));
        assert!(errors.has("website_link"));
        assert!(errors.has("genres"));
    }

    #[test]
    fn unchecked_checkbox_is_false() {
        let mut submitted = venue_pairs();
        submitted.retain(|(k, _)| k != "seeking_talent");
        let draft = VenueForm::from_pairs(&submitted).validate().unwrap();
        assert!(!draft.seeking_talent);
    }

    #[test]
    fn artist_form_does_not_need_address() {
        let submitted = pairs(&[
            ("name", "Guns N Petals"),
            ("city", "San Francisco"),
            ("state", "CA"),
            ("genres", "Rock n Roll"),
            ("seeking_venue", "on"),
        ]);
        let draft = ArtistForm::from_pairs(&submitted).validate().unwrap();
        assert_eq!(draft.name, "Guns N Petals");
        assert_eq!(draft.phone, None);
        assert!(draft.seeking_venue);
    }

    #[test]
    fn show_form_parses_ids_and_start_time() {
        let submitted = pairs(&[
            ("artist_id", "4"),
            ("venue_id", "1"),
            ("start_time", "2035-04-01 20:00:00"),
        ]);
        let draft = ShowForm::from_pairs(&submitted).validate().unwrap();
        assert_eq!(draft.artist_id, 4);
        assert_eq!(draft.venue_id, 1);
        assert_eq!(
            draft.start_time,
            Utc.with_ymd_and_hms(2035, 4, 1, 20, 0, 0).unwrap()
        );
    }

    #[test]
    fn show_form_accepts_datetime_local_input() {
        assert_eq!(
            parse_start_time("2035-04-01T20:00"),
            Some(Utc.with_ymd_and_hms(2035, 4, 1, 20, 0, 0).unwrap())
        );
        assert_eq!(parse_start_time("April 1st"), None);
    }

    #[test]
    fn show_form_reports_every_bad_field() {
        let submitted = pairs(&[("artist_id", "abc"), ("venue_id", ""), ("start_time", "soon")]);
        let errors = ShowForm::from_pairs(&submitted).validate().unwrap_err();
        assert!(errors.has("artist_id"));
        assert!(errors.has("venue_id"));
        assert!(errors.has("start_time"));
    }

    #[test]
    fn choices_mark_selected_values() {
        let states = state_choices("NY");
        assert_eq!(states.iter().filter(|c| c.selected).count(), 1);
        let genres = genre_choices(&["Jazz".to_string(), "Soul".to_string()]);
        let picked: Vec<&str> = genres.iter().filter(|c| c.selected).map(|c| c.value).collect();
        assert_eq!(picked, vec!["Jazz", "Soul"]);
    }
}
