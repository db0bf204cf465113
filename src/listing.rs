//! Grouped and time-partitioned views over the store.
//!
//! Everything here is a pure function of rows and `now`; upcoming counts are
//! recomputed on every read and never stored.

use crate::models::{Artist, NamedRecord, Show, ShowDetail, Venue, VenueLocation};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::hash::Hash;

/// A show starting exactly at `now` counts as upcoming.
pub fn is_upcoming(start_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    start_time >= now
}

pub fn upcoming_counts<K, F>(shows: &[Show], now: DateTime<Utc>, key: F) -> HashMap<K, usize>
where
    K: Eq + Hash,
    F: Fn(&Show) -> K,
{
    let mut counts = HashMap::new();
    for show in shows.iter().filter(|s| is_upcoming(s.start_time, now)) {
        *counts.entry(key(show)).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedRecord {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaGroup {
    pub city: String,
    pub state: String,
    pub venues: Vec<ListedRecord>,
}

/// Groups venues by `(city, state)` in order of first appearance, keeping
/// the incoming order of venues inside each group.
pub fn group_by_area(venues: Vec<VenueLocation>, counts: &HashMap<i64, usize>) -> Vec<AreaGroup> {
    let mut groups: Vec<AreaGroup> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for venue in venues {
        let listed = ListedRecord {
            id: venue.id,
            name: venue.name,
            num_upcoming_shows: counts.get(&venue.id).copied().unwrap_or(0),
        };
        let key = (venue.city, venue.state);
        match index.get(&key).copied() {
            Some(i) => groups[i].venues.push(listed),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(AreaGroup {
                    city: key.0,
                    state: key.1,
                    venues: vec![listed],
                });
            }
        }
    }
    groups
}

pub fn with_counts(records: Vec<NamedRecord>, counts: &HashMap<i64, usize>) -> Vec<ListedRecord> {
    records
        .into_iter()
        .map(|r| ListedRecord {
            num_upcoming_shows: counts.get(&r.id).copied().unwrap_or(0),
            id: r.id,
            name: r.name,
        })
        .collect()
}

/// Case-insensitive substring match. An empty term matches everything.
pub fn matches_term(name: &str, term: &str) -> bool {
    name.to_lowercase().contains(&term.to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResults {
    pub count: usize,
    pub data: Vec<ListedRecord>,
}

pub fn search(
    records: Vec<NamedRecord>,
    term: &str,
    counts: &HashMap<i64, usize>,
) -> SearchResults {
    let matching = records
        .into_iter()
        .filter(|r| matches_term(&r.name, term))
        .collect();
    let data = with_counts(matching, counts);
    SearchResults {
        count: data.len(),
        data,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitioned<T> {
    pub past: Vec<T>,
    pub upcoming: Vec<T>,
}

pub fn partition_by_time<T>(
    items: Vec<T>,
    now: DateTime<Utc>,
    start_of: impl Fn(&T) -> DateTime<Utc>,
) -> Partitioned<T> {
    let (upcoming, past): (Vec<T>, Vec<T>) = items
        .into_iter()
        .partition(|item| is_upcoming(start_of(item), now));
    Partitioned { past, upcoming }
}

/// Detail-page timestamp, e.g. `2035-04-01T20:00:00.000Z`.
pub fn iso_millis(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// The other side of a booking as shown on a detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedShow {
    pub id: i64,
    pub name: String,
    pub image_link: String,
    pub start_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowSets {
    pub past_shows: Vec<BookedShow>,
    pub upcoming_shows: Vec<BookedShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

fn show_sets(
    shows: Vec<ShowDetail>,
    now: DateTime<Utc>,
    counterpart: impl Fn(ShowDetail) -> BookedShow,
) -> ShowSets {
    let split = partition_by_time(shows, now, |s| s.start_time);
    let past_shows: Vec<BookedShow> = split.past.into_iter().map(&counterpart).collect();
    let upcoming_shows: Vec<BookedShow> = split.upcoming.into_iter().map(&counterpart).collect();
    ShowSets {
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueDetail {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub website: String,
    pub facebook_link: String,
    pub seeking_talent: bool,
    pub seeking_description: String,
    pub image_link: String,
    pub shows: ShowSets,
}

pub fn venue_detail(venue: Venue, shows: Vec<ShowDetail>, now: DateTime<Utc>) -> VenueDetail {
    let shows = show_sets(shows, now, |s| BookedShow {
        id: s.artist_id,
        name: s.artist_name,
        image_link: s.artist_image_link.unwrap_or_default(),
        start_time: iso_millis(s.start_time),
    });
    VenueDetail {
        genres: venue.genre_list(),
        id: venue.id,
        name: venue.name,
        address: venue.address,
        city: venue.city,
        state: venue.state,
        phone: venue.phone.unwrap_or_default(),
        website: venue.website.unwrap_or_default(),
        facebook_link: venue.facebook_link.unwrap_or_default(),
        seeking_talent: venue.seeking_talent,
        seeking_description: venue.seeking_description.unwrap_or_default(),
        image_link: venue.image_link.unwrap_or_default(),
        shows,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistDetail {
    pub id: i64,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub website: String,
    pub facebook_link: String,
    pub seeking_venue: bool,
    pub seeking_description: String,
    pub image_link: String,
    pub shows: ShowSets,
}

pub fn artist_detail(artist: Artist, shows: Vec<ShowDetail>, now: DateTime<Utc>) -> ArtistDetail {
    let shows = show_sets(shows, now, |s| BookedShow {
        id: s.venue_id,
        name: s.venue_name,
        image_link: s.venue_image_link.unwrap_or_default(),
        start_time: iso_millis(s.start_time),
    });
    ArtistDetail {
        genres: artist.genre_list(),
        id: artist.id,
        name: artist.name,
        city: artist.city,
        state: artist.state,
        phone: artist.phone.unwrap_or_default(),
        website: artist.website.unwrap_or_default(),
        facebook_link: artist.facebook_link.unwrap_or_default(),
        seeking_venue: artist.seeking_venue,
        seeking_description: artist.seeking_description.unwrap_or_default(),
        image_link: artist.image_link.unwrap_or_default(),
        shows,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowListing {
    pub venue_id: i64,
    pub venue_name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: String,
    pub start_time: String,
}

/// Upcoming shows in the order given, for the public show list.
pub fn upcoming_listing(shows: Vec<ShowDetail>, now: DateTime<Utc>) -> Vec<ShowListing> {
    shows
        .into_iter()
        .filter(|s| is_upcoming(s.start_time, now))
        .map(|s| ShowListing {
            venue_id: s.venue_id,
            venue_name: s.venue_name,
            artist_id: s.artist_id,
            artist_name: s.artist_name,
            artist_image_link: s.artist_image_link.unwrap_or_default(),
            start_time: s.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 20, 0, 0).unwrap()
    }

    fn loc(id: i64, name: &str, city: &str, state: &str) -> VenueLocation {
        VenueLocation {
            id,
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
        }
    }

    fn show(id: i64, venue_id: i64, artist_id: i64, start_time: DateTime<Utc>) -> Show {
        Show {
            id,
            venue_id,
            artist_id,
            start_time,
        }
    }

    fn detail(show_id: i64, start_time: DateTime<Utc>) -> ShowDetail {
        ShowDetail {
            show_id,
            venue_id: 1,
            venue_name: "The Musical Hop".to_string(),
            venue_image_link: None,
            artist_id: 10 + show_id,
            artist_name: format!("Artist {show_id}"),
            artist_image_link: Some(format!("https://img.example/{show_id}.png")),
            start_time,
        }
    }

    #[test]
    fn grouping_keeps_first_seen_order_and_every_venue_once() {
        let venues = vec![
            loc(1, "Hop", "San Francisco", "CA"),
            loc(2, "Pianos", "New York", "NY"),
            loc(3, "Park Square", "San Francisco", "CA"),
            loc(4, "Other SF", "San Francisco", "NM"),
        ];
        let groups = group_by_area(venues, &HashMap::new());

        let keys: Vec<(&str, &str)> = groups
            .iter()
            .map(|g| (g.city.as_str(), g.state.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("San Francisco", "CA"),
                ("New York", "NY"),
                ("San Francisco", "NM")
            ]
        );
        let ids: Vec<i64> = groups[0].venues.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let mut all: Vec<i64> = groups
            .iter()
            .flat_map(|g| g.venues.iter().map(|v| v.id))
            .collect();
        all.sort();
        assert_eq!(all, vec![1, 2, 3, 4]);
    }

    #[test]
    fn grouping_empty_store_yields_no_groups() {
        assert!(group_by_area(Vec::new(), &HashMap::new()).is_empty());
    }

    #[test]
    fn upcoming_counts_include_shows_starting_now() {
        let shows = vec![
            show(1, 1, 1, now() - Duration::seconds(1)),
            show(2, 1, 1, now()),
            show(3, 1, 2, now() + Duration::days(3)),
            show(4, 2, 2, now() + Duration::days(1)),
        ];
        let by_venue = upcoming_counts(&shows, now(), |s| s.venue_id);
        assert_eq!(by_venue.get(&1), Some(&2));
        assert_eq!(by_venue.get(&2), Some(&1));

        let groups = group_by_area(
            vec![loc(1, "Hop", "SF", "CA"), loc(5, "Empty", "SF", "CA")],
            &by_venue,
        );
        assert_eq!(groups[0].venues[0].num_upcoming_shows, 2);
        assert_eq!(groups[0].venues[1].num_upcoming_shows, 0);
    }

    #[test]
    fn search_is_case_insensitive_substring() {
        let records = vec![
            NamedRecord {
                id: 1,
                name: "The Musical Hop".to_string(),
            },
            NamedRecord {
                id: 2,
                name: "Park Square Live Music & Coffee".to_string(),
            },
        ];
        let counts = HashMap::from([(1, 4)]);

        let hop = search(records.clone(), "Hop", &counts);
        assert_eq!(hop.count, 1);
        assert_eq!(hop.data[0].name, "The Musical Hop");
        assert_eq!(hop.data[0].num_upcoming_shows, 4);
        assert_eq!(search(records.clone(), "hop", &counts), hop);

        assert_eq!(search(records.clone(), "Music", &counts).count, 2);
        assert_eq!(search(records.clone(), "xyz", &counts).count, 0);
        assert_eq!(search(records, "", &counts).count, 2);
    }

    #[test]
    fn partition_covers_every_show_with_boundary_upcoming() {
        let shows = vec![
            detail(1, now() - Duration::days(2)),
            detail(2, now()),
            detail(3, now() + Duration::hours(1)),
            detail(4, now() - Duration::milliseconds(1)),
        ];
        let total = shows.len();
        let split = partition_by_time(shows, now(), |s| s.start_time);
        assert_eq!(split.past.len() + split.upcoming.len(), total);
        let upcoming: Vec<i64> = split.upcoming.iter().map(|s| s.show_id).collect();
        assert_eq!(upcoming, vec![2, 3]);
    }

    #[test]
    fn venue_detail_lists_artists_with_iso_timestamps() {
        let venue = Venue {
            id: 1,
            name: "The Musical Hop".to_string(),
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            address: "1015 Folsom Street".to_string(),
            phone: None,
            genres: "Jazz,Reggae".to_string(),
            website: None,
            facebook_link: None,
            image_link: None,
            seeking_talent: true,
            seeking_description: None,
        };
        let shows = vec![
            detail(1, now() - Duration::days(1)),
            detail(2, now() + Duration::days(1)),
        ];
        let page = venue_detail(venue, shows, now());

        assert_eq!(page.genres, vec!["Jazz".to_string(), "Reggae".to_string()]);
        assert_eq!(page.shows.past_shows_count, 1);
        assert_eq!(page.shows.upcoming_shows_count, 1);
        assert_eq!(page.shows.past_shows[0].name, "Artist 1");
        assert_eq!(page.shows.upcoming_shows[0].id, 12);
        assert_eq!(page.shows.upcoming_shows[0].start_time, "2030-06-02T20:00:00.000Z");
    }

    #[test]
    fn show_listing_drops_past_shows() {
        let shows = vec![
            detail(1, now() - Duration::days(1)),
            detail(2, now() + Duration::minutes(90)),
        ];
        let listing = upcoming_listing(shows, now());
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].artist_name, "Artist 2");
        assert_eq!(listing[0].start_time, "2030-06-01 21:30:00");
    }
}
