use crate::error::AppError;
use crate::flash::{Level, Notice};
use crate::models::{
    join_genres, Artist, ArtistDraft, NamedRecord, Show, ShowDetail, ShowDraft, Venue,
    VenueDraft, VenueLocation,
};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;

const SHOW_DETAIL_SELECT: &str = "SELECT s.id AS show_id, v.id AS venue_id, v.name AS venue_name,
        v.image_link AS venue_image_link, a.id AS artist_id, a.name AS artist_name,
        a.image_link AS artist_image_link, s.start_time AS start_time
     FROM shows s
     JOIN venues v ON s.venue_id = v.id
     JOIN artists a ON s.artist_id = a.id";

pub async fn init_schema(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS venues (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            city TEXT NOT NULL,
            state TEXT NOT NULL,
            address TEXT NOT NULL,
            phone TEXT,
            genres TEXT NOT NULL,
            website TEXT,
            facebook_link TEXT,
            image_link TEXT,
            seeking_talent BOOLEAN NOT NULL DEFAULT 0,
            seeking_description TEXT
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS artists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            city TEXT NOT NULL,
            state TEXT NOT NULL,
            phone TEXT,
            genres TEXT NOT NULL,
            website TEXT,
            facebook_link TEXT,
            image_link TEXT,
            seeking_venue BOOLEAN NOT NULL DEFAULT 0,
            seeking_description TEXT
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS shows (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            venue_id INTEGER NOT NULL,
            artist_id INTEGER NOT NULL,
            start_time TIMESTAMP NOT NULL,
            FOREIGN KEY (venue_id) REFERENCES venues (id) ON DELETE CASCADE,
            FOREIGN KEY (artist_id) REFERENCES artists (id) ON DELETE CASCADE
        );",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_shows_venue_id ON shows (venue_id);")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_shows_artist_id ON shows (artist_id);")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS flash_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            token TEXT NOT NULL,
            level TEXT NOT NULL,
            message TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        );",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_flash_messages_token ON flash_messages (token);")
        .execute(pool)
        .await?;

    Ok(())
}

// Venues

pub async fn get_venue(pool: &SqlitePool, venue_id: i64) -> Result<Option<Venue>, AppError> {
    sqlx::query_as("SELECT * FROM venues WHERE id = ?")
        .bind(venue_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn list_venue_locations(pool: &SqlitePool) -> Result<Vec<VenueLocation>, AppError> {
    sqlx::query_as("SELECT id, name, city, state FROM venues ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn list_venue_names(pool: &SqlitePool) -> Result<Vec<NamedRecord>, AppError> {
    sqlx::query_as("SELECT id, name FROM venues ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn recent_venues(pool: &SqlitePool, limit: i64) -> Result<Vec<NamedRecord>, AppError> {
    sqlx::query_as("SELECT id, name FROM venues ORDER BY id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn create_venue(pool: &SqlitePool, draft: &VenueDraft) -> Result<Venue, AppError> {
    let mut tx = pool.begin().await?;
    let venue = sqlx::query_as(
        "INSERT INTO venues (name, city, state, address, phone, genres, website, facebook_link,
            image_link, seeking_talent, seeking_description)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(&draft.name)
    .bind(&draft.city)
    .bind(&draft.state)
    .bind(&draft.address)
    .bind(&draft.phone)
    .bind(join_genres(&draft.genres))
    .bind(&draft.website)
    .bind(&draft.facebook_link)
    .bind(&draft.image_link)
    .bind(draft.seeking_talent)
    .bind(&draft.seeking_description)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(venue)
}

/// Overwrites every mutable field. Returns `None` when the venue does not exist.
pub async fn update_venue(
    pool: &SqlitePool,
    venue_id: i64,
    draft: &VenueDraft,
) -> Result<Option<Venue>, AppError> {
    let mut tx = pool.begin().await?;
    let venue = sqlx::query_as(
        "UPDATE venues SET name = ?, city = ?, state = ?, address = ?, phone = ?, genres = ?,
            website = ?, facebook_link = ?, image_link = ?, seeking_talent = ?,
            seeking_description = ?
         WHERE id = ? RETURNING *",
    )
    .bind(&draft.name)
    .bind(&draft.city)
    .bind(&draft.state)
    .bind(&draft.address)
    .bind(&draft.phone)
    .bind(join_genres(&draft.genres))
    .bind(&draft.website)
    .bind(&draft.facebook_link)
    .bind(&draft.image_link)
    .bind(draft.seeking_talent)
    .bind(&draft.seeking_description)
    .bind(venue_id)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(venue)
}

/// Deletes the venue and every show it hosts. Returns the deleted venue's name.
pub async fn delete_venue(pool: &SqlitePool, venue_id: i64) -> Result<Option<String>, AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM shows WHERE venue_id = ?")
        .bind(venue_id)
        .execute(&mut *tx)
        .await?;
    let deleted: Option<(String,)> = sqlx::query_as("DELETE FROM venues WHERE id = ? RETURNING name")
        .bind(venue_id)
        .fetch_optional(&mut *tx)
        .await?;
    if deleted.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }
    tx.commit().await?;
    Ok(deleted.map(|(name,)| name))
}

// Artists

pub async fn get_artist(pool: &SqlitePool, artist_id: i64) -> Result<Option<Artist>, AppError> {
    sqlx::query_as("SELECT * FROM artists WHERE id = ?")
        .bind(artist_id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::from)
}

pub async fn list_artist_names(pool: &SqlitePool) -> Result<Vec<NamedRecord>, AppError> {
    sqlx::query_as("SELECT id, name FROM artists ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn recent_artists(pool: &SqlitePool, limit: i64) -> Result<Vec<NamedRecord>, AppError> {
    sqlx::query_as("SELECT id, name FROM artists ORDER BY id DESC LIMIT ?")
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn create_artist(pool: &SqlitePool, draft: &ArtistDraft) -> Result<Artist, AppError> {
    let mut tx = pool.begin().await?;
    let artist = sqlx::query_as(
        "INSERT INTO artists (name, city, state, phone, genres, website, facebook_link,
            image_link, seeking_venue, seeking_description)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(&draft.name)
    .bind(&draft.city)
    .bind(&draft.state)
    .bind(&draft.phone)
    .bind(join_genres(&draft.genres))
    .bind(&draft.website)
    .bind(&draft.facebook_link)
    .bind(&draft.image_link)
    .bind(draft.seeking_venue)
    .bind(&draft.seeking_description)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(artist)
}

pub async fn update_artist(
    pool: &SqlitePool,
    artist_id: i64,
    draft: &ArtistDraft,
) -> Result<Option<Artist>, AppError> {
    let mut tx = pool.begin().await?;
    let artist = sqlx::query_as(
        "UPDATE artists SET name = ?, city = ?, state = ?, phone = ?, genres = ?, website = ?,
            facebook_link = ?, image_link = ?, seeking_venue = ?, seeking_description = ?
         WHERE id = ? RETURNING *",
    )
    .bind(&draft.name)
    .bind(&draft.city)
    .bind(&draft.state)
    .bind(&draft.phone)
    .bind(join_genres(&draft.genres))
    .bind(&draft.website)
    .bind(&draft.facebook_link)
    .bind(&draft.image_link)
    .bind(draft.seeking_venue)
    .bind(&draft.seeking_description)
    .bind(artist_id)
    .fetch_optional(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(artist)
}

pub async fn delete_artist(pool: &SqlitePool, artist_id: i64) -> Result<Option<String>, AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM shows WHERE artist_id = ?")
        .bind(artist_id)
        .execute(&mut *tx)
        .await?;
    let deleted: Option<(String,)> =
        sqlx::query_as("DELETE FROM artists WHERE id = ? RETURNING name")
            .bind(artist_id)
            .fetch_optional(&mut *tx)
            .await?;
    if deleted.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }
    tx.commit().await?;
    Ok(deleted.map(|(name,)| name))
}

// Shows

pub async fn list_shows(pool: &SqlitePool) -> Result<Vec<Show>, AppError> {
    sqlx::query_as("SELECT id, venue_id, artist_id, start_time FROM shows ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn list_show_details(pool: &SqlitePool) -> Result<Vec<ShowDetail>, AppError> {
    sqlx::query_as(&format!("{SHOW_DETAIL_SELECT} ORDER BY s.start_time, s.id"))
        .fetch_all(pool)
        .await
        .map_err(AppError::from)
}

pub async fn shows_for_venue(pool: &SqlitePool, venue_id: i64) -> Result<Vec<ShowDetail>, AppError> {
    sqlx::query_as(&format!(
        "{SHOW_DETAIL_SELECT} WHERE s.venue_id = ? ORDER BY s.start_time, s.id"
    ))
    .bind(venue_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::from)
}

pub async fn shows_for_artist(
    pool: &SqlitePool,
    artist_id: i64,
) -> Result<Vec<ShowDetail>, AppError> {
    sqlx::query_as(&format!(
        "{SHOW_DETAIL_SELECT} WHERE s.artist_id = ? ORDER BY s.start_time, s.id"
    ))
    .bind(artist_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::from)
}

/// Both referenced records are checked inside the same transaction as the insert.
pub async fn create_show(pool: &SqlitePool, draft: &ShowDraft) -> Result<Show, AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query_as::<_, (i64,)>("SELECT id FROM venues WHERE id = ?")
        .bind(draft.venue_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Venue {} does not exist.", draft.venue_id)))?;

    sqlx::query_as::<_, (i64,)>("SELECT id FROM artists WHERE id = ?")
        .bind(draft.artist_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Artist {} does not exist.", draft.artist_id)))?;

    let show = sqlx::query_as(
        "INSERT INTO shows (venue_id, artist_id, start_time) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(draft.venue_id)
    .bind(draft.artist_id)
    .bind(draft.start_time)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(show)
}

// Flash messages

/// Notices older than this are dropped even if their cookie never comes back.
const NOTICE_TTL: &str = "-1 hour";

pub async fn store_notices(
    pool: &SqlitePool,
    token: &str,
    notices: &[Notice],
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM flash_messages WHERE created_at < datetime('now', ?)")
        .bind(NOTICE_TTL)
        .execute(&mut *tx)
        .await?;
    for notice in notices {
        sqlx::query("INSERT INTO flash_messages (token, level, message) VALUES (?, ?, ?)")
            .bind(token)
            .bind(notice.level.as_str())
            .bind(&notice.message)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;
    Ok(())
}

/// Reads and removes every notice stored under `token`.
pub async fn take_notices(pool: &SqlitePool, token: &str) -> Result<Vec<Notice>, AppError> {
    let mut tx = pool.begin().await?;
    let rows: Vec<(String, String)> =
        sqlx::query_as("SELECT level, message FROM flash_messages WHERE token = ? ORDER BY id")
            .bind(token)
            .fetch_all(&mut *tx)
            .await?;
    sqlx::query("DELETE FROM flash_messages WHERE token = ?")
        .bind(token)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    Ok(rows
        .into_iter()
        .map(|(level, message)| Notice {
            level: Level::parse(&level),
            message,
        })
        .collect())
}

// Demo data

pub async fn seed_demo_if_empty(pool: &SqlitePool) -> Result<bool, AppError> {
    let venue_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM venues")
        .fetch_one(pool)
        .await?;
    if venue_count.0 > 0 {
        return Ok(false);
    }

    let venues = [
        demo_venue("The Musical Hop", "San Francisco", "CA", "1015 Folsom Street", &["Jazz", "Reggae", "Swing", "Classical", "Folk"], true),
        demo_venue("The Dueling Pianos Bar", "New York", "NY", "335 Delancey Street", &["Classical", "R&B", "Hip-Hop"], false),
        demo_venue("Park Square Live Music & Coffee", "San Francisco", "CA", "34 Whiskey Moore Ave", &["Rock n Roll", "Jazz", "Classical", "Folk"], false),
    ];
    let artists = [
        demo_artist("Guns N Petals", "San Francisco", "CA", &["Rock n Roll"], true),
        demo_artist("Matt Quevedo", "New York", "NY", &["Jazz"], false),
        demo_artist("The Wild Sax Band", "San Francisco", "CA", &["Jazz", "Classical"], false),
    ];

    let mut venue_ids = Vec::with_capacity(venues.len());
    for draft in &venues {
        venue_ids.push(create_venue(pool, draft).await?.id);
    }
    let mut artist_ids = Vec::with_capacity(artists.len());
    for draft in &artists {
        artist_ids.push(create_artist(pool, draft).await?.id);
    }

    let now = Utc::now();
    let bookings = [
        (0_usize, 0_usize, now - Duration::days(30)),
        (2, 1, now - Duration::days(12)),
        (2, 2, now + Duration::days(10)),
        (2, 2, now + Duration::days(17)),
        (0, 2, now + Duration::days(45)),
    ];
    for (venue, artist, start_time) in bookings {
        create_show(
            pool,
            &ShowDraft {
                venue_id: venue_ids[venue],
                artist_id: artist_ids[artist],
                start_time,
            },
        )
        .await?;
    }
    Ok(true)
}

fn demo_venue(
    name: &str,
    city: &str,
    state: &str,
    address: &str,
    genres: &[&str],
    seeking_talent: bool,
) -> VenueDraft {
    VenueDraft {
        name: name.to_string(),
        city: city.to_string(),
        state: state.to_string(),
        address: address.to_string(),
        phone: Some("123-123-1234".to_string()),
        genres: genres.iter().map(ToString::to_string).collect(),
        website: None,
        facebook_link: None,
        image_link: None,
        seeking_talent,
        seeking_description: seeking_talent
            .then(|| "We are on the lookout for a local artist to play every two weeks.".to_string()),
    }
}

fn demo_artist(
    name: &str,
    city: &str,
    state: &str,
    genres: &[&str],
    seeking_venue: bool,
) -> ArtistDraft {
    ArtistDraft {
        name: name.to_string(),
        city: city.to_string(),
        state: state.to_string(),
        phone: Some("326-123-5000".to_string()),
        genres: genres.iter().map(ToString::to_string).collect(),
        website: None,
        facebook_link: None,
        image_link: None,
        seeking_venue,
        seeking_description: seeking_venue
            .then(|| "Looking for shows to perform at in the San Francisco Bay Area!".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connect_in_memory;

    fn venue_draft(name: &str) -> VenueDraft {
        demo_venue(name, "San Francisco", "CA", "1015 Folsom Street", &["Jazz"], false)
    }

    fn artist_draft(name: &str) -> ArtistDraft {
        demo_artist(name, "New York", "NY", &["Jazz", "Swing"], true)
    }

    #[tokio::test]
    async fn created_venue_is_retrievable_with_same_fields() {
        let pool = connect_in_memory().await.unwrap();
        let draft = venue_draft("The Musical Hop");
        let created = create_venue(&pool, &draft).await.unwrap();

        let fetched = get_venue(&pool, created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, draft.name);
        assert_eq!(fetched.city, draft.city);
        assert_eq!(fetched.address, draft.address);
        assert_eq!(fetched.phone, draft.phone);
        assert_eq!(fetched.genre_list(), draft.genres);
        assert_eq!(fetched.seeking_talent, draft.seeking_talent);
    }

    #[tokio::test]
    async fn update_overwrites_all_mutable_fields() {
        let pool = connect_in_memory().await.unwrap();
        let created = create_venue(&pool, &venue_draft("Old Name")).await.unwrap();

        let mut changed = demo_venue("New Name", "Austin", "TX", "1 Main St", &["Blues"], true);
        changed.website = Some("https://example.com".to_string());
        let updated = update_venue(&pool, created.id, &changed).await.unwrap().unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.city, "Austin");
        assert_eq!(updated.state, "TX");
        assert_eq!(updated.genres, "Blues");
        assert_eq!(updated.website.as_deref(), Some("https://example.com"));
        assert!(updated.seeking_talent);
    }

    #[tokio::test]
    async fn update_of_missing_venue_returns_none() {
        let pool = connect_in_memory().await.unwrap();
        let result = update_venue(&pool, 42, &venue_draft("Ghost")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn delete_venue_cascades_to_its_shows() {
        let pool = connect_in_memory().await.unwrap();
        let venue = create_venue(&pool, &venue_draft("Doomed Hall")).await.unwrap();
        let artist = create_artist(&pool, &artist_draft("Touring Act")).await.unwrap();
        create_show(
            &pool,
            &ShowDraft {
                venue_id: venue.id,
                artist_id: artist.id,
                start_time: Utc::now() + Duration::days(3),
            },
        )
        .await
        .unwrap();

        let name = delete_venue(&pool, venue.id).await.unwrap();
        assert_eq!(name.as_deref(), Some("Doomed Hall"));
        assert!(get_venue(&pool, venue.id).await.unwrap().is_none());
        assert!(shows_for_artist(&pool, artist.id).await.unwrap().is_empty());
        assert!(get_artist(&pool, artist.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_of_missing_venue_returns_none() {
        let pool = connect_in_memory().await.unwrap();
        assert!(delete_venue(&pool, 7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn show_requires_existing_venue_and_artist() {
        let pool = connect_in_memory().await.unwrap();
        let artist = create_artist(&pool, &artist_draft("Solo")).await.unwrap();

        let err = create_show(
            &pool,
            &ShowDraft {
                venue_id: 99,
                artist_id: artist.id,
                start_time: Utc::now(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(msg) if msg.contains("Venue 99")));
        assert!(list_shows(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn show_details_join_both_sides() {
        let pool = connect_in_memory().await.unwrap();
        let venue = create_venue(&pool, &venue_draft("Hall")).await.unwrap();
        let artist = create_artist(&pool, &artist_draft("Band")).await.unwrap();
        let start_time = Utc::now() + Duration::days(1);
        create_show(
            &pool,
            &ShowDraft {
                venue_id: venue.id,
                artist_id: artist.id,
                start_time,
            },
        )
        .await
        .unwrap();

        let shows = shows_for_venue(&pool, venue.id).await.unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].artist_name, "Band");
        assert_eq!(shows[0].venue_name, "Hall");
        assert_eq!(shows[0].start_time.timestamp(), start_time.timestamp());
    }

    #[tokio::test]
    async fn notices_are_consumed_once() {
        let pool = connect_in_memory().await.unwrap();
        store_notices(
            &pool,
            "tok",
            &[Notice::success("saved"), Notice::error("but also this")],
        )
        .await
        .unwrap();

        let taken = take_notices(&pool, "tok").await.unwrap();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].message, "saved");
        assert_eq!(taken[1].level, Level::Error);
        assert!(take_notices(&pool, "tok").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn abandoned_notices_are_purged_on_next_store() {
        let pool = connect_in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO flash_messages (token, level, message, created_at)
             VALUES ('abandoned', 'success', 'old news', '2000-01-01 00:00:00')",
        )
        .execute(&pool)
        .await
        .unwrap();
        store_notices(&pool, "recent", &[Notice::success("fresh")])
            .await
            .unwrap();

        assert!(take_notices(&pool, "abandoned").await.unwrap().is_empty());
        let recent = take_notices(&pool, "recent").await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message, "fresh");
    }

    #[tokio::test]
    async fn seeding_only_happens_on_empty_store() {
        let pool = connect_in_memory().await.unwrap();
        assert!(seed_demo_if_empty(&pool).await.unwrap());
        assert!(!seed_demo_if_empty(&pool).await.unwrap());
        assert_eq!(list_venue_names(&pool).await.unwrap().len(), 3);
        assert_eq!(list_artist_names(&pool).await.unwrap().len(), 3);
        assert_eq!(list_shows(&pool).await.unwrap().len(), 5);
    }
}
