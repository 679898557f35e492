use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{decode_json, encode_json, open_file, open_memory, with_transaction};
use crate::error::{CoreError, EntityKind, FieldError, Result};
use crate::models::{
    Artist, ArtistDraft, ArtistPatch, Show, ShowDraft, Venue, VenueDraft, VenuePatch,
};

const VENUE_COLUMNS: &str = "id, name, city, state, address, phone, image_link, facebook_link, \
     website, genres, seeking_talent, seeking_description";

const ARTIST_COLUMNS: &str = "id, name, city, state, phone, image_link, facebook_link, website, \
     genres, seeking_venue, seeking_description";

const SHOW_COLUMNS: &str = "id, artist_id, venue_id, start_time";

const SHOW_ORDER: &str = "ORDER BY start_time, id";

/// Venues, artists and the shows that link them.
///
/// Deleting a venue or an artist deletes every show that references it.
pub struct BookingStore {
    conn: Connection,
}

impl BookingStore {
    pub fn open(path: &Path) -> Result<Self> {
        let store = Self {
            conn: open_file(path)?,
        };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: open_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS venues(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                address TEXT NOT NULL,
                phone TEXT,
                image_link TEXT,
                facebook_link TEXT,
                website TEXT,
                genres TEXT NOT NULL,
                seeking_talent INTEGER NOT NULL DEFAULT 0,
                seeking_description TEXT
            );
            CREATE TABLE IF NOT EXISTS artists(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                phone TEXT,
                image_link TEXT,
                facebook_link TEXT,
                website TEXT,
                genres TEXT NOT NULL,
                seeking_venue INTEGER NOT NULL DEFAULT 0,
                seeking_description TEXT
            );
            CREATE TABLE IF NOT EXISTS shows(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                artist_id INTEGER NOT NULL REFERENCES artists(id) ON DELETE CASCADE,
                venue_id INTEGER NOT NULL REFERENCES venues(id) ON DELETE CASCADE,
                start_time TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS shows_by_venue ON shows(venue_id);
            CREATE INDEX IF NOT EXISTS shows_by_artist ON shows(artist_id);",
        )
    }

    // Venues

    pub fn list_venues(&self) -> Result<Vec<Venue>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {VENUE_COLUMNS} FROM venues ORDER BY id"))?;
        let rows = stmt.query_map([], venue_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_venue(&self, id: i64) -> Result<Venue> {
        find_venue(&self.conn, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Venue, id))
    }

    pub fn insert_venue(&self, draft: &VenueDraft) -> Result<Venue> {
        let genres = encode_json(&draft.genres)?;
        let venue = with_transaction(&self.conn, "insert venue", |tx| {
            tx.execute(
                "INSERT INTO venues (name, city, state, address, phone, image_link, facebook_link,
                    website, genres, seeking_talent, seeking_description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    draft.name,
                    draft.city,
                    draft.state,
                    draft.address,
                    draft.phone,
                    draft.image_link,
                    draft.facebook_link,
                    draft.website,
                    genres,
                    draft.seeking_talent,
                    draft.seeking_description
                ],
            )?;
            let id = tx.last_insert_rowid();
            find_venue(tx, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Venue, id))
        })?;
        tracing::info!(venue_id = venue.id, name = %venue.name, "venue listed");
        Ok(venue)
    }

    pub fn update_venue(&self, id: i64, patch: VenuePatch) -> Result<Venue> {
        let venue = with_transaction(&self.conn, "update venue", |tx| {
            let mut venue =
                find_venue(tx, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Venue, id))?;
            patch.apply_to(&mut venue);
            let genres = encode_json(&venue.genres)?;
            tx.execute(
                "UPDATE venues SET name = ?2, city = ?3, state = ?4, address = ?5, phone = ?6,
                    image_link = ?7, facebook_link = ?8, website = ?9, genres = ?10,
                    seeking_talent = ?11, seeking_description = ?12
                 WHERE id = ?1",
                params![
                    venue.id,
                    venue.name,
                    venue.city,
                    venue.state,
                    venue.address,
                    venue.phone,
                    venue.image_link,
                    venue.facebook_link,
                    venue.website,
                    genres,
                    venue.seeking_talent,
                    venue.seeking_description
                ],
            )?;
            Ok(venue)
        })?;
        tracing::info!(venue_id = id, "venue updated");
        Ok(venue)
    }

    /// Removes the venue and, through the foreign key, all of its shows.
    pub fn delete_venue(&self, id: i64) -> Result<Venue> {
        let venue = with_transaction(&self.conn, "delete venue", |tx| {
            let venue =
                find_venue(tx, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Venue, id))?;
            tx.execute("DELETE FROM venues WHERE id = ?1", params![id])?;
            Ok(venue)
        })?;
        tracing::info!(venue_id = id, name = %venue.name, "venue deleted");
        Ok(venue)
    }

    // Artists

    pub fn list_artists(&self) -> Result<Vec<Artist>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {ARTIST_COLUMNS} FROM artists ORDER BY id"))?;
        let rows = stmt.query_map([], artist_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_artist(&self, id: i64) -> Result<Artist> {
        find_artist(&self.conn, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Artist, id))
    }

    pub fn insert_artist(&self, draft: &ArtistDraft) -> Result<Artist> {
        let genres = encode_json(&draft.genres)?;
        let artist = with_transaction(&self.conn, "insert artist", |tx| {
            tx.execute(
                "INSERT INTO artists (name, city, state, phone, image_link, facebook_link, website,
                    genres, seeking_venue, seeking_description)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    draft.name,
                    draft.city,
                    draft.state,
                    draft.phone,
                    draft.image_link,
                    draft.facebook_link,
                    draft.website,
                    genres,
                    draft.seeking_venue,
                    draft.seeking_description
                ],
            )?;
            let id = tx.last_insert_rowid();
            find_artist(tx, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Artist, id))
        })?;
        tracing::info!(artist_id = artist.id, name = %artist.name, "artist listed");
        Ok(artist)
    }

    pub fn update_artist(&self, id: i64, patch: ArtistPatch) -> Result<Artist> {
        let artist = with_transaction(&self.conn, "update artist", |tx| {
            let mut artist =
                find_artist(tx, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Artist, id))?;
            patch.apply_to(&mut artist);
            let genres = encode_json(&artist.genres)?;
            tx.execute(
                "UPDATE artists SET name = ?2, city = ?3, state = ?4, phone = ?5, image_link = ?6,
                    facebook_link = ?7, website = ?8, genres = ?9, seeking_venue = ?10,
                    seeking_description = ?11
                 WHERE id = ?1",
                params![
                    artist.id,
                    artist.name,
                    artist.city,
                    artist.state,
                    artist.phone,
                    artist.image_link,
                    artist.facebook_link,
                    artist.website,
                    genres,
                    artist.seeking_venue,
                    artist.seeking_description
                ],
            )?;
            Ok(artist)
        })?;
        tracing::info!(artist_id = id, "artist updated");
        Ok(artist)
    }

    /// Removes the artist and all of its shows, same as for venues.
    pub fn delete_artist(&self, id: i64) -> Result<Artist> {
        let artist = with_transaction(&self.conn, "delete artist", |tx| {
            let artist =
                find_artist(tx, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Artist, id))?;
            tx.execute("DELETE FROM artists WHERE id = ?1", params![id])?;
            Ok(artist)
        })?;
        tracing::info!(artist_id = id, name = %artist.name, "artist deleted");
        Ok(artist)
    }

    // Shows

    pub fn list_shows(&self) -> Result<Vec<Show>> {
        let sql = format!("SELECT {SHOW_COLUMNS} FROM shows {SHOW_ORDER}");
        self.query_shows(&sql, None)
    }

    pub fn shows_for_venue(&self, venue_id: i64) -> Result<Vec<Show>> {
        let sql = format!("SELECT {SHOW_COLUMNS} FROM shows WHERE venue_id = ?1 {SHOW_ORDER}");
        self.query_shows(&sql, Some(venue_id))
    }

    pub fn shows_for_artist(&self, artist_id: i64) -> Result<Vec<Show>> {
        let sql = format!("SELECT {SHOW_COLUMNS} FROM shows WHERE artist_id = ?1 {SHOW_ORDER}");
        self.query_shows(&sql, Some(artist_id))
    }

    fn query_shows(&self, sql: &str, key: Option<i64>) -> Result<Vec<Show>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = match key {
            Some(key) => stmt.query_map(params![key], show_from_row)?,
            None => stmt.query_map([], show_from_row)?,
        };
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Inserts a show after checking that both ends of it exist.
    pub fn insert_show(&self, draft: &ShowDraft) -> Result<Show> {
        let show = with_transaction(&self.conn, "insert show", |tx| {
            let mut missing = Vec::new();
            if find_artist(tx, draft.artist_id)?.is_none() {
                missing.push(FieldError::new(
                    "artist_id",
                    format!("no artist with id {}", draft.artist_id),
                ));
            }
            if find_venue(tx, draft.venue_id)?.is_none() {
                missing.push(FieldError::new(
                    "venue_id",
                    format!("no venue with id {}", draft.venue_id),
                ));
            }
            if !missing.is_empty() {
                return Err(CoreError::ValidationFailed(missing));
            }

            tx.execute(
                "INSERT INTO shows (artist_id, venue_id, start_time) VALUES (?1, ?2, ?3)",
                params![draft.artist_id, draft.venue_id, draft.start_time],
            )?;
            let id = tx.last_insert_rowid();
            find_show(tx, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Show, id))
        })?;
        tracing::info!(
            show_id = show.id,
            artist_id = show.artist_id,
            venue_id = show.venue_id,
            start_time = %show.start_time,
            "show listed"
        );
        Ok(show)
    }
}

fn find_venue(conn: &Connection, id: i64) -> rusqlite::Result<Option<Venue>> {
    conn.query_row(
        &format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = ?1"),
        params![id],
        venue_from_row,
    )
    .optional()
}

fn find_artist(conn: &Connection, id: i64) -> rusqlite::Result<Option<Artist>> {
    conn.query_row(
        &format!("SELECT {ARTIST_COLUMNS} FROM artists WHERE id = ?1"),
        params![id],
        artist_from_row,
    )
    .optional()
}

fn find_show(conn: &Connection, id: i64) -> rusqlite::Result<Option<Show>> {
    conn.query_row(
        &format!("SELECT {SHOW_COLUMNS} FROM shows WHERE id = ?1"),
        params![id],
        show_from_row,
    )
    .optional()
}

fn venue_from_row(row: &Row<'_>) -> rusqlite::Result<Venue> {
    let genres: String = row.get("genres")?;
    Ok(Venue {
        id: row.get("id")?,
        name: row.get("name")?,
        city: row.get("city")?,
        state: row.get("state")?,
        address: row.get("address")?,
        phone: row.get("phone")?,
        image_link: row.get("image_link")?,
        facebook_link: row.get("facebook_link")?,
        website: row.get("website")?,
        genres: decode_json(&genres)?,
        seeking_talent: row.get("seeking_talent")?,
        seeking_description: row.get("seeking_description")?,
    })
}

fn artist_from_row(row: &Row<'_>) -> rusqlite::Result<Artist> {
    let genres: String = row.get("genres")?;
    Ok(Artist {
        id: row.get("id")?,
        name: row.get("name")?,
        city: row.get("city")?,
        state: row.get("state")?,
        phone: row.get("phone")?,
        image_link: row.get("image_link")?,
        facebook_link: row.get("facebook_link")?,
        website: row.get("website")?,
        genres: decode_json(&genres)?,
        seeking_venue: row.get("seeking_venue")?,
        seeking_description: row.get("seeking_description")?,
    })
}

fn show_from_row(row: &Row<'_>) -> rusqlite::Result<Show> {
    Ok(Show {
        id: row.get("id")?,
        artist_id: row.get("artist_id")?,
        venue_id: row.get("venue_id")?,
        start_time: row.get("start_time")?,
    })
}
