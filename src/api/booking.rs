use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::BookingStore;
use crate::error::Result;
use crate::forms::{self, FormPairs};
use crate::models::{Artist, Show, Venue};
use crate::query::{
    group_venues_by_location, is_upcoming, partition_shows, search_by_name, EmptyTermPolicy,
    LocationGroup, SearchResults,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueListing {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistListing {
    pub id: i64,
    pub name: String,
    pub num_upcoming_shows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueShow {
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistShow {
    pub venue_id: i64,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VenueDetail {
    #[serde(flatten)]
    pub venue: Venue,
    pub past_shows: Vec<VenueShow>,
    pub upcoming_shows: Vec<VenueShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistDetail {
    #[serde(flatten)]
    pub artist: Artist,
    pub past_shows: Vec<ArtistShow>,
    pub upcoming_shows: Vec<ArtistShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowListing {
    pub venue_id: i64,
    pub venue_name: String,
    pub artist_id: i64,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: DateTime<Utc>,
}

/// Venues grouped by city and state, each with its upcoming show count.
pub fn list_venue_areas(
    store: &BookingStore,
    now: DateTime<Utc>,
) -> Result<Vec<LocationGroup<VenueListing>>> {
    let venues = store.list_venues()?;
    let shows = store.list_shows()?;
    let upcoming = upcoming_by(&shows, now, |show| show.venue_id);

    Ok(group_venues_by_location(&venues)
        .into_iter()
        .map(|group| LocationGroup {
            city: group.city,
            state: group.state,
            venues: group
                .venues
                .into_iter()
                .map(|venue| VenueListing {
                    id: venue.id,
                    name: venue.name.clone(),
                    num_upcoming_shows: upcoming.get(&venue.id).copied().unwrap_or(0),
                })
                .collect(),
        })
        .collect())
}

pub fn search_venues(
    store: &BookingStore,
    term: &str,
    policy: EmptyTermPolicy,
    now: DateTime<Utc>,
) -> Result<SearchResults<VenueListing>> {
    let venues = store.list_venues()?;
    let shows = store.list_shows()?;
    let upcoming = upcoming_by(&shows, now, |show| show.venue_id);

    let hits = search_by_name(&venues, term, policy)?;
    let listings = hits.map(|venue| VenueListing {
        id: venue.id,
        name: venue.name.clone(),
        num_upcoming_shows: upcoming.get(&venue.id).copied().unwrap_or(0),
    });
    Ok(listings)
}

pub fn search_artists(
    store: &BookingStore,
    term: &str,
    policy: EmptyTermPolicy,
    now: DateTime<Utc>,
) -> Result<SearchResults<ArtistListing>> {
    let artists = store.list_artists()?;
    let shows = store.list_shows()?;
    let upcoming = upcoming_by(&shows, now, |show| show.artist_id);

    let hits = search_by_name(&artists, term, policy)?;
    let listings = hits.map(|artist| ArtistListing {
        id: artist.id,
        name: artist.name.clone(),
        num_upcoming_shows: upcoming.get(&artist.id).copied().unwrap_or(0),
    });
    Ok(listings)
}

pub fn venue_detail(store: &BookingStore, id: i64, now: DateTime<Utc>) -> Result<VenueDetail> {
    let venue = store.get_venue(id)?;
    let shows = store.shows_for_venue(id)?;
    let artists = index_by_id(store.list_artists()?, |artist| artist.id);
    let partition = partition_shows(&shows, now);

    let view = |show: &Show| -> VenueShow {
        let artist = artists.get(&show.artist_id);
        VenueShow {
            artist_id: show.artist_id,
            artist_name: artist.map(|a| a.name.clone()).unwrap_or_default(),
            artist_image_link: artist.and_then(|a| a.image_link.clone()),
            start_time: show.start_time,
        }
    };
    let past_shows: Vec<VenueShow> = partition.past.into_iter().map(&view).collect();
    let upcoming_shows: Vec<VenueShow> = partition.upcoming.into_iter().map(&view).collect();

    Ok(VenueDetail {
        venue,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    })
}

pub fn artist_detail(store: &BookingStore, id: i64, now: DateTime<Utc>) -> Result<ArtistDetail> {
    let artist = store.get_artist(id)?;
    let shows = store.shows_for_artist(id)?;
    let venues = index_by_id(store.list_venues()?, |venue| venue.id);
    let partition = partition_shows(&shows, now);

    let view = |show: &Show| -> ArtistShow {
        let venue = venues.get(&show.venue_id);
        ArtistShow {
            venue_id: show.venue_id,
            venue_name: venue.map(|v| v.name.clone()).unwrap_or_default(),
            venue_image_link: venue.and_then(|v| v.image_link.clone()),
            start_time: show.start_time,
        }
    };
    let past_shows: Vec<ArtistShow> = partition.past.into_iter().map(&view).collect();
    let upcoming_shows: Vec<ArtistShow> = partition.upcoming.into_iter().map(&view).collect();

    Ok(ArtistDetail {
        artist,
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    })
}

pub fn list_artists(store: &BookingStore) -> Result<Vec<ArtistSummary>> {
    Ok(store
        .list_artists()?
        .into_iter()
        .map(|artist| ArtistSummary {
            id: artist.id,
            name: artist.name,
        })
        .collect())
}

pub fn list_shows(store: &BookingStore) -> Result<Vec<ShowListing>> {
    let venues = index_by_id(store.list_venues()?, |venue| venue.id);
    let artists = index_by_id(store.list_artists()?, |artist| artist.id);

    Ok(store
        .list_shows()?
        .into_iter()
        .filter_map(|show| {
            let venue = venues.get(&show.venue_id)?;
            let artist = artists.get(&show.artist_id)?;
            Some(ShowListing {
                venue_id: show.venue_id,
                venue_name: venue.name.clone(),
                artist_id: show.artist_id,
                artist_name: artist.name.clone(),
                artist_image_link: artist.image_link.clone(),
                start_time: show.start_time,
            })
        })
        .collect())
}

pub fn venue_for_edit(store: &BookingStore, id: i64) -> Result<Venue> {
    store.get_venue(id)
}

pub fn artist_for_edit(store: &BookingStore, id: i64) -> Result<Artist> {
    store.get_artist(id)
}

pub fn create_venue(store: &BookingStore, form: &FormPairs) -> Result<Venue> {
    let draft = forms::venue_draft(form)?;
    store.insert_venue(&draft)
}

pub fn edit_venue(store: &BookingStore, id: i64, form: &FormPairs) -> Result<Venue> {
    let patch = forms::venue_patch(form)?;
    store.update_venue(id, patch)
}

pub fn delete_venue(store: &BookingStore, id: i64) -> Result<Venue> {
    store.delete_venue(id)
}

pub fn create_artist(store: &BookingStore, form: &FormPairs) -> Result<Artist> {
    let draft = forms::artist_draft(form)?;
    store.insert_artist(&draft)
}

pub fn edit_artist(store: &BookingStore, id: i64, form: &FormPairs) -> Result<Artist> {
    let patch = forms::artist_patch(form)?;
    store.update_artist(id, patch)
}

pub fn delete_artist(store: &BookingStore, id: i64) -> Result<Artist> {
    store.delete_artist(id)
}

pub fn create_show(store: &BookingStore, form: &FormPairs) -> Result<Show> {
    let draft = forms::show_draft(form)?;
    store.insert_show(&draft)
}

fn upcoming_by<F>(shows: &[Show], now: DateTime<Utc>, key: F) -> HashMap<i64, usize>
where
    F: Fn(&Show) -> i64,
{
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for show in shows.iter().filter(|show| is_upcoming(show, now)) {
        *counts.entry(key(show)).or_insert(0) += 1;
    }
    counts
}

fn index_by_id<T, F>(items: Vec<T>, id: F) -> HashMap<i64, T>
where
    F: Fn(&T) -> i64,
{
    items.into_iter().map(|item| (id(&item), item)).collect()
}
