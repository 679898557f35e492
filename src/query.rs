//! Grouping, search, show partitioning and pagination over loaded records.
//!
//! Everything here is a pure function of its inputs; "now" is always passed
//! in by the caller so that upcoming/past counts are computed at query time.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::models::{Artist, Drink, Question, Show, Venue};

/// What an empty search term means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyTermPolicy {
    /// No filter: every entity matches.
    #[default]
    MatchAll,
    /// The term is rejected as a validation failure.
    Reject,
}

pub trait Searchable {
    fn search_text(&self) -> &str;
}

impl Searchable for Venue {
    fn search_text(&self) -> &str {
        &self.name
    }
}

impl Searchable for Artist {
    fn search_text(&self) -> &str {
        &self.name
    }
}

impl Searchable for Question {
    fn search_text(&self) -> &str {
        &self.question
    }
}

impl Searchable for Drink {
    fn search_text(&self) -> &str {
        &self.title
    }
}

pub trait Located {
    fn city(&self) -> &str;
    fn state(&self) -> &str;
}

impl Located for Venue {
    fn city(&self) -> &str {
        &self.city
    }

    fn state(&self) -> &str {
        &self.state
    }
}

impl<T: Located + ?Sized> Located for &T {
    fn city(&self) -> &str {
        (**self).city()
    }

    fn state(&self) -> &str {
        (**self).state()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationGroup<T> {
    pub city: String,
    pub state: String,
    pub venues: Vec<T>,
}

/// Groups venues by their exact `(city, state)` pair.
///
/// Groups appear in the order their pair is first seen and each group keeps
/// the input order of its venues.
pub fn group_venues_by_location<T, I>(venues: I) -> Vec<LocationGroup<T>>
where
    T: Located,
    I: IntoIterator<Item = T>,
{
    let mut groups: Vec<LocationGroup<T>> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for venue in venues {
        let key = (venue.city().to_string(), venue.state().to_string());
        match index.get(&key) {
            Some(&position) => groups[position].venues.push(venue),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(LocationGroup {
                    city: key.0,
                    state: key.1,
                    venues: vec![venue],
                });
            }
        }
    }

    groups
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults<T> {
    pub count: usize,
    pub data: Vec<T>,
}

impl<T> SearchResults<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> SearchResults<U> {
        SearchResults {
            count: self.count,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

/// Case-insensitive substring search over each entity's searchable text.
///
/// Surrounding whitespace in the term is ignored; a blank term is handled
/// according to `policy`.
pub fn search_by_name<'a, T: Searchable>(
    entities: &'a [T],
    term: &str,
    policy: EmptyTermPolicy,
) -> Result<SearchResults<&'a T>> {
    let needle = term.trim().to_lowercase();
    let data: Vec<&T> = if needle.is_empty() {
        match policy {
            EmptyTermPolicy::MatchAll => entities.iter().collect(),
            EmptyTermPolicy::Reject => {
                return Err(CoreError::invalid("search_term", "must not be empty"))
            }
        }
    } else {
        entities
            .iter()
            .filter(|entity| entity.search_text().to_lowercase().contains(&needle))
            .collect()
    };

    tracing::debug!(term, hits = data.len(), "search");
    Ok(SearchResults {
        count: data.len(),
        data,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShowPartition<T> {
    pub past: Vec<T>,
    pub upcoming: Vec<T>,
}

/// Splits shows into past (`start < now`) and upcoming (`start >= now`).
pub fn partition_shows<'a, I>(shows: I, now: DateTime<Utc>) -> ShowPartition<&'a Show>
where
    I: IntoIterator<Item = &'a Show>,
{
    let (upcoming, past) = shows.into_iter().partition(|show| is_upcoming(show, now));
    ShowPartition { past, upcoming }
}

pub fn is_upcoming(show: &Show, now: DateTime<Utc>) -> bool {
    show.start_time >= now
}

/// Returns the 1-indexed `page` of `items`. Pages outside the sequence,
/// including page 0, are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}
