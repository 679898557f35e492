//! Maps submitted form fields onto drafts and patches.
//!
//! Each entity has an explicit list of accepted field names. Anything else is
//! rejected, and every problem is reported per field before the store is
//! touched.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CoreError, FieldError, Result};
use crate::models::{ArtistDraft, ArtistPatch, ShowDraft, VenueDraft, VenuePatch};

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3}-\d{3}-\d{4}$").expect("valid phone regex"));

static STATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{2}$").expect("valid state regex"));

/// Submitted (name, value) pairs in the order they arrived. Multi-valued
/// fields such as `genres` repeat their name.
pub type FormPairs = [(String, String)];

const VENUE_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("city", "city"),
    ("state", "state"),
    ("address", "address"),
    ("phone", "phone"),
    ("image_link", "image_link"),
    ("facebook_link", "facebook_link"),
    ("website_link", "website"),
    ("website", "website"),
    ("genres", "genres"),
    ("seeking_talent", "seeking_talent"),
    ("seeking_description", "seeking_description"),
];

const ARTIST_FIELDS: &[(&str, &str)] = &[
    ("name", "name"),
    ("city", "city"),
    ("state", "state"),
    ("phone", "phone"),
    ("image_link", "image_link"),
    ("facebook_link", "facebook_link"),
    ("website_link", "website"),
    ("website", "website"),
    ("genres", "genres"),
    ("seeking_venue", "seeking_venue"),
    ("seeking_description", "seeking_description"),
];

const SHOW_FIELDS: &[(&str, &str)] = &[
    ("artist_id", "artist_id"),
    ("venue_id", "venue_id"),
    ("start_time", "start_time"),
];

const TRUTHY: [&str; 6] = ["y", "t", "true", "True", "on", "1"];

pub fn venue_draft(pairs: &FormPairs) -> Result<VenueDraft> {
    let mut form = Submission::parse(pairs, VENUE_FIELDS);
    let draft = VenueDraft {
        name: form.required("name"),
        city: form.required("city"),
        state: form.state("state"),
        address: form.required("address"),
        phone: form.phone("phone"),
        image_link: form.link("image_link"),
        facebook_link: form.link("facebook_link"),
        website: form.link("website"),
        genres: form.genres("genres"),
        seeking_talent: form.flag("seeking_talent"),
        seeking_description: form.optional("seeking_description"),
    };
    form.finish(draft)
}

pub fn venue_patch(pairs: &FormPairs) -> Result<VenuePatch> {
    let mut form = Submission::parse(pairs, VENUE_FIELDS);
    let mut patch = VenuePatch::default();
    if form.has("name") {
        patch.name = Some(form.required("name"));
    }
    if form.has("city") {
        patch.city = Some(form.required("city"));
    }
    if form.has("state") {
        patch.state = Some(form.state("state"));
    }
    if form.has("address") {
        patch.address = Some(form.required("address"));
    }
    if form.has("phone") {
        patch.phone = Some(form.phone("phone"));
    }
    if form.has("image_link") {
        patch.image_link = Some(form.link("image_link"));
    }
    if form.has("facebook_link") {
        patch.facebook_link = Some(form.link("facebook_link"));
    }
    if form.has("website") {
        patch.website = Some(form.link("website"));
    }
    if form.has("genres") {
        patch.genres = Some(form.genres("genres"));
    }
    if form.has("seeking_talent") {
        patch.seeking_talent = Some(form.flag("seeking_talent"));
    }
    if form.has("seeking_description") {
        patch.seeking_description = Some(form.optional("seeking_description"));
    }
    form.finish(patch)
}

pub fn artist_draft(pairs: &FormPairs) -> Result<ArtistDraft> {
    let mut form = Submission::parse(pairs, ARTIST_FIELDS);
    let draft = ArtistDraft {
        name: form.required("name"),
        city: form.required("city"),
        state: form.state("state"),
        phone: form.phone("phone"),
        image_link: form.link("image_link"),
        facebook_link: form.link("facebook_link"),
        website: form.link("website"),
        genres: form.genres("genres"),
        seeking_venue: form.flag("seeking_venue"),
        seeking_description: form.optional("seeking_description"),
    };
    form.finish(draft)
}

pub fn artist_patch(pairs: &FormPairs) -> Result<ArtistPatch> {
    let mut form = Submission::parse(pairs, ARTIST_FIELDS);
    let mut patch = ArtistPatch::default();
    if form.has("name") {
        patch.name = Some(form.required("name"));
    }
    if form.has("city") {
        patch.city = Some(form.required("city"));
    }
    if form.has("state") {
        patch.state = Some(form.state("state"));
    }
    if form.has("phone") {
        patch.phone = Some(form.phone("phone"));
    }
    if form.has("image_link") {
        patch.image_link = Some(form.link("image_link"));
    }
    if form.has("facebook_link") {
        patch.facebook_link = Some(form.link("facebook_link"));
    }
    if form.has("website") {
        patch.website = Some(form.link("website"));
    }
    if form.has("genres") {
        patch.genres = Some(form.genres("genres"));
    }
    if form.has("seeking_venue") {
        patch.seeking_venue = Some(form.flag("seeking_venue"));
    }
    if form.has("seeking_description") {
        patch.seeking_description = Some(form.optional("seeking_description"));
    }
    form.finish(patch)
}

pub fn show_draft(pairs: &FormPairs) -> Result<ShowDraft> {
    let mut form = Submission::parse(pairs, SHOW_FIELDS);
    let draft = ShowDraft {
        artist_id: form.id("artist_id"),
        venue_id: form.id("venue_id"),
        start_time: form.timestamp("start_time"),
    };
    form.finish(draft)
}

/// Parses an RFC 3339 timestamp, or a naive `YYYY-MM-DD HH:MM[:SS]` taken as UTC.
pub fn parse_start_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

struct Submission<'a> {
    values: BTreeMap<&'static str, Vec<&'a str>>,
    errors: Vec<FieldError>,
}

impl<'a> Submission<'a> {
    fn parse(pairs: &'a FormPairs, allowed: &[(&str, &'static str)]) -> Self {
        let mut values: BTreeMap<&'static str, Vec<&'a str>> = BTreeMap::new();
        let mut errors = Vec::new();
        for (name, value) in pairs {
            let known = allowed
                .iter()
                .find(|(submitted, _)| *submitted == name.as_str());
            match known {
                Some((_, canonical)) => values.entry(*canonical).or_default().push(value.as_str()),
                None => errors.push(FieldError::new(name.as_str(), "unknown field")),
            }
        }
        Self { values, errors }
    }

    fn has(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    fn last(&self, field: &str) -> Option<&'a str> {
        self.values
            .get(field)
            .and_then(|values| values.last().copied())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    fn reject(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    fn required(&mut self, field: &str) -> String {
        match self.last(field) {
            Some(value) => value.to_string(),
            None => {
                self.reject(field, "is required");
                String::new()
            }
        }
    }

    fn optional(&mut self, field: &str) -> Option<String> {
        self.last(field).map(str::to_string)
    }

    fn state(&mut self, field: &str) -> String {
        let value = self.required(field);
        if !value.is_empty() && !STATE_RE.is_match(&value) {
            self.reject(field, "must be a two-letter state code");
        }
        value
    }

    fn phone(&mut self, field: &str) -> Option<String> {
        let value = self.optional(field)?;
        if !PHONE_RE.is_match(&value) {
            self.reject(field, "must look like 555-555-5555");
        }
        Some(value)
    }

    fn link(&mut self, field: &str) -> Option<String> {
        let value = self.optional(field)?;
        if !(value.starts_with("http://") || value.starts_with("https://")) {
            self.reject(field, "must be an http or https link");
        }
        Some(value)
    }

    fn genres(&mut self, field: &str) -> Vec<String> {
        let genres: Vec<String> = self
            .values
            .get(field)
            .map(|values| {
                values
                    .iter()
                    .map(|value| value.trim())
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if genres.is_empty() {
            self.reject(field, "at least one genre is required");
        }
        genres
    }

    fn flag(&self, field: &str) -> bool {
        self.last(field)
            .map(|value| TRUTHY.contains(&value))
            .unwrap_or(false)
    }

    fn id(&mut self, field: &str) -> i64 {
        let raw = self.required(field);
        if raw.is_empty() {
            return 0;
        }
        match raw.parse::<i64>() {
            Ok(id) if id > 0 => id,
            _ => {
                self.reject(field, "must be a positive integer id");
                0
            }
        }
    }

    fn timestamp(&mut self, field: &str) -> DateTime<Utc> {
        let raw = self.required(field);
        if raw.is_empty() {
            return DateTime::<Utc>::MIN_UTC;
        }
        match parse_start_time(&raw) {
            Some(at) => at,
            None => {
                self.reject(field, "must be a date and time like 2026-05-21 21:30:00");
                DateTime::<Utc>::MIN_UTC
            }
        }
    }

    fn finish<T>(self, value: T) -> Result<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(CoreError::ValidationFailed(self.errors))
        }
    }
}
