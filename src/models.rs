use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub genres: Vec<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub genres: Vec<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Show {
    pub id: i64,
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: DateTime<Utc>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VenueDraft {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub genres: Vec<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

/// Fields left as `None` keep their stored value. For nullable columns the
/// inner `None` clears the value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VenuePatch {
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub address: Option<String>,
    pub phone: Option<Option<String>>,
    pub image_link: Option<Option<String>>,
    pub facebook_link: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub genres: Option<Vec<String>>,
    pub seeking_talent: Option<bool>,
    pub seeking_description: Option<Option<String>>,
}

impl VenuePatch {
    pub fn apply_to(self, venue: &mut Venue) {
        if let Some(name) = self.name {
            venue.name = name;
        }
        if let Some(city) = self.city {
            venue.city = city;
        }
        if let Some(state) = self.state {
            venue.state = state;
        }
        if let Some(address) = self.address {
            venue.address = address;
        }
        if let Some(phone) = self.phone {
            venue.phone = phone;
        }
        if let Some(image_link) = self.image_link {
            venue.image_link = image_link;
        }
        if let Some(facebook_link) = self.facebook_link {
            venue.facebook_link = facebook_link;
        }
        if let Some(website) = self.website {
            venue.website = website;
        }
        if let Some(genres) = self.genres {
            venue.genres = genres;
        }
        if let Some(seeking) = self.seeking_talent {
            venue.seeking_talent = seeking;
        }
        if let Some(description) = self.seeking_description {
            venue.seeking_description = description;
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtistDraft {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub website: Option<String>,
    pub genres: Vec<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtistPatch {
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub phone: Option<Option<String>>,
    pub image_link: Option<Option<String>>,
    pub facebook_link: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub genres: Option<Vec<String>>,
    pub seeking_venue: Option<bool>,
    pub seeking_description: Option<Option<String>>,
}

impl ArtistPatch {
    pub fn apply_to(self, artist: &mut Artist) {
        if let Some(name) = self.name {
            artist.name = name;
        }
        if let Some(city) = self.city {
            artist.city = city;
        }
        if let Some(state) = self.state {
            artist.state = state;
        }
        if let Some(phone) = self.phone {
            artist.phone = phone;
        }
        if let Some(image_link) = self.image_link {
            artist.image_link = image_link;
        }
        if let Some(facebook_link) = self.facebook_link {
            artist.facebook_link = facebook_link;
        }
        if let Some(website) = self.website {
            artist.website = website;
        }
        if let Some(genres) = self.genres {
            artist.genres = genres;
        }
        if let Some(seeking) = self.seeking_venue {
            artist.seeking_venue = seeking;
        }
        if let Some(description) = self.seeking_description {
            artist.seeking_description = description;
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShowDraft {
    pub artist_id: i64,
    pub venue_id: i64,
    pub start_time: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: u8,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RecipePart {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

/// Recipe part without the ingredient name, as shown on the public menu.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ShortRecipePart {
    pub color: String,
    pub parts: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<RecipePart>,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct DrinkSummary {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<ShortRecipePart>,
}

impl Drink {
    pub fn short(&self) -> DrinkSummary {
        DrinkSummary {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|part| ShortRecipePart {
                    color: part.color.clone(),
                    parts: part.parts,
                })
                .collect(),
        }
    }

    pub fn long(&self) -> Drink {
        self.clone()
    }

    pub fn total_parts(&self) -> u32 {
        self.recipe.iter().map(|part| part.parts).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrinkDraft {
    pub title: String,
    pub recipe: Vec<RecipePart>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrinkPatch {
    pub title: Option<String>,
    pub recipe: Option<Vec<RecipePart>>,
}
