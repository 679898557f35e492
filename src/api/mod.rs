//! Operations the HTTP surface calls. Each takes an explicit store handle and
//! returns a serializable view or a [`CoreError`](crate::error::CoreError).

pub mod booking;
pub mod coffee;
pub mod trivia;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CoreError, FieldError, Result};

/// Decodes a JSON request body, reporting decode problems as validation failures.
pub(crate) fn decode_body<T: DeserializeOwned>(body: &Value) -> Result<T> {
    if body.is_null() {
        return Err(CoreError::invalid("body", "a JSON body is required"));
    }
    T::deserialize(body).map_err(|err| CoreError::invalid("body", err.to_string()))
}

/// Identifiers arrive as numbers from API clients and as strings from HTML
/// selects; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    pub(crate) fn parse(&self, field: &str) -> std::result::Result<i64, FieldError> {
        match self {
            Self::Number(id) => Ok(*id),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| FieldError::new(field, "must be an integer")),
        }
    }
}
