//! Error kinds shared by the three backends and their status-class mapping.

use std::fmt;

use serde::Serialize;

pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Venue,
    Artist,
    Show,
    Question,
    Category,
    QuestionPage,
    Drink,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Venue => "venue",
            Self::Artist => "artist",
            Self::Show => "show",
            Self::Question => "question",
            Self::Category => "category",
            Self::QuestionPage => "question page",
            Self::Drink => "drink",
        };
        f.write_str(label)
    }
}

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{kind} with id {id} not found")]
    NotFound { kind: EntityKind, id: i64 },
    #[error("validation failed: {}", join_fields(.0))]
    ValidationFailed(Vec<FieldError>),
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
    #[error("stored payload could not be decoded: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("missing permission {permission}")]
    Unauthorized { permission: String },
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CoreError {
    pub fn not_found(kind: EntityKind, id: i64) -> Self {
        Self::NotFound { kind, id }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed(vec![FieldError::new(field, message)])
    }

    pub fn unauthorized(permission: impl Into<String>) -> Self {
        Self::Unauthorized {
            permission: permission.into(),
        }
    }

    /// True when the store rejected a write because of a schema constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::Store(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }

    /// HTTP-style status class for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::ValidationFailed(_) => 422,
            Self::Store(_) if self.is_constraint_violation() => 422,
            Self::Store(_) | Self::Encoding(_) => 500,
            Self::Unauthorized { .. } => 401,
        }
    }

    /// Message that is safe to show to an end user.
    pub fn public_message(&self) -> &'static str {
        match self.status() {
            404 => "resource not found",
            422 => "unprocessable",
            401 => "unauthorized",
            _ => "internal server error",
        }
    }
}

/// Error envelope handed back to the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldError>,
}

impl From<&CoreError> for ErrorBody {
    fn from(err: &CoreError) -> Self {
        let status = err.status();
        if status >= 500 {
            tracing::error!(status, error = %err, "internal failure");
        }
        let fields = match err {
            CoreError::ValidationFailed(fields) => fields.clone(),
            _ => Vec::new(),
        };
        Self {
            success: false,
            error: status,
            message: err.public_message().to_string(),
            fields,
        }
    }
}

impl From<CoreError> for ErrorBody {
    fn from(err: CoreError) -> Self {
        Self::from(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = CoreError::not_found(EntityKind::Venue, 7);
        assert_eq!(err.to_string(), "venue with id 7 not found");
        assert_eq!(err.status(), 404);
        let body = ErrorBody::from(&err);
        assert!(!body.success);
        assert_eq!(body.message, "resource not found");
    }

    #[test]
    fn validation_keeps_field_list() {
        let err = CoreError::ValidationFailed(vec![
            FieldError::new("name", "is required"),
            FieldError::new("phone", "must look like 555-555-5555"),
        ]);
        assert_eq!(err.status(), 422);
        assert_eq!(
            err.to_string(),
            "validation failed: name: is required; phone: must look like 555-555-5555"
        );
        let body = ErrorBody::from(err);
        assert_eq!(body.fields.len(), 2);
    }

    #[test]
    fn constraint_violation_is_unprocessable() {
        let failure = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE),
            Some("UNIQUE constraint failed: drinks.title".to_string()),
        );
        let err = CoreError::from(failure);
        assert!(err.is_constraint_violation());
        assert_eq!(err.status(), 422);
    }

    #[test]
    fn other_store_failures_are_internal() {
        let err = CoreError::from(rusqlite::Error::QueryReturnedNoRows);
        assert!(!err.is_constraint_violation());
        assert_eq!(err.status(), 500);
        assert_eq!(err.public_message(), "internal server error");
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let err = CoreError::unauthorized("post:drinks");
        assert_eq!(err.status(), 401);
        assert_eq!(err.to_string(), "missing permission post:drinks");
    }
}
