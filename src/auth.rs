//! Permission gate for the coffee-shop operations.
//!
//! Token verification happens upstream; this module only checks that an
//! already verified permission set carries what an operation needs.

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::{CoreError, Result};

pub const GET_DRINKS_DETAIL: &str = "get:drinks-detail";
pub const POST_DRINKS: &str = "post:drinks";
pub const PATCH_DRINKS: &str = "patch:drinks";
pub const DELETE_DRINKS: &str = "delete:drinks";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Permissions(BTreeSet<String>);

impl Permissions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.0.contains(permission)
    }

    pub fn require(&self, permission: &str) -> Result<()> {
        if self.contains(permission) {
            Ok(())
        } else {
            tracing::warn!(permission, "permission denied");
            Err(CoreError::unauthorized(permission))
        }
    }
}

impl<S: Into<String>> FromIterator<S> for Permissions {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
