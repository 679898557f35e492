use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::decode_body;
use crate::auth::{Permissions, DELETE_DRINKS, GET_DRINKS_DETAIL, PATCH_DRINKS, POST_DRINKS};
use crate::db::CoffeeStore;
use crate::error::{CoreError, FieldError, Result};
use crate::models::{Drink, DrinkDraft, DrinkPatch, DrinkSummary, RecipePart};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrinksResponse<T> {
    pub success: bool,
    pub drinks: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedDrink {
    pub success: bool,
    pub delete: i64,
}

/// Clients post either a single ingredient or a list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeInput {
    One(RecipePart),
    Many(Vec<RecipePart>),
}

impl RecipeInput {
    fn into_parts(self) -> Vec<RecipePart> {
        match self {
            Self::One(part) => vec![part],
            Self::Many(parts) => parts,
        }
    }
}

/// Both fields are required on create and optional on update.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DrinkBody {
    title: Option<String>,
    recipe: Option<RecipeInput>,
}

/// Public menu: recipes show colors and proportions only.
pub fn drinks(store: &CoffeeStore) -> Result<DrinksResponse<DrinkSummary>> {
    Ok(DrinksResponse {
        success: true,
        drinks: store.list_drinks()?.iter().map(Drink::short).collect(),
    })
}

pub fn drinks_detail(store: &CoffeeStore, perms: &Permissions) -> Result<DrinksResponse<Drink>> {
    perms.require(GET_DRINKS_DETAIL)?;
    Ok(DrinksResponse {
        success: true,
        drinks: store.list_drinks()?.iter().map(Drink::long).collect(),
    })
}

pub fn create_drink(
    store: &CoffeeStore,
    perms: &Permissions,
    body: &Value,
) -> Result<DrinksResponse<Drink>> {
    perms.require(POST_DRINKS)?;
    let request: DrinkBody = decode_body(body)?;

    let mut errors = Vec::new();
    let title = checked_title(request.title, &mut errors);
    let recipe = match request.recipe {
        Some(recipe) => checked_recipe(recipe, &mut errors),
        None => {
            errors.push(FieldError::new("recipe", "is required"));
            Vec::new()
        }
    };
    if let Some(title) = &title {
        if store.find_by_title(title)?.is_some() {
            errors.push(FieldError::new(
                "title",
                "a drink with this title already exists",
            ));
        }
    }
    if !errors.is_empty() {
        return Err(CoreError::ValidationFailed(errors));
    }

    let draft = DrinkDraft {
        title: title.unwrap_or_default(),
        recipe,
    };
    let drink = store.insert_drink(&draft)?;
    Ok(DrinksResponse {
        success: true,
        drinks: vec![drink.long()],
    })
}

pub fn update_drink(
    store: &CoffeeStore,
    perms: &Permissions,
    id: i64,
    body: &Value,
) -> Result<DrinksResponse<Drink>> {
    perms.require(PATCH_DRINKS)?;
    store.get_drink(id)?;
    let request: DrinkBody = decode_body(body)?;

    let mut errors = Vec::new();
    let patch = DrinkPatch {
        title: request
            .title
            .and_then(|title| checked_title(Some(title), &mut errors)),
        recipe: request
            .recipe
            .map(|recipe| checked_recipe(recipe, &mut errors)),
    };
    if !errors.is_empty() {
        return Err(CoreError::ValidationFailed(errors));
    }

    let drink = store.update_drink(id, patch)?;
    Ok(DrinksResponse {
        success: true,
        drinks: vec![drink.long()],
    })
}

pub fn delete_drink(store: &CoffeeStore, perms: &Permissions, id: i64) -> Result<DeletedDrink> {
    perms.require(DELETE_DRINKS)?;
    let drink = store.delete_drink(id)?;
    Ok(DeletedDrink {
        success: true,
        delete: drink.id,
    })
}

fn checked_title(title: Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    match title.as_deref().map(str::trim) {
        Some(title) if !title.is_empty() => Some(title.to_string()),
        _ => {
            errors.push(FieldError::new("title", "is required"));
            None
        }
    }
}

fn checked_recipe(recipe: RecipeInput, errors: &mut Vec<FieldError>) -> Vec<RecipePart> {
    let parts = recipe.into_parts();
    if parts.is_empty() {
        errors.push(FieldError::new("recipe", "needs at least one ingredient"));
    }
    for (index, part) in parts.iter().enumerate() {
        if part.name.trim().is_empty() || part.color.trim().is_empty() {
            errors.push(FieldError::new(
                format!("recipe[{index}]"),
                "name and color are required",
            ));
        }
        if part.parts == 0 {
            errors.push(FieldError::new(
                format!("recipe[{index}].parts"),
                "must be at least 1",
            ));
        }
    }
    parts
}
