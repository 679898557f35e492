use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{count_rows, decode_json, encode_json, open_file, open_memory, with_transaction};
use crate::error::{CoreError, EntityKind, Result};
use crate::models::{Drink, DrinkDraft, DrinkPatch, RecipePart};

pub struct CoffeeStore {
    conn: Connection,
}

impl CoffeeStore {
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(open_file(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(open_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self { conn };
        store.init_schema()?;
        store.seed_if_empty()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS drinks(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                recipe TEXT NOT NULL
            );",
        )
    }

    fn seed_if_empty(&self) -> Result<()> {
        if count_rows(&self.conn, "drinks")? > 0 {
            return Ok(());
        }
        self.insert_drink(&DrinkDraft {
            title: "water".to_string(),
            recipe: vec![RecipePart {
                name: "water".to_string(),
                color: "blue".to_string(),
                parts: 1,
            }],
        })?;
        Ok(())
    }

    pub fn list_drinks(&self) -> Result<Vec<Drink>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, recipe FROM drinks ORDER BY id")?;
        let rows = stmt.query_map([], drink_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_drink(&self, id: i64) -> Result<Drink> {
        find_drink(&self.conn, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Drink, id))
    }

    pub fn find_by_title(&self, title: &str) -> Result<Option<Drink>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, title, recipe FROM drinks WHERE title = ?1",
                params![title],
                drink_from_row,
            )
            .optional()?)
    }

    pub fn insert_drink(&self, draft: &DrinkDraft) -> Result<Drink> {
        let recipe = encode_json(&draft.recipe)?;
        let drink = with_transaction(&self.conn, "insert drink", |tx| {
            tx.execute(
                "INSERT INTO drinks (title, recipe) VALUES (?1, ?2)",
                params![draft.title, recipe],
            )?;
            let id = tx.last_insert_rowid();
            find_drink(tx, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Drink, id))
        })?;
        tracing::info!(drink_id = drink.id, title = %drink.title, "drink created");
        Ok(drink)
    }

    pub fn update_drink(&self, id: i64, patch: DrinkPatch) -> Result<Drink> {
        let drink = with_transaction(&self.conn, "update drink", |tx| {
            let mut drink =
                find_drink(tx, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Drink, id))?;
            if let Some(title) = patch.title {
                drink.title = title;
            }
            if let Some(recipe) = patch.recipe {
                drink.recipe = recipe;
            }
            tx.execute(
                "UPDATE drinks SET title = ?2, recipe = ?3 WHERE id = ?1",
                params![drink.id, drink.title, encode_json(&drink.recipe)?],
            )?;
            Ok(drink)
        })?;
        tracing::info!(drink_id = id, "drink updated");
        Ok(drink)
    }

    pub fn delete_drink(&self, id: i64) -> Result<Drink> {
        let drink = with_transaction(&self.conn, "delete drink", |tx| {
            let drink =
                find_drink(tx, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Drink, id))?;
            tx.execute("DELETE FROM drinks WHERE id = ?1", params![id])?;
            Ok(drink)
        })?;
        tracing::info!(drink_id = id, "drink deleted");
        Ok(drink)
    }
}

fn find_drink(conn: &Connection, id: i64) -> rusqlite::Result<Option<Drink>> {
    conn.query_row(
        "SELECT id, title, recipe FROM drinks WHERE id = ?1",
        params![id],
        drink_from_row,
    )
    .optional()
}

fn drink_from_row(row: &Row<'_>) -> rusqlite::Result<Drink> {
    let recipe: String = row.get("recipe")?;
    Ok(Drink {
        id: row.get("id")?,
        title: row.get("title")?,
        recipe: decode_json(&recipe)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latte() -> DrinkDraft {
        DrinkDraft {
            title: "Latte".to_string(),
            recipe: vec![
                RecipePart {
                    name: "espresso".to_string(),
                    color: "brown".to_string(),
                    parts: 1,
                },
                RecipePart {
                    name: "steamed milk".to_string(),
                    color: "white".to_string(),
                    parts: 2,
                },
            ],
        }
    }

    #[test]
    fn opening_seeds_water() {
        let store = CoffeeStore::open_in_memory().expect("open store");
        let drinks = store.list_drinks().expect("drinks");
        assert_eq!(drinks.len(), 1);
        assert_eq!(drinks[0].title, "water");
        assert_eq!(drinks[0].recipe[0].color, "blue");
    }

    #[test]
    fn recipe_round_trips_through_text_column() {
        let store = CoffeeStore::open_in_memory().expect("open store");
        let drink = store.insert_drink(&latte()).expect("insert");
        let stored = store.get_drink(drink.id).expect("get");
        assert_eq!(stored.recipe, latte().recipe);
        assert_eq!(
            store.find_by_title("Latte").expect("lookup").map(|d| d.id),
            Some(drink.id)
        );
    }

    #[test]
    fn duplicate_title_is_a_constraint_violation() {
        let store = CoffeeStore::open_in_memory().expect("open store");
        store.insert_drink(&latte()).expect("first insert");
        let err = store.insert_drink(&latte()).expect_err("duplicate title");
        assert!(err.is_constraint_violation());
        assert_eq!(err.status(), 422);
        assert_eq!(store.list_drinks().expect("drinks").len(), 2);
    }

    #[test]
    fn update_keeps_unpatched_recipe() {
        let store = CoffeeStore::open_in_memory().expect("open store");
        let drink = store.insert_drink(&latte()).expect("insert");
        let updated = store
            .update_drink(
                drink.id,
                DrinkPatch {
                    title: Some("Flat White".to_string()),
                    recipe: None,
                },
            )
            .expect("update");
        assert_eq!(updated.title, "Flat White");
        assert_eq!(updated.recipe, latte().recipe);
        assert_eq!(
            store
                .update_drink(99, DrinkPatch::default())
                .expect_err("missing")
                .status(),
            404
        );
    }

    #[test]
    fn delete_then_missing() {
        let store = CoffeeStore::open_in_memory().expect("open store");
        let drink = store.insert_drink(&latte()).expect("insert");
        store.delete_drink(drink.id).expect("delete");
        assert_eq!(store.get_drink(drink.id).expect_err("gone").status(), 404);
    }
}
