use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{count_rows, open_file, open_memory, with_transaction};
use crate::error::{CoreError, EntityKind, Result};
use crate::models::{Category, Question, QuestionDraft};

const DEFAULT_CATEGORIES: [&str; 6] = [
    "Science",
    "Art",
    "Geography",
    "History",
    "Entertainment",
    "Sports",
];

pub struct TriviaStore {
    conn: Connection,
}

impl TriviaStore {
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
            "CREATE TABLE IF NOT EXISTS categories(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                type TEXT NOT NULL UNIQUE
            );
            CREATE TABLE IF NOT EXISTS questions(
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                question TEXT NOT NULL,
                answer TEXT NOT NULL,
                category INTEGER NOT NULL REFERENCES categories(id),
                difficulty INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS questions_by_category ON questions(category);",
        )
    }

    fn seed_if_empty(&self) -> Result<()> {
        if count_rows(&self.conn, "categories")? > 0 {
            return Ok(());
        }

        with_transaction(&self.conn, "seed categories", |tx| {
            for label in DEFAULT_CATEGORIES {
                tx.execute("INSERT INTO categories (type) VALUES (?1)", params![label])?;
            }
            Ok(())
        })?;
        tracing::info!(count = DEFAULT_CATEGORIES.len(), "seeded trivia categories");
        Ok(())
    }

    pub fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, type FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_category(&self, id: i64) -> Result<Category> {
        find_category(&self.conn, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Category, id))
    }

    pub fn list_questions(&self) -> Result<Vec<Question>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, question, answer, category, difficulty FROM questions ORDER BY id",
        )?;
        let rows = stmt.query_map([], question_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn questions_in_category(&self, category: i64) -> Result<Vec<Question>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, question, answer, category, difficulty FROM questions
             WHERE category = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![category], question_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_questions(&self) -> Result<usize> {
        let count = count_rows(&self.conn, "questions")?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn get_question(&self, id: i64) -> Result<Question> {
        find_question(&self.conn, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Question, id))
    }

    pub fn insert_question(&self, draft: &QuestionDraft) -> Result<Question> {
        let question = with_transaction(&self.conn, "insert question", |tx| {
            if find_category(tx, draft.category)?.is_none() {
                return Err(CoreError::invalid(
                    "category",
                    format!("no category with id {}", draft.category),
                ));
            }
            tx.execute(
                "INSERT INTO questions (question, answer, category, difficulty)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    draft.question,
                    draft.answer,
                    draft.category,
                    draft.difficulty
                ],
            )?;
            let id = tx.last_insert_rowid();
            find_question(tx, id)?.ok_or_else(|| CoreError::not_found(EntityKind::Question, id))
        })?;
        tracing::info!(
            question_id = question.id,
            category = question.category,
            "question added"
        );
        Ok(question)
    }

    pub fn delete_question(&self, id: i64) -> Result<Question> {
        let question = with_transaction(&self.conn, "delete question", |tx| {
            let question = find_question(tx, id)?
                .ok_or_else(|| CoreError::not_found(EntityKind::Question, id))?;
            tx.execute("DELETE FROM questions WHERE id = ?1", params![id])?;
            Ok(question)
        })?;
        tracing::info!(question_id = id, "question deleted");
        Ok(question)
    }
}

fn find_category(conn: &Connection, id: i64) -> rusqlite::Result<Option<Category>> {
    conn.query_row(
        "SELECT id, type FROM categories WHERE id = ?1",
        params![id],
        category_from_row,
    )
    .optional()
}

fn find_question(conn: &Connection, id: i64) -> rusqlite::Result<Option<Question>> {
    conn.query_row(
        "SELECT id, question, answer, category, difficulty FROM questions WHERE id = ?1",
        params![id],
        question_from_row,
    )
    .optional()
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        kind: row.get("type")?,
    })
}

fn question_from_row(row: &Row<'_>) -> rusqlite::Result<Question> {
    Ok(Question {
        id: row.get("id")?,
        question: row.get("question")?,
        answer: row.get("answer")?,
        category: row.get("category")?,
        difficulty: row.get("difficulty")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(text: &str, category: i64) -> QuestionDraft {
        QuestionDraft {
            question: text.to_string(),
            answer: "Answer".to_string(),
            category,
            difficulty: 3,
        }
    }

    #[test]
    fn opening_seeds_categories_once() {
        let store = TriviaStore::open_in_memory().expect("open store");
        store.seed_if_empty().expect("second seed is a no-op");

        let categories = store.list_categories().expect("categories");
        assert_eq!(categories.len(), 6);
        assert_eq!(categories[0].kind, "Science");
        assert_eq!(store.get_category(6).expect("sports").kind, "Sports");
    }

    #[test]
    fn questions_filter_by_category() {
        let store = TriviaStore::open_in_memory().expect("open store");
        store
            .insert_question(&draft("Who wrote the Caged Bird memoir?", 4))
            .expect("insert");
        store
            .insert_question(&draft("What is the heaviest human organ?", 1))
            .expect("insert");

        let history = store.questions_in_category(4).expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].category, 4);
        assert_eq!(store.count_questions().expect("count"), 2);
    }

    #[test]
    fn question_needs_known_category() {
        let store = TriviaStore::open_in_memory().expect("open store");
        let err = store
            .insert_question(&draft("Orphan?", 99))
            .expect_err("unknown category");
        assert_eq!(err.status(), 422);
        assert_eq!(store.count_questions().expect("count"), 0);
    }

    #[test]
    fn delete_removes_question() {
        let store = TriviaStore::open_in_memory().expect("open store");
        let question = store
            .insert_question(&draft("Gone soon?", 2))
            .expect("insert");

        let deleted = store.delete_question(question.id).expect("delete");
        assert_eq!(deleted, question);
        assert_eq!(
            store.get_question(question.id).expect_err("gone").status(),
            404
        );
        assert_eq!(
            store
                .delete_question(question.id)
                .expect_err("twice")
                .status(),
            404
        );
    }
}
