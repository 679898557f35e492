pub mod booking;
pub mod coffee;
pub mod trivia;

use std::path::Path;

use rusqlite::{Connection, Transaction};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::utils;

pub use booking::BookingStore;
pub use coffee::CoffeeStore;
pub use trivia::TriviaStore;

pub(crate) fn open_file(path: &Path) -> rusqlite::Result<Connection> {
    utils::ensure_parent(path);
    let conn = Connection::open(path)?;
    configure(&conn)?;
    Ok(conn)
}

pub(crate) fn open_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

/// Runs `work` inside a transaction. The transaction commits when `work`
/// succeeds and is rolled back otherwise; failures are never retried.
pub(crate) fn with_transaction<T, F>(conn: &Connection, operation: &str, work: F) -> Result<T>
where
    F: FnOnce(&Transaction<'_>) -> Result<T>,
{
    let tx = conn.unchecked_transaction()?;
    match work(&tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(operation, error = %err, "rolling back");
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!(operation, error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

pub(crate) fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub(crate) fn decode_json<T: DeserializeOwned>(payload: &str) -> rusqlite::Result<T> {
    serde_json::from_str(payload).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(
            payload.len(),
            rusqlite::types::Type::Text,
            Box::new(err),
        )
    })
}

pub(crate) fn count_rows(conn: &Connection, table: &str) -> rusqlite::Result<i64> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn failed_work_is_rolled_back() {
        let conn = open_memory().expect("open memory db");
        conn.execute_batch("CREATE TABLE notes(id INTEGER PRIMARY KEY, body TEXT NOT NULL);")
            .expect("create table");

        let result: Result<()> = with_transaction(&conn, "insert note", |tx| {
            tx.execute("INSERT INTO notes(body) VALUES ('kept?')", [])?;
            Err(CoreError::invalid("body", "rejected after write"))
        });

        assert!(result.is_err());
        assert_eq!(count_rows(&conn, "notes").expect("count"), 0);
    }

    #[test]
    fn successful_work_commits() {
        let conn = open_memory().expect("open memory db");
        conn.execute_batch("CREATE TABLE notes(id INTEGER PRIMARY KEY, body TEXT NOT NULL);")
            .expect("create table");

        let id = with_transaction(&conn, "insert note", |tx| {
            tx.execute("INSERT INTO notes(body) VALUES ('kept')", [])?;
            Ok(tx.last_insert_rowid())
        })
        .expect("commit");

        assert_eq!(id, 1);
        assert_eq!(count_rows(&conn, "notes").expect("count"), 1);
    }

    #[test]
    fn corrupt_json_is_a_conversion_failure() {
        let err = decode_json::<Vec<String>>("not json").expect_err("decode must fail");
        assert!(matches!(
            err,
            rusqlite::Error::FromSqlConversionFailure(_, rusqlite::types::Type::Text, _)
        ));
    }
}
