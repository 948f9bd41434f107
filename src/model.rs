use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_yaml::Value;
use std::path::Path;

use crate::error::StoreError;
use crate::parameterize::{format_timestamp, parse_timestamp};

/// Key of the cached draft in the draft table.
pub const DRAFT_KEY: &str = "tasks:create";

/// A task definition that was submitted before, saved as an entry in the
/// task_definition table.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDefinition {
    pub name: String,
    pub created: String,
    pub definition: Value,
}

impl TaskDefinition {
    /// Wrap a task document, taking the name and creation time from it.
    pub fn from_task(task: &Value) -> TaskDefinition {
        let name = task
            .get("metadata")
            .and_then(|metadata| metadata.get("name"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        // normalized so that rows sort chronologically as text
        let created = task
            .get("created")
            .and_then(Value::as_str)
            .map(|created| match parse_timestamp(created) {
                Ok(at) => format_timestamp(at),
                Err(_) => created.to_string(),
            })
            .unwrap_or_default();
        TaskDefinition {
            name,
            created,
            definition: task.clone(),
        }
    }

    /// The metadata description, if the task has one.
    pub fn description(&self) -> Option<&str> {
        self.definition
            .get("metadata")
            .and_then(|metadata| metadata.get("description"))
            .and_then(Value::as_str)
    }
}

/// Open the store database, creating its tables if they do not exist.
pub fn open_store(path: &Path) -> Result<Connection, StoreError> {
    let db = Connection::open(path)?;
    init_store(&db)?;
    Ok(db)
}

/// Open the store database, or a fresh in-memory store when the file cannot
/// be opened or initialized. The open error is handed back so that commands
/// needing the saved definitions can still report it.
pub fn open_store_or_memory(path: &Path) -> Result<(Connection, Option<StoreError>), StoreError> {
    match open_store(path) {
        Ok(db) => Ok((db, None)),
        Err(err) => {
            tracing::warn!(store = %path.display(), error = %err, "store unavailable, using an in-memory store");
            let db = Connection::open_in_memory()?;
            init_store(&db)?;
            Ok((db, Some(err)))
        }
    }
}

/// Initialize the store database.
pub fn init_store(db: &Connection) -> Result<(), StoreError> {
    db.execute(
        "CREATE TABLE if not exists task_definition (
                  name            TEXT PRIMARY KEY,
                  created         TEXT NOT NULL,
                  definition      TEXT NOT NULL
                  )",
        [],
    )?;

    db.execute(
        "CREATE INDEX if not exists task_definition_created ON task_definition (created)",
        [],
    )?;

    db.execute(
        "CREATE TABLE if not exists draft (
                  key             TEXT PRIMARY KEY,
                  value           TEXT NOT NULL
                  )",
        [],
    )?;

    Ok(())
}

/// Remember a task definition. A definition with the same name replaces the
/// previous one.
pub fn put_task_definition(db: &Connection, task: &Value) -> Result<(), StoreError> {
    let entry = TaskDefinition::from_task(task);
    let definition = serde_yaml::to_string(&entry.definition)?;
    db.execute(
        "INSERT OR REPLACE INTO task_definition (name, created, definition) VALUES (?1, ?2, ?3)",
        params![entry.name, entry.created, definition],
    )?;
    tracing::debug!(name = %entry.name, "saved task definition");
    Ok(())
}

/// Return up to `limit` task definitions, most recently created first.
/// Rows that no longer parse are skipped.
pub fn recent_task_definitions(db: &Connection, limit: u32) -> Result<Vec<TaskDefinition>, StoreError> {
    let mut stmt = db.prepare(
        "SELECT name, created, definition FROM task_definition ORDER BY created DESC LIMIT ?1",
    )?;
    let mapped_rows = stmt.query_map(params![limit], |row| {
        return definition_from_row(row);
    })?;

    let mut definitions = Vec::new();
    for row in mapped_rows {
        let (name, created, text) = row?;
        match serde_yaml::from_str(&text) {
            Ok(definition) => definitions.push(TaskDefinition {
                name,
                created,
                definition,
            }),
            Err(err) => tracing::warn!(%name, error = %err, "skipping unreadable task definition"),
        }
    }

    Ok(definitions)
}

/// Return a row in this order: [name, created, definition]
fn definition_from_row(row: &Row) -> rusqlite::Result<(String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

/// Return the cached draft text, if any.
pub fn load_draft(db: &Connection) -> Result<Option<String>, StoreError> {
    let draft = db
        .query_row(
            "SELECT value FROM draft WHERE key = ?1",
            params![DRAFT_KEY],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(draft)
}

/// Replace the cached draft text.
pub fn save_draft(db: &Connection, text: &str) -> Result<(), StoreError> {
    db.execute(
        "INSERT OR REPLACE INTO draft (key, value) VALUES (?1, ?2)",
        params![DRAFT_KEY, text],
    )?;
    Ok(())
}
