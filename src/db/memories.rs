//! Store functions for memory records

use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use serde::Serialize;

/// A persisted memory record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub cover_url: String,
    pub is_public: bool,
    pub created_at: String,
}

fn memory_from_row(row: &Row<'_>) -> Result<Memory> {
    Ok(Memory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content: row.get(2)?,
        cover_url: row.get(3)?,
        is_public: row.get(4)?,
        created_at: row.get(5)?,
    })
}

const MEMORY_COLUMNS: &str = "id, user_id, content, cover_url, is_public, created_at";

/// Insert a new memory owned by `user_id`.
///
/// The id (v4 UUID) and created_at (RFC 3339 UTC) are assigned here and are
/// immutable for the life of the record.
pub fn insert(
    conn: &Connection,
    user_id: &str,
    content: &str,
    cover_url: &str,
    is_public: bool,
) -> Result<Memory> {
    let memory = Memory {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        content: content.to_string(),
        cover_url: cover_url.to_string(),
        is_public,
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    conn.execute(
        "INSERT INTO memories (id, user_id, content, cover_url, is_public, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            memory.id,
            memory.user_id,
            memory.content,
            memory.cover_url,
            memory.is_public,
            memory.created_at
        ],
    )?;

    Ok(memory)
}

/// Look up a memory by id
pub fn get(conn: &Connection, id: &str) -> Result<Option<Memory>> {
    conn.query_row(
        &format!("SELECT {} FROM memories WHERE id = ?", MEMORY_COLUMNS),
        [id],
        memory_from_row,
    )
    .optional()
}

/// All memories owned by `user_id`, oldest first so they read like a journal
pub fn list_for_owner(conn: &Connection, user_id: &str) -> Result<Vec<Memory>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM memories WHERE user_id = ? ORDER BY created_at ASC, id ASC",
        MEMORY_COLUMNS
    ))?;

    let memories = stmt
        .query_map([user_id], memory_from_row)?
        .collect::<Result<Vec<_>>>()?;

    Ok(memories)
}

/// Rewrite the mutable fields of a memory. id, user_id, and created_at are
/// never touched. Returns the number of affected rows (0 when absent).
pub fn update(
    conn: &Connection,
    id: &str,
    content: &str,
    cover_url: &str,
    is_public: bool,
) -> Result<usize> {
    conn.execute(
        "UPDATE memories SET content = ?, cover_url = ?, is_public = ? WHERE id = ?",
        params![content, cover_url, is_public, id],
    )
}

/// Permanently remove a memory. Returns the number of affected rows.
pub fn delete(conn: &Connection, id: &str) -> Result<usize> {
    conn.execute("DELETE FROM memories WHERE id = ?", [id])
}
