//! HTTP route handlers for the memories API

use super::auth::CurrentUser;
use super::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Deserializer};

use crate::db::memories::{self, Memory};

/// Number of characters of content shown in list views
const EXCERPT_LEN: usize = 115;

// ============================================================================
// Health Check
// ============================================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ============================================================================
// Memories
// ============================================================================

/// Request body shared by create and update. Update is a full rewrite of the
/// mutable fields, so the shapes are identical.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryBody {
    pub content: String,
    pub cover_url: String,
    #[serde(default, deserialize_with = "coerce_bool")]
    pub is_public: bool,
}

/// Accept loosely typed JSON for the visibility flag (bool, number, string,
/// or null), defaulting to false
fn coerce_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Null => Ok(false),
        serde_json::Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        serde_json::Value::String(s) => Ok(matches!(
            s.to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        )),
        other => Err(D::Error::custom(format!(
            "isPublic must be a boolean-like value, got {}",
            other
        ))),
    }
}

/// First [`EXCERPT_LEN`] characters of content with a truncation marker,
/// appended unconditionally even when the content is shorter
fn excerpt(content: &str) -> String {
    let mut preview: String = content.chars().take(EXCERPT_LEN).collect();
    preview.push_str("...");
    preview
}

fn validation_error(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "Memory not found" })),
    )
        .into_response()
}

fn internal_error(e: rusqlite::Error) -> Response {
    tracing::error!("Storage failure: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
        .into_response()
}

/// Malformed ids fail validation before any storage lookup
fn require_memory_id(id: &str) -> Option<Response> {
    if id.parse::<uuid::Uuid>().is_err() {
        Some(validation_error("memory id must be a UUID"))
    } else {
        None
    }
}

/// Outcome of an owner-gated write, resolved under the connection lock so the
/// lookup and the mutation see the same record
enum WriteOutcome<T> {
    NotFound,
    NotOwner,
    Done(T),
}

/// GET /memories — the caller's memories, oldest first, as reduced projections
pub async fn list_memories(State(state): State<AppState>, user: CurrentUser) -> Response {
    let sub = user.sub().to_string();

    let result = state
        .db
        .with_conn(move |conn| memories::list_for_owner(conn, &sub))
        .await;

    match result {
        Ok(list) => {
            let projections: Vec<serde_json::Value> = list
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "id": m.id,
                        "coverUrl": m.cover_url,
                        "excerpt": excerpt(&m.content),
                    })
                })
                .collect();
            Json(projections).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// GET /memories/:id — full record; private memories are owner-only
pub async fn get_memory(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Response {
    if let Some(rejection) = require_memory_id(&id) {
        return rejection;
    }

    let result = state
        .db
        .with_conn(move |conn| memories::get(conn, &id))
        .await;

    match result {
        Ok(Some(memory)) => {
            if !memory.is_public && memory.user_id != user.sub() {
                StatusCode::FORBIDDEN.into_response()
            } else {
                Json(memory).into_response()
            }
        }
        Ok(None) => not_found(),
        Err(e) => internal_error(e),
    }
}

/// POST /memories — create a memory owned by the caller.
///
/// The owner always comes from the verified identity, never from the body.
pub async fn create_memory(
    State(state): State<AppState>,
    user: CurrentUser,
    body: Result<Json<MemoryBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return validation_error(&rejection.body_text()),
    };

    let sub = user.sub().to_string();

    let result = state
        .db
        .with_conn(move |conn| {
            memories::insert(conn, &sub, &body.content, &body.cover_url, body.is_public)
        })
        .await;

    match result {
        Ok(memory) => (StatusCode::CREATED, Json(memory)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// PUT /memories/:id — full rewrite of content/coverUrl/isPublic, owner-only
pub async fn update_memory(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    body: Result<Json<MemoryBody>, JsonRejection>,
) -> Response {
    if let Some(rejection) = require_memory_id(&id) {
        return rejection;
    }

    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return validation_error(&rejection.body_text()),
    };

    let sub = user.sub().to_string();

    let result = state
        .db
        .with_conn(move |conn| -> rusqlite::Result<WriteOutcome<Memory>> {
            let Some(existing) = memories::get(conn, &id)? else {
                return Ok(WriteOutcome::NotFound);
            };
            if existing.user_id != sub {
                return Ok(WriteOutcome::NotOwner);
            }

            memories::update(conn, &id, &body.content, &body.cover_url, body.is_public)?;

            Ok(WriteOutcome::Done(Memory {
                content: body.content,
                cover_url: body.cover_url,
                is_public: body.is_public,
                ..existing
            }))
        })
        .await;

    match result {
        Ok(WriteOutcome::Done(memory)) => Json(memory).into_response(),
        Ok(WriteOutcome::NotFound) => not_found(),
        Ok(WriteOutcome::NotOwner) => StatusCode::FORBIDDEN.into_response(),
        Err(e) => internal_error(e),
    }
}

/// DELETE /memories/:id — permanent removal, owner-only
pub async fn delete_memory(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Response {
    if let Some(rejection) = require_memory_id(&id) {
        return rejection;
    }

    let sub = user.sub().to_string();

    let result = state
        .db
        .with_conn(move |conn| -> rusqlite::Result<WriteOutcome<()>> {
            let Some(existing) = memories::get(conn, &id)? else {
                return Ok(WriteOutcome::NotFound);
            };
            if existing.user_id != sub {
                return Ok(WriteOutcome::NotOwner);
            }

            memories::delete(conn, &id)?;
            Ok(WriteOutcome::Done(()))
        })
        .await;

    match result {
        Ok(WriteOutcome::Done(())) => StatusCode::NO_CONTENT.into_response(),
        Ok(WriteOutcome::NotFound) => not_found(),
        Ok(WriteOutcome::NotOwner) => StatusCode::FORBIDDEN.into_response(),
        Err(e) => internal_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_short_content_still_gets_marker() {
        assert_eq!(excerpt("hello"), "hello...");
        assert_eq!(excerpt(""), "...");
    }

    #[test]
    fn test_excerpt_truncates_long_content() {
        let long = "x".repeat(500);
        let preview = excerpt(&long);
        assert_eq!(preview.chars().count(), EXCERPT_LEN + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        let long = "é".repeat(200);
        let preview = excerpt(&long);
        assert_eq!(preview.chars().count(), EXCERPT_LEN + 3);
    }

    #[test]
    fn test_body_defaults_is_public_to_false() {
        let body: MemoryBody =
            serde_json::from_str(r#"{"content": "hello", "coverUrl": "http://x/a.png"}"#).unwrap();
        assert!(!body.is_public);
    }

    #[test]
    fn test_body_coerces_loose_is_public() {
        for (raw, expected) in [
            ("true", true),
            ("false", false),
            ("1", true),
            ("0", false),
            ("\"true\"", true),
            ("\"false\"", false),
            ("\"1\"", true),
            ("null", false),
        ] {
            let json = format!(
                r#"{{"content": "c", "coverUrl": "u", "isPublic": {}}}"#,
                raw
            );
            let body: MemoryBody = serde_json::from_str(&json).unwrap();
            assert_eq!(body.is_public, expected, "isPublic = {}", raw);
        }
    }

    #[test]
    fn test_body_rejects_missing_required_fields() {
        assert!(serde_json::from_str::<MemoryBody>(r#"{"content": "c"}"#).is_err());
        assert!(serde_json::from_str::<MemoryBody>(r#"{"coverUrl": "u"}"#).is_err());
        assert!(serde_json::from_str::<MemoryBody>(r#"{"content": 7, "coverUrl": "u"}"#).is_err());
    }

    #[test]
    fn test_require_memory_id() {
        assert!(require_memory_id("not-a-uuid").is_some());
        assert!(require_memory_id("0f8fad5b-d9cb-469f-a165-70867728950e").is_none());
    }
}
