//! Draft trigger routes.
//!
//! Thin bearer-authenticated REST surface over the draft store; a
//! successful save or delete triggers the admin fan-out. The full draft
//! UX (export, rendering) lives outside this service.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use crate::error::CollabError;
use crate::state::AppState;
use crate::store::DraftStore;
use crate::types::{Draft, Identity};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/draft", post(create_draft))
        .route("/api/drafts", get(list_drafts))
        .route("/api/draft/{id}", delete(delete_draft))
}

#[derive(Debug, Deserialize)]
struct DraftBody {
    content: String,
}

async fn create_draft(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<DraftBody>,
) -> Result<Json<Draft>, CollabError> {
    let identity = authenticate(&state, &headers)?;
    let draft = state
        .drafts
        .create(identity.id, &identity.email, &body.content)
        .await?;

    info!(draft_id = draft.id, user = %identity.email, "draft saved");
    state.admin_channel.notify_draft_saved(&draft);
    Ok(Json(draft))
}

async fn list_drafts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Draft>>, CollabError> {
    let identity = authenticate(&state, &headers)?;
    let drafts = state.drafts.list(identity.id).await?;
    Ok(Json(drafts))
}

async fn delete_draft(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<StatusCode, CollabError> {
    let identity = authenticate(&state, &headers)?;
    state.drafts.delete(id, identity.id).await?;

    info!(draft_id = id, user = %identity.email, "draft deleted");
    state.admin_channel.notify_draft_deleted(id);
    Ok(StatusCode::NO_CONTENT)
}

/// Extract and verify the `Authorization: Bearer <token>` header.
fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Identity, CollabError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| CollabError::Auth("no token provided".into()))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| CollabError::Auth("malformed authorization header".into()))?;
    state.verifier.verify(token)
}
