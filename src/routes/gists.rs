// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gist routes: create, list, read, partial update, delete and reactions.

use crate::db::FieldFilter;
use crate::error::{AppError, Result};
use crate::identity::Identity;
use crate::models::{Gist, Reaction, Record, ValueOrigin};
use crate::routes::not_found;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/gists", get(list_gists).post(create_gist))
        .route(
            "/api/gists/{id}",
            get(get_gist).patch(update_gist).delete(delete_gist),
        )
        .route(
            "/api/gists/{id}/reactions/{reaction}",
            post(add_reaction).delete(remove_reaction),
        )
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListGistsQuery {
    /// Only gists by this user.
    pub author: Option<String>,
    /// Only gists carrying this tag.
    #[validate(length(min = 1, max = 64))]
    pub tag: Option<String>,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGistRequest {
    #[validate(length(max = 140))]
    pub desc: String,
    #[validate(length(min = 1, max = 20))]
    pub code_type: String,
    pub content: String,
    #[serde(default)]
    pub snapshot: Option<String>,
    #[serde(default)]
    #[validate(length(max = 16))]
    pub tags: Vec<String>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GistResponse {
    pub id: String,
    pub author: String,
    pub desc: String,
    pub code_type: String,
    pub content: String,
    pub snapshot: Option<String>,
    pub tags: Vec<String>,
    pub eggs: usize,
    pub flowers: usize,
    pub followers: usize,
    pub updated: String,
    pub uri: String,
    /// Whether the caller may edit this gist
    pub can_edit: bool,
    /// Whether the caller may delete this gist
    pub can_delete: bool,
}

impl GistResponse {
    fn new(record: &Record<Gist>, identity: &Identity, api_url: &str) -> Self {
        let permissions = record.permissions();
        Self {
            id: record.id.clone(),
            author: record.author.clone(),
            desc: record.desc.clone(),
            code_type: record.code_type.clone(),
            content: record.content.clone(),
            snapshot: record.snapshot.clone(),
            tags: record.tags.iter().cloned().collect(),
            eggs: record.reaction_count(Reaction::Eggs),
            flowers: record.reaction_count(Reaction::Flowers),
            followers: record.reaction_count(Reaction::Followers),
            updated: format_utc_rfc3339(record.updated()),
            uri: record.uri(api_url),
            can_edit: identity.can(&permissions.edit),
            can_delete: identity.can(&permissions.delete),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GistListResponse {
    pub gists: Vec<GistResponse>,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteGistResponse {
    pub id: String,
    pub replies_deleted: usize,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReactionResponse {
    pub reaction: Reaction,
    pub count: usize,
    /// False when the reaction was already in the requested state
    pub changed: bool,
}

/// List gists, optionally filtered by author or tag.
async fn list_gists(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ListGistsQuery>,
) -> Result<Json<GistListResponse>> {
    params.validate()?;

    let filter = match (params.author, params.tag) {
        (Some(_), Some(_)) => {
            return Err(AppError::BadRequest(
                "Filter by either author or tag, not both".to_string(),
            ))
        }
        (Some(author), None) => Some(FieldFilter::Equals("author", author)),
        (None, Some(tag)) => Some(FieldFilter::Contains("tags", tag)),
        (None, None) => None,
    };

    let identity = state.db.resolve_identity(identity).await?;
    let records = state
        .db
        .find_by_field::<Gist>(filter, Some(params.limit))
        .await?;

    let gists = records
        .iter()
        .map(|record| GistResponse::new(record, &identity, &state.config.api_url))
        .collect();

    Ok(Json(GistListResponse { gists }))
}

async fn create_gist(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateGistRequest>,
) -> Result<(StatusCode, Json<GistResponse>)> {
    req.validate()?;

    let identity = state.db.resolve_identity(identity).await?;
    let author = identity.require_user()?.id.clone();

    let mut gist = Gist::new(&author, req.desc, req.code_type, req.content);
    gist.snapshot = req.snapshot;
    for tag in &req.tags {
        gist.add_tag(tag)?;
    }

    let record = Record::new(gist);
    state.db.save(&record).await?;

    if let Err(e) = state.db.record_gist_stat(&record).await {
        tracing::warn!(error = %e, gist_id = record.id(), "Failed to update gist stats");
    }
    tracing::info!(gist_id = record.id(), author = %author, "Gist created");

    Ok((
        StatusCode::CREATED,
        Json(GistResponse::new(&record, &identity, &state.config.api_url)),
    ))
}

async fn get_gist(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<GistResponse>> {
    let identity = state.db.resolve_identity(identity).await?;
    let record = state
        .db
        .get::<Gist>(&id)
        .await?
        .ok_or_else(|| not_found("Gist", &id))?;

    Ok(Json(GistResponse::new(
        &record,
        &identity,
        &state.config.api_url,
    )))
}

/// Apply a partial update.
///
/// Only the fields named in the payload (plus the author, for the edit
/// check) are loaded and written back.
async fn update_gist(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<GistResponse>> {
    if payload.is_empty() {
        return Err(AppError::BadRequest("Empty update".to_string()));
    }

    let identity = state.db.resolve_identity(identity).await?;

    let mut fields: Vec<&str> = payload.keys().map(String::as_str).collect();
    fields.push("author");
    let mut record = state
        .db
        .get_partial::<Gist>(&id, &fields)
        .await?
        .ok_or_else(|| not_found("Gist", &id))?;

    identity.ensure(&record.permissions().edit)?;

    record.merge(&payload, ValueOrigin::Input)?;
    state.db.save(&record).await?;
    tracing::info!(gist_id = %id, fields = payload.len(), "Gist updated");

    let updated = state
        .db
        .get::<Gist>(&id)
        .await?
        .ok_or_else(|| not_found("Gist", &id))?;

    Ok(Json(GistResponse::new(
        &updated,
        &identity,
        &state.config.api_url,
    )))
}

async fn delete_gist(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<DeleteGistResponse>> {
    let identity = state.db.resolve_identity(identity).await?;
    let record = state
        .db
        .get_partial::<Gist>(&id, &["author"])
        .await?
        .ok_or_else(|| not_found("Gist", &id))?;

    identity.ensure(&record.permissions().delete)?;

    let replies_deleted = state.db.delete_gist_cascade(&id).await?;

    Ok(Json(DeleteGistResponse {
        id,
        replies_deleted,
    }))
}

/// Load just the author and one reaction list for a reaction change.
async fn load_for_reaction(
    state: &AppState,
    identity: Identity,
    id: &str,
    reaction: &str,
) -> Result<(String, Reaction, Record<Gist>)> {
    let reaction: Reaction = reaction.parse().map_err(AppError::BadRequest)?;

    let identity = state.db.resolve_identity(identity).await?;
    let actor = identity.require_user()?.id.clone();

    let record = state
        .db
        .get_partial::<Gist>(id, &["author", reaction.field()])
        .await?
        .ok_or_else(|| not_found("Gist", id))?;

    Ok((actor, reaction, record))
}

async fn add_reaction(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((id, reaction)): Path<(String, String)>,
) -> Result<Json<ReactionResponse>> {
    let (actor, reaction, mut record) =
        load_for_reaction(&state, identity, &id, &reaction).await?;

    let changed = record.update(|gist| gist.add_reaction(reaction, &actor))?;
    if changed {
        state.db.save(&record).await?;
        tracing::debug!(gist_id = %id, user_id = %actor, reaction = reaction.field(), "Reaction added");
    }

    Ok(Json(ReactionResponse {
        reaction,
        count: record.reaction_count(reaction),
        changed,
    }))
}

async fn remove_reaction(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path((id, reaction)): Path<(String, String)>,
) -> Result<Json<ReactionResponse>> {
    let (actor, reaction, mut record) =
        load_for_reaction(&state, identity, &id, &reaction).await?;

    let changed = record.update(|gist| gist.remove_reaction(reaction, &actor));
    if changed {
        state.db.save(&record).await?;
        tracing::debug!(gist_id = %id, user_id = %actor, reaction = reaction.field(), "Reaction removed");
    }

    Ok(Json(ReactionResponse {
        reaction,
        count: record.reaction_count(reaction),
        changed,
    }))
}
