// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reply routes.

use crate::db::FieldFilter;
use crate::error::Result;
use crate::identity::Identity;
use crate::models::{Gist, Record, Reply};
use crate::routes::not_found;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Upper bound on replies returned for one gist.
const MAX_REPLIES: u32 = 200;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/gists/{id}/replies", get(list_replies).post(create_reply))
        .route("/api/replies/{id}", delete(delete_reply))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReplyRequest {
    #[validate(length(min = 1, max = 140))]
    pub content: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReplyResponse {
    pub id: String,
    pub author: String,
    pub gist: String,
    pub content: String,
    pub uri: String,
    pub can_delete: bool,
}

impl ReplyResponse {
    fn new(record: &Record<Reply>, identity: &Identity, api_url: &str) -> Self {
        Self {
            id: record.id.clone(),
            author: record.author.clone(),
            gist: record.gist.clone(),
            content: record.content.clone(),
            uri: record.uri(api_url),
            can_delete: identity.can(&record.permissions().delete),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ReplyListResponse {
    pub replies: Vec<ReplyResponse>,
}

async fn list_replies(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(gist_id): Path<String>,
) -> Result<Json<ReplyListResponse>> {
    let identity = state.db.resolve_identity(identity).await?;
    let records = state
        .db
        .find_by_field::<Reply>(
            Some(FieldFilter::Equals("gist", gist_id)),
            Some(MAX_REPLIES),
        )
        .await?;

    let replies = records
        .iter()
        .map(|record| ReplyResponse::new(record, &identity, &state.config.api_url))
        .collect();

    Ok(Json(ReplyListResponse { replies }))
}

/// Reply to a gist. Saving fails with `save_failed` if the gist does not exist.
async fn create_reply(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(gist_id): Path<String>,
    Json(req): Json<CreateReplyRequest>,
) -> Result<(StatusCode, Json<ReplyResponse>)> {
    req.validate()?;

    let identity = state.db.resolve_identity(identity).await?;
    let author = identity.require_user()?.id.clone();

    let record = Record::new(Reply::new(&author, &gist_id, req.content));
    state.db.save(&record).await?;
    tracing::info!(reply_id = record.id(), gist_id = %gist_id, author = %author, "Reply created");

    if let Err(e) = notify_gist_author(&state, &record).await {
        tracing::warn!(error = %e, reply_id = record.id(), "Failed to record mention");
    }

    Ok((
        StatusCode::CREATED,
        Json(ReplyResponse::new(&record, &identity, &state.config.api_url)),
    ))
}

/// Tell the gist's author about a reply from someone else.
async fn notify_gist_author(state: &AppState, reply: &Record<Reply>) -> Result<()> {
    let gist = state
        .db
        .get_partial::<Gist>(&reply.gist, &["author"])
        .await?
        .ok_or_else(|| not_found("Gist", &reply.gist))?;

    if gist.author == reply.author {
        return Ok(());
    }

    let mut mention = Map::new();
    mention.insert("gist".to_string(), Value::String(reply.gist.clone()));
    mention.insert("reply".to_string(), Value::String(reply.id.clone()));
    mention.insert("from".to_string(), Value::String(reply.author.clone()));

    state.db.add_mention(&gist.author, mention).await
}

async fn delete_reply(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let identity = state.db.resolve_identity(identity).await?;
    let record = state
        .db
        .get::<Reply>(&id)
        .await?
        .ok_or_else(|| not_found("Reply", &id))?;

    identity.ensure(&record.permissions().delete)?;
    state.db.delete::<Reply>(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
