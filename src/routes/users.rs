// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile routes.

use crate::error::{AppError, Result};
use crate::identity::Identity;
use crate::models::{Record, User, ValueOrigin};
use crate::routes::not_found;
use crate::time_utils::format_utc_rfc3339;
use crate::urls::{resolve, Route};
use crate::AppState;
use axum::{
    extract::{Path, State},
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
        .route("/api/me", get(get_me).post(create_me))
        .route(
            "/api/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/api/users/{id}/follow", post(follow_user))
}

/// User profile response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub id: String,
    pub nickname: String,
    pub email: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub role: i64,
    pub is_admin: bool,
    pub is_super_admin: bool,
    pub avatar: Option<String>,
    pub brief: Option<String>,
    pub blog: Option<String>,
    pub github: Option<String>,
    pub follows: usize,
    pub updated: String,
    pub uri: String,
}

impl UserResponse {
    fn new(user: &User, api_url: &str) -> Self {
        Self {
            id: user.id.clone(),
            nickname: user.nickname.clone(),
            email: user.email.clone(),
            role: user.role.level(),
            is_admin: user.is_admin(),
            is_super_admin: user.is_super_admin(),
            avatar: user.avatar.clone(),
            brief: user.brief.clone(),
            blog: user.blog.clone(),
            github: user.github.clone(),
            follows: user.follows.len(),
            updated: format_utc_rfc3339(user.updated()),
            uri: resolve(api_url, Route::User, &user.id),
        }
    }
}

/// Get the current user's profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<UserResponse>> {
    let identity = state.db.resolve_identity(identity).await?;
    let user = identity.require_user()?;

    Ok(Json(UserResponse::new(user, &state.config.api_url)))
}

/// Profile fields supplied when a session subject first signs up.
#[derive(Deserialize, Validate)]
pub struct CreateProfileRequest {
    #[validate(length(min = 1, max = 20))]
    pub nickname: String,
    #[validate(email, length(max = 64))]
    pub email: String,
    #[serde(default)]
    pub openid: String,
    #[serde(default)]
    #[validate(url)]
    pub avatar: Option<String>,
}

/// Create the user record for the session subject.
///
/// Returns the existing record unchanged if the user already exists.
async fn create_me(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    req.validate()?;
    let user_id = identity.name.clone().ok_or(AppError::Unauthorized)?;

    if let Some(existing) = state.db.get::<User>(&user_id).await? {
        return Ok((
            StatusCode::OK,
            Json(UserResponse::new(&existing, &state.config.api_url)),
        ));
    }

    let mut user = User::new(&user_id, req.nickname, req.email, req.openid);
    user.avatar = req.avatar;
    let record = Record::new(user);
    state.db.save(&record).await?;

    if let Err(e) = state.db.record_user_stat().await {
        tracing::warn!(error = %e, user_id = %user_id, "Failed to update user stats");
    }
    tracing::info!(user_id = %user_id, "User created");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new(&record, &state.config.api_url)),
    ))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let user = state
        .db
        .get::<User>(&id)
        .await?
        .ok_or_else(|| not_found("User", &id))?;

    Ok(Json(UserResponse::new(&user, &state.config.api_url)))
}

/// Merge a partial profile update.
async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Json<UserResponse>> {
    let identity = state.db.resolve_identity(identity).await?;
    let mut record = state
        .db
        .get::<User>(&id)
        .await?
        .ok_or_else(|| not_found("User", &id))?;

    identity.ensure(&record.permissions().edit)?;

    record.merge(&payload, ValueOrigin::Input)?;
    state.db.save(&record).await?;

    tracing::info!(user_id = %id, fields = payload.len(), "User updated");
    Ok(Json(UserResponse::new(&record, &state.config.api_url)))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let identity = state.db.resolve_identity(identity).await?;
    let record = state
        .db
        .get::<User>(&id)
        .await?
        .ok_or_else(|| not_found("User", &id))?;

    identity.ensure(&record.permissions().delete)?;
    state.db.delete::<User>(record.id()).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FollowResponse {
    pub following: String,
    pub follows: usize,
    /// False when the user was already followed
    pub changed: bool,
}

/// Make the acting user follow `id`.
async fn follow_user(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<FollowResponse>> {
    let identity = state.db.resolve_identity(identity).await?;
    let actor_id = identity.require_user()?.id.clone();
    if actor_id == id {
        return Err(AppError::BadRequest("Cannot follow yourself".to_string()));
    }

    let mut actor = state
        .db
        .get_partial::<User>(&actor_id, &["follows"])
        .await?
        .ok_or_else(|| not_found("User", &actor_id))?;

    let changed = actor.update(|user| user.follow(&id))?;
    if changed {
        // Fails with save_failed unless every followed user exists
        state.db.save(&actor).await?;
        tracing::info!(user_id = %actor_id, following = %id, "User followed");
    }

    Ok(Json(FollowResponse {
        following: id,
        follows: actor.follows.len(),
        changed,
    }))
}
