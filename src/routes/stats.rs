// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily activity stats.

use crate::error::{AppError, Result};
use crate::models::stat::period_key;
use crate::models::{Record, Stat};
use crate::time_utils::parse_day;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/stats/{period}", get(get_stat))
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TagCount {
    pub tag: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StatResponse {
    pub period: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub new_gist: i64,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub new_user: i64,
    /// Most used first
    pub tags: Vec<TagCount>,
}

impl From<Stat> for StatResponse {
    fn from(stat: Stat) -> Self {
        let mut tags: Vec<TagCount> = stat
            .tag_set
            .into_iter()
            .map(|(tag, count)| TagCount { tag, count })
            .collect();
        tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));

        Self {
            period: stat.id,
            new_gist: stat.new_gist,
            new_user: stat.new_user,
            tags,
        }
    }
}

/// Get the counters for one day. A day with no activity reads as zeros.
async fn get_stat(
    State(state): State<Arc<AppState>>,
    Path(period): Path<String>,
) -> Result<Json<StatResponse>> {
    let day = parse_day(&period).ok_or_else(|| {
        AppError::BadRequest(format!("Invalid period {period:?}: expected YYYY-MM-DD"))
    })?;

    let stat = state
        .db
        .get::<Stat>(&period_key(day))
        .await?
        .map(Record::into_doc)
        .unwrap_or_else(|| Stat::for_day(day));

    Ok(Json(stat.into()))
}
