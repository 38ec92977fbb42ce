//! Site-wide activity counters, one document per day.
//!
//! Updated when gists and users are created so dashboards read one
//! document instead of scanning collections.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::collections;
use crate::models::document::Document;
use crate::models::schema::{FieldSpec, Schema};
use crate::models::Gist;

const STAT_FIELDS: &[FieldSpec] = &[
    FieldSpec::id(),
    FieldSpec::map("tag_set"),
    FieldSpec::int("new_gist"),
    FieldSpec::int("new_user"),
];

/// Counters for one period.
///
/// Stored at: `stats/{YYYY-MM-DD}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stat {
    /// Period key ("YYYY-MM-DD")
    pub id: String,
    /// Gists created per tag
    pub tag_set: HashMap<String, i64>,
    /// Gists created in the period
    pub new_gist: i64,
    /// Users created in the period
    pub new_user: i64,
}

/// Period key for a day.
pub fn period_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

impl Stat {
    pub fn for_day(day: NaiveDate) -> Self {
        Self {
            id: period_key(day),
            ..Self::default()
        }
    }

    /// Count a newly created gist and its tags.
    pub fn record_gist(&mut self, gist: &Gist) {
        self.new_gist += 1;
        for tag in &gist.tags {
            *self.tag_set.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    /// Count a newly created user.
    pub fn record_user(&mut self) {
        self.new_user += 1;
    }
}

impl Document for Stat {
    const COLLECTION: &'static str = collections::STATS;
    const SCHEMA: Schema = Schema::new(STAT_FIELDS);

    fn id(&self) -> &str {
        &self.id
    }
}
