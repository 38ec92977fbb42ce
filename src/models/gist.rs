// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gist model: a shareable code snippet owned by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::db::collections;
use crate::error::ValidationError;
use crate::models::document::{new_id, Document};
use crate::models::schema::{FieldSpec, Schema};
use crate::permissions::{Guarded, Permission, Permissions};
use crate::urls::{Routable, Route};

pub const DESC_MAX: usize = 140;
pub const CODE_TYPE_MAX: usize = 20;
pub const MAX_EGGS: usize = 20_480;
pub const MAX_FLOWERS: usize = 20_480;
pub const MAX_FOLLOWERS: usize = 10_240;
pub const MAX_TAGS: usize = 16;

const GIST_FIELDS: &[FieldSpec] = &[
    FieldSpec::id(),
    FieldSpec::reference("author", collections::USERS),
    FieldSpec::text("desc").max_length(DESC_MAX),
    FieldSpec::text("code_type").max_length(CODE_TYPE_MAX),
    FieldSpec::text("content"),
    FieldSpec::text("snapshot").optional(),
    FieldSpec::references("eggs", collections::USERS)
        .max_items(MAX_EGGS)
        .optional(),
    FieldSpec::references("flowers", collections::USERS)
        .max_items(MAX_FLOWERS)
        .optional(),
    FieldSpec::references("followers", collections::USERS)
        .max_items(MAX_FOLLOWERS)
        .optional(),
    FieldSpec::set("tags").max_items(MAX_TAGS).optional(),
    FieldSpec::computed("updated"),
];

/// Gist stored in Firestore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gist {
    pub id: String,
    /// Owning user id
    pub author: String,
    pub desc: String,
    /// Language/format tag (e.g. "rust", "python")
    pub code_type: String,
    pub content: String,
    pub snapshot: Option<String>,
    pub eggs: Vec<String>,
    pub flowers: Vec<String>,
    pub followers: Vec<String>,
    pub tags: BTreeSet<String>,
}

/// User-to-gist relations kept as id lists on the gist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(ts_rs::TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Eggs,
    Flowers,
    Followers,
}

impl Reaction {
    pub fn field(&self) -> &'static str {
        match self {
            Reaction::Eggs => "eggs",
            Reaction::Flowers => "flowers",
            Reaction::Followers => "followers",
        }
    }

    pub fn capacity(&self) -> usize {
        match self {
            Reaction::Eggs => MAX_EGGS,
            Reaction::Flowers => MAX_FLOWERS,
            Reaction::Followers => MAX_FOLLOWERS,
        }
    }
}

impl FromStr for Reaction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eggs" => Ok(Reaction::Eggs),
            "flowers" => Ok(Reaction::Flowers),
            "followers" => Ok(Reaction::Followers),
            other => Err(format!("Unknown reaction: {other}")),
        }
    }
}

impl Gist {
    pub fn new(
        author: impl Into<String>,
        desc: impl Into<String>,
        code_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            author: author.into(),
            desc: desc.into(),
            code_type: code_type.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    /// Last-updated time. Recomputed on every read, never stored.
    pub fn updated(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn reaction_list(&self, reaction: Reaction) -> &Vec<String> {
        match reaction {
            Reaction::Eggs => &self.eggs,
            Reaction::Flowers => &self.flowers,
            Reaction::Followers => &self.followers,
        }
    }

    fn reaction_list_mut(&mut self, reaction: Reaction) -> &mut Vec<String> {
        match reaction {
            Reaction::Eggs => &mut self.eggs,
            Reaction::Flowers => &mut self.flowers,
            Reaction::Followers => &mut self.followers,
        }
    }

    pub fn reaction_count(&self, reaction: Reaction) -> usize {
        self.reaction_list(reaction).len()
    }

    /// Record a user's reaction. Returns `false` if it was already present.
    pub fn add_reaction(
        &mut self,
        reaction: Reaction,
        user_id: &str,
    ) -> Result<bool, ValidationError> {
        let list = self.reaction_list_mut(reaction);
        if list.iter().any(|id| id == user_id) {
            return Ok(false);
        }
        if list.len() >= reaction.capacity() {
            return Err(ValidationError::TooMany {
                field: reaction.field(),
                max: reaction.capacity(),
            });
        }
        list.push(user_id.to_string());
        Ok(true)
    }

    /// Withdraw a user's reaction. Returns `false` if there was none.
    pub fn remove_reaction(&mut self, reaction: Reaction, user_id: &str) -> bool {
        let list = self.reaction_list_mut(reaction);
        let before = list.len();
        list.retain(|id| id != user_id);
        list.len() != before
    }

    /// Add a tag. Returns `false` if the gist already carries it.
    pub fn add_tag(&mut self, tag: &str) -> Result<bool, ValidationError> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(ValidationError::Required("tags"));
        }
        if self.tags.contains(tag) {
            return Ok(false);
        }
        if self.tags.len() >= MAX_TAGS {
            return Err(ValidationError::TooMany {
                field: "tags",
                max: MAX_TAGS,
            });
        }
        self.tags.insert(tag.to_string());
        Ok(true)
    }
}

impl Document for Gist {
    const COLLECTION: &'static str = collections::GISTS;
    const SCHEMA: Schema = Schema::new(GIST_FIELDS);

    fn id(&self) -> &str {
        &self.id
    }
}

impl Guarded for Gist {
    fn permissions(&self) -> Permissions {
        Permissions {
            edit: Permission::user(&self.author),
            delete: Permission::user(&self.author).and(Permission::admin()),
        }
    }
}

impl Routable for Gist {
    const ROUTE: Route = Route::Gist;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::document::{Record, ValueOrigin};
    use crate::models::{Role, User};
    use serde_json::json;

    fn actor(id: &str, role: Role) -> User {
        User {
            role,
            ..User::new(id, id, format!("{id}@example.com"), id)
        }
    }

    #[test]
    fn test_edit_is_author_only_regardless_of_role() {
        let gist = Gist::new("author", "desc", "rust", "fn main() {}");
        let perms = gist.permissions();

        assert!(perms.edit.allows(&actor("author", Role::Normal).provides()));
        assert!(perms.edit.allows(&actor("author", Role::Blocked).provides()));
        assert!(!perms.edit.allows(&actor("other", Role::SuperAdmin).provides()));
    }

    #[test]
    fn test_delete_requires_author_and_admin() {
        let gist = Gist::new("author", "desc", "rust", "fn main() {}");
        let perms = gist.permissions();

        assert!(!perms.delete.allows(&actor("author", Role::Normal).provides()));
        assert!(perms.delete.allows(&actor("author", Role::Admin).provides()));
        assert!(perms.delete.allows(&actor("author", Role::SuperAdmin).provides()));
        assert!(!perms.delete.allows(&actor("other", Role::SuperAdmin).provides()));
    }

    #[test]
    fn test_reactions_are_idempotent() {
        let mut gist = Gist::new("author", "desc", "rust", "");
        assert!(gist.add_reaction(Reaction::Flowers, "u1").unwrap());
        assert!(!gist.add_reaction(Reaction::Flowers, "u1").unwrap());
        assert!(gist.add_reaction(Reaction::Eggs, "u1").unwrap());
        assert_eq!(gist.reaction_count(Reaction::Flowers), 1);
        assert_eq!(gist.reaction_count(Reaction::Eggs), 1);

        assert!(gist.remove_reaction(Reaction::Flowers, "u1"));
        assert!(!gist.remove_reaction(Reaction::Flowers, "u1"));
    }

    #[test]
    fn test_followers_capacity() {
        let mut gist = Gist::new("author", "desc", "rust", "");
        gist.followers = (0..MAX_FOLLOWERS).map(|i| format!("u{i}")).collect();

        let err = gist.add_reaction(Reaction::Followers, "late").unwrap_err();
        assert_eq!(
            err,
            ValidationError::TooMany {
                field: "followers",
                max: MAX_FOLLOWERS
            }
        );
    }

    #[test]
    fn test_tags_are_unique_and_capped() {
        let mut gist = Gist::new("author", "desc", "rust", "");
        assert!(gist.add_tag("async").unwrap());
        assert!(!gist.add_tag(" async ").unwrap());

        for i in 1..MAX_TAGS {
            gist.add_tag(&format!("tag{i}")).unwrap();
        }
        assert!(gist.add_tag("overflow").is_err());
        assert_eq!(gist.tags.len(), MAX_TAGS);
    }

    #[test]
    fn test_merge_rejects_duplicate_tags_from_input() {
        let mut record = Record::new(Gist::new("author", "desc", "rust", ""));
        let payload = json!({ "tags": ["a", "a"] });
        let err = record
            .merge(payload.as_object().unwrap(), ValueOrigin::Input)
            .unwrap_err();
        assert!(matches!(err, ValidationError::Duplicate { field: "tags", .. }));
    }

    #[test]
    fn test_merge_desc_limit() {
        let mut record = Record::new(Gist::new("author", "desc", "rust", ""));
        let payload = json!({ "desc": "x".repeat(DESC_MAX + 1) });
        assert!(record
            .merge(payload.as_object().unwrap(), ValueOrigin::Input)
            .is_err());

        let payload = json!({ "desc": "x".repeat(DESC_MAX) });
        record
            .merge(payload.as_object().unwrap(), ValueOrigin::Input)
            .unwrap();
        assert_eq!(record.desc.len(), DESC_MAX);
    }

    #[test]
    fn test_reaction_from_str() {
        assert_eq!("eggs".parse::<Reaction>(), Ok(Reaction::Eggs));
        assert!("likes".parse::<Reaction>().is_err());
    }
}
