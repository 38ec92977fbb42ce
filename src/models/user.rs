// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::db::collections;
use crate::error::ValidationError;
use crate::models::document::Document;
use crate::models::role::{self, Role};
use crate::models::schema::{FieldSpec, Schema};
use crate::permissions::{CapabilitySet, Guarded, Need, Permission, Permissions, RoleNeed};
use crate::urls::{Routable, Route};

pub const MAX_MENTIONS: usize = 100;
pub const MAX_FOLLOWS: usize = 20_480;

const USER_FIELDS: &[FieldSpec] = &[
    FieldSpec::id(),
    FieldSpec::text("nickname").max_length(20),
    FieldSpec::text("email").max_length(64),
    FieldSpec::level("role", role::LEVELS),
    FieldSpec::text("openid"),
    FieldSpec::text("avatar").optional(),
    FieldSpec::text("brief").max_length(140).optional(),
    FieldSpec::text("blog").max_length(50).optional(),
    FieldSpec::text("github").max_length(50).optional(),
    FieldSpec::list("mentions").max_items(MAX_MENTIONS).optional(),
    FieldSpec::references("follows", collections::USERS)
        .max_items(MAX_FOLLOWS)
        .optional(),
    FieldSpec::computed("updated"),
];

/// User profile stored in Firestore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// Document ID; also the session subject
    pub id: String,
    pub nickname: String,
    pub email: String,
    pub role: Role,
    /// External login identifier
    pub openid: String,
    pub avatar: Option<String>,
    /// Short self description
    pub brief: Option<String>,
    pub blog: Option<String>,
    pub github: Option<String>,
    /// Open-ended mention records
    pub mentions: Vec<Map<String, Value>>,
    /// Ids of followed users
    pub follows: Vec<String>,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        nickname: impl Into<String>,
        email: impl Into<String>,
        openid: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            nickname: nickname.into(),
            email: email.into(),
            openid: openid.into(),
            ..Self::default()
        }
    }

    /// Last-updated time. Recomputed on every read, never stored.
    pub fn updated(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn is_super_admin(&self) -> bool {
        self.role.is_super_admin()
    }

    /// Capabilities this user grants to a session identity.
    pub fn provides(&self) -> CapabilitySet {
        let mut needs = CapabilitySet::new();
        needs.insert(Need::Role(RoleNeed::Authenticated));
        needs.insert(Need::User(self.id.clone()));

        if self.is_super_admin() {
            needs.insert(Need::Role(RoleNeed::Super));
        }
        if self.is_admin() {
            needs.insert(Need::Role(RoleNeed::Admin));
        }

        needs
    }

    /// Follow another user. Returns `false` if already followed.
    pub fn follow(&mut self, user_id: &str) -> Result<bool, ValidationError> {
        if self.follows.iter().any(|id| id == user_id) {
            return Ok(false);
        }
        if self.follows.len() >= MAX_FOLLOWS {
            return Err(ValidationError::TooMany {
                field: "follows",
                max: MAX_FOLLOWS,
            });
        }
        self.follows.push(user_id.to_string());
        Ok(true)
    }

    pub fn add_mention(&mut self, mention: Map<String, Value>) -> Result<(), ValidationError> {
        if self.mentions.len() >= MAX_MENTIONS {
            return Err(ValidationError::TooMany {
                field: "mentions",
                max: MAX_MENTIONS,
            });
        }
        self.mentions.push(mention);
        Ok(())
    }
}

impl Document for User {
    const COLLECTION: &'static str = collections::USERS;
    const SCHEMA: Schema = Schema::new(USER_FIELDS);

    fn id(&self) -> &str {
        &self.id
    }
}

impl Guarded for User {
    fn permissions(&self) -> Permissions {
        Permissions {
            edit: Permission::user(&self.id).and(Permission::super_admin()),
            delete: Permission::user(&self.id).and(Permission::super_admin()),
        }
    }
}

impl Routable for User {
    const ROUTE: Route = Route::User;
}
