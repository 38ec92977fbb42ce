// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reply model: a short comment on a gist.

use serde::{Deserialize, Serialize};

use crate::db::collections;
use crate::models::document::{new_id, Document};
use crate::models::schema::{FieldSpec, Schema};
use crate::permissions::{Guarded, Permission, Permissions};
use crate::urls::{Routable, Route};

pub const CONTENT_MAX: usize = 140;

const REPLY_FIELDS: &[FieldSpec] = &[
    FieldSpec::id(),
    FieldSpec::reference("author", collections::USERS),
    FieldSpec::reference("gist", collections::GISTS),
    FieldSpec::text("content").max_length(CONTENT_MAX),
];

/// Reply stored in Firestore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reply {
    pub id: String,
    /// Author user id
    pub author: String,
    /// Parent gist id
    pub gist: String,
    pub content: String,
}

impl Reply {
    pub fn new(
        author: impl Into<String>,
        gist: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: new_id(),
            author: author.into(),
            gist: gist.into(),
            content: content.into(),
        }
    }
}

impl Document for Reply {
    const COLLECTION: &'static str = collections::REPLIES;
    const SCHEMA: Schema = Schema::new(REPLY_FIELDS);

    fn id(&self) -> &str {
        &self.id
    }
}

impl Guarded for Reply {
    fn permissions(&self) -> Permissions {
        Permissions {
            edit: Permission::user(&self.author),
            delete: Permission::user(&self.author).and(Permission::admin()),
        }
    }
}

impl Routable for Reply {
    const ROUTE: Route = Route::Reply;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, User};

    #[test]
    fn test_reply_permissions() {
        let reply = Reply::new("u1", "g1", "nice");
        let author = User::new("u1", "a", "a@example.com", "oid");
        let admin_author = User {
            role: Role::Admin,
            ..author.clone()
        };

        assert!(reply.permissions().edit.allows(&author.provides()));
        assert!(!reply.permissions().delete.allows(&author.provides()));
        assert!(reply.permissions().delete.allows(&admin_author.provides()));
    }

    #[test]
    fn test_references_author_and_gist() {
        let reply = Reply::new("u1", "g1", "nice");
        let value = serde_json::to_value(&reply).unwrap();
        let refs = Reply::SCHEMA.references(value.as_object().unwrap());
        assert_eq!(
            refs,
            vec![(collections::USERS, "u1"), (collections::GISTS, "g1")]
        );
    }
}
