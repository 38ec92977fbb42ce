// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document base: identity, partial loads, extra fields and merging.
//!
//! A [`Record`] wraps a typed document as loaded for one request. It tracks
//! which fields were actually retrieved from Firestore (for projected loads),
//! keeps undeclared payload keys in a side store when the policy allows it,
//! and memoizes the document's permissions.

use once_cell::sync::OnceCell;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::ops::Deref;

use crate::error::ValidationError;
use crate::models::schema::{Access, Schema};
use crate::permissions::{Guarded, Permissions};

/// What to do with payload keys that are not declared in the schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExtraFields {
    /// Keep them in the record's extra-field store.
    Ignore,
    /// Reject the payload.
    #[default]
    Strict,
}

/// Where a merged value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOrigin {
    /// Previously persisted data; trusted and only decoded.
    Store,
    /// Untrusted client input; checked against the schema.
    Input,
}

/// A typed document stored in its own Firestore collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;
    const SCHEMA: Schema;
    const EXTRA_FIELDS: ExtraFields = ExtraFields::Strict;

    fn id(&self) -> &str;
}

/// Generate a fresh document id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// A document as loaded (or created) for the current request.
#[derive(Debug)]
pub struct Record<D: Document> {
    doc: D,
    retrieved: Option<BTreeSet<String>>,
    extra_fields: Map<String, Value>,
    extra_policy: ExtraFields,
    permissions: OnceCell<Permissions>,
}

impl<D: Document> Record<D> {
    /// Wrap a fully loaded or newly constructed document.
    pub fn new(doc: D) -> Self {
        Self {
            doc,
            retrieved: None,
            extra_fields: Map::new(),
            extra_policy: D::EXTRA_FIELDS,
            permissions: OnceCell::new(),
        }
    }

    /// Wrap a document of which only `fields` were retrieved.
    pub fn partial<I, S>(doc: D, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            retrieved: Some(fields.into_iter().map(Into::into).collect()),
            ..Self::new(doc)
        }
    }

    /// Override how merges treat keys the schema does not declare.
    pub fn with_extra_fields(mut self, policy: ExtraFields) -> Self {
        self.extra_policy = policy;
        self
    }

    pub fn id(&self) -> &str {
        self.doc.id()
    }

    pub fn doc(&self) -> &D {
        &self.doc
    }

    pub fn into_doc(self) -> D {
        self.doc
    }

    pub fn is_partial(&self) -> bool {
        self.retrieved.is_some()
    }

    /// Fields retrieved by a projected load, or `None` for a full load.
    pub fn retrieved_fields(&self) -> Option<&BTreeSet<String>> {
        self.retrieved.as_ref()
    }

    pub fn was_retrieved(&self, field: &str) -> bool {
        self.retrieved
            .as_ref()
            .map(|fields| fields.contains(field))
            .unwrap_or(true)
    }

    pub fn extra_field(&self, key: &str) -> Option<&Value> {
        self.extra_fields.get(key)
    }

    pub fn extra_fields(&self) -> &Map<String, Value> {
        &self.extra_fields
    }

    /// Mutate the document directly. Cached permissions are dropped.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut D) -> R) -> R {
        self.permissions.take();
        f(&mut self.doc)
    }

    /// Merge a key/value payload into the document.
    ///
    /// Declared fields present in `data` are set, except fields a partial
    /// load never retrieved, computed fields, and (for `Input`) read-only or
    /// ownership fields. Undeclared keys follow the extra-field policy.
    /// Either every change is applied or none is.
    pub fn merge(
        &mut self,
        data: &Map<String, Value>,
        origin: ValueOrigin,
    ) -> Result<(), ValidationError> {
        let schema = D::SCHEMA;

        let mut extras = Map::new();
        for (key, value) in data {
            if schema.contains(key) {
                continue;
            }
            match self.extra_policy {
                ExtraFields::Strict => return Err(ValidationError::ExtraField(key.clone())),
                ExtraFields::Ignore => {
                    extras.insert(key.clone(), value.clone());
                }
            }
        }

        let mut fields = match serde_json::to_value(&self.doc) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                return Err(ValidationError::Malformed(
                    "document is not an object".to_string(),
                ))
            }
            Err(e) => return Err(ValidationError::Malformed(e.to_string())),
        };

        let mut changed = false;
        for spec in schema.fields() {
            let Some(value) = data.get(spec.name) else {
                continue;
            };

            if !self.was_retrieved(spec.name) {
                tracing::debug!(
                    collection = D::COLLECTION,
                    id = self.id(),
                    field = spec.name,
                    "Skipping field not retrieved by partial load"
                );
                continue;
            }

            let writable = match (spec.access, origin) {
                (Access::Computed, _) => false,
                (Access::Writable, _) => true,
                (Access::Owner | Access::ReadOnly, ValueOrigin::Store) => true,
                (Access::Owner | Access::ReadOnly, ValueOrigin::Input) => false,
            };
            if !writable {
                continue;
            }

            if origin == ValueOrigin::Input {
                spec.check(value)?;
            }

            fields.insert(spec.name.to_string(), value.clone());
            changed = true;
        }

        if changed {
            let doc: D = serde_json::from_value(Value::Object(fields))
                .map_err(|e| ValidationError::Malformed(e.to_string()))?;
            self.doc = doc;
            self.permissions.take();
        }

        self.extra_fields.extend(extras);
        Ok(())
    }
}

impl<D: Document + Guarded> Record<D> {
    /// Permissions for this document, computed once per record.
    pub fn permissions(&self) -> &Permissions {
        self.permissions.get_or_init(|| self.doc.permissions())
    }
}

impl<D: Document> Deref for Record<D> {
    type Target = D;

    fn deref(&self) -> &D {
        &self.doc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::schema::FieldSpec;
    use crate::permissions::Permission;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Note {
        id: String,
        owner: String,
        title: String,
        body: String,
        labels: Vec<String>,
    }

    const NOTE_FIELDS: &[FieldSpec] = &[
        FieldSpec::id(),
        FieldSpec::reference("owner", "users"),
        FieldSpec::text("title").max_length(10),
        FieldSpec::text("body"),
        FieldSpec::set("labels").max_items(3),
        FieldSpec::computed("updated"),
    ];

    impl Document for Note {
        const COLLECTION: &'static str = "notes";
        const SCHEMA: Schema = Schema::new(NOTE_FIELDS);

        fn id(&self) -> &str {
            &self.id
        }
    }

    impl Guarded for Note {
        fn permissions(&self) -> Permissions {
            Permissions {
                edit: Permission::user(&self.owner),
                delete: Permission::user(&self.owner).and(Permission::admin()),
            }
        }
    }

    fn note() -> Note {
        Note {
            id: "n1".to_string(),
            owner: "u1".to_string(),
            title: "hello".to_string(),
            body: "original body".to_string(),
            labels: vec![],
        }
    }

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_merge_sets_declared_fields() {
        let mut record = Record::new(note());
        record
            .merge(&payload(json!({ "title": "bye", "labels": ["a"] })), ValueOrigin::Input)
            .unwrap();

        assert_eq!(record.title, "bye");
        assert_eq!(record.labels, vec!["a".to_string()]);
        assert_eq!(record.body, "original body");
    }

    #[test]
    fn test_partial_record_skips_unretrieved_fields() {
        let mut record = Record::partial(note(), ["id", "title"]);
        record
            .merge(
                &payload(json!({ "title": "new", "body": "overwritten?" })),
                ValueOrigin::Input,
            )
            .unwrap();

        assert_eq!(record.title, "new");
        assert_eq!(record.body, "original body");
    }

    #[test]
    fn test_strict_policy_rejects_extra_field() {
        let mut record = Record::new(note());
        let err = record
            .merge(&payload(json!({ "title": "x", "color": "red" })), ValueOrigin::Input)
            .unwrap_err();

        assert_eq!(err, ValidationError::ExtraField("color".to_string()));
        assert_eq!(record.title, "hello", "failed merge must not apply changes");
    }

    #[test]
    fn test_ignore_policy_keeps_extra_field() {
        let mut record = Record::new(note()).with_extra_fields(ExtraFields::Ignore);
        record
            .merge(&payload(json!({ "color": "red" })), ValueOrigin::Input)
            .unwrap();

        assert_eq!(record.extra_field("color"), Some(&json!("red")));
        assert_eq!(*record.doc(), note());
    }

    #[test]
    fn test_input_is_validated_atomically() {
        let mut record = Record::new(note());
        let err = record
            .merge(
                &payload(json!({ "body": "fine", "title": "far too long a title" })),
                ValueOrigin::Input,
            )
            .unwrap_err();

        assert!(matches!(err, ValidationError::TooLong { field: "title", .. }));
        assert_eq!(record.body, "original body");
    }

    #[test]
    fn test_store_values_are_trusted() {
        let mut record = Record::new(note());
        record
            .merge(&payload(json!({ "title": "far too long a title" })), ValueOrigin::Store)
            .unwrap();
        assert_eq!(record.title, "far too long a title");
    }

    #[test]
    fn test_input_cannot_change_ownership_or_id() {
        let mut record = Record::new(note());
        record
            .merge(&payload(json!({ "id": "n2", "owner": "u2" })), ValueOrigin::Input)
            .unwrap();

        assert_eq!(record.id(), "n1");
        assert_eq!(record.owner, "u1");
    }

    #[test]
    fn test_computed_fields_are_never_set() {
        let mut record = Record::new(note());
        record
            .merge(&payload(json!({ "updated": "not a timestamp" })), ValueOrigin::Input)
            .unwrap();
        assert_eq!(*record.doc(), note());
    }

    #[test]
    fn test_permissions_refresh_after_owner_changes() {
        let mut record = Record::new(note());
        assert_eq!(record.permissions().edit, Permission::user("u1"));

        record
            .merge(&payload(json!({ "owner": "u2" })), ValueOrigin::Store)
            .unwrap();
        assert_eq!(record.permissions().edit, Permission::user("u2"));
    }

    #[test]
    fn test_new_ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
