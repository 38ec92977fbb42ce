// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field schema declarations for stored documents.
//!
//! Every document type declares a static table of [`FieldSpec`]s. The table
//! is the contract with the Firestore encoding: it names the stored fields,
//! their semantic types and bounds, and which of them may be written from an
//! untrusted payload.

use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::ValidationError;

/// Semantic type of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Document identifier (string primary key).
    Id,
    Text,
    Int,
    /// Integer restricted to a closed, ordered set of levels.
    Enum(&'static [i64]),
    /// RFC 3339 timestamp.
    Timestamp,
    /// Open key/value object.
    Map,
    List,
    /// List whose items must be unique.
    Set,
    /// Id of a document in the named collection.
    Reference(&'static str),
    /// List of ids in the named collection.
    ReferenceList(&'static str),
}

/// Who may write a field during a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Writable,
    /// Ownership fields; only settable from stored values.
    Owner,
    ReadOnly,
    /// Recomputed on every read, never stored.
    Computed,
}

/// Declaration of a single document field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub max_length: Option<usize>,
    pub max_items: Option<usize>,
    pub access: Access,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            max_length: None,
            max_items: None,
            access: Access::Writable,
        }
    }

    pub const fn id() -> Self {
        Self {
            access: Access::ReadOnly,
            ..Self::new("id", FieldKind::Id)
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldKind::Text)
    }

    pub const fn int(name: &'static str) -> Self {
        Self::new(name, FieldKind::Int)
    }

    pub const fn level(name: &'static str, levels: &'static [i64]) -> Self {
        Self::new(name, FieldKind::Enum(levels))
    }

    pub const fn map(name: &'static str) -> Self {
        Self::new(name, FieldKind::Map)
    }

    pub const fn list(name: &'static str) -> Self {
        Self::new(name, FieldKind::List)
    }

    pub const fn set(name: &'static str) -> Self {
        Self::new(name, FieldKind::Set)
    }

    pub const fn reference(name: &'static str, collection: &'static str) -> Self {
        Self {
            access: Access::Owner,
            ..Self::new(name, FieldKind::Reference(collection))
        }
    }

    pub const fn references(name: &'static str, collection: &'static str) -> Self {
        Self::new(name, FieldKind::ReferenceList(collection))
    }

    pub const fn computed(name: &'static str) -> Self {
        Self {
            required: false,
            access: Access::Computed,
            ..Self::new(name, FieldKind::Timestamp)
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            required: false,
            ..self
        }
    }

    pub const fn max_length(self, max: usize) -> Self {
        Self {
            max_length: Some(max),
            ..self
        }
    }

    pub const fn max_items(self, max: usize) -> Self {
        Self {
            max_items: Some(max),
            ..self
        }
    }

    /// Whether the field is persisted.
    pub fn is_stored(&self) -> bool {
        self.access != Access::Computed
    }

    /// Check one value against this declaration.
    pub fn check(&self, value: &Value) -> Result<(), ValidationError> {
        let field = self.name;
        if value.is_null() {
            return if self.required {
                Err(ValidationError::Required(field))
            } else {
                Ok(())
            };
        }

        match self.kind {
            FieldKind::Id | FieldKind::Reference(_) => {
                let id = expect_str(field, value, "a document id")?;
                if id.is_empty() {
                    return Err(ValidationError::Required(field));
                }
            }
            FieldKind::Text => {
                let text = expect_str(field, value, "a string")?;
                if let Some(max) = self.max_length {
                    if text.chars().count() > max {
                        return Err(ValidationError::TooLong { field, max });
                    }
                }
            }
            FieldKind::Int => {
                value.as_i64().ok_or(ValidationError::WrongType {
                    field,
                    expected: "an integer",
                })?;
            }
            FieldKind::Enum(levels) => {
                let level = value.as_i64().ok_or(ValidationError::WrongType {
                    field,
                    expected: "an integer level",
                })?;
                if !levels.contains(&level) {
                    return Err(ValidationError::InvalidLevel {
                        field,
                        value: level,
                    });
                }
            }
            FieldKind::Timestamp => {
                let raw = expect_str(field, value, "an RFC 3339 timestamp")?;
                chrono::DateTime::parse_from_rfc3339(raw).map_err(|_| {
                    ValidationError::WrongType {
                        field,
                        expected: "an RFC 3339 timestamp",
                    }
                })?;
            }
            FieldKind::Map => {
                if !value.is_object() {
                    return Err(ValidationError::WrongType {
                        field,
                        expected: "an object",
                    });
                }
            }
            FieldKind::List | FieldKind::Set | FieldKind::ReferenceList(_) => {
                let items = value.as_array().ok_or(ValidationError::WrongType {
                    field,
                    expected: "an array",
                })?;
                if let Some(max) = self.max_items {
                    if items.len() > max {
                        return Err(ValidationError::TooMany { field, max });
                    }
                }
                if let FieldKind::ReferenceList(_) = self.kind {
                    if items.iter().any(|item| !item.is_string()) {
                        return Err(ValidationError::WrongType {
                            field,
                            expected: "an array of document ids",
                        });
                    }
                }
                if self.kind == FieldKind::Set {
                    let mut seen = HashSet::new();
                    for item in items {
                        let key = item.to_string();
                        if !seen.insert(key) {
                            return Err(ValidationError::Duplicate {
                                field,
                                value: item.as_str().map(str::to_string).unwrap_or_default(),
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

fn expect_str<'a>(
    field: &'static str,
    value: &'a Value,
    expected: &'static str,
) -> Result<&'a str, ValidationError> {
    value
        .as_str()
        .ok_or(ValidationError::WrongType { field, expected })
}

/// Ordered field table for one document type.
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    fields: &'static [FieldSpec],
}

impl Schema {
    pub const fn new(fields: &'static [FieldSpec]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        self.fields
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|spec| spec.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Names of all persisted fields, in declaration order.
    pub fn stored_fields(&self) -> impl Iterator<Item = &'static str> {
        self.fields
            .iter()
            .filter(|spec| spec.is_stored())
            .map(|spec| spec.name)
    }

    /// Check a single named value. Unknown names are extra fields.
    pub fn check(&self, name: &str, value: &Value) -> Result<(), ValidationError> {
        self.field(name)
            .ok_or_else(|| ValidationError::ExtraField(name.to_string()))?
            .check(value)
    }

    /// Check every stored field of a serialized document.
    pub fn check_document(&self, fields: &Map<String, Value>) -> Result<(), ValidationError> {
        for spec in self.fields.iter().filter(|spec| spec.is_stored()) {
            spec.check(fields.get(spec.name).unwrap_or(&Value::Null))?;
        }
        Ok(())
    }

    /// Documents referenced by a serialized document, as `(collection, id)`
    /// pairs. Covers single references and every item of reference lists,
    /// each pair reported once.
    pub fn references<'a>(&self, fields: &'a Map<String, Value>) -> Vec<(&'static str, &'a str)> {
        let mut refs = Vec::new();
        for spec in self.fields {
            let Some(value) = fields.get(spec.name) else {
                continue;
            };
            match spec.kind {
                FieldKind::Reference(collection) => {
                    if let Some(id) = value.as_str() {
                        refs.push((collection, id));
                    }
                }
                FieldKind::ReferenceList(collection) => {
                    let ids = value.as_array().into_iter().flatten();
                    refs.extend(ids.filter_map(Value::as_str).map(|id| (collection, id)));
                }
                _ => {}
            }
        }
        refs.sort_unstable();
        refs.dedup();
        refs
    }
}
