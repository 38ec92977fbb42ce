// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Capability sets and permission predicates.
//!
//! An acting identity provides a set of [`Need`]s. A [`Permission`] is a set
//! of needs that must all be provided. Ownership (`Permission::user`) and role
//! (`Permission::role`) predicates compose with [`Permission::and`].

use std::collections::BTreeSet;

/// Role-derived capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoleNeed {
    Authenticated,
    Admin,
    Super,
}

impl RoleNeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleNeed::Authenticated => "auth",
            RoleNeed::Admin => "admin",
            RoleNeed::Super => "super",
        }
    }
}

/// A single capability: a role, or being a specific user.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Need {
    Role(RoleNeed),
    User(String),
}

/// Capabilities granted to an identity for the current request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    needs: BTreeSet<Need>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, need: Need) -> bool {
        self.needs.insert(need)
    }

    pub fn contains(&self, need: &Need) -> bool {
        self.needs.contains(need)
    }

    pub fn has_role(&self, role: RoleNeed) -> bool {
        self.contains(&Need::Role(role))
    }

    pub fn is_empty(&self) -> bool {
        self.needs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.needs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Need> {
        self.needs.iter()
    }
}

impl FromIterator<Need> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Need>>(iter: I) -> Self {
        Self {
            needs: iter.into_iter().collect(),
        }
    }
}

impl Extend<Need> for CapabilitySet {
    fn extend<I: IntoIterator<Item = Need>>(&mut self, iter: I) {
        self.needs.extend(iter);
    }
}

impl IntoIterator for CapabilitySet {
    type Item = Need;
    type IntoIter = std::collections::btree_set::IntoIter<Need>;

    fn into_iter(self) -> Self::IntoIter {
        self.needs.into_iter()
    }
}

/// Conjunction of needs. Holds when every need is provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    needs: BTreeSet<Need>,
}

impl Permission {
    /// Ownership predicate: the actor is the given user.
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            needs: BTreeSet::from([Need::User(id.into())]),
        }
    }

    /// Role predicate.
    pub fn role(role: RoleNeed) -> Self {
        Self {
            needs: BTreeSet::from([Need::Role(role)]),
        }
    }

    pub fn admin() -> Self {
        Self::role(RoleNeed::Admin)
    }

    pub fn super_admin() -> Self {
        Self::role(RoleNeed::Super)
    }

    pub fn and(mut self, other: Permission) -> Self {
        self.needs.extend(other.needs);
        self
    }

    pub fn allows(&self, provides: &CapabilitySet) -> bool {
        self.needs.iter().all(|need| provides.contains(need))
    }
}

/// Named checks every guarded document exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permissions {
    pub edit: Permission,
    pub delete: Permission,
}

/// Documents whose mutations are guarded by permissions.
pub trait Guarded {
    fn permissions(&self) -> Permissions;
}
