// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User role levels.
//!
//! Roles are persisted as plain integers, so the exact level values and
//! their ordering are part of the stored-data contract.

use serde::{Deserialize, Serialize};

pub const BLOCK: i64 = 0;
pub const NORMAL: i64 = 100;
pub const ADMIN: i64 = 200;
pub const SA: i64 = 300;

/// All declared role levels, ascending.
pub const LEVELS: &[i64] = &[BLOCK, NORMAL, ADMIN, SA];

/// Whether a raw role level grants admin rights.
pub const fn is_admin_level(level: i64) -> bool {
    level >= ADMIN
}

/// Whether a raw role level grants super-admin rights.
pub const fn is_super_admin_level(level: i64) -> bool {
    level >= SA
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub enum Role {
    Blocked,
    #[default]
    Normal,
    Admin,
    SuperAdmin,
}

impl Role {
    pub const fn level(self) -> i64 {
        match self {
            Role::Blocked => BLOCK,
            Role::Normal => NORMAL,
            Role::Admin => ADMIN,
            Role::SuperAdmin => SA,
        }
    }

    pub const fn from_level(level: i64) -> Option<Self> {
        match level {
            BLOCK => Some(Role::Blocked),
            NORMAL => Some(Role::Normal),
            ADMIN => Some(Role::Admin),
            SA => Some(Role::SuperAdmin),
            _ => None,
        }
    }

    pub const fn is_admin(self) -> bool {
        is_admin_level(self.level())
    }

    pub const fn is_super_admin(self) -> bool {
        is_super_admin_level(self.level())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown role level: {0}")]
pub struct UnknownRole(pub i64);

impl TryFrom<i64> for Role {
    type Error = UnknownRole;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        Role::from_level(level).ok_or(UnknownRole(level))
    }
}

impl From<Role> for i64 {
    fn from(role: Role) -> Self {
        role.level()
    }
}
