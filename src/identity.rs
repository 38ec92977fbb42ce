// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session identity and its resolution to a stored user.
//!
//! The auth middleware produces an unresolved [`Identity`] carrying only the
//! session subject. Handlers resolve it once per request (see
//! `FirestoreDb::resolve_identity`), which is the only place a user's stored
//! role becomes capabilities.

use crate::error::AppError;
use crate::models::User;
use crate::permissions::{CapabilitySet, Permission};

/// Acting identity for one request.
#[derive(Debug, Clone, Default)]
pub struct Identity {
    /// Session subject (a User id), if authenticated
    pub name: Option<String>,
    /// Capabilities granted for this request
    pub provides: CapabilitySet,
    user: Option<User>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Attach the user looked up for this identity.
    ///
    /// A found user's capabilities are merged into `provides`. With no user
    /// the identity gains nothing.
    pub fn attach(&mut self, user: Option<User>) -> Option<&User> {
        if let Some(user) = &user {
            self.provides.extend(user.provides());
        }
        self.user = user;
        self.user.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// The acting user, or `Unauthorized` when none resolved.
    pub fn require_user(&self) -> Result<&User, AppError> {
        self.user.as_ref().ok_or(AppError::Unauthorized)
    }

    pub fn can(&self, permission: &Permission) -> bool {
        permission.allows(&self.provides)
    }

    /// Fail with `Forbidden` unless `permission` holds.
    pub fn ensure(&self, permission: &Permission) -> Result<(), AppError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}
