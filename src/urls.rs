// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Canonical resource URIs.

use crate::models::{Document, Record};

/// Named resource routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    User,
    Gist,
    Reply,
}

impl Route {
    pub fn path(&self, id: &str) -> String {
        match self {
            Route::User => format!("/api/users/{id}"),
            Route::Gist => format!("/api/gists/{id}"),
            Route::Reply => format!("/api/replies/{id}"),
        }
    }
}

/// Resolve a named route for a document id under `base_url`.
pub fn resolve(base_url: &str, route: Route, id: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), route.path(id))
}

/// Documents addressable by a named route.
pub trait Routable {
    const ROUTE: Route;
}

impl<D: Document + Routable> Record<D> {
    pub fn uri(&self, base_url: &str) -> String {
        resolve(base_url, D::ROUTE, self.id())
    }
}
