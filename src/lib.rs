// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Codewow: share code snippets, react to them and reply
//!
//! This crate provides the backend API: schema-checked documents stored
//! in Firestore, capability-based permissions and the REST routes on top.

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod time_utils;
pub mod urls;

use config::Config;
use db::FirestoreDb;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
}
