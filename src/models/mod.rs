// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod document;
pub mod gist;
pub mod reply;
pub mod role;
pub mod schema;
pub mod stat;
pub mod user;

pub use document::{Document, ExtraFields, Record, ValueOrigin};
pub use gist::{Gist, Reaction};
pub use reply::Reply;
pub use role::Role;
pub use stat::Stat;
pub use user::User;
