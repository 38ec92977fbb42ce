//! Database layer (Firestore).

pub mod firestore;

pub use firestore::{FieldFilter, FirestoreDb};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const GISTS: &str = "gists";
    pub const REPLIES: &str = "replies";
    /// Daily counters (keyed by YYYY-MM-DD)
    pub const STATS: &str = "stats";
}
