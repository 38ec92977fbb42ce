// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed document operations.
//!
//! Provides generic operations over any [`Document`]:
//! - Load (full or projected to a subset of fields)
//! - Save (schema-checked; every failure collapses to `SaveFailed`)
//! - Delete and query-by-field
//!
//! plus identity resolution, daily stats and gist deletion with replies.

use crate::error::AppError;
use crate::identity::Identity;
use crate::models::stat::period_key;
use crate::models::{Document, Gist, Record, Reply, Stat, User};
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use serde_json::{Map, Value};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Field predicate for [`FirestoreDb::find_by_field`].
#[derive(Debug, Clone)]
pub enum FieldFilter {
    /// Field equals the value.
    Equals(&'static str, String),
    /// Array field contains the value.
    Contains(&'static str, String),
}

/// Projection used for existence checks.
#[derive(Deserialize)]
struct IdOnly {
    #[serde(default)]
    #[allow(dead_code)]
    id: String,
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Generic Document Operations ─────────────────────────────

    /// Load a document by id.
    pub async fn get<D: Document>(&self, id: &str) -> Result<Option<Record<D>>, AppError> {
        let doc: Option<D> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(D::COLLECTION)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.map(Record::new))
    }

    /// Load only the named fields of a document (plus its id).
    ///
    /// The returned record is partial: merges skip the fields that were not
    /// retrieved, and saving writes back only the retrieved fields.
    pub async fn get_partial<D: Document>(
        &self,
        id: &str,
        fields: &[&str],
    ) -> Result<Option<Record<D>>, AppError> {
        let mut projection = vec!["id"];
        projection.extend(
            D::SCHEMA
                .stored_fields()
                .filter(|name| *name != "id" && fields.contains(name)),
        );

        let doc: Option<D> = self
            .get_client()?
            .fluent()
            .select()
            .fields(projection.clone())
            .by_id_in(D::COLLECTION)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(doc.map(|doc| Record::partial(doc, projection)))
    }

    /// Check whether a document exists in a collection.
    pub async fn exists(&self, collection: &str, id: &str) -> Result<bool, AppError> {
        let found: Option<IdOnly> = self
            .get_client()?
            .fluent()
            .select()
            .fields(["id"])
            .by_id_in(collection)
            .obj()
            .one(id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(found.is_some())
    }

    /// Persist a record.
    ///
    /// Every failure (schema violation, missing referenced document, store
    /// error, offline client) is logged and reported as the single
    /// `SaveFailed` kind.
    pub async fn save<D: Document>(&self, record: &Record<D>) -> Result<(), AppError> {
        let id = record.id();
        let fields = match serde_json::to_value(record.doc()) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => return Err(save_failed(D::COLLECTION, id, "not an object")),
            Err(e) => return Err(save_failed(D::COLLECTION, id, e)),
        };
        let fields: Map<String, Value> = fields
            .into_iter()
            .filter(|(name, _)| record.was_retrieved(name))
            .collect();

        let checked = if record.is_partial() {
            fields
                .iter()
                .try_for_each(|(name, value)| D::SCHEMA.check(name, value))
        } else {
            D::SCHEMA.check_document(&fields)
        };
        if let Err(e) = checked {
            return Err(save_failed(D::COLLECTION, id, e));
        }

        for (collection, ref_id) in D::SCHEMA.references(&fields) {
            match self.exists(collection, ref_id).await {
                Ok(true) => {}
                Ok(false) => {
                    return Err(save_failed(
                        D::COLLECTION,
                        id,
                        format!("referenced {collection}/{ref_id} does not exist"),
                    ))
                }
                Err(e) => return Err(save_failed(D::COLLECTION, id, e)),
            }
        }

        let client = match self.get_client() {
            Ok(client) => client,
            Err(e) => return Err(save_failed(D::COLLECTION, id, e)),
        };

        let update = client.fluent().update();
        let update = match record.retrieved_fields() {
            Some(retrieved) => update.fields(retrieved.iter()),
            None => update,
        };

        let written: Result<(), _> = update
            .in_col(D::COLLECTION)
            .document_id(id)
            .object(record.doc())
            .execute()
            .await;

        if let Err(e) = written {
            return Err(save_failed(D::COLLECTION, id, e));
        }

        tracing::debug!(
            collection = D::COLLECTION,
            id,
            partial = record.is_partial(),
            "Document saved"
        );
        Ok(())
    }

    /// Delete a document by id.
    pub async fn delete<D: Document>(&self, id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(D::COLLECTION)
            .document_id(id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(collection = D::COLLECTION, id, "Document deleted");
        Ok(())
    }

    /// Query documents by a single field.
    pub async fn find_by_field<D: Document>(
        &self,
        filter: Option<FieldFilter>,
        limit: Option<u32>,
    ) -> Result<Vec<Record<D>>, AppError> {
        let query = self.get_client()?.fluent().select().from(D::COLLECTION);

        let query = match filter {
            Some(FieldFilter::Equals(field, value)) => {
                query.filter(move |q| q.field(field).eq(value.clone()))
            }
            Some(FieldFilter::Contains(field, value)) => {
                query.filter(move |q| q.field(field).array_contains(value.clone()))
            }
            None => query,
        };

        let query = match limit {
            Some(limit) => query.limit(limit),
            None => query,
        };

        let docs: Vec<D> = query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(docs.into_iter().map(Record::new).collect())
    }

    // ─── Identity ────────────────────────────────────────────────

    /// Resolve a session identity to its stored user.
    ///
    /// An unknown subject leaves the identity anonymous (no user, no
    /// capabilities); only store errors fail.
    pub async fn resolve_identity(&self, mut identity: Identity) -> Result<Identity, AppError> {
        let Some(name) = identity.name.clone() else {
            return Ok(identity);
        };

        let user = self.get::<User>(&name).await?.map(Record::into_doc);
        if user.is_none() {
            tracing::debug!(user_id = %name, "Session subject has no user record");
        }

        identity.attach(user);
        Ok(identity)
    }

    // ─── Stats ───────────────────────────────────────────────────

    async fn todays_stat(&self) -> Result<Record<Stat>, AppError> {
        let today = chrono::Utc::now().date_naive();
        Ok(self
            .get::<Stat>(&period_key(today))
            .await?
            .unwrap_or_else(|| Record::new(Stat::for_day(today))))
    }

    /// Count a newly created gist in today's stats.
    pub async fn record_gist_stat(&self, gist: &Gist) -> Result<(), AppError> {
        let mut stat = self.todays_stat().await?;
        stat.update(|stat| stat.record_gist(gist));
        self.save(&stat).await
    }

    /// Count a newly created user in today's stats.
    pub async fn record_user_stat(&self) -> Result<(), AppError> {
        let mut stat = self.todays_stat().await?;
        stat.update(Stat::record_user);
        self.save(&stat).await
    }

    // ─── Mentions ──────────────────────────────────────────────

    /// Append a mention to a user's inbox.
    ///
    /// Only the `mentions` field is loaded and written back.
    pub async fn add_mention(
        &self,
        user_id: &str,
        mention: Map<String, Value>,
    ) -> Result<(), AppError> {
        let mut user = self
            .get_partial::<User>(user_id, &["mentions"])
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

        user.update(|user| user.add_mention(mention))?;
        self.save(&user).await
    }

    // ─── Cascades ────────────────────────────────────────────────

    /// Delete a gist and all of its replies.
    ///
    /// Returns the number of replies deleted.
    pub async fn delete_gist_cascade(&self, gist_id: &str) -> Result<usize, AppError> {
        let replies: Vec<Record<Reply>> = self
            .find_by_field(
                Some(FieldFilter::Equals("gist", gist_id.to_string())),
                None,
            )
            .await?;
        let count = replies.len();

        stream::iter(replies)
            .map(|reply| async move { self.delete::<Reply>(reply.id()).await })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        self.delete::<Gist>(gist_id).await?;

        tracing::info!(gist_id, replies = count, "Gist deleted with replies");
        Ok(count)
    }
}

fn save_failed(collection: &str, id: &str, reason: impl std::fmt::Display) -> AppError {
    tracing::warn!(collection, id, reason = %reason, "Save failed");
    AppError::SaveFailed
}
