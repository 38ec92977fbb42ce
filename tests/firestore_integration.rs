// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running, with
//! FIRESTORE_EMULATOR_HOST set. Each test uses unique ids, so they can
//! share one emulator instance.

use codewow::db::FieldFilter;
use codewow::error::AppError;
use codewow::identity::Identity;
use codewow::models::stat::period_key;
use codewow::models::{Gist, Reaction, Record, Reply, Role, Stat, User, ValueOrigin};
use serde_json::json;

mod common;
use common::{test_db, unique_id};

fn test_user(id: &str) -> User {
    User::new(id, "tester", "test@example.com", "openid")
}

async fn saved_user(db: &codewow::db::FirestoreDb, role: Role) -> User {
    let user = User {
        role,
        ..test_user(&unique_id("user"))
    };
    db.save(&Record::new(user.clone())).await.unwrap();
    user
}

// ═══════════════════════════════════════════════════════════════════════════
// DOCUMENT TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_user_save_and_load() {
    require_emulator!();

    let db = test_db().await;
    let followed = saved_user(&db, Role::Normal).await;
    let id = unique_id("user");

    assert!(db.get::<User>(&id).await.unwrap().is_none());

    let mut user = test_user(&id);
    user.brief = Some("hello".to_string());
    user.follow(&followed.id).unwrap();
    db.save(&Record::new(user.clone())).await.unwrap();

    let loaded = db.get::<User>(&id).await.unwrap().expect("user saved");
    assert_eq!(loaded.doc(), &user);
    assert!(!loaded.is_partial());
}

#[tokio::test]
async fn test_partial_update_preserves_unretrieved_fields() {
    require_emulator!();

    let db = test_db().await;
    let author = saved_user(&db, Role::Normal).await;
    let gist = Gist::new(&author.id, "original", "rust", "fn main() {}");
    let id = gist.id.clone();
    db.save(&Record::new(gist)).await.unwrap();

    let mut partial = db
        .get_partial::<Gist>(&id, &["desc", "author"])
        .await
        .unwrap()
        .expect("gist saved");
    assert!(partial.is_partial());
    assert!(partial.content.is_empty());

    // content was not retrieved, so it is neither merged nor written
    let payload = json!({ "desc": "changed", "content": "clobbered" });
    partial
        .merge(payload.as_object().unwrap(), ValueOrigin::Input)
        .unwrap();
    db.save(&partial).await.unwrap();

    let full = db.get::<Gist>(&id).await.unwrap().unwrap();
    assert_eq!(full.desc, "changed");
    assert_eq!(full.content, "fn main() {}");
    assert_eq!(full.code_type, "rust");
}

#[tokio::test]
async fn test_save_with_missing_reference_fails() {
    require_emulator!();

    let db = test_db().await;
    let gist = Gist::new(unique_id("nobody"), "desc", "rust", "");

    let err = db.save(&Record::new(gist.clone())).await.unwrap_err();
    assert!(matches!(err, AppError::SaveFailed));
    assert!(db.get::<Gist>(&gist.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reply_to_missing_gist_fails() {
    require_emulator!();

    let db = test_db().await;
    let author = saved_user(&db, Role::Normal).await;
    let reply = Reply::new(&author.id, unique_id("no-gist"), "hello");

    let err = db.save(&Record::new(reply)).await.unwrap_err();
    assert!(matches!(err, AppError::SaveFailed));
}

#[tokio::test]
async fn test_follow_unknown_user_fails() {
    require_emulator!();

    let db = test_db().await;
    let user = saved_user(&db, Role::Normal).await;

    let mut record = db
        .get_partial::<User>(&user.id, &["follows"])
        .await
        .unwrap()
        .unwrap();
    assert!(record
        .update(|u| u.follow(&unique_id("ghost")))
        .unwrap());

    let err = db.save(&record).await.unwrap_err();
    assert!(matches!(err, AppError::SaveFailed));

    let loaded = db.get::<User>(&user.id).await.unwrap().unwrap();
    assert!(loaded.follows.is_empty());
}

#[tokio::test]
async fn test_reaction_from_unknown_user_fails() {
    require_emulator!();

    let db = test_db().await;
    let author = saved_user(&db, Role::Normal).await;
    let gist = Gist::new(&author.id, "desc", "rust", "");
    let id = gist.id.clone();
    db.save(&Record::new(gist)).await.unwrap();

    let mut record = db
        .get_partial::<Gist>(&id, &["author", Reaction::Eggs.field()])
        .await
        .unwrap()
        .unwrap();
    record
        .update(|g| g.add_reaction(Reaction::Eggs, "made-up-user"))
        .unwrap();

    let err = db.save(&record).await.unwrap_err();
    assert!(matches!(err, AppError::SaveFailed));
}

#[tokio::test]
async fn test_save_invalid_document_fails() {
    require_emulator!();

    let db = test_db().await;
    let author = saved_user(&db, Role::Normal).await;
    let gist = Gist::new(&author.id, "x".repeat(200), "rust", "");

    let err = db.save(&Record::new(gist)).await.unwrap_err();
    assert!(matches!(err, AppError::SaveFailed));
}

#[tokio::test]
async fn test_reaction_partial_save() {
    require_emulator!();

    let db = test_db().await;
    let author = saved_user(&db, Role::Normal).await;
    let fan = saved_user(&db, Role::Normal).await;
    let gist = Gist::new(&author.id, "desc", "rust", "body");
    let id = gist.id.clone();
    db.save(&Record::new(gist)).await.unwrap();

    let mut record = db
        .get_partial::<Gist>(&id, &["author", Reaction::Flowers.field()])
        .await
        .unwrap()
        .unwrap();
    assert!(record
        .update(|g| g.add_reaction(Reaction::Flowers, &fan.id))
        .unwrap());
    db.save(&record).await.unwrap();

    let full = db.get::<Gist>(&id).await.unwrap().unwrap();
    assert_eq!(full.flowers, vec![fan.id.clone()]);
    assert_eq!(full.content, "body");
}

#[tokio::test]
async fn test_find_gists_by_author_and_tag() {
    require_emulator!();

    let db = test_db().await;
    let author = saved_user(&db, Role::Normal).await;
    let tag = unique_id("tag");

    let mut tagged = Gist::new(&author.id, "tagged", "rust", "");
    tagged.add_tag(&tag).unwrap();
    db.save(&Record::new(tagged.clone())).await.unwrap();
    db.save(&Record::new(Gist::new(&author.id, "plain", "go", "")))
        .await
        .unwrap();

    let by_author = db
        .find_by_field::<Gist>(Some(FieldFilter::Equals("author", author.id.clone())), None)
        .await
        .unwrap();
    assert_eq!(by_author.len(), 2);

    let by_tag = db
        .find_by_field::<Gist>(Some(FieldFilter::Contains("tags", tag)), Some(10))
        .await
        .unwrap();
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].id, tagged.id);
}

#[tokio::test]
async fn test_add_mention_keeps_profile() {
    require_emulator!();

    let db = test_db().await;
    let user = saved_user(&db, Role::Normal).await;

    let mention = json!({ "gist": "g1", "reply": "r1", "from": "someone" });
    db.add_mention(&user.id, mention.as_object().unwrap().clone())
        .await
        .unwrap();

    let loaded = db.get::<User>(&user.id).await.unwrap().unwrap();
    assert_eq!(loaded.mentions.len(), 1);
    assert_eq!(loaded.mentions[0]["reply"], "r1");
    assert_eq!(loaded.nickname, user.nickname);
    assert_eq!(loaded.email, user.email);
}

// ═══════════════════════════════════════════════════════════════════════════
// IDENTITY TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_resolve_unknown_identity() {
    require_emulator!();

    let db = test_db().await;
    let identity = db
        .resolve_identity(Identity::new(unique_id("ghost")))
        .await
        .unwrap();

    assert!(identity.user().is_none());
    assert!(identity.provides.is_empty());
}

#[tokio::test]
async fn test_resolve_admin_identity() {
    require_emulator!();

    let db = test_db().await;
    let admin = saved_user(&db, Role::Admin).await;

    let identity = db
        .resolve_identity(Identity::new(admin.id.clone()))
        .await
        .unwrap();

    assert_eq!(identity.user().map(|u| u.id.as_str()), Some(admin.id.as_str()));
    assert_eq!(identity.provides, admin.provides());
}

// ═══════════════════════════════════════════════════════════════════════════
// CASCADE AND STATS TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_delete_gist_cascades_to_replies() {
    require_emulator!();

    let db = test_db().await;
    let author = saved_user(&db, Role::Admin).await;
    let gist = Gist::new(&author.id, "desc", "rust", "");
    let gist_id = gist.id.clone();
    db.save(&Record::new(gist)).await.unwrap();

    let mut reply_ids = Vec::new();
    for i in 0..3 {
        let reply = Reply::new(&author.id, &gist_id, format!("reply {i}"));
        reply_ids.push(reply.id.clone());
        db.save(&Record::new(reply)).await.unwrap();
    }

    let deleted = db.delete_gist_cascade(&gist_id).await.unwrap();
    assert_eq!(deleted, 3);

    assert!(db.get::<Gist>(&gist_id).await.unwrap().is_none());
    for id in reply_ids {
        assert!(db.get::<Reply>(&id).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_stats_count_new_gists_and_users() {
    require_emulator!();

    let db = test_db().await;
    let key = period_key(chrono::Utc::now().date_naive());
    let before = db
        .get::<Stat>(&key)
        .await
        .unwrap()
        .map(Record::into_doc)
        .unwrap_or_default();

    let tag = unique_id("tag");
    let mut gist = Gist::new("anyone", "desc", "rust", "");
    gist.add_tag(&tag).unwrap();

    db.record_gist_stat(&gist).await.unwrap();
    db.record_user_stat().await.unwrap();

    let after = db.get::<Stat>(&key).await.unwrap().unwrap();
    assert!(after.new_gist > before.new_gist);
    assert!(after.new_user > before.new_user);
    assert_eq!(after.tag_set.get(&tag), Some(&1));
}
