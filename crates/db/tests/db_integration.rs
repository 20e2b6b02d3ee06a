//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `pictogram_test`)
//!   `TEST_DB_PASSWORD` (default: `pictogram_test`)
//!   `TEST_DB_NAME` (default: `pictogram_test`)

#![allow(clippy::unwrap_used)]

use pictogram_common::AppError;
use pictogram_db::entities::{following, user};
use pictogram_db::repositories::{FollowingRepository, MessageRepository, UserRepository};
use pictogram_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{NotSet, Set};

fn new_user(username: &str) -> user::ActiveModel {
    user::ActiveModel {
        id: NotSet,
        username: Set(username.to_string()),
        username_lower: Set(username.to_lowercase()),
        email: Set(format!("{username}@example.com")),
        token: NotSet,
        bio: Set(String::new()),
        profile_pic: Set("default.png".to_string()),
        created_at: NotSet,
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_follow_edge_unique_index() {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let conn = db.conn.clone();

    let users = UserRepository::new(conn.clone());
    let alice = users.create(new_user("alice")).await.unwrap();
    let bob = users.create(new_user("bob")).await.unwrap();

    let follows = FollowingRepository::new(conn);
    follows
        .create(following::ActiveModel {
            id: NotSet,
            follower_id: Set(alice.id),
            followee_id: Set(bob.id),
            created_at: NotSet,
        })
        .await
        .unwrap();

    // Second identical edge must be rejected by the unique index
    let dup = follows
        .create(following::ActiveModel {
            id: NotSet,
            follower_id: Set(alice.id),
            followee_id: Set(bob.id),
            created_at: NotSet,
        })
        .await;
    assert!(matches!(dup, Err(AppError::Conflict(_))));

    assert_eq!(follows.count_following(alice.id).await.unwrap(), 1);

    db.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_conversation_history_is_symmetric() {
    use pictogram_db::entities::message;

    let db = TestDatabase::new().await.expect("Failed to connect");
    db.cleanup().await.unwrap();
    let conn = db.conn.clone();

    let users = UserRepository::new(conn.clone());
    let alice = users.create(new_user("alice")).await.unwrap();
    let bob = users.create(new_user("bob")).await.unwrap();

    let messages = MessageRepository::new(conn);
    for (from, to, text) in [
        (alice.id, bob.id, "hello"),
        (bob.id, alice.id, "hi back"),
        (alice.id, bob.id, "how are you"),
    ] {
        messages
            .create(message::ActiveModel {
                id: NotSet,
                sender_id: Set(from),
                receiver_id: Set(to),
                content: Set(text.to_string()),
                created_at: NotSet,
            })
            .await
            .unwrap();
    }

    let a_view = messages.find_conversation(alice.id, bob.id).await.unwrap();
    let b_view = messages.find_conversation(bob.id, alice.id).await.unwrap();

    assert_eq!(a_view.len(), 3);
    assert_eq!(a_view, b_view);
    assert_eq!(a_view[0].content, "hello");

    let partners = messages.find_conversation_partners(alice.id).await.unwrap();
    assert_eq!(partners, vec![bob.id]);

    db.cleanup().await.unwrap();
}
