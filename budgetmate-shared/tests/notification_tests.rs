//! Integration tests for notification ownership
//!
//! These tests require a running PostgreSQL database (DATABASE_URL).

mod common;

use budgetmate_shared::models::notification::{kind, Notification};
use common::{test_pool, TestFamily};

#[tokio::test]
async fn test_notifications_are_private_to_their_recipient() {
    let pool = test_pool().await.expect("Failed to set up database");
    let family = TestFamily::create(&pool, 2).await.unwrap();
    let owner = family.member(0);
    let other = family.member(1);

    let invite = Notification::create(
        &pool,
        owner.id,
        kind::INVITE,
        "Asha invited you to join their family 'Rao'",
        "42",
    )
    .await
    .unwrap();

    let found = Notification::find_for_user(&pool, invite.id, owner.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.kind, kind::INVITE);
    assert_eq!(found.data, "42");

    assert!(Notification::find_for_user(&pool, invite.id, other.id)
        .await
        .unwrap()
        .is_none());
    assert!(!Notification::mark_read(&pool, invite.id, other.id).await.unwrap());
    assert_eq!(Notification::unread_count(&pool, owner.id).await.unwrap(), 1);

    assert!(Notification::mark_read(&pool, invite.id, owner.id).await.unwrap());
    assert_eq!(Notification::unread_count(&pool, owner.id).await.unwrap(), 0);

    family.cleanup(&pool).await.unwrap();
}
