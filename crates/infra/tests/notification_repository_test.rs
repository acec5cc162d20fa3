//! NotificationRepository 統合テスト
//!
//! 実行方法:
//! ```bash
//! DATABASE_URL=postgres://... cargo test -p aleya-infra --features postgres-tests --test notification_repository_test
//! ```

#![cfg(feature = "postgres-tests")]

mod common;

use aleya_domain::{
    expense::{ExpenseAmount, ExpenseId},
    notification::{ExpenseNotification, Notification, NotificationId},
    user::UserId,
};
use aleya_infra::repository::{NotificationRepository, PostgresNotificationRepository};
use common::{minutes_later, test_now};
use pretty_assertions::assert_eq;
use sqlx::PgPool;

fn approved_for(user_id: &UserId, minutes: i64) -> Notification {
    let event = ExpenseNotification::CancellationApproved {
        expense_id:   ExpenseId::new(),
        category:     "Arriendo".to_string(),
        amount:       ExpenseAmount::new(500_000).unwrap(),
        requester_id: user_id.clone(),
    };
    Notification::new(
        NotificationId::new(),
        event.to_new_notification(),
        minutes_later(minutes),
    )
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_挿入した通知を未読として取得できる(pool: PgPool) {
    let sut = PostgresNotificationRepository::new(pool);
    let user_id = UserId::new();
    let notification = approved_for(&user_id, 0);

    sut.insert(&notification).await.unwrap();
    let unread = sut.find_unread_by_user(&user_id, 50).await.unwrap();

    assert_eq!(unread, vec![notification]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_通知は新しい順で件数上限まで返す(pool: PgPool) {
    let sut = PostgresNotificationRepository::new(pool);
    let user_id = UserId::new();
    let first = approved_for(&user_id, 1);
    let second = approved_for(&user_id, 2);
    let third = approved_for(&user_id, 3);
    for n in [&first, &second, &third] {
        sut.insert(n).await.unwrap();
    }
    sut.insert(&approved_for(&UserId::new(), 4)).await.unwrap();

    let found = sut.find_by_user(&user_id, 2).await.unwrap();

    assert_eq!(found, vec![third, second]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_既読化は最初の既読日時を保持する(pool: PgPool) {
    let sut = PostgresNotificationRepository::new(pool);
    let user_id = UserId::new();
    let notification = approved_for(&user_id, 0);
    sut.insert(&notification).await.unwrap();

    assert!(sut.mark_as_read(&notification.id, minutes_later(5)).await.unwrap());
    assert!(sut.mark_as_read(&notification.id, minutes_later(9)).await.unwrap());

    let found = sut.find_by_user(&user_id, 30).await.unwrap();
    assert_eq!(found[0].read_at, Some(minutes_later(5)));
    assert!(sut.find_unread_by_user(&user_id, 50).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_存在しない通知の既読化はfalseを返す(pool: PgPool) {
    let sut = PostgresNotificationRepository::new(pool);

    let updated = sut
        .mark_as_read(&NotificationId::new(), test_now())
        .await
        .unwrap();

    assert!(!updated);
}

#[sqlx::test(migrations = "../../migrations")]
async fn test_すべて既読は本人の未読だけを更新する(pool: PgPool) {
    let sut = PostgresNotificationRepository::new(pool);
    let user_id = UserId::new();
    let other_id = UserId::new();
    sut.insert(&approved_for(&user_id, 1)).await.unwrap();
    sut.insert(&approved_for(&user_id, 2)).await.unwrap();
    sut.insert(&approved_for(&other_id, 3)).await.unwrap();

    let count = sut
        .mark_all_as_read(&user_id, minutes_later(10))
        .await
        .unwrap();

    assert_eq!(count, 2);
    assert!(sut.find_unread_by_user(&user_id, 50).await.unwrap().is_empty());
    assert_eq!(sut.find_unread_by_user(&other_id, 50).await.unwrap().len(), 1);
}
