//! Integration tests for store contents across a restart.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use lovesense_bot::services::ChatUser;
use lovesense_core::{Action, AdminCommand, ContentKind, Language, OrderStatus, UserId};
use lovesense_integration_tests::{ADMIN, TestContext};

const USER: UserId = UserId::new(1001);

#[tokio::test]
async fn test_state_survives_reopen() {
    let ctx = TestContext::new().await;
    let user = ChatUser::new(USER, "Alice");
    let actions = ctx.state.actions();

    actions
        .handle(&user, Action::SetLanguage(Language::Kz))
        .await
        .unwrap();
    actions
        .handle(&user, Action::Content(ContentKind::Mini))
        .await
        .unwrap();
    actions.handle(&user, Action::ClaimPayment).await.unwrap();
    let order = ctx.state.orders().list().await.remove(0);
    ctx.state
        .admin()
        .execute(ADMIN, AdminCommand::Approve(order.id.clone()))
        .await
        .unwrap();

    let reopened = ctx.reopen().await;
    let record = reopened.users().peek(USER).await.unwrap();
    assert_eq!(record.language, Language::Kz);
    assert_eq!(record.trial_remaining, 1);
    assert_eq!(record.request_count, 1);
    assert!(reopened.entitlements().is_premium(USER).await);

    let orders = reopened.orders().list().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order.id);
    assert_eq!(orders[0].status, OrderStatus::Approved);
}

#[tokio::test]
async fn test_first_contact_is_persisted() {
    let ctx = TestContext::new().await;
    ctx.state
        .actions()
        .handle_text(&ChatUser::new(USER, "Alice"), "/start")
        .await
        .unwrap();

    let reopened = ctx.reopen().await;
    let record = reopened.users().peek(USER).await.unwrap();
    assert_eq!(record.trial_remaining, 2);
    assert_eq!(record.language, Language::Ru);
    assert!(ctx.audit_lines().iter().any(|l| l.contains("user_created")));
}

#[tokio::test]
async fn test_corrupt_store_starts_empty_and_is_backed_up() {
    let ctx = TestContext::new().await;
    ctx.state.entitlements().ensure_user(USER).await.unwrap();

    let users_file = ctx.storage().users_file();
    std::fs::write(&users_file, "{ not json").unwrap();

    let reopened = ctx.reopen().await;
    assert!(reopened.users().is_empty().await);

    let backups = std::fs::read_dir(users_file.parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().contains(".corrupt-"))
        .count();
    assert_eq!(backups, 1);
}

#[tokio::test]
async fn test_legacy_files_load() {
    let ctx = TestContext::new().await;
    let storage = ctx.storage();
    std::fs::create_dir_all(&storage.data_dir).unwrap();
    std::fs::write(
        storage.users_file(),
        r#"{"1001":{"trial_left":-3,"premium":true,"lang":"xx"}}"#,
    )
    .unwrap();
    std::fs::write(
        storage.orders_file(),
        r#"[{"id":"man_1700000000","telegram_id":1001,"timestamp":1700000000}]"#,
    )
    .unwrap();

    let reopened = ctx.reopen().await;
    let record = reopened.users().peek(USER).await.unwrap();
    assert_eq!(record.trial_remaining, 0);
    assert!(record.premium_active);
    assert_eq!(record.language, Language::Ru);
    assert!(reopened.entitlements().is_premium(USER).await);

    let orders = reopened.orders().list_pending().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].user_id, USER);
}
