//! Integration tests for the admin gate.
//!
//! Every admin command from a non-admin is refused, leaves the stores
//! untouched and is recorded in the action log.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use lovesense_bot::services::{AdminError, AdminOutcome, ChatUser, Reply};
use lovesense_core::{Action, AdminCommand, OrderId, UserId};
use lovesense_integration_tests::{ADMIN, TestContext};

const INTRUDER: UserId = UserId::new(666);
const CUSTOMER: UserId = UserId::new(1001);

fn every_command(order: &OrderId) -> Vec<AdminCommand> {
    vec![
        AdminCommand::grant(INTRUDER),
        AdminCommand::Revoke(CUSTOMER),
        AdminCommand::Approve(order.clone()),
        AdminCommand::Reject(order.clone()),
        AdminCommand::PurgeOrders(CUSTOMER),
        AdminCommand::Stats,
        AdminCommand::ListUsers,
        AdminCommand::ListOrders,
        AdminCommand::ViewLogs,
    ]
}

#[tokio::test]
async fn test_non_admin_commands_never_mutate() {
    let ctx = TestContext::new().await;
    ctx.state
        .admin()
        .execute(ADMIN, AdminCommand::grant(CUSTOMER))
        .await
        .unwrap();
    let customer = ChatUser::new(CUSTOMER, "Customer");
    ctx.state
        .actions()
        .handle(&customer, Action::ClaimPayment)
        .await
        .unwrap();
    let order = ctx.state.orders().list().await.remove(0);

    let users_before = ctx.state.users().all().await;
    let orders_before = ctx.state.orders().list().await;
    let log_before = ctx.audit_lines().len();

    let commands = every_command(&order.id);
    let attempts = commands.len();
    for command in commands {
        let name = command.name();
        let err = ctx.state.admin().execute(INTRUDER, command).await.unwrap_err();
        assert!(
            matches!(err, AdminError::Unauthorized(actor) if actor == INTRUDER),
            "{name} was not refused"
        );
    }

    assert_eq!(ctx.state.users().all().await, users_before);
    assert_eq!(ctx.state.orders().list().await, orders_before);

    let log = ctx.audit_lines();
    assert_eq!(log.len(), log_before + attempts);
    assert!(
        log[log_before..]
            .iter()
            .all(|line| line.contains("unauthorized_attempt") && line.contains("actor=666"))
    );
}

#[tokio::test]
async fn test_admin_command_performs_exactly_the_mutation() {
    let ctx = TestContext::new().await;
    ctx.state.entitlements().ensure_user(CUSTOMER).await.unwrap();
    ctx.state.entitlements().ensure_user(INTRUDER).await.unwrap();

    let outcome = ctx
        .state
        .admin()
        .execute(ADMIN, AdminCommand::grant(CUSTOMER))
        .await
        .unwrap();
    assert!(matches!(outcome, AdminOutcome::Granted { user, days: 30, .. } if user == CUSTOMER));

    let customer = ctx.state.users().peek(CUSTOMER).await.unwrap();
    assert!(customer.premium_active);
    let bystander = ctx.state.users().peek(INTRUDER).await.unwrap();
    assert!(!bystander.premium_active);
    assert_eq!(bystander.premium_until, 0);
}

#[tokio::test]
async fn test_admin_buttons_refused_for_non_admin() {
    let ctx = TestContext::new().await;
    let intruder = ChatUser::new(INTRUDER, "Mallory");

    for action in [
        Action::AdminPanel,
        Action::AdminManage,
        Action::Admin(AdminCommand::grant(INTRUDER)),
    ] {
        let replies = ctx.state.actions().handle(&intruder, action).await.unwrap();
        assert!(matches!(
            replies.as_slice(),
            [Reply::Toast { alert: true, .. }]
        ));
    }
    assert!(!ctx.state.entitlements().is_premium(INTRUDER).await);
}

#[tokio::test]
async fn test_grant_typed_by_non_admin_is_ignored() {
    let ctx = TestContext::new().await;
    let intruder = ChatUser::new(INTRUDER, "Mallory");

    ctx.state
        .actions()
        .handle_text(&intruder, "grant:666")
        .await
        .unwrap();
    assert!(!ctx.state.entitlements().is_premium(INTRUDER).await);
}

#[tokio::test]
async fn test_grant_typed_by_admin_is_applied() {
    let ctx = TestContext::new().await;
    let admin = ChatUser::new(ADMIN, "Admin");

    let replies = ctx
        .state
        .actions()
        .handle_text(&admin, "grant:1001:7")
        .await
        .unwrap();
    assert!(!replies.is_empty());
    assert!(ctx.state.entitlements().is_premium(CUSTOMER).await);
}
