//! Payment claim commands.

use lovesense_bot::i18n::admin_report;
use lovesense_bot::services::AdminOutcome;
use lovesense_core::{AdminCommand, OrderId, UserId};

use super::{CliError, Context, print};

/// List the latest orders, newest first.
///
/// With `pending_only`, every pending order is listed however old.
///
/// # Errors
///
/// Returns `CliError` if the admin service fails.
pub async fn list(ctx: &Context, pending_only: bool) -> Result<(), CliError> {
    let outcome = listing(ctx, pending_only).await?;
    print(&admin_report(&outcome));
    Ok(())
}

async fn listing(ctx: &Context, pending_only: bool) -> Result<AdminOutcome, CliError> {
    if !pending_only {
        return ctx.execute(AdminCommand::ListOrders).await;
    }
    ctx.authorize(AdminCommand::ListOrders.name()).await?;
    let mut pending = ctx.state.orders().list_pending().await;
    pending.reverse();
    Ok(AdminOutcome::Orders(pending))
}

/// Approve a claim.
///
/// # Errors
///
/// Returns `CliError` for a malformed id or if the change cannot be persisted.
pub async fn approve(ctx: &Context, order_id: &str) -> Result<(), CliError> {
    let order_id: OrderId = order_id.parse()?;
    let outcome = ctx.execute(AdminCommand::Approve(order_id)).await?;
    print(&admin_report(&outcome));
    Ok(())
}

/// Reject a claim.
///
/// # Errors
///
/// Returns `CliError` for a malformed id or if the change cannot be persisted.
pub async fn reject(ctx: &Context, order_id: &str) -> Result<(), CliError> {
    let order_id: OrderId = order_id.parse()?;
    let outcome = ctx.execute(AdminCommand::Reject(order_id)).await?;
    print(&admin_report(&outcome));
    Ok(())
}

/// Remove every order of a user.
///
/// # Errors
///
/// Returns `CliError` for a malformed id or if the change cannot be persisted.
pub async fn purge(ctx: &Context, uid: &str) -> Result<(), CliError> {
    let user: UserId = uid.parse()?;
    let outcome = ctx.execute(AdminCommand::PurgeOrders(user)).await?;
    print(&admin_report(&outcome));
    Ok(())
}
