//! Premium management commands.

use lovesense_bot::i18n::admin_report;
use lovesense_core::{AdminCommand, UserId};

use super::{CliError, Context, print};

/// Grant premium for `days` starting now.
///
/// # Errors
///
/// Returns `CliError` for a malformed id or if the grant cannot be persisted.
pub async fn grant(ctx: &Context, uid: &str, days: u32) -> Result<(), CliError> {
    let user: UserId = uid.parse()?;
    let outcome = ctx.execute(AdminCommand::Grant { user, days }).await?;
    tracing::info!(user_id = %user, days, "Premium granted");
    print(&admin_report(&outcome));
    Ok(())
}

/// Revoke premium.
///
/// # Errors
///
/// Returns `CliError` for a malformed id or if the change cannot be persisted.
pub async fn revoke(ctx: &Context, uid: &str) -> Result<(), CliError> {
    let user: UserId = uid.parse()?;
    let outcome = ctx.execute(AdminCommand::Revoke(user)).await?;
    tracing::info!(user_id = %user, "Premium revoked");
    print(&admin_report(&outcome));
    Ok(())
}
