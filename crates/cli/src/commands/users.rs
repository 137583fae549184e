//! User inspection commands.

use lovesense_bot::i18n::admin_report;
use lovesense_core::{AdminCommand, UserId};

use super::{CliError, Context, print};

/// List users (first 100).
///
/// # Errors
///
/// Returns `CliError` if the admin service fails.
pub async fn list(ctx: &Context) -> Result<(), CliError> {
    let outcome = ctx.execute(AdminCommand::ListUsers).await?;
    print(&admin_report(&outcome));
    Ok(())
}

/// Show one user record. Does not create a record for unknown users.
///
/// # Errors
///
/// Returns `CliError::InvalidId` for a malformed id and
/// `CliError::UserNotFound` if there is no record.
pub async fn show(ctx: &Context, uid: &str) -> Result<(), CliError> {
    let uid: UserId = uid.parse()?;
    ctx.state.admin().authorize(ctx.admin_id, "users").await?;

    let record = ctx
        .state
        .users()
        .peek(uid)
        .await
        .ok_or(CliError::UserNotFound(uid))?;
    let now = ctx.state.entitlements().now().timestamp();

    print(&format!("user:          {uid}"));
    print(&format!("premium:       {}", record.is_premium(now)));
    print(&format!("premium flag:  {}", record.premium_active));
    print(&format!("premium until: {}", record.premium_until));
    print(&format!("trial left:    {}", record.trial_remaining));
    print(&format!("requests:      {}", record.request_count));
    print(&format!("language:      {}", record.language));
    Ok(())
}
