//! CLI command implementations.
//!
//! # Environment Variables
//!
//! - `ADMIN_ID` - Identity the CLI acts as (required)
//! - `DATA_DIR` - Directory holding `users.json` and `orders.json` (default: data)
//! - `LOGS_DIR` - Directory holding `actions.log` (default: logs)

pub mod orders;
pub mod premium;
pub mod users;

use std::sync::Arc;

use lovesense_bot::config::{ConfigError, PaymentConfig, StorageConfig, admin_id_from_env};
use lovesense_bot::i18n::admin_report;
use lovesense_bot::services::{AdminError, AdminGate, AdminOutcome, NoopNotifier};
use lovesense_bot::state::AppState;
use lovesense_bot::store::StoreError;
use lovesense_core::{AdminCommand, IdParseError, SystemClock, UserId};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The admin service refused or failed.
    #[error(transparent)]
    Admin(#[from] AdminError),

    /// Reading a store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A command-line id could not be parsed.
    #[error("Invalid id: {0}")]
    InvalidId(#[from] IdParseError),

    /// No record for the given user.
    #[error("User not found: {0}")]
    UserNotFound(UserId),
}

/// Opened stores plus the identity commands run as.
pub struct Context {
    pub state: AppState,
    pub admin_id: UserId,
}

impl Context {
    /// Load `ADMIN_ID` and open the stores.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Config` if `ADMIN_ID` is missing or invalid.
    pub async fn open() -> Result<Self, CliError> {
        let admin_id = admin_id_from_env()?;
        let storage = StorageConfig::from_env();
        tracing::debug!(data_dir = %storage.data_dir.display(), "Opening stores");

        let state = AppState::open(
            &storage,
            AdminGate::new(admin_id),
            PaymentConfig::default(),
            Arc::new(SystemClock),
            Arc::new(NoopNotifier),
        )
        .await;
        Ok(Self { state, admin_id })
    }

    /// Run `command` as the configured admin.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Admin` if the command fails.
    pub async fn execute(&self, command: AdminCommand) -> Result<AdminOutcome, CliError> {
        Ok(self.state.admin().execute(self.admin_id, command).await?)
    }

    /// Check the configured identity before reading stores directly.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Admin` if `ADMIN_ID` is not the bot's admin.
    pub async fn authorize(&self, what: &str) -> Result<(), CliError> {
        Ok(self.state.admin().authorize(self.admin_id, what).await?)
    }
}

/// Write command output to stdout.
#[allow(clippy::print_stdout)]
pub fn print(text: &str) {
    println!("{text}");
}

/// Show dashboard counters.
///
/// # Errors
///
/// Returns `CliError` if the admin service fails.
pub async fn stats(ctx: &Context) -> Result<(), CliError> {
    let outcome = ctx.execute(AdminCommand::Stats).await?;
    print(&admin_report(&outcome));
    Ok(())
}

/// Show the last `lines` lines of the action log.
///
/// # Errors
///
/// Returns `CliError` if the log cannot be read.
pub async fn logs(ctx: &Context, lines: usize) -> Result<(), CliError> {
    let outcome = log_tail(ctx, lines).await?;
    if let AdminOutcome::Logs { exists: true, path, .. } = &outcome {
        tracing::info!("Reading {}", path.display());
    }
    print(&admin_report(&outcome));
    Ok(())
}

/// The last `lines` lines of the action log, however many that is.
async fn log_tail(ctx: &Context, lines: usize) -> Result<AdminOutcome, CliError> {
    ctx.authorize(AdminCommand::ViewLogs.name()).await?;
    let audit = ctx.state.audit();
    Ok(AdminOutcome::Logs {
        path: audit.path().to_path_buf(),
        exists: audit.exists().await,
        lines: audit.read_recent(lines).await?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use super::*;
    use lovesense_core::{AuditAction, AuditEntry, Clock, ManualClock};

    pub const ADMIN: UserId = UserId::new(935_939_738);

    pub async fn context(dir: &tempfile::TempDir, admin_id: UserId) -> Context {
        let storage = StorageConfig {
            data_dir: dir.path().join("data"),
            logs_dir: dir.path().join("logs"),
        };
        let state = AppState::open(
            &storage,
            AdminGate::new(ADMIN),
            PaymentConfig::default(),
            Arc::new(ManualClock::at(1_760_000_000)),
            Arc::new(NoopNotifier),
        )
        .await;
        Context { state, admin_id }
    }

    #[tokio::test]
    async fn test_log_tail_is_not_capped() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, ADMIN).await;
        for i in 0..250_i64 {
            ctx.state
                .audit()
                .record(AuditEntry::new(
                    ManualClock::at(1_760_000_000 + i).now(),
                    ADMIN,
                    AuditAction::PremiumRevoked,
                    UserId::new(i.unsigned_abs()),
                ))
                .await;
        }

        let AdminOutcome::Logs { lines, exists, .. } = log_tail(&ctx, 300).await.unwrap() else {
            panic!("expected logs");
        };
        assert!(exists);
        assert_eq!(lines.len(), 250);

        let AdminOutcome::Logs { lines, .. } = log_tail(&ctx, 2).await.unwrap() else {
            panic!("expected logs");
        };
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("subject=249"));
    }

    #[tokio::test]
    async fn test_log_tail_requires_admin() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir, UserId::new(666)).await;
        let err = log_tail(&ctx, 10).await.unwrap_err();
        assert!(matches!(err, CliError::Admin(AdminError::Unauthorized(_))));
    }
}
