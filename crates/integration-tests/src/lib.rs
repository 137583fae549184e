//! Integration tests for the `LoveSense` bot.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p lovesense-integration-tests
//! ```
//!
//! Every test gets its own temporary data directory and a [`ManualClock`],
//! so nothing touches the real stores and premium expiry can be exercised
//! by moving the clock.
//!
//! # Test Categories
//!
//! - `entitlements` - Trial consumption and premium expiry
//! - `admin_gate` - Authorization of every admin command
//! - `orders` - Manual payment claim lifecycle
//! - `http_api` - Status and admin routes through the axum router
//! - `persistence` - Store contents across reopen

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lovesense_bot::config::{PaymentConfig, StorageConfig};
use lovesense_bot::services::{AdminGate, AdminNotifier, NotifyError};
use lovesense_bot::state::AppState;
use lovesense_core::{ManualClock, Order, UserId};
use tempfile::TempDir;

/// Admin identity used by every test.
pub const ADMIN: UserId = UserId::new(935_939_738);

/// Start of every test clock (unix seconds).
pub const START: i64 = 1_760_000_000;

/// Records orders the admin would have been notified about.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notified: Mutex<Vec<(Order, String)>>,
}

impl RecordingNotifier {
    /// Orders notified so far, with the customer label.
    ///
    /// # Panics
    ///
    /// Panics if the lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn notified(&self) -> Vec<(Order, String)> {
        self.notified.lock().unwrap().clone()
    }
}

#[async_trait]
impl AdminNotifier for RecordingNotifier {
    #[allow(clippy::unwrap_used)]
    async fn order_created(&self, order: &Order, customer: &str) -> Result<(), NotifyError> {
        self.notified
            .lock()
            .unwrap()
            .push((order.clone(), customer.to_string()));
        Ok(())
    }
}

/// Opened stores over a temporary directory.
pub struct TestContext {
    pub dir: TempDir,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub state: AppState,
}

impl TestContext {
    /// Open fresh, empty stores.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub async fn new() -> Self {
        Self::with_files(|_| {}).await
    }

    /// Like [`new`](Self::new), running `setup` on the storage locations
    /// before the stores are opened.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[allow(clippy::unwrap_used)]
    pub async fn with_files(setup: impl FnOnce(&StorageConfig)) -> Self {
        let dir = TempDir::new().unwrap();
        setup(&storage_in(dir.path()));
        let clock = Arc::new(ManualClock::at(START));
        let notifier = Arc::new(RecordingNotifier::default());
        let state = open_state(dir.path(), Arc::clone(&clock), Arc::clone(&notifier)).await;
        Self {
            dir,
            clock,
            notifier,
            state,
        }
    }

    /// Open a second state over the same files, as a restarted process would.
    pub async fn reopen(&self) -> AppState {
        open_state(
            self.dir.path(),
            Arc::clone(&self.clock),
            Arc::clone(&self.notifier),
        )
        .await
    }

    /// Lines currently in the action log.
    #[must_use]
    pub fn audit_lines(&self) -> Vec<String> {
        std::fs::read_to_string(self.storage().actions_log())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Storage locations under the temporary directory.
    #[must_use]
    pub fn storage(&self) -> StorageConfig {
        storage_in(self.dir.path())
    }
}

fn storage_in(root: &Path) -> StorageConfig {
    StorageConfig {
        data_dir: root.join("data"),
        logs_dir: root.join("logs"),
    }
}

async fn open_state(
    root: &Path,
    clock: Arc<ManualClock>,
    notifier: Arc<RecordingNotifier>,
) -> AppState {
    AppState::open(
        &storage_in(root),
        AdminGate::new(ADMIN),
        PaymentConfig {
            card_number: Some("4400 0000 0000 0000".to_string()),
            card_owner: Some("A. G.".to_string()),
            ..PaymentConfig::default()
        },
        clock,
        notifier,
    )
    .await
}
