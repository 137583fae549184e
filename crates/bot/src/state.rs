//! Application state shared across handlers.

use std::sync::Arc;

use lovesense_core::Clock;

use crate::audit::AuditLog;
use crate::config::{PaymentConfig, StorageConfig};
use crate::services::{
    ActionService, AdminGate, AdminNotifier, AdminService, EntitlementService, OrderService,
};
use crate::store::{OrderStore, StoreError, UserStore};

/// Application state shared by the HTTP API and the chat transport.
///
/// Cheaply cloneable via `Arc`. Stores are opened once and shared, so both
/// front ends serialize their writes through the same locks.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    users: Arc<UserStore>,
    orders: Arc<OrderStore>,
    audit: Arc<AuditLog>,
    entitlements: EntitlementService,
    admin: AdminService,
    actions: ActionService,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("users", &self.inner.users.path())
            .field("orders", &self.inner.orders.path())
            .field("audit", &self.inner.audit.path())
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Open the stores under `storage` and wire up the services.
    ///
    /// Unreadable store files start empty (a corrupt file is backed up
    /// first), so this never fails.
    pub async fn open(
        storage: &StorageConfig,
        gate: AdminGate,
        payment: PaymentConfig,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn AdminNotifier>,
    ) -> Self {
        let users = Arc::new(UserStore::open(storage.users_file()).await);
        let orders = Arc::new(OrderStore::open(storage.orders_file()).await);
        let audit = Arc::new(AuditLog::new(storage.actions_log()));

        let entitlements = EntitlementService::new(Arc::clone(&users), Arc::clone(&audit), clock);
        let order_service = OrderService::new(
            Arc::clone(&orders),
            entitlements.clone(),
            Arc::clone(&audit),
            notifier,
        );
        let admin = AdminService::new(
            gate,
            entitlements.clone(),
            Arc::clone(&orders),
            Arc::clone(&audit),
        );
        let actions = ActionService::new(
            entitlements.clone(),
            order_service,
            admin.clone(),
            Arc::clone(&audit),
            payment,
        );

        tracing::info!(
            users = users.len().await,
            orders = orders.list().await.len(),
            "Stores loaded"
        );

        Self {
            inner: Arc::new(AppStateInner {
                users,
                orders,
                audit,
                entitlements,
                admin,
                actions,
            }),
        }
    }

    /// Get a reference to the user store.
    #[must_use]
    pub fn users(&self) -> &UserStore {
        &self.inner.users
    }

    /// Get a reference to the order store.
    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.inner.orders
    }

    /// Get a reference to the action log.
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.inner.audit
    }

    /// Get a reference to the entitlement service.
    #[must_use]
    pub fn entitlements(&self) -> &EntitlementService {
        &self.inner.entitlements
    }

    /// Get a reference to the admin service.
    #[must_use]
    pub fn admin(&self) -> &AdminService {
        &self.inner.admin
    }

    /// Get a reference to the chat action service.
    #[must_use]
    pub fn actions(&self) -> &ActionService {
        &self.inner.actions
    }

    /// Write both stores to disk.
    ///
    /// # Errors
    ///
    /// Returns the first `StoreError` encountered; the other store is still
    /// attempted.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let users = self.inner.users.flush().await;
        let orders = self.inner.orders.flush().await;
        users.and(orders)
    }
}
