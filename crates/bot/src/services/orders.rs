//! Manual payment claims.

use std::sync::Arc;

use async_trait::async_trait;
use lovesense_core::{AuditAction, AuditEntry, Order, UserId};
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::audit::AuditLog;
use crate::store::{OrderStore, StoreError};

use super::entitlement::EntitlementService;

/// Failure to deliver an admin notification.
#[derive(Debug, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Alerts the admin about new payment claims.
#[async_trait]
pub trait AdminNotifier: Send + Sync {
    /// Called once per newly created order. `customer` is a display name
    /// for the claiming user.
    async fn order_created(&self, order: &Order, customer: &str) -> Result<(), NotifyError>;
}

/// Notifier that drops everything. Used where no chat transport runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl AdminNotifier for NoopNotifier {
    async fn order_created(&self, _order: &Order, _customer: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Result of a payment claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// A new order was recorded and the admin was told about it.
    Created(Order),
    /// The user already has an order awaiting a decision.
    AlreadyPending(Order),
}

impl Claim {
    /// The order the claim refers to.
    #[must_use]
    pub const fn order(&self) -> &Order {
        match self {
            Self::Created(order) | Self::AlreadyPending(order) => order,
        }
    }
}

/// Records payment claims and notifies the admin.
#[derive(Clone)]
pub struct OrderService {
    orders: Arc<OrderStore>,
    entitlements: EntitlementService,
    audit: Arc<AuditLog>,
    notifier: Arc<dyn AdminNotifier>,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("orders", &self.orders)
            .finish_non_exhaustive()
    }
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub fn new(
        orders: Arc<OrderStore>,
        entitlements: EntitlementService,
        audit: Arc<AuditLog>,
        notifier: Arc<dyn AdminNotifier>,
    ) -> Self {
        Self {
            orders,
            entitlements,
            audit,
            notifier,
        }
    }

    /// The underlying order store.
    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.orders
    }

    /// Record that `user` claims to have paid.
    ///
    /// A second claim while one is still pending returns the existing order
    /// and does not notify again. A failed notification is logged; the
    /// order stays recorded.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the order could not be persisted.
    #[instrument(skip(self, customer), fields(user_id = %user))]
    pub async fn claim_payment(&self, user: UserId, customer: &str) -> Result<Claim, StoreError> {
        let (order, created) = self
            .orders
            .append_unless_pending(Order::new(user, self.entitlements.now()))
            .await?;
        if !created {
            info!(order_id = %order.id, "Payment claim already pending");
            return Ok(Claim::AlreadyPending(order));
        }
        info!(order_id = %order.id, "Payment claim recorded");
        self.audit
            .record(AuditEntry::new(
                order.created_at,
                user,
                AuditAction::OrderCreated {
                    order_id: order.id.to_string(),
                },
                user,
            ))
            .await;

        if let Err(e) = self.notifier.order_created(&order, customer).await {
            error!(order_id = %order.id, error = %e, "Failed to notify admin");
        }
        Ok(Claim::Created(order))
    }
}
