//! Admin authorization gate and privileged command execution.
//!
//! Every privileged operation, whichever surface it arrives from, goes
//! through [`AdminService::execute`]. A caller that is not the configured
//! admin is refused before anything is read or written, and the refusal is
//! recorded in the action log.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lovesense_core::{
    Actor, AdminCommand, AuditAction, AuditEntry, Language, MANUAL_PAYMENT_GRANT_DAYS, Order, OrderId,
    Stats, UserId,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::audit::AuditLog;
use crate::store::{OrderStore, StoreError};

use super::entitlement::EntitlementService;

/// Users shown in the admin user list.
pub const USER_LIST_LIMIT: usize = 100;
/// Orders shown in the admin order list.
pub const ORDER_LIST_LIMIT: usize = 50;
/// Log lines returned by the log view.
pub const LOG_TAIL_LINES: usize = 200;
/// Subject recorded for refused callers without a usable id.
const NO_SUBJECT: UserId = UserId::new(0);

/// Errors from admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The caller is not the configured admin.
    #[error("unauthorized: user {0} is not the admin")]
    Unauthorized(UserId),

    /// The caller gave no admin id, or one that is not a user id.
    #[error("unauthorized: missing or malformed admin id")]
    Unidentified,

    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Single-identity authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminGate {
    admin_id: UserId,
}

impl AdminGate {
    /// Create a gate for `admin_id`.
    #[must_use]
    pub const fn new(admin_id: UserId) -> Self {
        Self { admin_id }
    }

    /// The configured admin.
    #[must_use]
    pub const fn admin_id(&self) -> UserId {
        self.admin_id
    }

    /// Whether `actor` is the admin.
    #[must_use]
    pub fn is_admin(&self, actor: UserId) -> bool {
        actor == self.admin_id
    }
}

/// One row of the admin user list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    pub id: UserId,
    pub premium: bool,
    pub premium_until: i64,
    pub trial_remaining: u32,
    pub request_count: u64,
    pub language: Language,
}

/// Result of an approve or reject decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderDecision {
    pub order_id: OrderId,
    /// Owner of the order, if the order is known.
    pub user: Option<UserId>,
    /// Pending orders approved or removed. Zero means nothing happened.
    pub affected: usize,
    /// New premium expiry, set only when premium was granted.
    pub premium_until: Option<DateTime<Utc>>,
}

impl OrderDecision {
    const fn noop(order_id: OrderId, user: Option<UserId>) -> Self {
        Self {
            order_id,
            user,
            affected: 0,
            premium_until: None,
        }
    }
}

/// What a successful admin command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOutcome {
    Granted {
        user: UserId,
        days: u32,
        until: DateTime<Utc>,
    },
    Revoked {
        user: UserId,
    },
    Approved(OrderDecision),
    Rejected(OrderDecision),
    Purged {
        user: UserId,
        removed: usize,
    },
    Stats(Stats),
    /// First [`USER_LIST_LIMIT`] users plus the total count.
    Users {
        users: Vec<UserSummary>,
        total: usize,
    },
    /// Latest [`ORDER_LIST_LIMIT`] orders, newest first.
    Orders(Vec<Order>),
    /// Tail of the action log and the path of the full file.
    Logs {
        path: PathBuf,
        exists: bool,
        lines: Vec<String>,
    },
}

/// Executes [`AdminCommand`]s behind the [`AdminGate`].
#[derive(Debug, Clone)]
pub struct AdminService {
    gate: AdminGate,
    entitlements: EntitlementService,
    orders: Arc<OrderStore>,
    audit: Arc<AuditLog>,
}

impl AdminService {
    /// Create a new admin service.
    #[must_use]
    pub const fn new(
        gate: AdminGate,
        entitlements: EntitlementService,
        orders: Arc<OrderStore>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            gate,
            entitlements,
            orders,
            audit,
        }
    }

    /// The authorization gate.
    #[must_use]
    pub const fn gate(&self) -> &AdminGate {
        &self.gate
    }

    /// Check that `actor` is the admin, recording a refused attempt.
    ///
    /// `what` names the attempted operation in the action log.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` if `actor` is not the admin.
    pub async fn authorize(&self, actor: UserId, what: &str) -> Result<(), AdminError> {
        if self.gate.is_admin(actor) {
            return Ok(());
        }
        warn!(actor = %actor, command = what, "Unauthorized admin attempt");
        self.audit
            .record(AuditEntry::new(
                self.entitlements.now(),
                actor,
                AuditAction::UnauthorizedAttempt {
                    command: what.to_string(),
                },
                actor,
            ))
            .await;
        Err(AdminError::Unauthorized(actor))
    }

    /// Resolve and check a caller id exactly as it was sent.
    ///
    /// A missing or malformed id is refused and recorded like any other
    /// unauthorized attempt.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unidentified` if `raw` is not a user id, or
    /// `AdminError::Unauthorized` if it is not the admin.
    pub async fn authorize_caller(&self, raw: Option<&str>, what: &str) -> Result<UserId, AdminError> {
        if let Some(actor) = raw.and_then(|r| r.parse::<UserId>().ok()) {
            self.authorize(actor, what).await?;
            return Ok(actor);
        }
        warn!(admin_id = raw.unwrap_or("<missing>"), command = what, "Unidentified admin attempt");
        self.audit
            .record(AuditEntry::new(
                self.entitlements.now(),
                Actor::Anonymous,
                AuditAction::UnauthorizedAttempt {
                    command: what.to_string(),
                },
                NO_SUBJECT,
            ))
            .await;
        Err(AdminError::Unidentified)
    }

    /// Run `command` on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Unauthorized` (with no state change) if `actor`
    /// is not the admin, or `AdminError::Store` if persisting failed.
    #[instrument(skip(self), fields(command = command.name()))]
    pub async fn execute(
        &self,
        actor: UserId,
        command: AdminCommand,
    ) -> Result<AdminOutcome, AdminError> {
        self.authorize(actor, command.name()).await?;
        if command.is_mutating() {
            info!(actor = %actor, args = %command, "Admin command");
        }

        let outcome = match command {
            AdminCommand::Grant { user, days } => {
                let until = self.entitlements.grant_premium(user, days, actor).await?;
                AdminOutcome::Granted { user, days, until }
            }
            AdminCommand::Revoke(user) => {
                self.entitlements.revoke_premium(user, actor).await?;
                AdminOutcome::Revoked { user }
            }
            AdminCommand::Approve(order_id) => AdminOutcome::Approved(self.approve(actor, order_id).await?),
            AdminCommand::Reject(order_id) => AdminOutcome::Rejected(self.reject(actor, order_id).await?),
            AdminCommand::PurgeOrders(user) => {
                let removed = self.orders.remove_all_for_user(user).await?;
                if removed > 0 {
                    self.audit
                        .record(AuditEntry::new(
                            self.entitlements.now(),
                            actor,
                            AuditAction::OrdersPurged { removed },
                            user,
                        ))
                        .await;
                }
                AdminOutcome::Purged { user, removed }
            }
            AdminCommand::Stats => AdminOutcome::Stats(self.entitlements.stats().await),
            AdminCommand::ListUsers => self.list_users().await,
            AdminCommand::ListOrders => {
                let mut orders = self.orders.list().await;
                orders.reverse();
                orders.truncate(ORDER_LIST_LIMIT);
                AdminOutcome::Orders(orders)
            }
            AdminCommand::ViewLogs => AdminOutcome::Logs {
                path: self.audit.path().to_path_buf(),
                exists: self.audit.exists().await,
                lines: self.audit.read_recent(LOG_TAIL_LINES).await?,
            },
        };
        Ok(outcome)
    }

    /// Approve a claim: grant the manual-payment period, then mark the
    /// owner's pending orders approved. A no-op when nothing is pending.
    ///
    /// The orders stay pending until the grant is persisted, so a failed
    /// approval can be retried.
    async fn approve(&self, actor: UserId, order_id: OrderId) -> Result<OrderDecision, AdminError> {
        let Some(order) = self.orders.get(&order_id).await else {
            info!(order_id = %order_id, "Approve for unknown order ignored");
            return Ok(OrderDecision::noop(order_id, None));
        };
        let user = order.user_id;

        if self.orders.pending_for_user(user).await.is_empty() {
            info!(order_id = %order_id, user_id = %user, "No pending orders to approve");
            return Ok(OrderDecision::noop(order_id, Some(user)));
        }

        let until = self
            .entitlements
            .grant_premium(user, MANUAL_PAYMENT_GRANT_DAYS, actor)
            .await?;
        let approved = self.orders.approve_pending_for_user(user).await?;
        self.audit
            .record(AuditEntry::new(
                self.entitlements.now(),
                actor,
                AuditAction::OrderApproved {
                    order_id: order_id.to_string(),
                },
                user,
            ))
            .await;
        info!(order_id = %order_id, user_id = %user, approved, "Payment approved");

        Ok(OrderDecision {
            order_id,
            user: Some(user),
            affected: approved,
            premium_until: Some(until),
        })
    }

    /// Reject a claim: drop the owner's pending orders. Entitlements are
    /// not touched. A no-op when nothing is pending.
    async fn reject(&self, actor: UserId, order_id: OrderId) -> Result<OrderDecision, AdminError> {
        let Some(order) = self.orders.get(&order_id).await else {
            info!(order_id = %order_id, "Reject for unknown order ignored");
            return Ok(OrderDecision::noop(order_id, None));
        };
        let user = order.user_id;

        let removed = self.orders.remove_pending_for_user(user).await?;
        if removed > 0 {
            self.audit
                .record(AuditEntry::new(
                    self.entitlements.now(),
                    actor,
                    AuditAction::OrdersRejected { removed },
                    user,
                ))
                .await;
            info!(order_id = %order_id, user_id = %user, removed, "Payment rejected");
        }

        Ok(OrderDecision {
            order_id,
            user: Some(user),
            affected: removed,
            premium_until: None,
        })
    }

    async fn list_users(&self) -> AdminOutcome {
        let now = self.entitlements.now().timestamp();
        let all = self.entitlements.users().all().await;
        let total = all.len();
        let users = all
            .into_iter()
            .take(USER_LIST_LIMIT)
            .map(|(id, record)| UserSummary {
                id,
                premium: record.is_premium(now),
                premium_until: record.premium_until,
                trial_remaining: record.trial_remaining,
                request_count: record.request_count,
                language: record.language,
            })
            .collect();
        AdminOutcome::Users { users, total }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::UserStore;
    use lovesense_core::{ManualClock, OrderStatus};

    const ADMIN: UserId = UserId::new(1);
    const INTRUDER: UserId = UserId::new(666);

    struct Fixture {
        _dir: tempfile::TempDir,
        users: Arc<UserStore>,
        orders: Arc<OrderStore>,
        audit: Arc<AuditLog>,
        service: AdminService,
    }

    async fn fixture() -> Fixture {
        fixture_in(tempfile::tempdir().unwrap()).await
    }

    async fn fixture_in(dir: tempfile::TempDir) -> Fixture {
        let users = Arc::new(UserStore::open(dir.path().join("users.json")).await);
        let orders = Arc::new(OrderStore::open(dir.path().join("orders.json")).await);
        let audit = Arc::new(AuditLog::new(dir.path().join("actions.log")));
        let clock = Arc::new(ManualClock::at(1_760_000_000));
        let entitlements = EntitlementService::new(Arc::clone(&users), Arc::clone(&audit), clock);
        let service = AdminService::new(
            AdminGate::new(ADMIN),
            entitlements,
            Arc::clone(&orders),
            Arc::clone(&audit),
        );
        Fixture {
            _dir: dir,
            users,
            orders,
            audit,
            service,
        }
    }

    fn order_for(user: u64) -> Order {
        Order::new(UserId::new(user), Utc::now())
    }

    #[tokio::test]
    async fn test_non_admin_is_refused_without_side_effects() {
        let f = fixture().await;
        let order = f.orders.append(order_for(5)).await.unwrap();

        for command in [
            AdminCommand::grant(INTRUDER),
            AdminCommand::Revoke(UserId::new(5)),
            AdminCommand::Approve(order.id.clone()),
            AdminCommand::Reject(order.id.clone()),
            AdminCommand::PurgeOrders(UserId::new(5)),
            AdminCommand::Stats,
            AdminCommand::ViewLogs,
        ] {
            let err = f.service.execute(INTRUDER, command).await.unwrap_err();
            assert!(matches!(err, AdminError::Unauthorized(id) if id == INTRUDER));
        }

        assert!(f.users.is_empty().await);
        assert_eq!(f.orders.list_pending().await, vec![order]);

        let lines = f.audit.read_recent(100).await.unwrap();
        assert_eq!(lines.len(), 7);
        assert!(lines.iter().all(|l| l.contains("unauthorized_attempt subject=666")));
    }

    #[tokio::test]
    async fn test_admin_grant_and_revoke() {
        let f = fixture().await;
        let outcome = f
            .service
            .execute(ADMIN, AdminCommand::Grant { user: UserId::new(5), days: 10 })
            .await
            .unwrap();
        assert!(matches!(outcome, AdminOutcome::Granted { days: 10, .. }));
        assert!(f.users.peek(UserId::new(5)).await.unwrap().premium_active);

        f.service
            .execute(ADMIN, AdminCommand::Revoke(UserId::new(5)))
            .await
            .unwrap();
        let record = f.users.peek(UserId::new(5)).await.unwrap();
        assert!(!record.premium_active);
        assert_eq!(record.premium_until, 0);
    }

    #[tokio::test]
    async fn test_approve_marks_orders_and_grants_once() {
        let f = fixture().await;
        let first = f.orders.append(order_for(5)).await.unwrap();
        f.orders.append(order_for(5)).await.unwrap();
        f.orders.append(order_for(6)).await.unwrap();

        let AdminOutcome::Approved(decision) = f
            .service
            .execute(ADMIN, AdminCommand::Approve(first.id.clone()))
            .await
            .unwrap()
        else {
            panic!("expected approval");
        };
        assert_eq!(decision.affected, 2);
        assert_eq!(decision.user, Some(UserId::new(5)));
        assert!(decision.premium_until.is_some());
        assert_eq!(
            f.orders.get(&first.id).await.unwrap().status,
            OrderStatus::Approved
        );
        assert_eq!(f.orders.pending_for_user(UserId::new(6)).await.len(), 1);

        let until = f.users.peek(UserId::new(5)).await.unwrap().premium_until;

        // Second click on the same notification.
        let AdminOutcome::Approved(again) = f
            .service
            .execute(ADMIN, AdminCommand::Approve(first.id))
            .await
            .unwrap()
        else {
            panic!("expected approval");
        };
        assert_eq!(again.affected, 0);
        assert!(again.premium_until.is_none());
        assert_eq!(f.users.peek(UserId::new(5)).await.unwrap().premium_until, until);
    }

    #[tokio::test]
    async fn test_failed_grant_leaves_order_pending() {
        let dir = tempfile::tempdir().unwrap();
        // A directory in place of users.json makes every user write fail.
        let users_path = dir.path().join("users.json");
        std::fs::create_dir(&users_path).unwrap();
        std::fs::write(users_path.join("keep"), b"x").unwrap();
        let f = fixture_in(dir).await;
        let order = f.orders.append(order_for(5)).await.unwrap();

        let err = f
            .service
            .execute(ADMIN, AdminCommand::Approve(order.id.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Store(_)));
        assert!(f.orders.get(&order.id).await.unwrap().is_pending());
        assert!(f.users.peek(UserId::new(5)).await.is_none());

        let lines = f.audit.read_recent(10).await.unwrap();
        assert!(lines.iter().all(|l| !l.contains("order_approved")));
    }

    #[tokio::test]
    async fn test_caller_without_usable_id_is_recorded() {
        let f = fixture().await;
        for raw in [None, Some("hacker"), Some(""), Some("-1")] {
            let err = f.service.authorize_caller(raw, "stats").await.unwrap_err();
            assert!(matches!(err, AdminError::Unidentified));
        }
        let err = f.service.authorize_caller(Some("666"), "stats").await.unwrap_err();
        assert!(matches!(err, AdminError::Unauthorized(id) if id == INTRUDER));
        assert_eq!(f.service.authorize_caller(Some(" 1 "), "stats").await.unwrap(), ADMIN);

        let lines = f.audit.read_recent(10).await.unwrap();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines.iter().filter(|l| l.contains("actor=anonymous command=stats")).count(),
            4
        );
    }

    #[tokio::test]
    async fn test_reject_removes_only_that_users_pending_orders() {
        let f = fixture().await;
        let target = f.orders.append(order_for(5)).await.unwrap();
        f.orders.append(order_for(5)).await.unwrap();
        let other = f.orders.append(order_for(6)).await.unwrap();

        let AdminOutcome::Rejected(decision) = f
            .service
            .execute(ADMIN, AdminCommand::Reject(target.id.clone()))
            .await
            .unwrap()
        else {
            panic!("expected rejection");
        };
        assert_eq!(decision.affected, 2);
        assert_eq!(f.orders.list().await, vec![other]);
        assert!(f.users.peek(UserId::new(5)).await.is_none());

        // Rejecting again is a no-op, not an error.
        let AdminOutcome::Rejected(again) = f
            .service
            .execute(ADMIN, AdminCommand::Reject(target.id))
            .await
            .unwrap()
        else {
            panic!("expected rejection");
        };
        assert_eq!(again.affected, 0);
    }

    #[tokio::test]
    async fn test_purge_and_listings() {
        let f = fixture().await;
        let old = f.orders.append(order_for(5)).await.unwrap();
        let new = f.orders.append(order_for(6)).await.unwrap();
        f.service.execute(ADMIN, AdminCommand::grant(UserId::new(6))).await.unwrap();

        let AdminOutcome::Orders(orders) = f.service.execute(ADMIN, AdminCommand::ListOrders).await.unwrap() else {
            panic!("expected orders");
        };
        assert_eq!(orders.first().map(|o| &o.id), Some(&new.id));
        assert_eq!(orders.last().map(|o| &o.id), Some(&old.id));

        let AdminOutcome::Users { users, total } =
            f.service.execute(ADMIN, AdminCommand::ListUsers).await.unwrap()
        else {
            panic!("expected users");
        };
        assert_eq!(total, 1);
        assert!(users[0].premium);

        let outcome = f
            .service
            .execute(ADMIN, AdminCommand::PurgeOrders(UserId::new(5)))
            .await
            .unwrap();
        assert_eq!(outcome, AdminOutcome::Purged { user: UserId::new(5), removed: 1 });
        assert_eq!(f.orders.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_view_logs() {
        let f = fixture().await;
        f.service.execute(ADMIN, AdminCommand::grant(UserId::new(9))).await.unwrap();
        let AdminOutcome::Logs { exists, lines, .. } =
            f.service.execute(ADMIN, AdminCommand::ViewLogs).await.unwrap()
        else {
            panic!("expected logs");
        };
        assert!(exists);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("grant_premium subject=9 actor=1 days=30"));
    }
}
