//! Manual payment order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{OrderId, UserId};
use super::status::OrderStatus;

/// A user's claim of having paid, awaiting admin verification.
///
/// Orders reference users by id only; no existence check is made against
/// the user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique, time-derived id.
    pub id: OrderId,
    /// The user who claimed the payment.
    #[serde(rename = "telegram_id")]
    pub user_id: UserId,
    /// When the claim was made (unix seconds on disk).
    #[serde(rename = "timestamp", with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    /// Current status.
    #[serde(default)]
    pub status: OrderStatus,
}

impl Order {
    /// Create a new pending order for `user_id`.
    #[must_use]
    pub fn new(user_id: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: OrderId::generate(),
            user_id,
            created_at,
            status: OrderStatus::Pending,
        }
    }

    /// Whether the order still awaits a decision.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.status, OrderStatus::Pending)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_is_pending() {
        let order = Order::new(UserId::new(5), Utc::now());
        assert!(order.is_pending());
        assert_eq!(order.user_id, UserId::new(5));
    }

    #[test]
    fn test_reads_legacy_order() {
        let json = r#"{"id":"man_1700000000","telegram_id":"42","timestamp":1700000000,"status":"pending"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.id.as_str(), "man_1700000000");
        assert_eq!(order.user_id, UserId::new(42));
        assert_eq!(order.created_at.timestamp(), 1_700_000_000);
        assert!(order.is_pending());
    }

    #[test]
    fn test_writes_unix_timestamp() {
        let order = Order::new(
            UserId::new(1),
            DateTime::from_timestamp(1_700_000_123, 0).unwrap(),
        );
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["timestamp"], 1_700_000_123);
        assert_eq!(value["telegram_id"], "1");
        assert_eq!(value["status"], "pending");
    }
}
