//! Order store backed by `orders.json`.

use std::path::{Path, PathBuf};

use lovesense_core::{Order, OrderId, OrderStatus, UserId};
use tracing::instrument;

use super::StoreError;
use super::synced::SyncedFile;

/// Ordered collection of manual payment orders, oldest first.
#[derive(Debug)]
pub struct OrderStore {
    orders: SyncedFile<Vec<Order>>,
}

impl OrderStore {
    /// Open the store at `path`, loading whatever is on disk.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            orders: SyncedFile::open(path.into()).await,
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.orders.path()
    }

    /// Append a new order. Its status is forced to pending.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store could not be persisted.
    #[instrument(skip(self, order), fields(order_id = %order.id, user_id = %order.user_id))]
    pub async fn append(&self, mut order: Order) -> Result<Order, StoreError> {
        order.status = OrderStatus::Pending;
        let stored = order.clone();
        self.orders.write(move |orders| orders.push(order)).await?;
        Ok(stored)
    }

    /// Append `order` unless its user already has one pending.
    ///
    /// The check and the append happen under one lock. Returns the stored
    /// order and `true`, or the oldest existing pending order and `false`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store could not be persisted.
    #[instrument(skip(self, order), fields(order_id = %order.id, user_id = %order.user_id))]
    pub async fn append_unless_pending(&self, mut order: Order) -> Result<(Order, bool), StoreError> {
        order.status = OrderStatus::Pending;
        self.orders
            .write(move |orders| {
                if let Some(existing) = orders
                    .iter()
                    .find(|o| o.user_id == order.user_id && o.is_pending())
                {
                    return (existing.clone(), false);
                }
                orders.push(order.clone());
                (order, true)
            })
            .await
    }

    /// All orders, oldest first.
    pub async fn list(&self) -> Vec<Order> {
        self.orders.read(Clone::clone).await
    }

    /// Orders awaiting a decision, oldest first.
    pub async fn list_pending(&self) -> Vec<Order> {
        self.orders
            .read(|orders| orders.iter().filter(|o| o.is_pending()).cloned().collect())
            .await
    }

    /// Find an order by id.
    pub async fn get(&self, id: &OrderId) -> Option<Order> {
        self.orders
            .read(|orders| orders.iter().find(|o| &o.id == id).cloned())
            .await
    }

    /// Pending orders of one user.
    pub async fn pending_for_user(&self, user: UserId) -> Vec<Order> {
        self.orders
            .read(|orders| {
                orders
                    .iter()
                    .filter(|o| o.user_id == user && o.is_pending())
                    .cloned()
                    .collect()
            })
            .await
    }

    /// Set the status of the order with `id`. Returns whether it was found.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store could not be persisted.
    pub async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<bool, StoreError> {
        self.orders
            .write(|orders| {
                orders
                    .iter_mut()
                    .find(|o| &o.id == id)
                    .map(|o| o.status = status)
                    .is_some()
            })
            .await
    }

    /// Mark every pending order of `user` approved. Returns how many changed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store could not be persisted.
    pub async fn approve_pending_for_user(&self, user: UserId) -> Result<usize, StoreError> {
        self.orders
            .write(|orders| {
                let mut changed = 0;
                for order in orders
                    .iter_mut()
                    .filter(|o| o.user_id == user && o.is_pending())
                {
                    order.status = OrderStatus::Approved;
                    changed += 1;
                }
                changed
            })
            .await
    }

    /// Remove the pending orders of `user`. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store could not be persisted.
    pub async fn remove_pending_for_user(&self, user: UserId) -> Result<usize, StoreError> {
        self.retain(|o| !(o.user_id == user && o.is_pending())).await
    }

    /// Remove every order of `user`. Returns how many were removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store could not be persisted.
    pub async fn remove_all_for_user(&self, user: UserId) -> Result<usize, StoreError> {
        self.retain(|o| o.user_id != user).await
    }

    /// Rewrite the file from memory.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file could not be written.
    pub async fn flush(&self) -> Result<(), StoreError> {
        self.orders.flush().await
    }

    async fn retain(&self, keep: impl Fn(&Order) -> bool) -> Result<usize, StoreError> {
        self.orders
            .write(|orders| {
                let before = orders.len();
                orders.retain(|o| keep(o));
                before - orders.len()
            })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    async fn store() -> (tempfile::TempDir, OrderStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = OrderStore::open(dir.path().join("orders.json")).await;
        (dir, store)
    }

    #[tokio::test]
    async fn test_append_and_list_pending() {
        let (_dir, store) = store().await;
        let first = store.append(Order::new(UserId::new(1), at(100))).await.unwrap();
        store.append(Order::new(UserId::new(2), at(200))).await.unwrap();
        store.set_status(&first.id, OrderStatus::Approved).await.unwrap();

        let pending = store.list_pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].user_id, UserId::new(2));
        assert_eq!(store.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_append_forces_pending() {
        let (_dir, store) = store().await;
        let mut order = Order::new(UserId::new(1), at(100));
        order.status = OrderStatus::Rejected;
        let stored = store.append(order).await.unwrap();
        assert!(stored.is_pending());
    }

    #[tokio::test]
    async fn test_remove_pending_leaves_other_users_and_history() {
        let (_dir, store) = store().await;
        let approved = store.append(Order::new(UserId::new(1), at(1))).await.unwrap();
        store.set_status(&approved.id, OrderStatus::Approved).await.unwrap();
        store.append(Order::new(UserId::new(1), at(2))).await.unwrap();
        store.append(Order::new(UserId::new(1), at(3))).await.unwrap();
        let other = store.append(Order::new(UserId::new(2), at(4))).await.unwrap();

        assert_eq!(store.remove_pending_for_user(UserId::new(1)).await.unwrap(), 2);
        assert_eq!(store.remove_pending_for_user(UserId::new(1)).await.unwrap(), 0);

        let remaining = store.list().await;
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().any(|o| o.id == approved.id));
        assert!(remaining.iter().any(|o| o.id == other.id && o.is_pending()));
    }

    #[tokio::test]
    async fn test_remove_all_for_user() {
        let (_dir, store) = store().await;
        let first = store.append(Order::new(UserId::new(5), at(1))).await.unwrap();
        store.set_status(&first.id, OrderStatus::Approved).await.unwrap();
        store.append(Order::new(UserId::new(5), at(2))).await.unwrap();
        store.append(Order::new(UserId::new(6), at(3))).await.unwrap();

        assert_eq!(store.remove_all_for_user(UserId::new(5)).await.unwrap(), 2);
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_approve_pending_for_user() {
        let (_dir, store) = store().await;
        store.append(Order::new(UserId::new(5), at(1))).await.unwrap();
        store.append(Order::new(UserId::new(5), at(2))).await.unwrap();
        store.append(Order::new(UserId::new(6), at(3))).await.unwrap();

        assert_eq!(store.approve_pending_for_user(UserId::new(5)).await.unwrap(), 2);
        assert!(store.pending_for_user(UserId::new(5)).await.is_empty());
        assert_eq!(store.pending_for_user(UserId::new(6)).await.len(), 1);

        let reopened = OrderStore::open(store.path()).await;
        assert_eq!(reopened.list_pending().await.len(), 1);
    }

    #[tokio::test]
    async fn test_append_unless_pending() {
        let (_dir, store) = store().await;
        let (first, created) = store
            .append_unless_pending(Order::new(UserId::new(5), at(1)))
            .await
            .unwrap();
        assert!(created);

        let (existing, created) = store
            .append_unless_pending(Order::new(UserId::new(5), at(2)))
            .await
            .unwrap();
        assert!(!created);
        assert_eq!(existing.id, first.id);
        assert_eq!(store.list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_claims_store_one_order() {
        let (_dir, store) = store().await;
        let store = std::sync::Arc::new(store);
        let mut handles = Vec::new();
        for i in 0..10 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_unless_pending(Order::new(UserId::new(8), at(i)))
                    .await
                    .unwrap()
                    .1
            }));
        }
        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.pending_for_user(UserId::new(8)).await.len(), 1);
    }

    #[tokio::test]
    async fn test_sees_orders_written_by_another_process() {
        let (_dir, store) = store().await;
        let other = OrderStore::open(store.path()).await;
        let order = other.append(Order::new(UserId::new(3), at(1))).await.unwrap();

        assert_eq!(store.get(&order.id).await, Some(order.clone()));
        store.append(Order::new(UserId::new(4), at(2))).await.unwrap();

        let reopened = OrderStore::open(store.path()).await;
        assert_eq!(reopened.list().await.len(), 2);
    }

    #[tokio::test]
    async fn test_set_status_unknown_id() {
        let (_dir, store) = store().await;
        let found = store
            .set_status(&"man_missing".parse().unwrap(), OrderStatus::Approved)
            .await
            .unwrap();
        assert!(!found);
    }

    #[tokio::test]
    async fn test_loads_legacy_orders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");
        std::fs::write(
            &path,
            r#"[{"id":"man_1700000000","telegram_id":"42","timestamp":1700000000,"status":"pending"}]"#,
        )
        .unwrap();
        let store = OrderStore::open(&path).await;
        let pending = store.pending_for_user(UserId::new(42)).await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id.as_str(), "man_1700000000");
    }
}
