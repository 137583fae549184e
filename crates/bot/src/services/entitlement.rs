//! Entitlement service: the store-backed side of the trial/premium rules.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lovesense_core::{
    Access, Actor, AuditAction, AuditEntry, Clock, ContentKind, Language, Stats, UserId, UserPatch,
    UserRecord,
};
use tracing::{debug, info, instrument};

use crate::audit::AuditLog;
use crate::store::{StoreError, UserStore};

/// Reads and mutates user entitlements, mirroring changes to the action log.
#[derive(Debug, Clone)]
pub struct EntitlementService {
    users: Arc<UserStore>,
    audit: Arc<AuditLog>,
    clock: Arc<dyn Clock>,
}

impl EntitlementService {
    /// Create a new entitlement service.
    #[must_use]
    pub fn new(users: Arc<UserStore>, audit: Arc<AuditLog>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            audit,
            clock,
        }
    }

    /// Current time according to the service clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The underlying user store.
    #[must_use]
    pub fn users(&self) -> &UserStore {
        &self.users
    }

    /// Load a user, creating the default record on first contact.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a new record could not be persisted.
    pub async fn ensure_user(&self, id: UserId) -> Result<UserRecord, StoreError> {
        let (record, created) = self.users.get_or_create(id).await?;
        if created {
            info!(user_id = %id, "New user");
            self.audit
                .record(AuditEntry::new(self.now(), id, AuditAction::UserCreated, id))
                .await;
        }
        Ok(record)
    }

    /// Whether `id` is premium right now. Unknown users are not.
    pub async fn is_premium(&self, id: UserId) -> bool {
        let now = self.clock.unix();
        self.users
            .peek(id)
            .await
            .is_some_and(|record| record.is_premium(now))
    }

    /// Gate a free content request, consuming trial if needed.
    ///
    /// The request is counted whether or not it is allowed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the updated record could not be persisted.
    #[instrument(skip(self), fields(user_id = %id, kind = kind.key()))]
    pub async fn consume_or_allow(
        &self,
        id: UserId,
        kind: ContentKind,
    ) -> Result<(Access, UserRecord), StoreError> {
        let now = self.clock.unix();
        let (access, record) = self
            .users
            .update(id, |record| (record.consume_or_allow(now, true), record.clone()))
            .await?;

        let action = if access.is_allowed() {
            AuditAction::ContentServed { kind }
        } else {
            AuditAction::TrialExhausted { kind }
        };
        debug!(?access, requests = record.request_count, "Content request gated");
        self.audit
            .record(AuditEntry::new(self.now(), id, action, id))
            .await;
        Ok((access, record))
    }

    /// Grant premium for `days` from now. Returns the new expiry.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the updated record could not be persisted.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn grant_premium(
        &self,
        id: UserId,
        days: u32,
        actor: impl Into<Actor> + std::fmt::Debug,
    ) -> Result<DateTime<Utc>, StoreError> {
        let now = self.clock.unix();
        let until = self
            .users
            .update(id, |record| record.grant_premium(days, now))
            .await?;
        info!(days, until, "Premium granted");
        self.audit
            .record(AuditEntry::new(
                self.now(),
                actor,
                AuditAction::PremiumGranted { days },
                id,
            ))
            .await;
        Ok(DateTime::from_timestamp(until, 0).unwrap_or(DateTime::<Utc>::MAX_UTC))
    }

    /// Remove premium.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the updated record could not be persisted.
    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn revoke_premium(
        &self,
        id: UserId,
        actor: impl Into<Actor> + std::fmt::Debug,
    ) -> Result<(), StoreError> {
        self.users.update(id, UserRecord::revoke_premium).await?;
        info!("Premium revoked");
        self.audit
            .record(AuditEntry::new(
                self.now(),
                actor,
                AuditAction::PremiumRevoked,
                id,
            ))
            .await;
        Ok(())
    }

    /// Change the interface language.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the updated record could not be persisted.
    pub async fn set_language(
        &self,
        id: UserId,
        language: Language,
    ) -> Result<UserRecord, StoreError> {
        let record = self.users.upsert(id, UserPatch::language(language)).await?;
        self.audit
            .record(AuditEntry::new(
                self.now(),
                id,
                AuditAction::LanguageChanged { language },
                id,
            ))
            .await;
        Ok(record)
    }

    /// Dashboard counters.
    pub async fn stats(&self) -> Stats {
        let now = self.clock.unix();
        let users = self.users.all().await;
        Stats::collect(users.iter().map(|(_, record)| record), now)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use lovesense_core::{ManualClock, SECONDS_PER_DAY};

    const START: i64 = 1_760_000_000;

    struct Fixture {
        _dir: tempfile::TempDir,
        clock: Arc<ManualClock>,
        audit: Arc<AuditLog>,
        service: EntitlementService,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let users = Arc::new(UserStore::open(dir.path().join("users.json")).await);
        let audit = Arc::new(AuditLog::new(dir.path().join("actions.log")));
        let clock = Arc::new(ManualClock::at(START));
        let service = EntitlementService::new(users, Arc::clone(&audit), clock.clone());
        Fixture {
            _dir: dir,
            clock,
            audit,
            service,
        }
    }

    #[tokio::test]
    async fn test_trial_then_premium_scenario() {
        let f = fixture().await;
        let user = UserId::new(100);
        f.service.ensure_user(user).await.unwrap();

        let (access, record) = f.service.consume_or_allow(user, ContentKind::Mini).await.unwrap();
        assert_eq!(access, Access::Trial { remaining: 1 });
        assert_eq!(record.trial_remaining, 1);

        let (access, _) = f.service.consume_or_allow(user, ContentKind::Advice).await.unwrap();
        assert_eq!(access, Access::Trial { remaining: 0 });

        let (access, record) = f.service.consume_or_allow(user, ContentKind::Mini).await.unwrap();
        assert_eq!(access, Access::Exhausted);
        assert_eq!(record.trial_remaining, 0);
        assert_eq!(record.request_count, 3);

        f.service.grant_premium(user, 30, UserId::new(1)).await.unwrap();
        let (access, record) = f.service.consume_or_allow(user, ContentKind::Mini).await.unwrap();
        assert_eq!(access, Access::Premium);
        assert_eq!(record.trial_remaining, 0);
        assert_eq!(record.request_count, 4);
    }

    #[tokio::test]
    async fn test_premium_expires_with_clock() {
        let f = fixture().await;
        let user = UserId::new(5);
        let until = f.service.grant_premium(user, 30, UserId::new(1)).await.unwrap();
        assert_eq!(until.timestamp(), START + 30 * SECONDS_PER_DAY);
        assert!(f.service.is_premium(user).await);

        f.clock.advance(30 * SECONDS_PER_DAY - 1);
        assert!(f.service.is_premium(user).await);
        f.clock.advance(1);
        assert!(!f.service.is_premium(user).await);
    }

    #[tokio::test]
    async fn test_revoke() {
        let f = fixture().await;
        let user = UserId::new(5);
        f.service.grant_premium(user, 30, UserId::new(1)).await.unwrap();
        f.service.revoke_premium(user, UserId::new(1)).await.unwrap();
        assert!(!f.service.is_premium(user).await);
    }

    #[tokio::test]
    async fn test_mutations_are_audited() {
        let f = fixture().await;
        let user = UserId::new(8);
        f.service.ensure_user(user).await.unwrap();
        f.service.ensure_user(user).await.unwrap();
        f.service.set_language(user, Language::En).await.unwrap();
        f.service.grant_premium(user, 7, UserId::new(1)).await.unwrap();

        let lines = f.audit.read_recent(10).await.unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("user_created subject=8"));
        assert!(lines[1].contains("language_changed subject=8 actor=8 lang=en"));
        assert!(lines[2].contains("grant_premium subject=8 actor=1 days=7"));
    }

    #[tokio::test]
    async fn test_stats() {
        let f = fixture().await;
        f.service.ensure_user(UserId::new(1)).await.unwrap();
        f.service.grant_premium(UserId::new(2), 30, UserId::new(1)).await.unwrap();
        let stats = f.service.stats().await;
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.premium_active, 1);
        assert_eq!(stats.with_trial_left, 2);
    }
}
