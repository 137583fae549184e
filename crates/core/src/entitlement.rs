//! Entitlement rules: trial consumption and premium activation.
//!
//! Everything here is pure. Callers pass the current time in unix seconds
//! and persist the mutated [`UserRecord`] themselves.
//!
//! # Premium
//!
//! A record is premium when it holds an unexpired time-boxed grant
//! (`premium_until > now`), or when the manual `premium_active` flag is set
//! and no time-boxed grant was ever recorded. A grant sets both fields, so
//! once its window closes the flag lapses with it.
//!
//! # Trial
//!
//! [`UserRecord::consume_or_allow`] is the gate in front of every free
//! content request. The request counter moves on every counted call, while
//! the trial allowance only moves when the call is allowed.

use serde::Serialize;

use crate::types::UserRecord;

/// Free requests granted to a new user.
pub const DEFAULT_TRIAL_ALLOWANCE: u32 = 2;

/// Seconds in one day of premium.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Premium days granted when an admin approves a manual payment.
pub const MANUAL_PAYMENT_GRANT_DAYS: u32 = 30;

/// Outcome of [`UserRecord::consume_or_allow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Allowed under premium; the trial was not touched.
    Premium,
    /// Allowed by spending one trial request.
    Trial {
        /// Trial requests left after this one.
        remaining: u32,
    },
    /// Denied: no premium and no trial left.
    Exhausted,
}

impl Access {
    /// Whether the request may proceed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        !matches!(self, Self::Exhausted)
    }
}

impl UserRecord {
    /// Whether the record is premium at `now` (unix seconds).
    #[must_use]
    pub const fn is_premium(&self, now: i64) -> bool {
        if self.premium_until > 0 {
            now < self.premium_until
        } else {
            self.premium_active
        }
    }

    /// Grant premium for `days` starting at `now`.
    ///
    /// Repeated grants restart from `now` rather than extending a prior
    /// expiry. Returns the new expiry in unix seconds.
    pub fn grant_premium(&mut self, days: u32, now: i64) -> i64 {
        self.premium_active = true;
        self.premium_until = now.saturating_add(i64::from(days).saturating_mul(SECONDS_PER_DAY));
        self.premium_until
    }

    /// Remove any premium entitlement.
    pub const fn revoke_premium(&mut self) {
        self.premium_active = false;
        self.premium_until = 0;
    }

    /// Decide whether a content request may proceed, consuming trial if needed.
    ///
    /// When `counts_as_usage` is set the request counter is incremented
    /// before the decision, so denied requests are counted too.
    pub const fn consume_or_allow(&mut self, now: i64, counts_as_usage: bool) -> Access {
        let premium = self.is_premium(now);
        if counts_as_usage {
            self.request_count = self.request_count.saturating_add(1);
        }
        if premium {
            return Access::Premium;
        }
        if self.trial_remaining == 0 {
            return Access::Exhausted;
        }
        self.trial_remaining -= 1;
        Access::Trial {
            remaining: self.trial_remaining,
        }
    }
}

/// Aggregate counters shown on the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Users with a record.
    pub total_users: usize,
    /// Users that are premium right now.
    pub premium_active: usize,
    /// Users with at least one trial request left.
    pub with_trial_left: usize,
}

impl Stats {
    /// Compute counters over `records` at `now`.
    #[must_use]
    pub fn collect<'a>(records: impl IntoIterator<Item = &'a UserRecord>, now: i64) -> Self {
        records.into_iter().fold(Self::default(), |mut acc, record| {
            acc.total_users += 1;
            if record.is_premium(now) {
                acc.premium_active += 1;
            }
            if record.trial_remaining > 0 {
                acc.with_trial_left += 1;
            }
            acc
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000;

    #[test]
    fn test_fresh_user_is_not_premium() {
        assert!(!UserRecord::default().is_premium(NOW));
    }

    #[test]
    fn test_manual_flag_without_grant_is_premium() {
        let record = UserRecord {
            premium_active: true,
            ..UserRecord::default()
        };
        assert!(record.is_premium(NOW));
        assert!(record.is_premium(NOW + 365 * SECONDS_PER_DAY));
    }

    #[test]
    fn test_grant_then_expiry() {
        let mut record = UserRecord::default();
        let until = record.grant_premium(30, NOW);
        assert_eq!(until, NOW + 30 * SECONDS_PER_DAY);
        assert!(record.is_premium(NOW));
        assert!(record.is_premium(until - 1));
        assert!(!record.is_premium(until));
        assert!(!record.is_premium(until + SECONDS_PER_DAY));
    }

    #[test]
    fn test_grant_restarts_from_now() {
        let mut record = UserRecord::default();
        record.grant_premium(30, NOW);
        let later = NOW + 10 * SECONDS_PER_DAY;
        let until = record.grant_premium(30, later);
        assert_eq!(until, later + 30 * SECONDS_PER_DAY);
    }

    #[test]
    fn test_revoke_clears_both_fields() {
        let mut record = UserRecord::default();
        record.grant_premium(30, NOW);
        record.revoke_premium();
        assert!(!record.premium_active);
        assert_eq!(record.premium_until, 0);
        assert!(!record.is_premium(NOW));
    }

    #[test]
    fn test_premium_never_touches_trial() {
        let mut record = UserRecord::default();
        record.grant_premium(1, NOW);
        for _ in 0..5 {
            assert_eq!(record.consume_or_allow(NOW, true), Access::Premium);
        }
        assert_eq!(record.trial_remaining, DEFAULT_TRIAL_ALLOWANCE);
        assert_eq!(record.request_count, 5);
    }

    #[test]
    fn test_exhausted_stays_at_zero() {
        let mut record = UserRecord {
            trial_remaining: 0,
            ..UserRecord::default()
        };
        assert_eq!(record.consume_or_allow(NOW, true), Access::Exhausted);
        assert_eq!(record.trial_remaining, 0);
        assert_eq!(record.request_count, 1);
    }

    #[test]
    fn test_trial_sequence_counts_every_call() {
        let mut record = UserRecord::default();
        assert_eq!(
            record.consume_or_allow(NOW, true),
            Access::Trial { remaining: 1 }
        );
        assert_eq!(
            record.consume_or_allow(NOW, true),
            Access::Trial { remaining: 0 }
        );
        assert_eq!(record.consume_or_allow(NOW, true), Access::Exhausted);
        assert_eq!(record.consume_or_allow(NOW, true), Access::Exhausted);
        assert_eq!(record.trial_remaining, 0);
        assert_eq!(record.request_count, 4);
    }

    #[test]
    fn test_uncounted_call_still_spends_trial() {
        let mut record = UserRecord::default();
        assert!(record.consume_or_allow(NOW, false).is_allowed());
        assert_eq!(record.request_count, 0);
        assert_eq!(record.trial_remaining, 1);
    }

    #[test]
    fn test_expired_grant_falls_back_to_trial() {
        let mut record = UserRecord {
            trial_remaining: 1,
            ..UserRecord::default()
        };
        let until = record.grant_premium(30, NOW);
        assert_eq!(record.consume_or_allow(until, true), Access::Trial { remaining: 0 });
        assert_eq!(record.consume_or_allow(until, true), Access::Exhausted);
    }

    #[test]
    fn test_premium_state_space() {
        // Walk grant/revoke/time-advance and compare against the definition.
        let expected = |r: &UserRecord, now: i64| {
            (r.premium_until > 0 && now < r.premium_until)
                || (r.premium_until == 0 && r.premium_active)
        };
        let mut record = UserRecord::default();
        let mut now = NOW;
        for step in 0..40_i64 {
            match step % 4 {
                0 => {
                    record.grant_premium(u32::try_from(step % 7).unwrap_or(1), now);
                }
                1 => now += 3 * SECONDS_PER_DAY,
                2 if step % 8 == 2 => record.revoke_premium(),
                _ => now += SECONDS_PER_DAY / 2,
            }
            assert_eq!(record.is_premium(now), expected(&record, now), "step {step}");
        }
    }

    #[test]
    fn test_stats_collect() {
        let mut premium = UserRecord::default();
        premium.grant_premium(30, NOW);
        let expired = UserRecord {
            premium_active: true,
            premium_until: NOW - 1,
            trial_remaining: 0,
            ..UserRecord::default()
        };
        let fresh = UserRecord::default();

        let stats = Stats::collect([&premium, &expired, &fresh], NOW);
        assert_eq!(
            stats,
            Stats {
                total_users: 3,
                premium_active: 1,
                with_trial_left: 2,
            }
        );
    }
}
