//! Audit log entries.
//!
//! An [`AuditEntry`] is written once and never changed. Its [`Display`]
//! form is the line format of the on-disk action log:
//!
//! ```text
//! 2026-10-18T09:30:00Z grant_premium subject=42 actor=935939738 days=30
//! ```
//!
//! [`Display`]: std::fmt::Display

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::status::{ContentKind, Language, PremiumKind};

/// Who performed an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Actor {
    /// An end user or the admin acting through a chat or HTTP surface.
    User(UserId),
    /// The operator CLI or internal maintenance.
    System,
    /// A caller that did not present a usable user id.
    Anonymous,
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(id) => write!(f, "{id}"),
            Self::System => f.write_str("system"),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}

impl From<UserId> for Actor {
    fn from(id: UserId) -> Self {
        Self::User(id)
    }
}

/// A state-changing (or refused) event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuditAction {
    /// First interaction created the user record.
    UserCreated,
    /// User picked an interface language.
    LanguageChanged { language: Language },
    /// Free content was served against trial or premium.
    ContentServed { kind: ContentKind },
    /// Free content was refused because the trial is used up.
    TrialExhausted { kind: ContentKind },
    /// Premium-only content was served.
    PremiumContentServed { kind: PremiumKind },
    /// A time-boxed premium grant.
    PremiumGranted { days: u32 },
    /// Premium removed.
    PremiumRevoked,
    /// A manual payment claim was recorded.
    OrderCreated { order_id: String },
    /// A pending claim was approved.
    OrderApproved { order_id: String },
    /// Pending claims for the subject were rejected and removed.
    OrdersRejected { removed: usize },
    /// All claims for the subject were removed by an operator.
    OrdersPurged { removed: usize },
    /// A non-admin tried a privileged command.
    UnauthorizedAttempt { command: String },
}

impl AuditAction {
    /// Stable snake-case name of the action.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::UserCreated => "user_created",
            Self::LanguageChanged { .. } => "language_changed",
            Self::ContentServed { .. } => "content_served",
            Self::TrialExhausted { .. } => "trial_exhausted",
            Self::PremiumContentServed { .. } => "premium_content_served",
            Self::PremiumGranted { .. } => "grant_premium",
            Self::PremiumRevoked => "revoke_premium",
            Self::OrderCreated { .. } => "manual_order",
            Self::OrderApproved { .. } => "order_approved",
            Self::OrdersRejected { .. } => "orders_rejected",
            Self::OrdersPurged { .. } => "orders_purged",
            Self::UnauthorizedAttempt { .. } => "unauthorized_attempt",
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            Self::UserCreated | Self::PremiumRevoked => None,
            Self::LanguageChanged { language } => Some(format!("lang={language}")),
            Self::ContentServed { kind } | Self::TrialExhausted { kind } => {
                Some(format!("kind={}", kind.key()))
            }
            Self::PremiumContentServed { kind } => Some(format!("kind={}", kind.key())),
            Self::PremiumGranted { days } => Some(format!("days={days}")),
            Self::OrderCreated { order_id } | Self::OrderApproved { order_id } => {
                Some(format!("order={order_id}"))
            }
            Self::OrdersRejected { removed } | Self::OrdersPurged { removed } => {
                Some(format!("removed={removed}"))
            }
            Self::UnauthorizedAttempt { command } => Some(format!("command={command}")),
        }
    }
}

/// One line of the action log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub at: DateTime<Utc>,
    pub actor: Actor,
    #[serde(flatten)]
    pub action: AuditAction,
    /// Id of the user the action applies to.
    pub subject: UserId,
}

impl AuditEntry {
    /// Create an entry.
    #[must_use]
    pub fn new(at: DateTime<Utc>, actor: impl Into<Actor>, action: AuditAction, subject: UserId) -> Self {
        Self {
            at,
            actor: actor.into(),
            action,
            subject,
        }
    }
}

impl std::fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} subject={} actor={}",
            self.at.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.action.name(),
            self.subject,
            self.actor
        )?;
        if let Some(detail) = self.action.detail() {
            write!(f, " {detail}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_760_779_800, 0).unwrap()
    }

    #[test]
    fn test_entry_line_format() {
        let entry = AuditEntry::new(
            at(),
            UserId::new(1),
            AuditAction::PremiumGranted { days: 30 },
            UserId::new(42),
        );
        assert_eq!(
            entry.to_string(),
            "2025-10-18T09:30:00Z grant_premium subject=42 actor=1 days=30"
        );
    }

    #[test]
    fn test_entry_without_detail() {
        let entry = AuditEntry::new(at(), Actor::System, AuditAction::PremiumRevoked, UserId::new(7));
        assert_eq!(
            entry.to_string(),
            "2025-10-18T09:30:00Z revoke_premium subject=7 actor=system"
        );
    }

    #[test]
    fn test_unauthorized_attempt_detail() {
        let entry = AuditEntry::new(
            at(),
            UserId::new(5),
            AuditAction::UnauthorizedAttempt {
                command: "grant".to_string(),
            },
            UserId::new(5),
        );
        assert!(entry.to_string().ends_with("unauthorized_attempt subject=5 actor=5 command=grant"));
    }

    #[test]
    fn test_anonymous_actor() {
        let entry = AuditEntry::new(
            at(),
            Actor::Anonymous,
            AuditAction::UnauthorizedAttempt {
                command: "stats".to_string(),
            },
            UserId::new(0),
        );
        assert!(entry.to_string().ends_with("subject=0 actor=anonymous command=stats"));
    }
}
