//! Per-user entitlement record.

use serde::{Deserialize, Deserializer, Serialize};

use super::status::Language;
use crate::entitlement::DEFAULT_TRIAL_ALLOWANCE;

/// Entitlement state of one end user.
///
/// The record is keyed by [`UserId`](super::UserId) in the user store and does
/// not carry its own id. Field names on disk match the files written by the
/// first version of the bot, and every field falls back to its default when
/// missing, so partially written records load cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserRecord {
    /// Free content requests left. Negative values on disk are clamped to 0.
    #[serde(rename = "trial_left", deserialize_with = "non_negative")]
    pub trial_remaining: u32,
    /// Manual premium flag.
    #[serde(rename = "premium")]
    pub premium_active: bool,
    /// Unix seconds at which a time-boxed grant ends; 0 means no grant.
    pub premium_until: i64,
    /// Interface language.
    #[serde(rename = "lang", deserialize_with = "Language::deserialize_lenient")]
    pub language: Language,
    /// Number of counted content requests, including denied ones.
    #[serde(rename = "requests")]
    pub request_count: u64,
}

impl Default for UserRecord {
    fn default() -> Self {
        Self {
            trial_remaining: DEFAULT_TRIAL_ALLOWANCE,
            premium_active: false,
            premium_until: 0,
            language: Language::default(),
            request_count: 0,
        }
    }
}

/// Partial update merged into a record by [`UserRecord::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub trial_remaining: Option<u32>,
    pub premium_active: Option<bool>,
    pub premium_until: Option<i64>,
    pub language: Option<Language>,
    pub request_count: Option<u64>,
}

impl UserPatch {
    /// A patch that only changes the language.
    #[must_use]
    pub fn language(language: Language) -> Self {
        Self {
            language: Some(language),
            ..Self::default()
        }
    }
}

impl UserRecord {
    /// Merge the set fields of `patch` into this record.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(v) = patch.trial_remaining {
            self.trial_remaining = v;
        }
        if let Some(v) = patch.premium_active {
            self.premium_active = v;
        }
        if let Some(v) = patch.premium_until {
            self.premium_until = v;
        }
        if let Some(v) = patch.language {
            self.language = v;
        }
        if let Some(v) = patch.request_count {
            self.request_count = v;
        }
    }
}

fn non_negative<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(u32::try_from(raw.max(0)).unwrap_or(u32::MAX))
}
