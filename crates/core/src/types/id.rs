//! Newtype IDs for type-safe entity references.
//!
//! [`UserId`] wraps the numeric chat identity and [`OrderId`] wraps the
//! time-derived order key, so the two can never be mixed up at call sites.

use core::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Errors that can occur when parsing an id from text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdParseError {
    /// The input string is empty.
    #[error("id cannot be empty")]
    Empty,
    /// The input is not a non-negative integer.
    #[error("invalid user id: {0}")]
    InvalidUserId(String),
    /// The input contains characters not allowed in an order id.
    #[error("invalid order id: {0}")]
    InvalidOrderId(String),
}

/// Identity of a chat user.
///
/// Serialized as a string (so it can key a JSON object), but accepts both
/// strings and integers when deserializing since older data files used both.
///
/// # Example
///
/// ```rust
/// # use lovesense_core::UserId;
/// let id: UserId = "935939738".parse().unwrap();
/// assert_eq!(id, UserId::new(935_939_738));
/// assert_eq!(id.to_string(), "935939738");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId(u64);

impl UserId {
    /// Create a new ID from a u64 value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying u64 value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<UserId> for u64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl FromStr for UserId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdParseError::Empty);
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| IdParseError::InvalidUserId(trimmed.to_owned()))
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct UserIdVisitor;

        impl Visitor<'_> for UserIdVisitor {
            type Value = UserId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a user id as a string or non-negative integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<UserId, E> {
                Ok(UserId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<UserId, E> {
                u64::try_from(v)
                    .map(UserId)
                    .map_err(|_| E::custom(format!("negative user id: {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<UserId, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(UserIdVisitor)
    }
}

/// Identifier of a manual payment order.
///
/// New ids are `man_` followed by a UUIDv7, which keeps them unique and
/// sortable by creation time. Any non-empty token is accepted when loading
/// so orders written by earlier versions (`man_<unix-seconds>`) stay readable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(String);

impl OrderId {
    const PREFIX: &'static str = "man_";

    /// Generate a fresh, time-ordered order id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("{}{}", Self::PREFIX, Uuid::now_v7().simple()))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(IdParseError::Empty);
        }
        // Order ids travel inside callback data and URL paths.
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IdParseError::InvalidOrderId(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }
}
