//! Status and option enums for users and orders.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Manual payment order status.
///
/// `Pending` is the only non-terminal state; an admin decision moves an
/// order to `Approved` (or removes it on rejection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl OrderStatus {
    /// Whether no further transition is allowed from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Interface language of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    #[default]
    Ru,
    Kz,
}

impl Language {
    /// All supported languages, in menu order.
    pub const ALL: [Self; 3] = [Self::En, Self::Ru, Self::Kz];

    /// Two-letter code used in callbacks and on disk.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
            Self::Kz => "kz",
        }
    }

    /// Human-readable label with flag, shown in the language menu.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::En => "🇬🇧 English",
            Self::Ru => "🇷🇺 Русский",
            Self::Kz => "🇰🇿 Қазақша",
        }
    }

    /// Deserialize a language, falling back to the default for unknown codes.
    ///
    /// # Errors
    ///
    /// Returns an error only if the value is not a string or null.
    pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = Option::<String>::deserialize(deserializer)?;
        Ok(code.and_then(|c| c.parse().ok()).unwrap_or_default())
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::En),
            "ru" => Ok(Self::Ru),
            "kz" => Ok(Self::Kz),
            _ => Err(format!("unsupported language: {s}")),
        }
    }
}

/// Free content available to trial and premium users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Short three-sentence personality sketch.
    Mini,
    /// Short compatibility analysis.
    Compatibility,
    /// Short actionable advice.
    Advice,
}

impl ContentKind {
    /// Callback key for this content.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Mini => "mini",
            Self::Compatibility => "compat",
            Self::Advice => "advice",
        }
    }
}

/// Content reserved for premium users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumKind {
    DeepPortrait,
    RelationshipPro,
    PartnerAnalysis,
}

impl PremiumKind {
    /// Callback key for this content.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::DeepPortrait => "deep_portrait",
            Self::RelationshipPro => "relationship_pro",
            Self::PartnerAnalysis => "partner",
        }
    }
}
