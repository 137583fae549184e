//! Typed inbound actions.
//!
//! Every surface (chat buttons, admin text messages, HTTP routes, the
//! operator CLI) is reduced to an [`Action`] or an [`AdminCommand`] before
//! anything touches the stores. The string forms here are the callback
//! payloads carried by chat buttons and the text commands typed by the
//! admin, e.g. `grant:935939738` or `approve:man_0192...`.

use std::fmt;
use std::str::FromStr;

use crate::entitlement::MANUAL_PAYMENT_GRANT_DAYS;
use crate::types::{ContentKind, IdParseError, Language, OrderId, PremiumKind, UserId};

/// Errors from parsing an action or admin command.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("missing argument for {0}")]
    MissingArgument(&'static str),
    #[error(transparent)]
    InvalidId(#[from] IdParseError),
    #[error("invalid day count: {0}")]
    InvalidDays(String),
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// A privileged operation. Every variant passes the admin gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    /// Grant time-boxed premium.
    Grant { user: UserId, days: u32 },
    /// Remove premium.
    Revoke(UserId),
    /// Approve the payment claim and grant premium to its user.
    Approve(OrderId),
    /// Reject the payment claim, dropping its user's pending orders.
    Reject(OrderId),
    /// Remove every order of a user regardless of status.
    PurgeOrders(UserId),
    Stats,
    ListUsers,
    ListOrders,
    ViewLogs,
}

impl AdminCommand {
    /// Grant with the default manual-payment period.
    #[must_use]
    pub const fn grant(user: UserId) -> Self {
        Self::Grant {
            user,
            days: MANUAL_PAYMENT_GRANT_DAYS,
        }
    }

    /// Short name used in logs and unauthorized-attempt records.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Grant { .. } => "grant",
            Self::Revoke(_) => "revoke",
            Self::Approve(_) => "approve",
            Self::Reject(_) => "reject",
            Self::PurgeOrders(_) => "purge",
            Self::Stats => "stats",
            Self::ListUsers => "users",
            Self::ListOrders => "orders",
            Self::ViewLogs => "logs",
        }
    }

    /// Whether the command changes stored state.
    #[must_use]
    pub const fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Grant { .. }
                | Self::Revoke(_)
                | Self::Approve(_)
                | Self::Reject(_)
                | Self::PurgeOrders(_)
        )
    }
}

impl fmt::Display for AdminCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Grant { user, days } if *days == MANUAL_PAYMENT_GRANT_DAYS => {
                write!(f, "grant:{user}")
            }
            Self::Grant { user, days } => write!(f, "grant:{user}:{days}"),
            Self::Revoke(user) | Self::PurgeOrders(user) => write!(f, "{}:{user}", self.name()),
            Self::Approve(order) | Self::Reject(order) => write!(f, "{}:{order}", self.name()),
            Self::Stats | Self::ListUsers | Self::ListOrders | Self::ViewLogs => {
                f.write_str(self.name())
            }
        }
    }
}

impl FromStr for AdminCommand {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, arg) = match s.split_once(':') {
            Some((verb, arg)) => (verb, Some(arg.trim())),
            None => (s, None),
        };
        let require = |name: &'static str| {
            arg.filter(|a| !a.is_empty())
                .ok_or(CommandParseError::MissingArgument(name))
        };

        match verb {
            "grant" => {
                let arg = require("grant")?;
                let (user, days) = match arg.split_once(':') {
                    Some((user, days)) => {
                        let days = days
                            .trim()
                            .parse::<u32>()
                            .map_err(|_| CommandParseError::InvalidDays(days.to_owned()))?;
                        (user, days)
                    }
                    None => (arg, MANUAL_PAYMENT_GRANT_DAYS),
                };
                Ok(Self::Grant {
                    user: user.parse()?,
                    days,
                })
            }
            "revoke" => Ok(Self::Revoke(require("revoke")?.parse()?)),
            "purge" => Ok(Self::PurgeOrders(require("purge")?.parse()?)),
            "approve" => Ok(Self::Approve(require("approve")?.parse()?)),
            "reject" => Ok(Self::Reject(require("reject")?.parse()?)),
            "stats" if arg.is_none() => Ok(Self::Stats),
            "users" if arg.is_none() => Ok(Self::ListUsers),
            "orders" if arg.is_none() => Ok(Self::ListOrders),
            "logs" if arg.is_none() => Ok(Self::ViewLogs),
            _ => Err(CommandParseError::Unknown(s.to_owned())),
        }
    }
}

/// Which id the admin is being asked to type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminPrompt {
    Grant,
    Revoke,
}

/// Anything a chat user can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start,
    LanguageMenu,
    SetLanguage(Language),
    /// Free content, gated by trial or premium.
    Content(ContentKind),
    PremiumMenu,
    /// Premium-only content.
    Premium(PremiumKind),
    Buy,
    CopyCard,
    /// "I paid": record a manual payment claim.
    ClaimPayment,
    Status,
    Back,
    AdminPanel,
    AdminManage,
    AdminPrompt(AdminPrompt),
    AdminBack,
    Admin(AdminCommand),
}

impl Action {
    /// Whether only the admin may perform this action.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(
            self,
            Self::AdminPanel
                | Self::AdminManage
                | Self::AdminPrompt(_)
                | Self::AdminBack
                | Self::Admin(_)
        )
    }
}

const SET_LANG_PREFIX: &str = "set_lang_";

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::LanguageMenu => f.write_str("lang"),
            Self::SetLanguage(lang) => write!(f, "{SET_LANG_PREFIX}{}", lang.code()),
            Self::Content(kind) => f.write_str(kind.key()),
            Self::PremiumMenu => f.write_str("premium"),
            Self::Premium(kind) => f.write_str(kind.key()),
            Self::Buy => f.write_str("buy"),
            Self::CopyCard => f.write_str("copy_card"),
            Self::ClaimPayment => f.write_str("i_paid"),
            Self::Status => f.write_str("status"),
            Self::Back => f.write_str("back"),
            Self::AdminPanel => f.write_str("admin_panel"),
            Self::AdminManage => f.write_str("adm_manage"),
            Self::AdminPrompt(AdminPrompt::Grant) => f.write_str("adm_grant_prompt"),
            Self::AdminPrompt(AdminPrompt::Revoke) => f.write_str("adm_revoke_prompt"),
            Self::AdminBack => f.write_str("adm_back"),
            Self::Admin(AdminCommand::Stats) => f.write_str("adm_stats"),
            Self::Admin(AdminCommand::ListUsers) => f.write_str("adm_users"),
            Self::Admin(AdminCommand::ListOrders) => f.write_str("adm_orders"),
            Self::Admin(AdminCommand::ViewLogs) => f.write_str("adm_logs"),
            Self::Admin(command) => write!(f, "{command}"),
        }
    }
}

impl FromStr for Action {
    type Err = CommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let action = match s {
            "start" => Self::Start,
            "lang" => Self::LanguageMenu,
            "mini" => Self::Content(ContentKind::Mini),
            "compat" => Self::Content(ContentKind::Compatibility),
            "advice" => Self::Content(ContentKind::Advice),
            "premium" => Self::PremiumMenu,
            "deep_portrait" => Self::Premium(PremiumKind::DeepPortrait),
            "relationship_pro" => Self::Premium(PremiumKind::RelationshipPro),
            "partner" => Self::Premium(PremiumKind::PartnerAnalysis),
            "buy" => Self::Buy,
            "copy_card" => Self::CopyCard,
            "i_paid" => Self::ClaimPayment,
            "status" => Self::Status,
            "back" => Self::Back,
            "admin_panel" => Self::AdminPanel,
            "adm_manage" => Self::AdminManage,
            "adm_grant_prompt" => Self::AdminPrompt(AdminPrompt::Grant),
            "adm_revoke_prompt" => Self::AdminPrompt(AdminPrompt::Revoke),
            "adm_back" => Self::AdminBack,
            "adm_stats" => Self::Admin(AdminCommand::Stats),
            "adm_users" => Self::Admin(AdminCommand::ListUsers),
            "adm_orders" => Self::Admin(AdminCommand::ListOrders),
            "adm_logs" => Self::Admin(AdminCommand::ViewLogs),
            other => {
                if let Some(code) = other.strip_prefix(SET_LANG_PREFIX) {
                    let lang = code
                        .parse()
                        .map_err(|_| CommandParseError::UnsupportedLanguage(code.to_owned()))?;
                    return Ok(Self::SetLanguage(lang));
                }
                if other.contains(':') {
                    return other.parse().map(Self::Admin);
                }
                return Err(CommandParseError::Unknown(other.to_owned()));
            }
        };
        Ok(action)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grant_with_default_days() {
        let cmd: AdminCommand = "grant:935939738".parse().unwrap();
        assert_eq!(
            cmd,
            AdminCommand::Grant {
                user: UserId::new(935_939_738),
                days: 30
            }
        );
        assert_eq!(cmd.to_string(), "grant:935939738");
    }

    #[test]
    fn test_parse_grant_with_days() {
        let cmd: AdminCommand = "grant: 42:7".parse().unwrap();
        assert_eq!(
            cmd,
            AdminCommand::Grant {
                user: UserId::new(42),
                days: 7
            }
        );
        assert_eq!(cmd.to_string(), "grant:42:7");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(
            "grant:".parse::<AdminCommand>(),
            Err(CommandParseError::MissingArgument("grant"))
        );
        assert!(matches!(
            "revoke:abc".parse::<AdminCommand>(),
            Err(CommandParseError::InvalidId(_))
        ));
        assert!(matches!(
            "grant:1:x".parse::<AdminCommand>(),
            Err(CommandParseError::InvalidDays(_))
        ));
        assert!(matches!(
            "drop:1".parse::<AdminCommand>(),
            Err(CommandParseError::Unknown(_))
        ));
    }

    #[test]
    fn test_mutating_commands() {
        assert!(AdminCommand::Revoke(UserId::new(1)).is_mutating());
        assert!(AdminCommand::PurgeOrders(UserId::new(1)).is_mutating());
        assert!(!AdminCommand::Stats.is_mutating());
        assert!(!AdminCommand::ViewLogs.is_mutating());
    }

    #[test]
    fn test_callback_payloads() {
        assert_eq!("mini".parse::<Action>().unwrap(), Action::Content(ContentKind::Mini));
        assert_eq!(
            "set_lang_kz".parse::<Action>().unwrap(),
            Action::SetLanguage(Language::Kz)
        );
        assert_eq!(
            "adm_stats".parse::<Action>().unwrap(),
            Action::Admin(AdminCommand::Stats)
        );
        assert!(matches!(
            "set_lang_de".parse::<Action>(),
            Err(CommandParseError::UnsupportedLanguage(_))
        ));
        assert!(matches!(
            "nope".parse::<Action>(),
            Err(CommandParseError::Unknown(_))
        ));
    }

    #[test]
    fn test_callback_payload_display_parses_back() {
        let order = OrderId::generate();
        for action in [
            Action::Start,
            Action::SetLanguage(Language::En),
            Action::Premium(PremiumKind::PartnerAnalysis),
            Action::ClaimPayment,
            Action::AdminPrompt(AdminPrompt::Revoke),
            Action::Admin(AdminCommand::ListOrders),
            Action::Admin(AdminCommand::Approve(order.clone())),
            Action::Admin(AdminCommand::Reject(order)),
        ] {
            let payload = action.to_string();
            // Telegram caps callback data at 64 bytes.
            assert!(payload.len() <= 64, "{payload}");
            assert_eq!(payload.parse::<Action>().unwrap(), action);
        }
    }

    #[test]
    fn test_privileged_actions() {
        assert!(Action::AdminPanel.is_privileged());
        assert!(Action::Admin(AdminCommand::Stats).is_privileged());
        assert!(!Action::ClaimPayment.is_privileged());
    }
}
