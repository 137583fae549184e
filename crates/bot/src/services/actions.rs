//! Chat actions.
//!
//! [`ActionService`] turns a user's [`Action`] into a list of transport
//! neutral [`Reply`]s. The chat transport renders them in order: a
//! [`Reply::Toast`] answers the button press, messages and edits go to the
//! chat, and a [`Reply::Generate`] is resolved through the content
//! generator after everything before it has been delivered.

use std::path::PathBuf;
use std::sync::Arc;

use lovesense_core::{
    Action, AdminCommand, AdminPrompt, AuditAction, AuditEntry, Language, OrderId, UserId,
};
use tracing::{debug, instrument};

use crate::audit::AuditLog;
use crate::config::PaymentConfig;
use crate::generation::prompts::{content_prompt, premium_prompt};
use crate::i18n::{self, Text};
use crate::store::StoreError;

use super::admin::{AdminError, AdminOutcome, AdminService};
use super::entitlement::EntitlementService;
use super::orders::{Claim, OrderService};

/// The person behind an inbound action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    pub id: UserId,
    /// Name used in prompts.
    pub display_name: String,
    pub username: Option<String>,
}

impl ChatUser {
    #[must_use]
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            username: None,
        }
    }

    #[must_use]
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.username = username;
        self
    }

    /// How the admin sees this user: `@username`, else the display name.
    #[must_use]
    pub fn mention(&self) -> String {
        self.username
            .as_ref()
            .map_or_else(|| self.display_name.clone(), |u| format!("@{u}"))
    }
}

/// Keyboards a reply can carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Menu {
    Main { language: Language, admin: bool },
    Languages,
    Premium(Language),
    Purchase { language: Language, card_number: Option<String> },
    AdminPanel,
    AdminManage,
    /// Approve/reject buttons attached to an admin notification.
    OrderDecision(OrderId),
}

/// One piece of output for the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Answer to the button press.
    Toast { text: String, alert: bool },
    /// New message in the chat.
    Message { text: String, menu: Option<Menu> },
    /// Replace the message whose button was pressed.
    Edit { text: String, menu: Option<Menu> },
    /// Upload a file.
    Document { path: PathBuf },
    /// Generate content for `prompt` and send it as a message.
    Generate { prompt: String },
}

impl Reply {
    fn toast(text: impl Into<String>) -> Self {
        Self::Toast {
            text: text.into(),
            alert: false,
        }
    }

    fn alert(text: impl Into<String>) -> Self {
        Self::Toast {
            text: text.into(),
            alert: true,
        }
    }

    fn message(text: impl Into<String>, menu: Option<Menu>) -> Self {
        Self::Message {
            text: text.into(),
            menu,
        }
    }

    fn edit(text: impl Into<String>, menu: Option<Menu>) -> Self {
        Self::Edit {
            text: text.into(),
            menu,
        }
    }
}

/// Dispatches chat actions to the services.
#[derive(Debug, Clone)]
pub struct ActionService {
    entitlements: EntitlementService,
    orders: OrderService,
    admin: AdminService,
    audit: Arc<AuditLog>,
    payment: PaymentConfig,
}

impl ActionService {
    /// Create a new action service.
    #[must_use]
    pub const fn new(
        entitlements: EntitlementService,
        orders: OrderService,
        admin: AdminService,
        audit: Arc<AuditLog>,
        payment: PaymentConfig,
    ) -> Self {
        Self {
            entitlements,
            orders,
            admin,
            audit,
            payment,
        }
    }

    fn main_menu(&self, user: UserId, language: Language) -> Menu {
        Menu::Main {
            language,
            admin: self.admin.gate().is_admin(user),
        }
    }

    /// Handle a button press or command.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a state change could not be persisted.
    /// Refused admin actions are not errors; they produce an alert.
    #[instrument(skip(self, user, action), fields(user_id = %user.id, action = %action))]
    pub async fn handle(&self, user: &ChatUser, action: Action) -> Result<Vec<Reply>, StoreError> {
        let record = self.entitlements.ensure_user(user.id).await?;
        let lang = record.language;

        let replies = match action {
            Action::Start => vec![Reply::message(
                i18n::text(Text::Welcome, lang),
                Some(self.main_menu(user.id, lang)),
            )],
            Action::LanguageMenu => {
                vec![Reply::message(i18n::CHOOSE_LANGUAGE_ALL, Some(Menu::Languages))]
            }
            Action::SetLanguage(lang) => {
                self.entitlements.set_language(user.id, lang).await?;
                vec![
                    Reply::toast(i18n::text(Text::LanguageSet, lang)),
                    Reply::edit(i18n::text(Text::Welcome, lang), Some(self.main_menu(user.id, lang))),
                ]
            }
            Action::Content(kind) => {
                let (access, _) = self.entitlements.consume_or_allow(user.id, kind).await?;
                if access.is_allowed() {
                    vec![
                        Reply::toast(i18n::generating(kind, lang)),
                        Reply::Generate {
                            prompt: content_prompt(kind, &user.display_name, lang),
                        },
                    ]
                } else {
                    vec![
                        Reply::alert(i18n::text(Text::TrialExhaustedAlert, lang)),
                        Reply::message(
                            i18n::text(Text::TrialExhausted, lang),
                            Some(self.main_menu(user.id, lang)),
                        ),
                    ]
                }
            }
            Action::PremiumMenu => {
                if self.entitlements.is_premium(user.id).await {
                    vec![
                        Reply::toast(i18n::text(Text::PremiumActive, lang)),
                        Reply::message(i18n::text(Text::PremiumMenu, lang), Some(Menu::Premium(lang))),
                    ]
                } else {
                    vec![Reply::alert(i18n::text(Text::NoPremium, lang))]
                }
            }
            Action::Premium(kind) => {
                if self.entitlements.is_premium(user.id).await {
                    self.audit
                        .record(AuditEntry::new(
                            self.entitlements.now(),
                            user.id,
                            AuditAction::PremiumContentServed { kind },
                            user.id,
                        ))
                        .await;
                    vec![
                        Reply::toast(i18n::text(Text::GeneratingPremium, lang)),
                        Reply::Generate {
                            prompt: premium_prompt(kind, &user.display_name, lang),
                        },
                    ]
                } else {
                    vec![Reply::alert(i18n::text(Text::NoPremium, lang))]
                }
            }
            Action::Buy => vec![Reply::message(
                i18n::purchase(
                    lang,
                    &self.payment.price,
                    self.payment.card_number.as_deref(),
                    self.payment.card_owner.as_deref(),
                ),
                Some(Menu::Purchase {
                    language: lang,
                    card_number: self.payment.card_number.clone(),
                }),
            )],
            Action::CopyCard => match &self.payment.card_number {
                Some(number) => vec![Reply::alert(format!(
                    "{number}\n{}",
                    i18n::text(Text::CardCopied, lang)
                ))],
                None => vec![Reply::alert(i18n::text(Text::CardUnavailable, lang))],
            },
            Action::ClaimPayment => {
                match self
                    .orders
                    .claim_payment(user.id, &user.mention())
                    .await?
                {
                    Claim::Created(_) => vec![Reply::toast(i18n::text(Text::ClaimReceived, lang))],
                    Claim::AlreadyPending(_) => {
                        vec![Reply::alert(i18n::text(Text::ClaimPending, lang))]
                    }
                }
            }
            Action::Status => {
                let premium = self.entitlements.is_premium(user.id).await;
                let toast = if premium { Text::PremiumActive } else { Text::NoPremium };
                vec![
                    Reply::toast(i18n::text(toast, lang)),
                    Reply::message(i18n::status(lang, &record, premium), None),
                ]
            }
            Action::Back => vec![Reply::message(
                i18n::text(Text::BackToMenu, lang),
                Some(self.main_menu(user.id, lang)),
            )],
            Action::AdminPanel
            | Action::AdminManage
            | Action::AdminPrompt(_)
            | Action::AdminBack
            | Action::Admin(_) => self.handle_admin(user.id, action).await?,
        };

        debug!(replies = replies.len(), "Action handled");
        Ok(replies)
    }

    /// Handle free text. Only `/start` and the admin's `grant:`/`revoke:`
    /// commands mean anything; other text is ignored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a state change could not be persisted.
    pub async fn handle_text(&self, user: &ChatUser, text: &str) -> Result<Vec<Reply>, StoreError> {
        let text = text.trim();
        if text == "/start" || text.starts_with("/start ") {
            return self.handle(user, Action::Start).await;
        }
        if !(text.starts_with("grant:") || text.starts_with("revoke:")) {
            return Ok(Vec::new());
        }

        match text.parse::<AdminCommand>() {
            Ok(command) => {
                let mut replies = self.handle_admin(user.id, Action::Admin(command)).await?;
                // Text commands have no button to answer or message to edit.
                for reply in &mut replies {
                    if let Reply::Toast { text, .. } | Reply::Edit { text, .. } = reply {
                        *reply = Reply::message(std::mem::take(text), None);
                    }
                }
                Ok(replies)
            }
            Err(e) if self.admin.gate().is_admin(user.id) => {
                let usage = if text.starts_with("grant:") {
                    i18n::ADMIN_GRANT_PROMPT
                } else {
                    i18n::ADMIN_REVOKE_PROMPT
                };
                Ok(vec![Reply::message(format!("{e}\n{usage}"), None)])
            }
            Err(_) => Ok(Vec::new()),
        }
    }

    async fn handle_admin(&self, actor: UserId, action: Action) -> Result<Vec<Reply>, StoreError> {
        let result = match action {
            Action::Admin(command) => self.run_command(actor, command).await,
            other => self.admin_screen(actor, &other).await,
        };
        match result {
            Ok(replies) => Ok(replies),
            Err(AdminError::Unauthorized(_) | AdminError::Unidentified) => Ok(vec![Reply::alert(i18n::text(
                Text::Unauthorized,
                Language::En,
            ))]),
            Err(AdminError::Store(e)) => Err(e),
        }
    }

    async fn admin_screen(&self, actor: UserId, action: &Action) -> Result<Vec<Reply>, AdminError> {
        self.admin.authorize(actor, &action.to_string()).await?;
        Ok(match action {
            Action::AdminPanel => vec![Reply::message(i18n::ADMIN_PANEL, Some(Menu::AdminPanel))],
            Action::AdminManage => vec![Reply::edit(i18n::ADMIN_MANAGE, Some(Menu::AdminManage))],
            Action::AdminPrompt(AdminPrompt::Grant) => {
                vec![Reply::message(i18n::ADMIN_GRANT_PROMPT, None)]
            }
            Action::AdminPrompt(AdminPrompt::Revoke) => {
                vec![Reply::message(i18n::ADMIN_REVOKE_PROMPT, None)]
            }
            _ => vec![Reply::edit(i18n::ADMIN_PANEL, Some(Menu::AdminPanel))],
        })
    }

    async fn run_command(
        &self,
        actor: UserId,
        command: AdminCommand,
    ) -> Result<Vec<Reply>, AdminError> {
        let outcome = self.admin.execute(actor, command).await?;
        let report = i18n::admin_report(&outcome);
        Ok(match outcome {
            AdminOutcome::Granted { .. }
            | AdminOutcome::Revoked { .. }
            | AdminOutcome::Purged { .. } => vec![Reply::message(report, None)],
            AdminOutcome::Approved(ref d) | AdminOutcome::Rejected(ref d) => {
                let toast = if d.affected == 0 {
                    "Nothing pending"
                } else if matches!(outcome, AdminOutcome::Approved(_)) {
                    "Premium granted ✅"
                } else {
                    "Payment rejected"
                };
                vec![Reply::alert(toast), Reply::edit(report, None)]
            }
            AdminOutcome::Stats(_) | AdminOutcome::Users { .. } | AdminOutcome::Orders(_) => {
                vec![Reply::edit(report, Some(Menu::AdminPanel))]
            }
            AdminOutcome::Logs {
                path, exists: true, ..
            } => vec![Reply::Document { path }],
            AdminOutcome::Logs { .. } => vec![Reply::message(report, None)],
        })
    }
}
