//! Admin notifications over Telegram.

use async_trait::async_trait;
use lovesense_core::{Order, UserId};
use teloxide::prelude::*;

use crate::i18n;
use crate::services::{AdminNotifier, Menu, NotifyError};

use super::{fit_message, keyboards};

/// Sends new payment claims to the admin's chat with approve/reject buttons.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    admin: UserId,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("admin", &self.admin)
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// Create a notifier posting to `admin`.
    #[must_use]
    pub const fn new(bot: Bot, admin: UserId) -> Self {
        Self { bot, admin }
    }
}

#[async_trait]
impl AdminNotifier for TelegramNotifier {
    async fn order_created(&self, order: &Order, customer: &str) -> Result<(), NotifyError> {
        let text = fit_message(&i18n::order_notification(order, customer));
        self.bot
            .send_message(teloxide::types::UserId(self.admin.as_u64()), text)
            .reply_markup(keyboards::render(&Menu::OrderDecision(order.id.clone())))
            .await
            .map_err(|e| NotifyError(e.to_string()))?;
        Ok(())
    }
}
