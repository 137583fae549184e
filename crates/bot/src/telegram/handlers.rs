//! Update handlers and reply rendering.

use std::sync::Arc;

use lovesense_core::{Action, UserId};
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{CallbackQueryId, ChatAction, InputFile, MessageId, User};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::generation::ContentGenerator;
use crate::services::{ChatUser, Reply};
use crate::state::AppState;

use super::{fit_message, keyboards};

const SOMETHING_WENT_WRONG: &str = "⚠️ Something went wrong, please try again later.";

/// Dependencies injected into every handler.
#[derive(Clone)]
pub struct TelegramContext {
    state: AppState,
    generator: Arc<dyn ContentGenerator>,
}

impl std::fmt::Debug for TelegramContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramContext")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TelegramContext {
    #[must_use]
    pub fn new(state: AppState, generator: Arc<dyn ContentGenerator>) -> Self {
        Self { state, generator }
    }
}

/// Handler tree: text messages and button presses.
#[must_use]
pub fn schema() -> UpdateHandler<teloxide::RequestError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback))
}

/// Long-poll until `shutdown` flips, then stop gracefully.
pub async fn run_dispatcher(
    bot: Bot,
    context: TelegramContext,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut dispatcher = Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![context])
        .build();

    let shutdown_token = dispatcher.shutdown_token();
    tokio::spawn(async move {
        let _ = shutdown.changed().await;
        info!("Stopping Telegram dispatcher");
        if let Ok(stopped) = shutdown_token.shutdown() {
            stopped.await;
        }
    });

    info!("Telegram bot starting long polling");
    dispatcher.dispatch().await;
}

fn chat_user(user: &User) -> ChatUser {
    ChatUser::new(UserId::new(user.id.0), user.full_name()).with_username(user.username.clone())
}

#[instrument(skip_all, fields(user_id = msg.from.as_ref().map(|u| u.id.0)))]
async fn on_message(bot: Bot, msg: Message, context: TelegramContext) -> ResponseResult<()> {
    let (Some(from), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return respond(());
    };
    if from.is_bot {
        return respond(());
    }

    let user = chat_user(from);
    let replies = match context.state.actions().handle_text(&user, text).await {
        Ok(replies) => replies,
        Err(e) => {
            error!(error = %e, "Failed to handle message");
            vec![Reply::Message {
                text: SOMETHING_WENT_WRONG.to_string(),
                menu: None,
            }]
        }
    };

    deliver(&bot, &context, msg.chat.id, None, None, replies).await;
    respond(())
}

#[instrument(skip_all, fields(user_id = q.from.id.0, data = q.data.as_deref()))]
async fn on_callback(bot: Bot, q: CallbackQuery, context: TelegramContext) -> ResponseResult<()> {
    let chat = q
        .message
        .as_ref()
        .map_or_else(|| ChatId::from(q.from.id), |m| m.chat().id);
    let message_id = q.message.as_ref().map(|m| m.id());

    let Some(action) = q.data.as_deref().and_then(|data| data.parse::<Action>().ok()) else {
        debug!("Ignoring unknown callback data");
        bot.answer_callback_query(q.id.clone()).await?;
        return respond(());
    };

    let user = chat_user(&q.from);
    let replies = match context.state.actions().handle(&user, action).await {
        Ok(replies) => replies,
        Err(e) => {
            error!(error = %e, "Failed to handle callback");
            vec![Reply::Toast {
                text: SOMETHING_WENT_WRONG.to_string(),
                alert: true,
            }]
        }
    };

    deliver(&bot, &context, chat, message_id, Some(&q.id), replies).await;
    respond(())
}

/// Render replies in order. Delivery failures are logged and skipped.
async fn deliver(
    bot: &Bot,
    context: &TelegramContext,
    chat: ChatId,
    message_id: Option<MessageId>,
    callback: Option<&CallbackQueryId>,
    replies: Vec<Reply>,
) {
    // Button presses must be answered exactly once, and before slow work.
    if let Some(id) = callback {
        let toast = replies.iter().find_map(|r| match r {
            Reply::Toast { text, alert } => Some((text.clone(), *alert)),
            _ => None,
        });
        let mut answer = bot.answer_callback_query(id.clone());
        if let Some((text, alert)) = toast {
            answer = answer.text(text).show_alert(alert);
        }
        if let Err(e) = answer.await {
            warn!(error = %e, "Failed to answer callback query");
        }
    }

    for reply in replies {
        let result = match reply {
            Reply::Toast { .. } if callback.is_some() => continue,
            Reply::Toast { text, .. } | Reply::Message { text, menu: None } => {
                bot.send_message(chat, fit_message(&text)).await.map(drop)
            }
            Reply::Message {
                text,
                menu: Some(menu),
            } => bot
                .send_message(chat, fit_message(&text))
                .reply_markup(keyboards::render(&menu))
                .await
                .map(drop),
            Reply::Edit { text, menu } => match message_id {
                Some(id) => {
                    let request = bot.edit_message_text(chat, id, fit_message(&text));
                    match menu {
                        Some(menu) => request.reply_markup(keyboards::render(&menu)).await,
                        None => request.await,
                    }
                    .map(drop)
                }
                None => {
                    let request = bot.send_message(chat, fit_message(&text));
                    match menu {
                        Some(menu) => request.reply_markup(keyboards::render(&menu)).await,
                        None => request.await,
                    }
                    .map(drop)
                }
            },
            Reply::Document { path } => bot
                .send_document(chat, InputFile::file(path))
                .await
                .map(drop),
            Reply::Generate { prompt } => {
                if let Err(e) = bot.send_chat_action(chat, ChatAction::Typing).await {
                    debug!(error = %e, "Failed to send typing indicator");
                }
                let text = context.generator.generate(&prompt).await;
                bot.send_message(chat, fit_message(&text)).await.map(drop)
            }
        };

        if let Err(e) = result {
            warn!(error = %e, "Failed to deliver reply");
        }
    }
}
