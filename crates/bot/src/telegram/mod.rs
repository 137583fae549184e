//! Telegram transport.
//!
//! Long-polls the Bot API with teloxide, turns messages and button presses
//! into [`Action`]s for the [`ActionService`], and renders the returned
//! [`Reply`]s.
//!
//! [`Action`]: lovesense_core::Action
//! [`ActionService`]: crate::services::ActionService
//! [`Reply`]: crate::services::Reply

pub mod handlers;
pub mod keyboards;
pub mod notifier;

pub use handlers::{TelegramContext, run_dispatcher};
pub use notifier::TelegramNotifier;

/// Longest text Telegram accepts in one message.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Cut `text` to what Telegram accepts, marking the cut.
#[must_use]
pub fn fit_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_message() {
        assert_eq!(fit_message("short"), "short");
        let long = "ж".repeat(MAX_MESSAGE_CHARS + 10);
        let fitted = fit_message(&long);
        assert_eq!(fitted.chars().count(), MAX_MESSAGE_CHARS);
        assert!(fitted.ends_with('…'));
    }
}
