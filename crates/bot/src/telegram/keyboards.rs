//! Inline keyboards for each [`Menu`].

use lovesense_core::{Action, AdminCommand, AdminPrompt, ContentKind, Language, PremiumKind};
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::i18n::{self, Button};
use crate::services::Menu;

fn button(text: impl Into<String>, action: &Action) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(text, action.to_string())
}

fn row(text: impl Into<String>, action: &Action) -> Vec<InlineKeyboardButton> {
    vec![button(text, action)]
}

/// Build the keyboard for `menu`.
#[must_use]
pub fn render(menu: &Menu) -> InlineKeyboardMarkup {
    let rows = match menu {
        Menu::Main { language, admin } => {
            let lang = *language;
            let mut rows = vec![
                row(i18n::button(Button::Mini, lang), &Action::Content(ContentKind::Mini)),
                row(
                    i18n::button(Button::Compatibility, lang),
                    &Action::Content(ContentKind::Compatibility),
                ),
                row(i18n::button(Button::Advice, lang), &Action::Content(ContentKind::Advice)),
                row(i18n::button(Button::Premium, lang), &Action::PremiumMenu),
                row(i18n::button(Button::Buy, lang), &Action::Buy),
                row(i18n::button(Button::Status, lang), &Action::Status),
                row(i18n::button(Button::Language, lang), &Action::LanguageMenu),
            ];
            if *admin {
                rows.push(row(i18n::ADMIN_PANEL, &Action::AdminPanel));
            }
            rows
        }
        Menu::Languages => vec![
            Language::ALL
                .into_iter()
                .map(|lang| button(lang.label(), &Action::SetLanguage(lang)))
                .collect(),
        ],
        Menu::Premium(lang) => vec![
            row(
                i18n::button(Button::DeepPortrait, *lang),
                &Action::Premium(PremiumKind::DeepPortrait),
            ),
            row(
                i18n::button(Button::RelationshipPro, *lang),
                &Action::Premium(PremiumKind::RelationshipPro),
            ),
            row(
                i18n::button(Button::PartnerAnalysis, *lang),
                &Action::Premium(PremiumKind::PartnerAnalysis),
            ),
            row(i18n::button(Button::Back, *lang), &Action::Back),
        ],
        Menu::Purchase {
            language,
            card_number,
        } => {
            let mut rows = Vec::new();
            if let Some(card) = card_number {
                rows.push(row(
                    format!("{}: {card}", i18n::button(Button::PayToCard, *language)),
                    &Action::CopyCard,
                ));
            }
            rows.push(row(i18n::button(Button::IPaid, *language), &Action::ClaimPayment));
            rows.push(row(i18n::button(Button::Back, *language), &Action::Back));
            rows
        }
        Menu::AdminPanel => vec![
            vec![
                button("📊 Stats", &Action::Admin(AdminCommand::Stats)),
                button("👤 Users", &Action::Admin(AdminCommand::ListUsers)),
            ],
            vec![
                button("💳 Orders", &Action::Admin(AdminCommand::ListOrders)),
                button("📝 Logs", &Action::Admin(AdminCommand::ViewLogs)),
            ],
            vec![
                button("⭐ Manage Premium", &Action::AdminManage),
                button("⬅️ Back", &Action::AdminBack),
            ],
        ],
        Menu::AdminManage => vec![
            row("Grant Premium (ID)", &Action::AdminPrompt(AdminPrompt::Grant)),
            row("Revoke Premium (ID)", &Action::AdminPrompt(AdminPrompt::Revoke)),
            row("⬅️ Back", &Action::AdminBack),
        ],
        Menu::OrderDecision(order_id) => vec![
            row(
                "✔ Grant Premium",
                &Action::Admin(AdminCommand::Approve(order_id.clone())),
            ),
            row("✖ Reject", &Action::Admin(AdminCommand::Reject(order_id.clone()))),
        ],
    };
    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lovesense_core::OrderId;
    use teloxide::types::InlineKeyboardButtonKind;

    fn payloads(menu: &Menu) -> Vec<String> {
        render(menu)
            .inline_keyboard
            .into_iter()
            .flatten()
            .filter_map(|b| match b.kind {
                InlineKeyboardButtonKind::CallbackData(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_every_button_parses_back() {
        let menus = [
            Menu::Main {
                language: Language::En,
                admin: true,
            },
            Menu::Languages,
            Menu::Premium(Language::Kz),
            Menu::Purchase {
                language: Language::Ru,
                card_number: Some("4400 0000 0000 0000".to_string()),
            },
            Menu::AdminPanel,
            Menu::AdminManage,
            Menu::OrderDecision(OrderId::generate()),
        ];
        for menu in &menus {
            for data in payloads(menu) {
                assert!(data.len() <= 64, "{data} exceeds callback limit");
                assert!(data.parse::<Action>().is_ok(), "{data} does not parse");
            }
        }
    }

    #[test]
    fn test_admin_button_only_for_admin() {
        let user = payloads(&Menu::Main {
            language: Language::Ru,
            admin: false,
        });
        assert!(!user.contains(&"admin_panel".to_string()));
        let admin = payloads(&Menu::Main {
            language: Language::Ru,
            admin: true,
        });
        assert_eq!(admin.last().map(String::as_str), Some("admin_panel"));
    }

    #[test]
    fn test_purchase_without_card_has_no_copy_button() {
        let data = payloads(&Menu::Purchase {
            language: Language::En,
            card_number: None,
        });
        assert_eq!(data, vec!["i_paid", "back"]);
    }

    #[test]
    fn test_order_decision_buttons() {
        let id = OrderId::generate();
        let data = payloads(&Menu::OrderDecision(id.clone()));
        assert_eq!(data, vec![format!("approve:{id}"), format!("reject:{id}")]);
    }
}
