//! User-facing strings.
//!
//! Chat users see the main flows in their chosen language. Admin screens
//! are English only.

use chrono::{DateTime, Utc};
use lovesense_core::{ContentKind, Language, Order, Price, UserRecord};

use crate::services::admin::{AdminOutcome, OrderDecision};

/// Localized notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    Welcome,
    ChooseLanguage,
    LanguageSet,
    TrialExhaustedAlert,
    TrialExhausted,
    PremiumActive,
    NoPremium,
    PremiumMenu,
    GeneratingPremium,
    CardCopied,
    CardUnavailable,
    ClaimReceived,
    ClaimPending,
    BackToMenu,
    Unauthorized,
}

/// Localized button labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Mini,
    Compatibility,
    Advice,
    Premium,
    Buy,
    Status,
    Language,
    DeepPortrait,
    RelationshipPro,
    PartnerAnalysis,
    Back,
    PayToCard,
    IPaid,
}

/// Prompt shown by the language menu, in every supported language.
pub const CHOOSE_LANGUAGE_ALL: &str = "Choose language / Выберите язык / Тілді таңдаңыз";

/// Look up a notice.
#[must_use]
pub const fn text(key: Text, lang: Language) -> &'static str {
    use Language::{En, Kz, Ru};
    match (key, lang) {
        (Text::Welcome, En) => "Welcome to LoveSense AI — press a button to start.",
        (Text::Welcome, Ru) => "Добро пожаловать в LoveSense AI — нажмите кнопку, чтобы начать.",
        (Text::Welcome, Kz) => "LoveSense AI-ге қош келіңіз — бастау үшін батырманы басыңыз.",
        (Text::ChooseLanguage, En) => "Choose language",
        (Text::ChooseLanguage, Ru) => "Выберите язык",
        (Text::ChooseLanguage, Kz) => "Тілді таңдаңыз",
        (Text::LanguageSet, En) => "Language set ✅",
        (Text::LanguageSet, Ru) => "Язык установлен ✅",
        (Text::LanguageSet, Kz) => "Тіл орнатылды ✅",
        (Text::TrialExhaustedAlert, En) => "Trial exhausted. Buy Premium to continue.",
        (Text::TrialExhaustedAlert, Ru) => "Пробный период исчерпан. Купите Premium, чтобы продолжить.",
        (Text::TrialExhaustedAlert, Kz) => "Сынақ мерзімі аяқталды. Жалғастыру үшін Premium сатып алыңыз.",
        (Text::TrialExhausted, En) => "Your trial is over. Please buy Premium.",
        (Text::TrialExhausted, Ru) => "Пробный период закончился. Пожалуйста, купите Premium.",
        (Text::TrialExhausted, Kz) => "Сынақ мерзімі бітті. Premium сатып алыңыз.",
        (Text::PremiumActive, En) => "You have Premium ✅",
        (Text::PremiumActive, Ru) => "У вас есть Premium ✅",
        (Text::PremiumActive, Kz) => "Сізде Premium бар ✅",
        (Text::NoPremium, En) => "No active Premium. Buy to unlock.",
        (Text::NoPremium, Ru) => "Нет активного Premium. Купите, чтобы разблокировать.",
        (Text::NoPremium, Kz) => "Premium белсенді емес. Сатып алыңыз",
        (Text::PremiumMenu, En) => "Premium menu:",
        (Text::PremiumMenu, Ru) => "Премиум меню:",
        (Text::PremiumMenu, Kz) => "Премиум мәзір:",
        (Text::GeneratingPremium, En) => "Generating premium analysis...",
        (Text::GeneratingPremium, Ru) => "Готовим премиум анализ...",
        (Text::GeneratingPremium, Kz) => "Премиум талдау жасалып жатыр...",
        (Text::CardCopied, En) => "Copied (paste it into your banking app).",
        (Text::CardCopied, Ru) => "Скопировано (вставьте в приложение банка).",
        (Text::CardCopied, Kz) => "Көшірілді (банк қосымшасына қойыңыз).",
        (Text::CardUnavailable, En) => "Payment details are not available yet.",
        (Text::CardUnavailable, Ru) => "Реквизиты для оплаты пока недоступны.",
        (Text::CardUnavailable, Kz) => "Төлем деректемелері әзірге жоқ.",
        (Text::ClaimReceived, En) => "Thanks, awaiting verification. Admin notified.",
        (Text::ClaimReceived, Ru) => "Спасибо, ожидайте проверки. Администратор уведомлён.",
        (Text::ClaimReceived, Kz) => "Рақмет, тексеруді күтіңіз. Әкімші хабардар етілді.",
        (Text::ClaimPending, En) => "Your payment is already awaiting verification.",
        (Text::ClaimPending, Ru) => "Ваша оплата уже ожидает проверки.",
        (Text::ClaimPending, Kz) => "Төлеміңіз тексеруді күтуде.",
        (Text::BackToMenu, En) => "Back to menu",
        (Text::BackToMenu, Ru) => "Назад в меню",
        (Text::BackToMenu, Kz) => "Мәзірге оралу",
        (Text::Unauthorized, _) => "Unauthorized",
    }
}

/// Look up a button label.
#[must_use]
pub const fn button(key: Button, lang: Language) -> &'static str {
    use Language::{En, Kz, Ru};
    match (key, lang) {
        (Button::Mini, En) => "🧠 Mini personality",
        (Button::Mini, Ru) => "🧠 Мини-анализ",
        (Button::Mini, Kz) => "🧠 Мини-талдау",
        (Button::Compatibility, En) => "❤️ Compatibility",
        (Button::Compatibility, Ru) => "❤️ Совместимость",
        (Button::Compatibility, Kz) => "❤️ Сәйкестік",
        (Button::Advice, En) => "🔮 AI Advice",
        (Button::Advice, Ru) => "🔮 Совет AI",
        (Button::Advice, Kz) => "🔮 AI кеңес",
        (Button::Premium, En) => "💎 Premium analysis",
        (Button::Premium, Ru) => "💎 Премиум анализ",
        (Button::Premium, Kz) => "💎 Премиум талдау",
        (Button::Buy, En) => "💳 Buy Premium",
        (Button::Buy, Ru) => "💳 Купить Premium",
        (Button::Buy, Kz) => "💳 Premium сатып алу",
        (Button::Status, En) => "📊 My status",
        (Button::Status, Ru) => "📊 Мой статус",
        (Button::Status, Kz) => "📊 Жағдайым",
        (Button::Language, En) => "🌐 Language",
        (Button::Language, Ru) => "🌐 Язык",
        (Button::Language, Kz) => "🌐 Тіл",
        (Button::DeepPortrait, En) => "🧠 Deep portrait",
        (Button::DeepPortrait, Ru) => "🧠 Глубокий портрет",
        (Button::DeepPortrait, Kz) => "🧠 Терең портрет",
        (Button::RelationshipPro, _) => "❤️ Relationship PRO",
        (Button::PartnerAnalysis, En) => "🔍 Partner analysis",
        (Button::PartnerAnalysis, Ru) => "🔍 Разбор партнёра",
        (Button::PartnerAnalysis, Kz) => "🔍 Серіктес талдауы",
        (Button::Back, En) => "🔁 Back",
        (Button::Back, Ru) => "🔁 Назад",
        (Button::Back, Kz) => "🔁 Артқа",
        (Button::PayToCard, En) => "Pay to card",
        (Button::PayToCard, Ru) => "Перевести на карту",
        (Button::PayToCard, Kz) => "Картаға аудару",
        (Button::IPaid, En) => "I paid",
        (Button::IPaid, Ru) => "Я оплатил",
        (Button::IPaid, Kz) => "Мен төледім",
    }
}

/// Toast shown while free content is generated.
#[must_use]
pub const fn generating(kind: ContentKind, lang: Language) -> &'static str {
    use Language::{En, Kz, Ru};
    match (kind, lang) {
        (ContentKind::Mini, En) => "Generating mini-analysis...",
        (ContentKind::Mini, Ru) => "Генерируется мини-анализ...",
        (ContentKind::Mini, Kz) => "Мини-талдау жасалып жатыр...",
        (ContentKind::Compatibility, En) => "Compatibility analysis...",
        (ContentKind::Compatibility, Ru) => "Анализ совместимости...",
        (ContentKind::Compatibility, Kz) => "Сәйкестік талдауы...",
        (ContentKind::Advice, En) => "AI Advice...",
        (ContentKind::Advice, Ru) => "Совет AI...",
        (ContentKind::Advice, Kz) => "AI кеңес...",
    }
}

/// Purchase instructions.
#[must_use]
pub fn purchase(
    lang: Language,
    price: &Price,
    card_number: Option<&str>,
    card_owner: Option<&str>,
) -> String {
    let (per_month, card, owner) = match lang {
        Language::En => ("Premium for 30 days", "Card", "Name"),
        Language::Ru => ("Premium на 30 дней", "Карта", "Имя"),
        Language::Kz => ("Premium 30 күнге", "Карта", "Аты"),
    };
    let mut out = format!("{per_month}: {price}");
    if let Some(number) = card_number {
        out.push_str(&format!("\n{card}: {number}"));
    }
    if let Some(name) = card_owner {
        out.push_str(&format!("\n{owner}: {name}"));
    }
    out
}

/// The "My status" screen.
#[must_use]
pub fn status(lang: Language, record: &UserRecord, premium: bool) -> String {
    let until = (record.premium_until > 0)
        .then(|| DateTime::from_timestamp(record.premium_until, 0))
        .flatten()
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string());

    let headline = match (lang, premium) {
        (Language::En, true) => "Your Premium is active ✅",
        (Language::Ru, true) => "Ваш Premium активен ✅",
        (Language::Kz, true) => "Premium белсенді ✅",
        (Language::En, false) => "You have no Premium. Buy it to get access.",
        (Language::Ru, false) => "У вас нет Premium. Купите, чтобы получить доступ.",
        (Language::Kz, false) => "Сізде Premium жоқ. Қол жеткізу үшін сатып алыңыз.",
    };
    let (until_label, trial_label) = match lang {
        Language::En => ("Until", "Free requests left"),
        Language::Ru => ("До", "Бесплатных запросов осталось"),
        Language::Kz => ("Дейін", "Тегін сұраулар қалды"),
    };

    let mut out = headline.to_string();
    if premium && let Some(until) = until {
        out.push_str(&format!("\n{until_label}: {until}"));
    }
    if !premium {
        out.push_str(&format!("\n{trial_label}: {}", record.trial_remaining));
    }
    out
}

// =============================================================================
// Admin screens
// =============================================================================

pub const ADMIN_PANEL: &str = "🛠 Admin panel";
pub const ADMIN_MANAGE: &str = "⭐ Premium management";
pub const ADMIN_GRANT_PROMPT: &str = "Send: grant:<user_id> (optionally grant:<user_id>:<days>)";
pub const ADMIN_REVOKE_PROMPT: &str = "Send: revoke:<user_id>";
pub const ADMIN_NO_LOGS: &str = "No logs yet.";

/// Admin notification for a new payment claim.
#[must_use]
pub fn order_notification(order: &Order, customer: &str) -> String {
    format!(
        "💳 Payment verification requested by {customer} (ID: {}).\nOrder: {}",
        order.user_id, order.id
    )
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn decision(d: &OrderDecision, approved: bool) -> String {
    match (d.user, d.affected, approved) {
        (None, _, _) => format!("Order {} not found.", d.order_id),
        (Some(user), 0, _) => format!("No pending orders for user {user}; nothing changed."),
        (Some(user), _, true) => match d.premium_until {
            Some(until) => format!("Premium granted for user {user} until {} ✅", format_time(until)),
            None => format!("Premium granted for user {user} ✅"),
        },
        (Some(user), n, false) => format!("Payment rejected for user {user} ({n} order(s) removed) ❌"),
    }
}

/// Plain-text rendering of an admin command result.
#[must_use]
pub fn admin_report(outcome: &AdminOutcome) -> String {
    match outcome {
        AdminOutcome::Granted { user, days, until } => format!(
            "✅ Premium granted to {user} for {days} day(s), until {}",
            format_time(*until)
        ),
        AdminOutcome::Revoked { user } => format!("❌ Premium revoked from {user}"),
        AdminOutcome::Approved(d) => decision(d, true),
        AdminOutcome::Rejected(d) => decision(d, false),
        AdminOutcome::Purged { user, removed } => {
            format!("🗑 Removed {removed} order(s) of user {user}")
        }
        AdminOutcome::Stats(stats) => format!(
            "📊 Stats\n\nTotal users: {}\nPremium active: {}\nTrial left: {}",
            stats.total_users, stats.premium_active, stats.with_trial_left
        ),
        AdminOutcome::Users { users, total } => {
            if users.is_empty() {
                return "👥 Users:\nNo users".to_string();
            }
            let mut out = format!("👥 Users ({} of {total}):", users.len());
            for u in users {
                out.push_str(&format!(
                    "\n{} | premium:{} | trial_left:{} | lang:{}",
                    u.id,
                    if u.premium { "yes" } else { "no" },
                    u.trial_remaining,
                    u.language
                ));
            }
            out
        }
        AdminOutcome::Orders(orders) => {
            if orders.is_empty() {
                return "💳 Orders:\nNo orders".to_string();
            }
            let mut out = "💳 Orders:".to_string();
            for o in orders {
                out.push_str(&format!(
                    "\n{} | {} | {} | {}",
                    o.user_id,
                    format_time(o.created_at),
                    o.status,
                    o.id
                ));
            }
            out
        }
        AdminOutcome::Logs { exists: false, .. } => ADMIN_NO_LOGS.to_string(),
        AdminOutcome::Logs { lines, .. } => lines.join("\n"),
    }
}
