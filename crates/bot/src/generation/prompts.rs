//! Prompt templates for each kind of content.

use lovesense_core::{ContentKind, Language, PremiumKind};

/// Prompt for free content.
#[must_use]
pub fn content_prompt(kind: ContentKind, name: &str, language: Language) -> String {
    let task = match kind {
        ContentKind::Mini => "Write a short, three-sentence personality sketch",
        ContentKind::Compatibility => "Write a short relationship compatibility analysis",
        ContentKind::Advice => "Give one short, actionable piece of relationship advice",
    };
    format!("{task} for {name}. {}", reply_in(language))
}

/// Prompt for premium content.
#[must_use]
pub fn premium_prompt(kind: PremiumKind, name: &str, language: Language) -> String {
    let task = match kind {
        PremiumKind::DeepPortrait => "Write a detailed psychological portrait",
        PremiumKind::RelationshipPro => "Write a detailed analysis of the relationship patterns",
        PremiumKind::PartnerAnalysis => "Analyze the likely behavior and motives of the partner",
    };
    format!("{task} for {name}. {}", reply_in(language))
}

const fn reply_in(language: Language) -> &'static str {
    match language {
        Language::En => "Reply in English.",
        Language::Ru => "Reply in Russian.",
        Language::Kz => "Reply in Kazakh.",
    }
}
