//! Chat-style decoration of answers for terminal output.

use crate::compose::IntentKind;

fn prefix(intent: IntentKind) -> &'static str {
    match intent {
        IntentKind::ProductNutrient => "🥗 Nutrient info:",
        IntentKind::PriceQuery => "💰 Price info:",
        IntentKind::RecipeQuery => "👩‍🍳 Recipe ideas:",
        _ => "🤖",
    }
}

/// Prefix the answer with an intent label. Answers containing `•` bullets
/// are rewritten to one `🍽️ item` line per non-empty bullet.
pub fn decorate(intent: IntentKind, answer: &str) -> String {
    let body = if answer.contains('•') {
        answer
            .split('•')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| format!("🍽️ {item}"))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        answer.to_string()
    };
    format!("{}\n{}", prefix(intent), body)
}
