use crate::i18n::Language;
use crate::models::Intent;

/// Ordered keyword table. The first row with a hit wins, so an utterance
/// mentioning both a scholarship and tax is an education question.
pub const INTENT_KEYWORDS: &[(Intent, &[&str])] = &[
    (Intent::Education, &["scholarship", "education"]),
    (Intent::Taxation, &["tax", "income tax", "filing"]),
    (Intent::Tracking, &["track", "status", "application"]),
    (Intent::Business, &["business", "loan", "startup"]),
    (Intent::Housing, &["house", "housing", "awas"]),
    (Intent::Healthcare, &["health", "insurance", "medical"]),
    (Intent::Welfare, &["pension", "widow", "disability"]),
    (Intent::Eligibility, &["eligible", "qualify"]),
];

pub fn normalize_text(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

pub fn classify_intent(utterance: &str) -> Intent {
    let lower = utterance.to_lowercase();

    INTENT_KEYWORDS
        .iter()
        .find(|(_, needles)| contains_any(&lower, needles))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::General)
}

/// Picks a reply language from an explicit choice, falling back to the
/// dominant script of the text.
pub fn detect_language(explicit: Option<Language>, text: &str) -> Language {
    if let Some(language) = explicit {
        return language;
    }

    let mut devanagari_count = 0usize;
    let mut tamil_count = 0usize;
    let mut latin_count = 0usize;

    for ch in text.chars() {
        let code = ch as u32;
        if (0x0900..=0x097F).contains(&code) {
            devanagari_count += 1;
        } else if (0x0B80..=0x0BFF).contains(&code) {
            tamil_count += 1;
        } else if ch.is_ascii_alphabetic() {
            latin_count += 1;
        }
    }

    if tamil_count > latin_count && tamil_count >= devanagari_count {
        Language::Ta
    } else if devanagari_count > latin_count {
        Language::Hi
    } else {
        Language::En
    }
}

pub(crate) fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scholarship_beats_tax() {
        assert_eq!(
            classify_intent("Is there a scholarship that also saves tax?"),
            Intent::Education
        );
    }

    #[test]
    fn classifies_each_row() {
        assert_eq!(classify_intent("When is the FILING deadline"), Intent::Taxation);
        assert_eq!(classify_intent("track my request"), Intent::Tracking);
        assert_eq!(classify_intent("I need a loan"), Intent::Business);
        assert_eq!(classify_intent("PM Awas details"), Intent::Housing);
        assert_eq!(classify_intent("medical cover"), Intent::Healthcare);
        assert_eq!(classify_intent("widow pension"), Intent::Welfare);
        assert_eq!(classify_intent("what do I qualify for"), Intent::Eligibility);
        assert_eq!(classify_intent("hello there"), Intent::General);
    }

    #[test]
    fn substring_matching_follows_table_order() {
        // "application" is a tracking keyword and is checked before "eligible".
        assert_eq!(
            classify_intent("am I eligible to submit an application"),
            Intent::Tracking
        );
    }

    #[test]
    fn detects_tamil_and_hindi() {
        assert_eq!(detect_language(None, "வணக்கம் உதவி"), Language::Ta);
        assert_eq!(detect_language(None, "नमस्ते मदद"), Language::Hi);
        assert_eq!(detect_language(None, "hello"), Language::En);
        assert_eq!(detect_language(Some(Language::Hi), "hello"), Language::Hi);
    }

    #[test]
    fn normalizes_whitespace() {
        assert_eq!(normalize_text("  income   3\n lakhs "), "income 3 lakhs");
    }
}
