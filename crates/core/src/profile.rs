use once_cell::sync::Lazy;
use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::EngineConfig;
use crate::models::{ApplicantCategory, Occupation, Profile};

/// Regions recognised in free text, checked in order; the first hit wins.
pub const GAZETTEER: &[&str] = &[
    "tamil nadu",
    "karnataka",
    "maharashtra",
    "delhi",
    "kerala",
    "punjab",
    "gujarat",
];

#[derive(Debug, Clone, Copy)]
enum Needle {
    Substring(&'static str),
    /// Short code; a substring match unless whole-word codes are configured.
    Code(&'static str),
}

// Every matching row is applied, so the last matching row wins.
const OCCUPATION_RULES: &[(&[Needle], Occupation)] = &[
    (&[Needle::Substring("student")], Occupation::Student),
    (
        &[Needle::Substring("business"), Needle::Substring("entrepreneur")],
        Occupation::Business,
    ),
    (&[Needle::Substring("farmer")], Occupation::Farmer),
    (&[Needle::Substring("teacher")], Occupation::Teacher),
];

const CATEGORY_RULES: &[(&[Needle], ApplicantCategory)] = &[
    (
        &[Needle::Code("sc"), Needle::Code("st"), Needle::Substring("scheduled")],
        ApplicantCategory::ScSt,
    ),
    (&[Needle::Substring("obc")], ApplicantCategory::Obc),
    (&[Needle::Substring("general")], ApplicantCategory::General),
];

static AGE_AFTER_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:age|years old|yr|years)[^\d.,;!?\n]{0,12}(\d{1,3})(?:\D|$)")
        .expect("valid age regex")
});
static AGE_BEFORE_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\D)(\d{1,3})\s*(?:age|years old|yr|years)").expect("valid age regex")
});
static INCOME_AFTER_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:income|earn|salary)\D{0,32}(\d+)").expect("valid income regex")
});
static INCOME_BEFORE_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d+)\s*(?:income|salary|lakh|lakhs)").expect("valid income regex")
});

/// Rebuilds the profile from every user utterance so far, oldest first.
pub fn extract_profile<S: AsRef<str>>(utterances: &[S]) -> Profile {
    extract_profile_with(utterances, &EngineConfig::default())
}

pub fn extract_profile_with<S: AsRef<str>>(utterances: &[S], config: &EngineConfig) -> Profile {
    let parts: Vec<&str> = utterances.iter().map(|utterance| utterance.as_ref()).collect();
    let blob = parts.join(" ").to_lowercase();
    let words = blob
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>();

    Profile {
        age: extract_age(&blob, config),
        income: extract_income(&blob, config),
        jurisdiction: extract_jurisdiction(&blob),
        category: last_match(&blob, &words, CATEGORY_RULES, config),
        occupation: last_match(&blob, &words, OCCUPATION_RULES, config),
    }
}

fn extract_age(blob: &str, config: &EngineConfig) -> Option<u32> {
    let age = first_capture(&AGE_AFTER_KEYWORD, blob)
        .or_else(|| first_capture(&AGE_BEFORE_KEYWORD, blob))?
        .parse::<u32>()
        .ok()?;

    match config.max_age {
        Some(max_age) if age > max_age => None,
        _ => Some(age),
    }
}

fn extract_income(blob: &str, config: &EngineConfig) -> Option<u64> {
    let digits = first_capture(&INCOME_AFTER_KEYWORD, blob)
        .or_else(|| first_capture(&INCOME_BEFORE_KEYWORD, blob))?;
    // Only overflow can fail here; an absurd figure saturates.
    let amount = digits.parse::<u64>().unwrap_or(u64::MAX);

    let stated_in_lakhs = blob.contains("lakh") || amount < config.small_income_threshold;
    if stated_in_lakhs {
        Some(amount.saturating_mul(config.lakh_multiplier))
    } else {
        Some(amount)
    }
}

fn extract_jurisdiction(blob: &str) -> Option<String> {
    GAZETTEER
        .iter()
        .find(|region| blob.contains(*region))
        .map(|region| title_case(region))
}

fn first_capture<'a>(pattern: &Regex, blob: &'a str) -> Option<&'a str> {
    pattern
        .captures(blob)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str())
}

fn last_match<T: Copy>(
    blob: &str,
    words: &[&str],
    rules: &[(&[Needle], T)],
    config: &EngineConfig,
) -> Option<T> {
    rules
        .iter()
        .filter(|(needles, _)| {
            needles
                .iter()
                .any(|needle| mentions(blob, words, *needle, config))
        })
        .map(|(_, value)| *value)
        .last()
}

fn mentions(blob: &str, words: &[&str], needle: Needle, config: &EngineConfig) -> bool {
    match needle {
        Needle::Substring(fragment) => blob.contains(fragment),
        Needle::Code(code) if config.whole_word_category_codes => words.contains(&code),
        Needle::Code(code) => blob.contains(code),
    }
}

pub fn title_case(input: &str) -> String {
    input
        .split_word_bounds()
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
