use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    En,
    Hi,
    Ta,
}

impl Language {
    pub fn from_optional_str(value: Option<&str>) -> Option<Self> {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "en" || v == "en-in" || v == "english" => Some(Self::En),
            Some(v) if v == "hi" || v == "hi-in" || v == "hindi" => Some(Self::Hi),
            Some(v) if v == "ta" || v == "ta-in" || v == "tamil" => Some(Self::Ta),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Hi => "hi",
            Self::Ta => "ta",
        }
    }

    fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::En => EN,
            Self::Hi => HI,
            Self::Ta => TA,
        }
    }
}

pub const TRANSLATION_KEYS: [&str; 7] = [
    "greeting",
    "placeholder",
    "send",
    "demoStudent",
    "demoBusinessOwner",
    "demoLowIncome",
    "askQuestion",
];

const EN: &[(&str, &str)] = &[
    ("greeting", "Hello! I'm CivicAI. How can I help you today?"),
    ("placeholder", "Type your message here..."),
    ("send", "Send"),
    ("demoStudent", "Student from Tamil Nadu"),
    ("demoBusinessOwner", "Small Business Owner"),
    ("demoLowIncome", "Low Income Family"),
    ("askQuestion", "Try asking: What scholarships can I apply for?"),
];

const HI: &[(&str, &str)] = &[
    ("greeting", "नमस्ते! मैं CivicAI हूं। आज मैं आपकी कैसे मदद कर सकता हूं?"),
    ("placeholder", "अपना संदेश यहां टाइप करें..."),
    ("send", "भेजें"),
    ("demoStudent", "तमिलनाडु का छात्र"),
    ("demoBusinessOwner", "छोटे व्यवसाय मालिक"),
    ("demoLowIncome", "कम आय वाला परिवार"),
    (
        "askQuestion",
        "पूछने का प्रयास करें: मैं किन छात्रवृत्तियों के लिए आवेदन कर सकता हूं?",
    ),
];

const TA: &[(&str, &str)] = &[
    (
        "greeting",
        "வணக்கம்! நான் CivicAI. இன்று நான் உங்களுக்கு எப்படி உதவ முடியும்?",
    ),
    ("placeholder", "உங்கள் செய்தியை இங்கே தட்டச்சு செய்யவும்..."),
    ("send", "அனுப்பு"),
    ("demoStudent", "தமிழ்நாட்டைச் சேர்ந்த மாணவர்"),
    ("demoBusinessOwner", "சிறு வணிக உரிமையாளர்"),
    ("demoLowIncome", "குறைந்த வருமானம் கொண்ட குடும்பம்"),
    (
        "askQuestion",
        "கேட்க முயற்சிக்கவும்: நான் என்ன உதவித்தொகைகளுக்கு விண்ணப்பிக்க முடியும்?",
    ),
];

fn lookup(language: Language, key: &str) -> Option<&'static str> {
    language
        .table()
        .iter()
        .find(|(candidate, _)| *candidate == key)
        .map(|(_, text)| *text)
}

/// Resolves a UI string. Unknown languages and missing keys fall back to
/// English, then to the key itself.
pub fn translate<'a>(key: &'a str, language: &str) -> &'a str {
    Language::from_optional_str(Some(language))
        .and_then(|language| lookup(language, key))
        .or_else(|| lookup(Language::En, key))
        .unwrap_or(key)
}

/// Every key for one language, with English filling any gaps.
pub fn translations_for(language: Language) -> Vec<(&'static str, &'static str)> {
    TRANSLATION_KEYS
        .iter()
        .map(|key| {
            let text = lookup(language, key)
                .or_else(|| lookup(Language::En, key))
                .unwrap_or(key);
            (*key, text)
        })
        .collect()
}
