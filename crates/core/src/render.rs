use serde::{Deserialize, Serialize};

/// Piece of a reply, split on the `**bold**` convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Segment {
    Plain(String),
    Bold(String),
}

pub fn split_emphasis(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("**") else {
            break;
        };
        if start > 0 {
            segments.push(Segment::Plain(rest[..start].to_string()));
        }
        segments.push(Segment::Bold(after_open[..end].to_string()));
        rest = &after_open[end + 2..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Plain(rest.to_string()));
    }
    segments
}

/// Reply text with emphasis markers removed, for plain terminals.
pub fn strip_emphasis(text: &str) -> String {
    split_emphasis(text)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(text) | Segment::Bold(text) => text,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoPersona {
    Student,
    Business,
    Family,
}

impl DemoPersona {
    pub const ALL: [Self; 3] = [Self::Student, Self::Business, Self::Family];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Business => "business",
            Self::Family => "family",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "student" => Some(Self::Student),
            "business" | "business_owner" => Some(Self::Business),
            "family" | "low_income" => Some(Self::Family),
            _ => None,
        }
    }

    pub fn utterance(self) -> &'static str {
        match self {
            Self::Student => "I am a 19-year-old student from Tamil Nadu. My family income is 3 lakhs per year. What scholarships can I apply for?",
            Self::Business => "I am a 35-year-old small business owner. My annual income is 8 lakhs. I need a loan to expand my business.",
            Self::Family => "We are a low-income family with annual income of 2 lakhs. My age is 42. What benefits and schemes are we eligible for?",
        }
    }

    /// Translation key of the demo button label.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Student => "demoStudent",
            Self::Business => "demoBusinessOwner",
            Self::Family => "demoLowIncome",
        }
    }
}
