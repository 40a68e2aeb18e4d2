use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// Jurisdiction sentinel for programs that apply everywhere.
pub const ALL_INDIA: &str = "All India";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Education,
    Healthcare,
    Housing,
    Business,
    Agriculture,
    Taxation,
    #[serde(rename = "Social Welfare")]
    SocialWelfare,
    #[serde(rename = "Skill Development")]
    SkillDevelopment,
    Energy,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Self::Education,
        Self::Healthcare,
        Self::Housing,
        Self::Business,
        Self::Agriculture,
        Self::Taxation,
        Self::SocialWelfare,
        Self::SkillDevelopment,
        Self::Energy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Education => "Education",
            Self::Healthcare => "Healthcare",
            Self::Housing => "Housing",
            Self::Business => "Business",
            Self::Agriculture => "Agriculture",
            Self::Taxation => "Taxation",
            Self::SocialWelfare => "Social Welfare",
            Self::SkillDevelopment => "Skill Development",
            Self::Energy => "Energy",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub jurisdiction: String,
    pub age_min: u32,
    pub age_max: u32,
    pub income_max: u64,
    pub required_documents: Vec<String>,
    pub deadline: String,
    pub benefits: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramInvariantError {
    #[error("program has an empty id")]
    MissingId,
    #[error("program {id}: age_min {age_min} exceeds age_max {age_max}")]
    InvertedAgeRange { id: String, age_min: u32, age_max: u32 },
}

impl Program {
    pub fn is_nationwide(&self) -> bool {
        self.jurisdiction == ALL_INDIA
    }

    pub fn validate(&self) -> Result<(), ProgramInvariantError> {
        if self.id.trim().is_empty() {
            return Err(ProgramInvariantError::MissingId);
        }
        if self.age_min > self.age_max {
            return Err(ProgramInvariantError::InvertedAgeRange {
                id: self.id.clone(),
                age_min: self.age_min,
                age_max: self.age_max,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicantCategory {
    #[serde(rename = "SC/ST")]
    ScSt,
    #[serde(rename = "OBC")]
    Obc,
    #[serde(rename = "General")]
    General,
}

impl ApplicantCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::ScSt => "SC/ST",
            Self::Obc => "OBC",
            Self::General => "General",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupation {
    Student,
    Business,
    Farmer,
    Teacher,
}

impl Occupation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Business => "business",
            Self::Farmer => "farmer",
            Self::Teacher => "teacher",
        }
    }
}

/// Attributes inferred from the conversation. A missing field is
/// unconstrained, never zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ApplicantCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<Occupation>,
}

impl Profile {
    pub fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.income.is_none()
            && self.jurisdiction.is_none()
            && self.category.is_none()
            && self.occupation.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Education,
    Taxation,
    Tracking,
    Business,
    Housing,
    Healthcare,
    Welfare,
    Eligibility,
    General,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Education => "education",
            Self::Taxation => "taxation",
            Self::Tracking => "tracking",
            Self::Business => "business",
            Self::Housing => "housing",
            Self::Healthcare => "healthcare",
            Self::Welfare => "welfare",
            Self::Eligibility => "eligibility",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking one program against a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityResult {
    pub program_id: String,
    pub eligible: bool,
    pub reasons: Vec<String>,
}

impl EligibilityResult {
    /// Eligible with at least one criterion actually checked.
    pub fn is_recommended(&self) -> bool {
        self.eligible && !self.reasons.is_empty()
    }

    pub fn reason_text(&self) -> String {
        self.reasons.join(", ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub eligible: Vec<Program>,
    pub reasons: BTreeMap<String, String>,
}

impl EligibilityReport {
    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }

    pub fn len(&self) -> usize {
        self.eligible.len()
    }

    pub fn reason_for(&self, program_id: &str) -> &str {
        self.reasons
            .get(program_id)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn in_category(&self, category: Category) -> Vec<&Program> {
        self.eligible
            .iter()
            .filter(|program| program.category == category)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub at: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// User utterances of a conversation, oldest first.
pub fn user_utterances(history: &[ChatTurn]) -> Vec<&str> {
    history
        .iter()
        .filter(|turn| turn.role == Role::User)
        .map(|turn| turn.text.as_str())
        .collect()
}

/// One chat request. The caller owns the conversation and sends it back
/// in `history` on every turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatInput {
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
}

impl ChatInput {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Prior user utterances followed by the new one.
    pub fn utterances(&self) -> Vec<&str> {
        let mut utterances = user_utterances(&self.history);
        utterances.push(self.text.as_str());
        utterances
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub reply_text: String,
    pub intent: Intent,
    pub profile: Profile,
    pub eligible_count: usize,
    pub eligible_program_ids: Vec<String>,
    /// Name of the composer branch that answered.
    pub handler: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusStage {
    Submitted,
    UnderVerification,
    DocumentValidation,
    Approved,
    Rejected,
}

impl StatusStage {
    pub fn progress_percent(self) -> u8 {
        match self {
            Self::Submitted => 25,
            Self::UnderVerification => 50,
            Self::DocumentValidation => 75,
            Self::Approved | Self::Rejected => 100,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::UnderVerification => "under_verification",
            Self::DocumentValidation => "document_validation",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "submitted" => Some(Self::Submitted),
            "under_verification" => Some(Self::UnderVerification),
            "document_validation" => Some(Self::DocumentValidation),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    pub id: String,
    #[serde(alias = "scheme")]
    pub program: String,
    pub status: StatusStage,
    pub submitted_date: String,
    pub expected_days: u32,
    pub current_stage: String,
}
