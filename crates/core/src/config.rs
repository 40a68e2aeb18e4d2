use serde::{Deserialize, Serialize};

pub const LAKH: u64 = 100_000;

/// Tunables for the matching engine. `Default` reproduces the documented
/// assistant behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Incomes strictly above this get the non-income-gated redirect.
    pub high_income_threshold: u64,
    /// Multiplier applied to incomes stated in lakhs.
    pub lakh_multiplier: u64,
    /// Bare incomes below this are read as lakhs.
    pub small_income_threshold: u64,
    /// Programs listed in the generic eligibility summary.
    pub summary_limit: usize,
    /// Required documents previewed per education program.
    pub document_preview: usize,
    /// Ages above this are discarded. `None` accepts any extracted age.
    pub max_age: Option<u32>,
    /// Match the "sc" and "st" category codes as whole words only, so
    /// "student" or "state" no longer imply SC/ST.
    #[serde(default)]
    pub whole_word_category_codes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            high_income_threshold: 1_000_000,
            lakh_multiplier: LAKH,
            small_income_threshold: 1_000,
            summary_limit: 5,
            document_preview: 3,
            max_age: None,
            whole_word_category_codes: false,
        }
    }
}

impl EngineConfig {
    pub fn with_max_age(mut self, max_age: Option<u32>) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_whole_word_category_codes(mut self, enabled: bool) -> Self {
        self.whole_word_category_codes = enabled;
        self
    }
}
