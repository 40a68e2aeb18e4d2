use serde::{Deserialize, Serialize};

use crate::models::{Category, Program};

/// Browse filters for the program explorer. Every unset field passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerFilter {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    /// Keeps programs whose income ceiling reaches at least this amount.
    #[serde(default)]
    pub income: Option<u64>,
    /// Inclusive age band; keeps programs whose range overlaps it.
    #[serde(default)]
    pub age_band: Option<(u32, u32)>,
}

impl ExplorerFilter {
    pub fn matches(&self, program: &Program) -> bool {
        if let Some(query) = self.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let query = query.to_lowercase();
            if !program.name.to_lowercase().contains(&query)
                && !program.description.to_lowercase().contains(&query)
            {
                return false;
            }
        }

        if let Some(jurisdiction) = self.jurisdiction.as_deref() {
            if program.jurisdiction != jurisdiction && !program.is_nationwide() {
                return false;
            }
        }

        if let Some(category) = self.category {
            if program.category != category {
                return false;
            }
        }

        if let Some(income) = self.income {
            if program.income_max < income {
                return false;
            }
        }

        if let Some((min_age, max_age)) = self.age_band {
            if program.age_max < min_age || program.age_min > max_age {
                return false;
            }
        }

        true
    }

    pub fn apply<'a>(&self, catalog: &'a [Program]) -> Vec<&'a Program> {
        catalog.iter().filter(|program| self.matches(program)).collect()
    }
}

/// Parses an age band such as `18-25`. A trailing `+` means open-ended.
pub fn parse_age_band(value: &str) -> Option<(u32, u32)> {
    let value = value.trim();
    if let Some(lower) = value.strip_suffix('+') {
        return lower.trim().parse().ok().map(|min| (min, u32::MAX));
    }

    let (min, max) = value.split_once('-')?;
    let min = min.trim().parse::<u32>().ok()?;
    let max = max.trim().parse::<u32>().ok()?;
    (min <= max).then_some((min, max))
}

/// Distinct categories in first-seen order.
pub fn categories(catalog: &[Program]) -> Vec<Category> {
    let mut seen = Vec::new();
    for program in catalog {
        if !seen.contains(&program.category) {
            seen.push(program.category);
        }
    }
    seen
}

/// Distinct jurisdictions in first-seen order.
pub fn jurisdictions(catalog: &[Program]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for program in catalog {
        if !seen.contains(&program.jurisdiction.as_str()) {
            seen.push(&program.jurisdiction);
        }
    }
    seen
}
