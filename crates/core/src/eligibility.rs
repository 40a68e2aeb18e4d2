use std::collections::BTreeMap;

use crate::models::{EligibilityReport, EligibilityResult, Profile, Program};

/// Checks one program. Criteria the profile says nothing about are
/// skipped, and a failing program keeps no reason text.
pub fn evaluate_program(profile: &Profile, program: &Program) -> EligibilityResult {
    let mut eligible = true;
    let mut reasons = Vec::new();

    if let Some(age) = profile.age {
        if age < program.age_min || age > program.age_max {
            eligible = false;
        } else {
            reasons.push(format!(
                "Age requirement met ({}-{} years)",
                program.age_min, program.age_max
            ));
        }
    }

    if let Some(income) = profile.income {
        if income > program.income_max {
            eligible = false;
        } else {
            reasons.push(format!(
                "Income within limit (max ₹{})",
                group_thousands(program.income_max)
            ));
        }
    }

    if let Some(jurisdiction) = profile.jurisdiction.as_deref() {
        if !program.is_nationwide() {
            if jurisdiction != program.jurisdiction {
                eligible = false;
            } else {
                reasons.push(format!(
                    "State-specific scheme for {}",
                    program.jurisdiction
                ));
            }
        }
    }

    if !eligible {
        reasons.clear();
    }

    EligibilityResult {
        program_id: program.id.clone(),
        eligible,
        reasons,
    }
}

/// Programs the profile positively matches, in catalog order.
pub fn evaluate_eligibility(profile: &Profile, catalog: &[Program]) -> EligibilityReport {
    let mut eligible = Vec::new();
    let mut reasons = BTreeMap::new();

    for program in catalog {
        let result = evaluate_program(profile, program);
        if result.is_recommended() {
            reasons.insert(program.id.clone(), result.reason_text());
            eligible.push(program.clone());
        }
    }

    EligibilityReport { eligible, reasons }
}

/// Formats with comma separators every three digits, e.g. `400,000`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ALL_INDIA};

    fn program(id: &str, category: Category, jurisdiction: &str, ages: (u32, u32), income_max: u64) -> Program {
        Program {
            id: id.to_string(),
            name: format!("Program {id}"),
            description: String::new(),
            category,
            jurisdiction: jurisdiction.to_string(),
            age_min: ages.0,
            age_max: ages.1,
            income_max,
            required_documents: Vec::new(),
            deadline: "2026-12-31".to_string(),
            benefits: String::new(),
        }
    }

    #[test]
    fn empty_profile_recommends_nothing() {
        let catalog = vec![
            program("a", Category::Education, ALL_INDIA, (0, 100), u64::MAX),
            program("b", Category::Housing, "Kerala", (18, 60), 300_000),
        ];
        let report = evaluate_eligibility(&Profile::default(), &catalog);
        assert!(report.is_empty());
        assert!(report.reasons.is_empty());
    }

    #[test]
    fn student_matches_nationwide_scholarship_with_age_and_income_reasons() {
        let catalog = vec![program("nms", Category::Education, ALL_INDIA, (18, 25), 400_000)];
        let profile = Profile {
            age: Some(19),
            income: Some(300_000),
            jurisdiction: Some("Tamil Nadu".to_string()),
            ..Profile::default()
        };

        let report = evaluate_eligibility(&profile, &catalog);
        assert_eq!(report.len(), 1);
        let reason = report.reason_for("nms");
        assert!(reason.contains("Age requirement met (18-25 years)"));
        assert!(reason.contains("Income within limit (max ₹400,000)"));
        assert!(!reason.contains("State-specific"));
    }

    #[test]
    fn nationwide_programs_ignore_profile_jurisdiction() {
        let nationwide = program("n", Category::Energy, ALL_INDIA, (18, 100), 1_000_000);
        for region in ["Kerala", "Punjab", "Nowhere"] {
            let profile = Profile {
                jurisdiction: Some(region.to_string()),
                age: Some(30),
                ..Profile::default()
            };
            assert!(evaluate_program(&profile, &nationwide).is_recommended());
        }
    }

    #[test]
    fn jurisdiction_only_profile_matches_only_regional_programs() {
        let catalog = vec![
            program("n", Category::Energy, ALL_INDIA, (18, 100), 1_000_000),
            program("k", Category::Housing, "Kerala", (18, 70), 300_000),
            program("p", Category::Housing, "Punjab", (18, 70), 300_000),
        ];
        let profile = Profile {
            jurisdiction: Some("Kerala".to_string()),
            ..Profile::default()
        };
        let report = evaluate_eligibility(&profile, &catalog);
        let ids = report.eligible.iter().map(|p| p.id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec!["k"]);
        assert_eq!(report.reason_for("k"), "State-specific scheme for Kerala");
    }

    #[test]
    fn one_failing_criterion_excludes_program_and_drops_reasons() {
        let regional = program("k", Category::Housing, "Kerala", (18, 70), 300_000);
        let profile = Profile {
            age: Some(30),
            income: Some(900_000),
            jurisdiction: Some("Kerala".to_string()),
            ..Profile::default()
        };
        let result = evaluate_program(&profile, &regional);
        assert!(!result.eligible);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn bounds_are_inclusive() {
        let bounded = program("b", Category::Education, ALL_INDIA, (18, 25), 400_000);
        let at_edges = Profile {
            age: Some(25),
            income: Some(400_000),
            ..Profile::default()
        };
        assert!(evaluate_program(&at_edges, &bounded).is_recommended());
        let too_young = Profile {
            age: Some(17),
            ..Profile::default()
        };
        assert!(!evaluate_program(&too_young, &bounded).eligible);
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_800_000), "1,800,000");
    }
}
