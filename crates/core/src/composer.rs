use std::fmt::Write as _;

use crate::config::EngineConfig;
use crate::eligibility::evaluate_eligibility;
use crate::models::{Category, EligibilityReport, Intent, Profile, Program};

pub const EDUCATION_CLARIFY: &str = "I couldn't find specific education schemes matching your profile. Could you provide more details about your age, income, and state?";

pub const TAXATION_REDIRECT: &str = "For tax filing assistance, I recommend checking the Income Tax e-filing portal. You may also be eligible for certain rebates based on your profile.";

pub const TRACKING_INSTRUCTIONS: &str = "To track your application status, please visit the 'Track Application' section and enter your Application ID (e.g., CIV12345). You'll get real-time updates on your application progress.";

pub const HIGH_INCOME_REDIRECT: &str = "Based on your income level, you may not qualify for schemes with income limits. However, you might be eligible for startup funding, tax benefits, or business development schemes. Please check the Schemes Explorer for more options.";

pub const ONBOARDING: &str = "Hello! I'm CivicAI, your intelligent government services assistant. I can help you:\n\n• Find eligible schemes (scholarships, benefits, loans)\n• Guide you through tax filing\n• Track application status\n• Explain eligibility criteria\n\nPlease share your details (age, income, state, occupation) to get personalized recommendations.";

/// Everything a reply handler may look at for one turn.
pub struct ReplyContext<'a> {
    pub intent: Intent,
    pub profile: &'a Profile,
    pub report: &'a EligibilityReport,
    pub user_text: &'a str,
    pub config: &'a EngineConfig,
}

/// A handler returns `None` to hand the turn to the next one.
pub type ReplyHandler = fn(&ReplyContext<'_>) -> Option<String>;

/// Handlers in priority order. The onboarding text answers when all pass.
pub const REPLY_CHAIN: &[(&str, ReplyHandler)] = &[
    ("education", education_reply),
    ("taxation", taxation_reply),
    ("tracking", tracking_reply),
    ("business", business_reply),
    ("eligible_summary", eligible_summary_reply),
    ("high_income", high_income_reply),
];

pub fn compose_response(
    intent: Intent,
    profile: &Profile,
    catalog: &[Program],
    user_text: &str,
) -> String {
    compose_response_with(intent, profile, catalog, user_text, &EngineConfig::default())
}

pub fn compose_response_with(
    intent: Intent,
    profile: &Profile,
    catalog: &[Program],
    user_text: &str,
    config: &EngineConfig,
) -> String {
    let report = evaluate_eligibility(profile, catalog);
    compose_from_report(&ReplyContext {
        intent,
        profile,
        report: &report,
        user_text,
        config,
    })
    .1
}

/// Runs the chain and reports which handler produced the reply.
pub fn compose_from_report(ctx: &ReplyContext<'_>) -> (&'static str, String) {
    REPLY_CHAIN
        .iter()
        .find_map(|(name, handler)| handler(ctx).map(|reply| (*name, reply)))
        .unwrap_or(("onboarding", ONBOARDING.to_string()))
}

fn education_reply(ctx: &ReplyContext<'_>) -> Option<String> {
    if ctx.intent != Intent::Education {
        return None;
    }

    let programs = ctx.report.in_category(Category::Education);
    if programs.is_empty() {
        return Some(EDUCATION_CLARIFY.to_string());
    }

    let mut reply =
        String::from("Based on your profile, here are the education schemes you're eligible for:\n\n");
    for (idx, program) in programs.iter().enumerate() {
        let documents = program
            .required_documents
            .iter()
            .take(ctx.config.document_preview)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = write!(
            reply,
            "{}. **{}**\n   Benefits: {}\n   Reason: {}\n   Required Documents: {}\n\n",
            idx + 1,
            program.name,
            program.benefits,
            ctx.report.reason_for(&program.id),
            documents
        );
    }
    Some(reply)
}

fn taxation_reply(ctx: &ReplyContext<'_>) -> Option<String> {
    if ctx.intent != Intent::Taxation {
        return None;
    }

    let programs = ctx.report.in_category(Category::Taxation);
    if programs.is_empty() {
        return Some(TAXATION_REDIRECT.to_string());
    }

    let mut reply = String::from("Here are the tax benefits you may be eligible for:\n\n");
    for (idx, program) in programs.iter().enumerate() {
        let _ = write!(
            reply,
            "{}. **{}**\n   Benefits: {}\n   Eligibility: {}\n\n",
            idx + 1,
            program.name,
            program.benefits,
            ctx.report.reason_for(&program.id)
        );
    }
    Some(reply)
}

fn tracking_reply(ctx: &ReplyContext<'_>) -> Option<String> {
    (ctx.intent == Intent::Tracking).then(|| TRACKING_INSTRUCTIONS.to_string())
}

// With no business match this passes, letting the generic summary answer.
fn business_reply(ctx: &ReplyContext<'_>) -> Option<String> {
    if ctx.intent != Intent::Business {
        return None;
    }

    let programs = ctx.report.in_category(Category::Business);
    if programs.is_empty() {
        return None;
    }

    let mut reply = String::from("Great! Here are business schemes suitable for you:\n\n");
    for (idx, program) in programs.iter().enumerate() {
        let _ = write!(
            reply,
            "{}. **{}**\n   Benefits: {}\n   Description: {}\n   Reason: {}\n\n",
            idx + 1,
            program.name,
            program.benefits,
            program.description,
            ctx.report.reason_for(&program.id)
        );
    }
    Some(reply)
}

fn eligible_summary_reply(ctx: &ReplyContext<'_>) -> Option<String> {
    // An eligibility question with nothing to list falls through as well.
    if ctx.report.is_empty() {
        return None;
    }

    let limit = ctx.config.summary_limit;
    let mut reply = String::from(
        "Based on your profile analysis, you are eligible for the following schemes:\n\n",
    );
    for (idx, program) in ctx.report.eligible.iter().take(limit).enumerate() {
        let _ = write!(
            reply,
            "{}. **{}** ({})\n   Benefits: {}\n   Reason: {}\n   Deadline: {}\n\n",
            idx + 1,
            program.name,
            program.category,
            program.benefits,
            ctx.report.reason_for(&program.id),
            program.deadline
        );
    }
    if ctx.report.len() > limit {
        let _ = write!(
            reply,
            "\nAnd {} more schemes. Visit the Schemes Explorer to see all options.",
            ctx.report.len() - limit
        );
    }
    Some(reply)
}

fn high_income_reply(ctx: &ReplyContext<'_>) -> Option<String> {
    ctx.profile
        .income
        .filter(|income| *income > ctx.config.high_income_threshold)
        .map(|_| HIGH_INCOME_REDIRECT.to_string())
}
