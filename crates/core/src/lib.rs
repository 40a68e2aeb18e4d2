pub mod composer;
pub mod config;
pub mod eligibility;
pub mod explorer;
pub mod i18n;
pub mod intent;
pub mod models;
pub mod profile;
pub mod render;
pub mod tracker;

pub use composer::{compose_from_report, compose_response, compose_response_with, ReplyContext};
pub use config::EngineConfig;
pub use eligibility::{evaluate_eligibility, evaluate_program};
pub use explorer::{parse_age_band, ExplorerFilter};
pub use i18n::{translate, Language};
pub use intent::{classify_intent, detect_language, normalize_text};
pub use models::*;
pub use profile::{extract_profile, extract_profile_with};
pub use render::{split_emphasis, strip_emphasis, DemoPersona, Segment};
pub use tracker::{StatusBook, StatusLookupError};
