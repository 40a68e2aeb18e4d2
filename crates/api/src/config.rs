use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_KEY: &str = "dev-civic-key";
const DEFAULT_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:3000",
    "http://127.0.0.1:3000",
];

/// Server settings. `from_env` reads the `CIVIC_*` variables; tests build
/// one directly.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Directory of catalog JSON files. `None` uses the built-in catalog.
    pub catalog_dir: Option<PathBuf>,
    /// SQLite URL. `None` keeps everything in memory.
    pub database_url: Option<String>,
    pub api_key: String,
    pub rate_limit_window: Duration,
    pub rate_limit_max: usize,
    pub max_age: Option<u32>,
    pub whole_word_category_codes: bool,
    pub allowed_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            catalog_dir: None,
            database_url: None,
            api_key: DEFAULT_API_KEY.to_string(),
            rate_limit_window: Duration::from_secs(60),
            rate_limit_max: 120,
            max_age: None,
            whole_word_category_codes: false,
            allowed_origins: DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            catalog_dir: non_empty_var("CIVIC_CATALOG_DIR").map(PathBuf::from),
            database_url: non_empty_var("CIVIC_DATABASE_URL"),
            api_key: non_empty_var("CIVIC_API_KEY").unwrap_or(defaults.api_key),
            rate_limit_window: parsed_var::<u64>("CIVIC_RATE_LIMIT_WINDOW_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_window),
            rate_limit_max: parsed_var("CIVIC_RATE_LIMIT_MAX").unwrap_or(defaults.rate_limit_max),
            max_age: parsed_var("CIVIC_MAX_AGE"),
            whole_word_category_codes: parsed_var("CIVIC_WHOLE_WORD_CATEGORY_CODES")
                .unwrap_or(defaults.whole_word_category_codes),
            allowed_origins: non_empty_var("CIVIC_ALLOWED_ORIGINS")
                .map(|value| parse_origins(&value))
                .unwrap_or(defaults.allowed_origins),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    non_empty_var(name).and_then(|value| value.parse().ok())
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|origin| origin.trim().trim_end_matches('/').to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}
