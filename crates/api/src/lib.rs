mod config;
mod rate_limit;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::{Json, Path, Query, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use civic_agents::CivicAssistant;
use civic_catalog::{default_bundle, load_catalog_dir};
use civic_core::explorer::{categories, jurisdictions};
use civic_core::i18n::translations_for;
use civic_core::{
    extract_profile_with, parse_age_band, split_emphasis, AssistantReply, Category, ChatInput,
    ChatTurn, DemoPersona, EligibilityReport, EngineConfig, ExplorerFilter, Language, Profile,
    Program, Segment, StatusLookupError,
};
use civic_observability::{AppMetrics, MetricsSnapshot};
use civic_storage::Store;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub use crate::config::ApiConfig;
use crate::rate_limit::{IpRateLimiter, RateDecision};

const DEFAULT_SEARCH_LIMIT: usize = 5;
const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Clone)]
pub struct ApiState {
    pub assistant: Arc<CivicAssistant<Store>>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: IpRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    programs: usize,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    history: Vec<ChatTurn>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    language: Option<String>,
    /// Demo persona whose canned utterance replaces `text`.
    #[serde(default)]
    demo: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    #[serde(flatten)]
    reply: AssistantReply,
    segments: Vec<Segment>,
}

#[derive(Debug, Default, Deserialize)]
struct EligibilityRequest {
    #[serde(default)]
    profile: Profile,
    /// When present, the profile is extracted from these instead.
    #[serde(default)]
    utterances: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EligibleProgram {
    #[serde(flatten)]
    program: Program,
    reason: String,
}

#[derive(Debug, Serialize)]
struct EligibilityResponse {
    profile: Profile,
    count: usize,
    eligible: Vec<EligibleProgram>,
}

#[derive(Debug, Default, Deserialize)]
struct ProgramsQuery {
    q: Option<String>,
    jurisdiction: Option<String>,
    category: Option<String>,
    income: Option<u64>,
    age: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct TranslationsResponse {
    requested: String,
    language: Language,
    entries: BTreeMap<&'static str, &'static str>,
}

pub async fn build_app(config: ApiConfig) -> Result<Router> {
    let bundle = match config.catalog_dir.as_ref() {
        Some(dir) => load_catalog_dir(dir)
            .with_context(|| format!("failed to load catalog from {}", dir.display()))?,
        None => default_bundle().context("built-in catalog is invalid")?,
    };

    let store = match config.database_url.as_deref() {
        Some(database_url) => Store::sqlite(database_url).await?,
        None => Store::memory(),
    };
    store
        .seed(bundle.programs, bundle.applications)
        .await
        .context("failed to seed store")?;

    let metrics = AppMetrics::shared();
    let engine = EngineConfig::default()
        .with_max_age(config.max_age)
        .with_whole_word_category_codes(config.whole_word_category_codes);
    let assistant = Arc::new(
        CivicAssistant::from_store(Arc::new(store), engine, metrics.clone())
            .await
            .context("failed to initialize assistant")?,
    );
    info!(
        programs = assistant.catalog().len(),
        sqlite = config.database_url.is_some(),
        "civic assistant ready"
    );

    let state = ApiState {
        assistant,
        metrics,
        api_key: config.api_key,
        limiter: IpRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
        allowed_origins: Arc::new(config.allowed_origins),
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/chat", post(chat))
        .route("/v1/eligibility", post(eligibility))
        .route("/v1/programs", get(programs))
        .route("/v1/programs/:id", get(program_by_id))
        .route("/v1/search", get(search))
        .route("/v1/status/:id", get(status))
        .route("/v1/translations/:lang", get(translations))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        programs: state.assistant.catalog().len(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(State(state): State<ApiState>, Json(request): Json<ChatRequest>) -> Response {
    let text = match request.demo.as_deref() {
        Some(demo) => match DemoPersona::parse(demo) {
            Some(persona) => persona.utterance().to_string(),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "unknown_demo",
                    format!("unknown demo persona {demo}"),
                )
            }
        },
        None => request.text,
    };

    if text.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "empty_message",
            "text must not be empty",
        );
    }

    let input = ChatInput {
        history: request.history,
        text,
        language: request.language,
    };
    let reply = state.assistant.handle_turn(&input);
    let segments = split_emphasis(&reply.reply_text);

    (StatusCode::OK, Json(ChatResponse { reply, segments })).into_response()
}

async fn eligibility(
    State(state): State<ApiState>,
    Json(request): Json<EligibilityRequest>,
) -> impl IntoResponse {
    let profile = if request.utterances.is_empty() {
        request.profile
    } else {
        extract_profile_with(&request.utterances, state.assistant.config())
    };

    let EligibilityReport {
        eligible,
        mut reasons,
    } = state.assistant.eligibility(&profile);
    let eligible = eligible
        .into_iter()
        .map(|program| EligibleProgram {
            reason: reasons.remove(&program.id).unwrap_or_default(),
            program,
        })
        .collect::<Vec<_>>();

    Json(EligibilityResponse {
        profile,
        count: eligible.len(),
        eligible,
    })
}

async fn programs(State(state): State<ApiState>, Query(query): Query<ProgramsQuery>) -> Response {
    let category = match query.category.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(raw) => match Category::parse(raw) {
            Some(category) => Some(category),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "invalid_category",
                    format!("unknown category {raw}"),
                )
            }
        },
        None => None,
    };

    let age_band = match query.age.as_deref().filter(|a| !a.trim().is_empty()) {
        Some(raw) => match parse_age_band(raw) {
            Some(band) => Some(band),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "invalid_age_band",
                    format!("age band {raw} is not like 18-25 or 60+"),
                )
            }
        },
        None => None,
    };

    let filter = ExplorerFilter {
        query: query.q,
        jurisdiction: query.jurisdiction.filter(|j| !j.trim().is_empty()),
        category,
        income: query.income,
        age_band,
    };
    let programs = state.assistant.explore(&filter);
    let catalog = state.assistant.catalog();

    Json(serde_json::json!({
        "count": programs.len(),
        "programs": programs,
        "facets": {
            "categories": categories(catalog),
            "jurisdictions": jurisdictions(catalog),
        },
    }))
    .into_response()
}

async fn program_by_id(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.assistant.program(&id) {
        Some(program) => Json(program).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "not_found",
            format!("program {id} not found"),
        ),
    }
}

async fn search(State(state): State<ApiState>, Query(query): Query<SearchQuery>) -> impl IntoResponse {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let hits = state.assistant.search(&query.q, limit);
    Json(serde_json::json!({ "count": hits.len(), "hits": hits }))
}

async fn status(State(state): State<ApiState>, Path(id): Path<String>) -> Response {
    match state.assistant.lookup_status(&id).await {
        Ok(report) => Json(report).into_response(),
        Err(err) => match err.downcast_ref::<StatusLookupError>() {
            Some(lookup @ StatusLookupError::EmptyId) => {
                error_response(StatusCode::BAD_REQUEST, "empty_id", lookup.to_string())
            }
            Some(lookup @ StatusLookupError::NotFound(_)) => {
                error_response(StatusCode::NOT_FOUND, "not_found", lookup.to_string())
            }
            None => {
                error!(error = %err, "status lookup failed");
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "status lookup failed",
                )
            }
        },
    }
}

async fn translations(Path(lang): Path<String>) -> impl IntoResponse {
    let language = Language::from_optional_str(Some(&lang)).unwrap_or(Language::En);
    Json(TranslationsResponse {
        requested: lang,
        language,
        entries: translations_for(language).into_iter().collect(),
    })
}

fn error_response(status: StatusCode, error: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": error,
            "message": message.into(),
        })),
    )
        .into_response()
}

fn is_public_endpoint(path: &str) -> bool {
    path == "/health" || path.starts_with("/v1/translations/")
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
        ])
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if header_key != state.api_key {
        return error_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid x-api-key",
        );
    }

    next.run(request).await
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    match state.limiter.check(&ip) {
        RateDecision::Limited { retry_after } => {
            let mut response = error_response(
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "rate limit exceeded for this IP",
            );
            let seconds = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
        RateDecision::Allowed { remaining } => {
            let mut response = next.run(request).await;
            if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
                response.headers_mut().insert(
                    header::HeaderName::from_static("x-ratelimit-remaining"),
                    value,
                );
            }
            response
        }
    }
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'; base-uri 'none'"),
    );

    response
}
