use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use civic_api::{build_app, ApiConfig};
use civic_core::composer::HIGH_INCOME_REDIRECT;
use serde_json::{json, Value};
use tower::ServiceExt;

const API_KEY: &str = "dev-civic-key";

async fn app() -> Router {
    build_app(ApiConfig::default())
        .await
        .expect("app should build")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    let parsed = read_json(response).await;
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["programs"], 18);
}

#[tokio::test]
async fn chat_requires_api_key() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/chat")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "text": "hello" }).to_string()))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["error"], "unauthorized");
}

#[tokio::test]
async fn student_demo_lists_education_schemes() {
    let response = app()
        .await
        .oneshot(post_json("/v1/chat", json!({ "demo": "student" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["intent"], "education");
    assert_eq!(parsed["handler"], "education");
    assert_eq!(parsed["profile"]["jurisdiction"], "Tamil Nadu");
    assert_eq!(parsed["profile"]["income"], 300_000);
    assert!(parsed["profile"].get("age").is_none());
    assert!(parsed["reply_text"]
        .as_str()
        .unwrap()
        .contains("**National Merit Scholarship**"));
    assert!(parsed["greeting"].is_string());
    assert!(parsed["segments"]
        .as_array()
        .unwrap()
        .iter()
        .any(|segment| segment["kind"] == "bold"
            && segment["text"] == "National Merit Scholarship"));
}

#[tokio::test]
async fn history_carries_high_income_forward() {
    let response = app()
        .await
        .oneshot(post_json(
            "/v1/chat",
            json!({
                "history": [
                    { "role": "user", "text": "I earn 50 lakhs" },
                    { "role": "assistant", "text": "Thanks." }
                ],
                "text": "am I eligible for anything?"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["intent"], "eligibility");
    assert_eq!(parsed["eligible_count"], 0);
    assert_eq!(parsed["reply_text"], HIGH_INCOME_REDIRECT);
    assert!(parsed.get("greeting").is_none());
}

#[tokio::test]
async fn blank_chat_and_unknown_demo_are_rejected() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(post_json("/v1/chat", json!({ "text": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "empty_message");

    let response = app
        .oneshot(post_json("/v1/chat", json!({ "demo": "astronaut" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "unknown_demo");
}

#[tokio::test]
async fn eligibility_endpoint_explains_matches() {
    let response = app()
        .await
        .oneshot(post_json(
            "/v1/eligibility",
            json!({ "profile": { "age": 65, "income": 90000 } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    let pension = parsed["eligible"]
        .as_array()
        .unwrap()
        .iter()
        .find(|program| program["id"] == "welfare-old-age-pension")
        .expect("pension should match");
    assert_eq!(
        pension["reason"],
        "Age requirement met (60-100 years), Income within limit (max ₹100,000)"
    );
    assert_eq!(
        parsed["count"].as_u64().unwrap() as usize,
        parsed["eligible"].as_array().unwrap().len()
    );
}

#[tokio::test]
async fn eligibility_endpoint_extracts_from_utterances() {
    let response = app()
        .await
        .oneshot(post_json(
            "/v1/eligibility",
            json!({ "utterances": ["I am a farmer from Punjab", "income 4 lakhs"] }),
        ))
        .await
        .unwrap();

    let parsed = read_json(response).await;
    assert_eq!(parsed["profile"]["jurisdiction"], "Punjab");
    assert_eq!(parsed["profile"]["occupation"], "farmer");
    assert_eq!(parsed["profile"]["income"], 400_000);
    assert!(parsed["eligible"]
        .as_array()
        .unwrap()
        .iter()
        .all(|program| program["jurisdiction"] == "All India"));
}

#[tokio::test]
async fn category_codes_follow_the_configured_matching() {
    let body = json!({ "utterances": ["I am a student from the state of Kerala"] });

    let response = app()
        .await
        .oneshot(post_json("/v1/eligibility", body.clone()))
        .await
        .unwrap();
    assert_eq!(read_json(response).await["profile"]["category"], "SC/ST");

    let strict = build_app(ApiConfig {
        whole_word_category_codes: true,
        ..ApiConfig::default()
    })
    .await
    .unwrap();
    let response = strict
        .oneshot(post_json("/v1/eligibility", body))
        .await
        .unwrap();
    let parsed = read_json(response).await;
    assert!(parsed["profile"].get("category").is_none());
    assert_eq!(parsed["profile"]["occupation"], "student");
}

#[tokio::test]
async fn status_lookup_reports_stage_or_404() {
    let app = app().await;

    let response = app.clone().oneshot(get("/v1/status/civ12347")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["id"], "CIV12347");
    assert_eq!(parsed["status"], "approved");
    assert_eq!(parsed["currentStage"], "Approved - Awaiting Disbursement");
    assert_eq!(parsed["progressPercent"], 100);

    let response = app.oneshot(get("/v1/status/CIV99999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["error"], "not_found");
}

#[tokio::test]
async fn programs_filter_and_lookup() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(get("/v1/programs?category=Energy&jurisdiction=Gujarat"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["count"], 2);
    assert_eq!(parsed["facets"]["categories"].as_array().unwrap().len(), 9);
    let jurisdictions = parsed["facets"]["jurisdictions"].as_array().unwrap();
    assert_eq!(jurisdictions.len(), 6);
    assert!(jurisdictions.iter().any(|j| j == "All India"));
    assert!(jurisdictions.iter().any(|j| j == "Gujarat"));

    let response = app
        .clone()
        .oneshot(get("/v1/programs?category=Space"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(get("/v1/programs?age=60%2B"))
        .await
        .unwrap();
    let parsed = read_json(response).await;
    assert!(parsed["programs"]
        .as_array()
        .unwrap()
        .iter()
        .all(|program| program["ageMax"].as_u64().unwrap() >= 60));

    let response = app
        .clone()
        .oneshot(get("/v1/programs/health-pmjay"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["name"], "Ayushman Bharat PM-JAY");

    let response = app.oneshot(get("/v1/programs/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_ranks_keyword_matches() {
    let response = app()
        .await
        .oneshot(get("/v1/search?q=rooftop%20solar&limit=2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    assert_eq!(parsed["hits"][0]["program_id"], "energy-surya-ghar");
    assert!(parsed["count"].as_u64().unwrap() <= 2);
}

#[tokio::test]
async fn translations_are_public_and_fall_back_to_english() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/translations/ta")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["language"], "ta");
    assert_eq!(parsed["entries"]["send"], "அனுப்பு");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/translations/fr")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let parsed = read_json(response).await;
    assert_eq!(parsed["requested"], "fr");
    assert_eq!(parsed["language"], "en");
    assert_eq!(parsed["entries"]["send"], "Send");
}

#[tokio::test]
async fn rate_limit_rejects_excess_requests() {
    let app = build_app(ApiConfig {
        rate_limit_window: Duration::from_secs(60),
        rate_limit_max: 2,
        ..ApiConfig::default()
    })
    .await
    .unwrap();

    for _ in 0..2 {
        let response = app.clone().oneshot(get("/v1/programs")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/v1/programs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get("retry-after").is_some());
}

#[tokio::test]
async fn custom_catalog_dir_and_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("catalog.json"),
        json!({
            "programs": [{
                "id": "local-1",
                "name": "Local Scheme",
                "description": "Village grant",
                "category": "Agriculture",
                "jurisdiction": "Punjab",
                "ageMin": 18,
                "ageMax": 80,
                "incomeMax": 500000,
                "requiredDocuments": ["Land Records"],
                "deadline": "Open all year",
                "benefits": "Grant"
            }],
            "applications": [{
                "id": "LOC1",
                "scheme": "Local Scheme",
                "status": "submitted",
                "submittedDate": "2026-03-01",
                "expectedDays": 10,
                "currentStage": "Initial Review"
            }]
        })
        .to_string(),
    )
    .unwrap();

    let app = build_app(ApiConfig {
        catalog_dir: Some(dir.path().to_path_buf()),
        database_url: Some("sqlite::memory:".to_string()),
        ..ApiConfig::default()
    })
    .await
    .unwrap();

    let response = app.clone().oneshot(get("/v1/programs")).await.unwrap();
    assert_eq!(read_json(response).await["count"], 1);

    let response = app.oneshot(get("/v1/status/loc1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["program"], "Local Scheme");
    assert_eq!(parsed["progressPercent"], 25);
}
