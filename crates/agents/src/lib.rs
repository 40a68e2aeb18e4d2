use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use civic_catalog::{CatalogIndex, SearchHit};
use civic_core::i18n::translate;
use civic_core::tracker::application_key;
use civic_core::{
    classify_intent, compose_from_report, detect_language, evaluate_eligibility,
    extract_profile_with, normalize_text, ApplicationStatus, AssistantReply, ChatInput,
    EligibilityReport, EngineConfig, ExplorerFilter, Language, Profile, Program, ReplyContext,
    StatusLookupError,
};
use civic_observability::AppMetrics;
use civic_storage::{CatalogRepository, StatusRepository};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Composer branch used when nothing more specific applies.
const ONBOARDING_HANDLER: &str = "onboarding";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    #[serde(flatten)]
    pub status: ApplicationStatus,
    pub progress_percent: u8,
}

/// Per-turn orchestration over an immutable catalog. Holds no
/// conversation state; callers send the history with every turn.
#[derive(Clone)]
pub struct CivicAssistant<S>
where
    S: CatalogRepository + StatusRepository,
{
    catalog: Arc<Vec<Program>>,
    index: Arc<CatalogIndex>,
    config: EngineConfig,
    store: Arc<S>,
    metrics: Arc<AppMetrics>,
}

impl<S> CivicAssistant<S>
where
    S: CatalogRepository + StatusRepository,
{
    pub fn new(
        catalog: Vec<Program>,
        store: Arc<S>,
        config: EngineConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        let index = CatalogIndex::build(&catalog);
        Self {
            catalog: Arc::new(catalog),
            index: Arc::new(index),
            config,
            store,
            metrics,
        }
    }

    /// Snapshots the store's programs. Later upserts are not seen.
    pub async fn from_store(
        store: Arc<S>,
        config: EngineConfig,
        metrics: Arc<AppMetrics>,
    ) -> Result<Self> {
        let catalog = store.list_programs().await?;
        info!(programs = catalog.len(), "assistant catalog snapshot taken");
        Ok(Self::new(catalog, store, config, metrics))
    }

    pub fn catalog(&self) -> &[Program] {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &AppMetrics {
        &self.metrics
    }

    #[instrument(skip(self, input), fields(history = input.history.len()))]
    pub fn handle_turn(&self, input: &ChatInput) -> AssistantReply {
        let started = Instant::now();
        self.metrics.inc_turn();

        let latest = normalize_text(&input.text);
        let explicit = Language::from_optional_str(input.language.as_deref());
        let language = detect_language(explicit, &latest);
        let intent = classify_intent(&latest);

        let profile = extract_profile_with(&input.utterances(), &self.config);
        debug!(?profile, %intent, "profile extracted");

        let report = evaluate_eligibility(&profile, &self.catalog);
        self.metrics.add_eligible_matches(report.len());

        let (handler, reply_text) = compose_from_report(&ReplyContext {
            intent,
            profile: &profile,
            report: &report,
            user_text: &latest,
            config: &self.config,
        });
        if handler == ONBOARDING_HANDLER {
            self.metrics.inc_onboarding_fallback();
        }

        let greeting = input
            .history
            .is_empty()
            .then(|| translate("greeting", language.as_code()).to_string());

        self.metrics.observe_turn_latency(started.elapsed());
        info!(
            intent = %intent,
            language = language.as_code(),
            handler,
            eligible = report.len(),
            "turn handled"
        );

        AssistantReply {
            reply_text,
            intent,
            eligible_count: report.len(),
            eligible_program_ids: report.eligible.iter().map(|p| p.id.clone()).collect(),
            handler: handler.to_string(),
            language,
            greeting,
            profile,
        }
    }

    pub fn eligibility(&self, profile: &Profile) -> EligibilityReport {
        let report = evaluate_eligibility(profile, &self.catalog);
        self.metrics.add_eligible_matches(report.len());
        report
    }

    pub fn explore(&self, filter: &ExplorerFilter) -> Vec<&Program> {
        filter.apply(&self.catalog)
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        self.index.search(query, limit)
    }

    pub fn program(&self, id: &str) -> Option<&Program> {
        self.catalog.iter().find(|program| program.id == id)
    }

    /// Fails with a [`StatusLookupError`] for blank or unknown ids; other
    /// errors come from the store.
    #[instrument(skip(self))]
    pub async fn lookup_status(&self, id: &str) -> Result<StatusReport> {
        let key = match application_key(id) {
            Ok(key) => key,
            Err(err) => {
                self.metrics.record_status_lookup(false);
                return Err(err.into());
            }
        };

        let found = self.store.find_status(&key).await?;
        self.metrics.record_status_lookup(found.is_some());
        let status = found.ok_or(StatusLookupError::NotFound(key))?;

        Ok(StatusReport {
            progress_percent: status.status.progress_percent(),
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::{ChatTurn, Intent, StatusStage};
    use civic_storage::Store;

    async fn assistant() -> CivicAssistant<Store> {
        let bundle = civic_catalog::default_bundle().unwrap();
        let store = Store::memory();
        store
            .seed(bundle.programs, bundle.applications)
            .await
            .unwrap();
        CivicAssistant::from_store(Arc::new(store), EngineConfig::default(), AppMetrics::shared())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn first_turn_gets_a_greeting_and_onboarding() {
        let assistant = assistant().await;
        let reply = assistant.handle_turn(&ChatInput::new("hello"));
        assert_eq!(reply.intent, Intent::General);
        assert_eq!(reply.handler, "onboarding");
        assert!(reply.reply_text.starts_with("Hello! I'm CivicAI"));
        assert!(reply.greeting.is_some());
        assert_eq!(assistant.metrics().snapshot().onboarding_fallback_total, 1);
    }

    #[tokio::test]
    async fn profile_accumulates_across_turns() {
        let assistant = assistant().await;
        let input = ChatInput {
            history: vec![
                ChatTurn::user("I am 20 years old and a student"),
                ChatTurn::assistant("Tell me more."),
            ],
            text: "my family income is 3 lakhs and I live in Tamil Nadu. any scholarship?"
                .to_string(),
            language: None,
        };

        let reply = assistant.handle_turn(&input);
        assert_eq!(reply.intent, Intent::Education);
        assert_eq!(reply.profile.age, Some(20));
        assert_eq!(reply.profile.income, Some(300_000));
        assert_eq!(reply.profile.jurisdiction.as_deref(), Some("Tamil Nadu"));
        assert!(reply.greeting.is_none());
        assert!(reply.eligible_count > 0);
        assert!(reply
            .eligible_program_ids
            .iter()
            .all(|id| !id.starts_with("edu-ka")));
    }

    #[tokio::test]
    async fn explicit_language_wins_over_script() {
        let assistant = assistant().await;
        let mut input = ChatInput::new("hello");
        input.language = Some("ta".to_string());
        assert_eq!(assistant.handle_turn(&input).language, Language::Ta);

        let input = ChatInput::new("मुझे छात्रवृत्ति चाहिए");
        assert_eq!(assistant.handle_turn(&input).language, Language::Hi);
    }

    #[tokio::test]
    async fn status_lookup_is_case_insensitive() {
        let assistant = assistant().await;
        let report = assistant.lookup_status(" civ12346 ").await.unwrap();
        assert_eq!(report.status.status, StatusStage::UnderVerification);
        assert_eq!(report.progress_percent, 50);

        let missing = assistant.lookup_status("CIV00000").await.unwrap_err();
        assert_eq!(
            missing.downcast_ref::<StatusLookupError>(),
            Some(&StatusLookupError::NotFound("CIV00000".to_string()))
        );

        let blank = assistant.lookup_status("   ").await.unwrap_err();
        assert_eq!(
            blank.downcast_ref::<StatusLookupError>(),
            Some(&StatusLookupError::EmptyId)
        );
        assert_eq!(assistant.metrics().snapshot().status_misses_total, 2);
    }

    #[tokio::test]
    async fn program_and_search_views() {
        let assistant = assistant().await;
        assert!(assistant.program("health-pmjay").is_some());
        assert!(assistant.program("nope").is_none());
        assert!(!assistant.search("pension", 3).is_empty());
    }
}
