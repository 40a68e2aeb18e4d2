use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Process-local counters. Every increment is also forwarded to the
/// `metrics` facade so an installed exporter sees the same numbers.
#[derive(Debug, Default)]
pub struct AppMetrics {
    turns_total: AtomicU64,
    eligible_matches_total: AtomicU64,
    onboarding_fallback_total: AtomicU64,
    status_lookups_total: AtomicU64,
    status_misses_total: AtomicU64,
    total_latency_micros: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub turns_total: u64,
    pub eligible_matches_total: u64,
    pub onboarding_fallback_total: u64,
    pub status_lookups_total: u64,
    pub status_misses_total: u64,
    pub avg_turn_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_turn(&self) {
        self.turns_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("civic_turns_total").increment(1);
    }

    pub fn add_eligible_matches(&self, matches: usize) {
        self.eligible_matches_total
            .fetch_add(matches as u64, Ordering::Relaxed);
        metrics::counter!("civic_eligible_matches_total").increment(matches as u64);
    }

    pub fn inc_onboarding_fallback(&self) {
        self.onboarding_fallback_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("civic_onboarding_fallback_total").increment(1);
    }

    pub fn record_status_lookup(&self, found: bool) {
        self.status_lookups_total.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("civic_status_lookups_total").increment(1);
        if !found {
            self.status_misses_total.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("civic_status_misses_total").increment(1);
        }
    }

    pub fn observe_turn_latency(&self, duration: Duration) {
        self.total_latency_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        metrics::histogram!("civic_turn_latency_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let turns = self.turns_total.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);

        MetricsSnapshot {
            turns_total: turns,
            eligible_matches_total: self.eligible_matches_total.load(Ordering::Relaxed),
            onboarding_fallback_total: self.onboarding_fallback_total.load(Ordering::Relaxed),
            status_lookups_total: self.status_lookups_total.load(Ordering::Relaxed),
            status_misses_total: self.status_misses_total.load(Ordering::Relaxed),
            avg_turn_latency_millis: if turns == 0 {
                0.0
            } else {
                latency as f64 / turns as f64 / 1000.0
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,civic_api=info,civic_agents=info,civic_catalog=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
