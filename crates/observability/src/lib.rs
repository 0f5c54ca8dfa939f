use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use travelwise_core::SuggestionSource;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    places_resolutions_total: AtomicU64,
    dataset_resolutions_total: AtomicU64,
    ai_resolutions_total: AtomicU64,
    fallback_total: AtomicU64,
    stage_failures_total: AtomicU64,
    provider_calls_total: AtomicU64,
    plans_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub places_resolutions_total: u64,
    pub dataset_resolutions_total: u64,
    pub ai_resolutions_total: u64,
    pub fallback_total: u64,
    pub stage_failures_total: u64,
    pub provider_calls_total: u64,
    pub plans_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        counter!("travelwise_requests_total").increment(1);
    }

    /// Counts which waterfall stage produced the suggestions.
    pub fn record_resolution(&self, source: SuggestionSource) {
        let slot = match source {
            SuggestionSource::PlacesApi => &self.places_resolutions_total,
            SuggestionSource::Dataset => &self.dataset_resolutions_total,
            SuggestionSource::Ai => &self.ai_resolutions_total,
            SuggestionSource::Fallback => &self.fallback_total,
        };
        slot.fetch_add(1, Ordering::Relaxed);
        counter!("travelwise_waterfall_resolutions_total", "stage" => source.as_str()).increment(1);
    }

    pub fn inc_stage_failure(&self, source: SuggestionSource) {
        self.stage_failures_total.fetch_add(1, Ordering::Relaxed);
        counter!("travelwise_waterfall_failures_total", "stage" => source.as_str()).increment(1);
    }

    pub fn inc_provider_call(&self, provider: &'static str) {
        self.provider_calls_total.fetch_add(1, Ordering::Relaxed);
        counter!("travelwise_provider_calls_total", "provider" => provider).increment(1);
    }

    pub fn inc_plan(&self) {
        self.plans_total.fetch_add(1, Ordering::Relaxed);
        counter!("travelwise_plans_total").increment(1);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        histogram!("travelwise_request_latency_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            places_resolutions_total: self.places_resolutions_total.load(Ordering::Relaxed),
            dataset_resolutions_total: self.dataset_resolutions_total.load(Ordering::Relaxed),
            ai_resolutions_total: self.ai_resolutions_total.load(Ordering::Relaxed),
            fallback_total: self.fallback_total.load(Ordering::Relaxed),
            stage_failures_total: self.stage_failures_total.load(Ordering::Relaxed),
            provider_calls_total: self.provider_calls_total.load(Ordering::Relaxed),
            plans_total: self.plans_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,travelwise_api=info,travelwise_agents=info,travelwise_providers=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();

        tracing::debug!(service = service_name, "tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_tracks_stages_and_average_latency() {
        let metrics = AppMetrics::default();
        metrics.inc_request();
        metrics.inc_request();
        metrics.observe_latency(Duration::from_millis(30));
        metrics.observe_latency(Duration::from_millis(10));
        metrics.record_resolution(SuggestionSource::Dataset);
        metrics.record_resolution(SuggestionSource::Fallback);
        metrics.inc_stage_failure(SuggestionSource::Ai);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.dataset_resolutions_total, 1);
        assert_eq!(snapshot.fallback_total, 1);
        assert_eq!(snapshot.stage_failures_total, 1);
        assert!((snapshot.avg_latency_millis - 20.0).abs() < f64::EPSILON);
    }
}
