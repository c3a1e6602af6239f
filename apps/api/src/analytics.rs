//! Conversion tracking.
//!
//! One structured event per completed signup flow, emitted fire-and-forget:
//! handlers spawn the emit and move on, and a lost event is acceptable by
//! contract. `AppState` carries an `Arc<dyn AnalyticsSink>`; the default
//! sink writes a structured log line; setting `ANALYTICS_ENDPOINT` swaps in
//! the HTTP sink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

pub const SIGNUP_COMPLETED: &str = "signup_completed";

/// The event recorded when a flow reaches its terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionEvent {
    pub name: String,
    /// Which step completed the flow: "profile_saved" or "profile_skipped".
    pub step: String,
    pub utm_source: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl ConversionEvent {
    pub fn signup_completed(
        step: impl Into<String>,
        utm_source: impl Into<String>,
        user_agent: Option<String>,
    ) -> Self {
        ConversionEvent {
            name: SIGNUP_COMPLETED.to_string(),
            step: step.into(),
            utm_source: utm_source.into(),
            timestamp: Utc::now(),
            user_agent,
        }
    }
}

#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Best effort: implementations log failures, never propagate them.
    async fn emit(&self, event: ConversionEvent);
}

/// Default sink: the event becomes a structured log line.
pub struct TracingSink;

#[async_trait]
impl AnalyticsSink for TracingSink {
    async fn emit(&self, event: ConversionEvent) {
        info!(
            name = %event.name,
            step = %event.step,
            utm_source = %event.utm_source,
            timestamp = %event.timestamp,
            user_agent = event.user_agent.as_deref().unwrap_or("unknown"),
            "conversion event"
        );
    }
}

/// Posts the event as JSON to an external analytics endpoint.
pub struct HttpSink {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSink {
    pub fn new(endpoint: String) -> Self {
        HttpSink {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(5))
                .build()
                .expect("Failed to build HTTP client"),
            endpoint,
        }
    }
}

#[async_trait]
impl AnalyticsSink for HttpSink {
    async fn emit(&self, event: ConversionEvent) {
        let result = self
            .client
            .post(&self.endpoint)
            .json(&event)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        if let Err(e) = result {
            // No delivery guarantee; drop the event and say so.
            warn!("analytics emit failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_has_the_fixed_name_and_given_fields() {
        let event = ConversionEvent::signup_completed(
            "profile_skipped",
            "newsletter",
            Some("Mozilla/5.0".into()),
        );
        assert_eq!(event.name, SIGNUP_COMPLETED);
        assert_eq!(event.step, "profile_skipped");
        assert_eq!(event.utm_source, "newsletter");
        assert_eq!(event.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn test_event_serializes_without_a_missing_user_agent() {
        let event = ConversionEvent::signup_completed("profile_saved", "direct", None);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["name"], "signup_completed");
        assert!(json.get("user_agent").is_none());
    }
}
