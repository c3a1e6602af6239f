//! Multi-step signup flow: drafts, field validation, the flow state machine,
//! and the swappable account-creation backend.

pub mod backend;
pub mod flow;
pub mod handlers;
pub mod sessions;
pub mod validation;

use serde::{Deserialize, Serialize};

/// Not-yet-persisted input from the credentials step. Built from the raw
/// submission after normalization (fields trimmed, email lowercased) and
/// consumed once by the account-creation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupDraft {
    pub first_name: String,
    pub email: String,
    pub password: String,
    pub send_reminder: bool,
    pub utm_source: String,
}

/// Optional profile fields collected in step two. Discarded entirely when the
/// user skips the step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDraft {
    pub job_title: Option<String>,
    pub career_goal: Option<String>,
}

/// UTM attribution captured when a flow starts. Only `utm_source` feeds the
/// conversion event; the rest is carried for the persisted user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtmParams {
    #[serde(default = "default_utm_source")]
    pub utm_source: String,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
    #[serde(default)]
    pub utm_content: Option<String>,
    #[serde(default)]
    pub utm_term: Option<String>,
}

fn default_utm_source() -> String {
    "direct".to_string()
}

impl Default for UtmParams {
    fn default() -> Self {
        UtmParams {
            utm_source: default_utm_source(),
            utm_medium: None,
            utm_campaign: None,
            utm_content: None,
            utm_term: None,
        }
    }
}
