use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::analytics::{AnalyticsSink, ConversionEvent};
use crate::calendar;
use crate::errors::AppError;
use crate::signup::backend::SignupBackend;
use crate::signup::flow::{FlowSession, FlowState};
use crate::signup::validation::{self, FieldValidationResult};
use crate::signup::{ProfileDraft, SignupDraft, UtmParams};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FlowStatusResponse {
    pub flow_id: Uuid,
    /// Which of the three views is visible.
    pub state: FlowState,
    /// True while a submission for the current step is outstanding.
    pub pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
}

impl FlowStatusResponse {
    fn from_session(session: &FlowSession, state: &AppState) -> Self {
        FlowStatusResponse {
            flow_id: session.id,
            state: session.state,
            pending: session.pending,
            app_url: session
                .state
                .is_terminal()
                .then(|| state.config.app_url.clone()),
        }
    }
}

/// POST /api/v1/signup
/// Starts a flow. The optional body carries UTM attribution; absent params
/// default to a "direct" source.
pub async fn handle_start(
    State(state): State<AppState>,
    body: Option<Json<UtmParams>>,
) -> Json<FlowStatusResponse> {
    let utm = body.map(|Json(u)| u).unwrap_or_default();
    let session = state.sessions.create(utm);
    info!(
        flow_id = %session.id,
        utm_source = %session.utm.utm_source,
        "signup flow started"
    );
    Json(FlowStatusResponse::from_session(&session, &state))
}

/// GET /api/v1/signup/:id
pub async fn handle_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FlowStatusResponse>, AppError> {
    let session = state.sessions.get(id).ok_or_else(flow_not_found)?;
    Ok(Json(FlowStatusResponse::from_session(&session, &state)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupField {
    FirstName,
    Email,
    Password,
}

#[derive(Debug, Deserialize)]
pub struct FieldValidationRequest {
    pub field: SignupField,
    pub value: String,
}

/// POST /api/v1/signup/validate
/// Server-side counterpart of per-field blur/input validation.
pub async fn handle_validate(
    State(state): State<AppState>,
    Json(req): Json<FieldValidationRequest>,
) -> Json<FieldValidationResult> {
    let result = match req.field {
        SignupField::FirstName => validation::validate_first_name(&req.value),
        SignupField::Email => {
            validation::validate_email(&req.value, &state.config.advisory_email_domains)
        }
        SignupField::Password => validation::validate_password(&req.value),
    };
    Json(result)
}

#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    pub first_name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_send_reminder")]
    pub send_reminder: bool,
}

fn default_send_reminder() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub flow_id: Uuid,
    pub state: FlowState,
    /// Transient step acknowledgment, distinct from the terminal success view.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
}

/// POST /api/v1/signup/:id/account
/// Credentials submission: validate, guard the step, run the backend call.
/// On failure the flow stays in credentials and the form re-enables.
pub async fn handle_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AccountRequest>,
) -> Result<Json<SubmitResponse>, AppError> {
    let session = state.sessions.get(id).ok_or_else(flow_not_found)?;
    let draft = normalized_draft(req, session.utm.utm_source.clone());

    let checked = validation::validate_signup(&draft, &state.config.advisory_email_domains);
    if !checked.is_valid() {
        return Err(AppError::UnprocessableEntity(
            serde_json::to_string(&checked).unwrap_or_default(),
        ));
    }

    begin_step(&state, id, FlowState::Credentials)?;

    match state.backend.create_account(&draft).await {
        Ok(account_id) => {
            let session = state
                .sessions
                .with(id, |s| {
                    s.complete_step();
                    s.account_id = Some(account_id.clone());
                    s.clone()
                })
                .ok_or_else(flow_not_found)?;
            Ok(Json(SubmitResponse {
                flow_id: id,
                state: session.state,
                message: "Account created".to_string(),
                account_id: Some(account_id),
                app_url: None,
            }))
        }
        Err(e) => {
            state.sessions.with(id, |s| s.fail_step());
            Err(e.into())
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub career_goal: Option<String>,
}

/// POST /api/v1/signup/:id/profile
/// Profile submission; both fields optional. Reaching success fires the
/// one-time conversion event.
pub async fn handle_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    body: Option<Json<ProfileRequest>>,
) -> Result<Json<SubmitResponse>, AppError> {
    let profile = normalized_profile(body.map(|Json(r)| r).unwrap_or_default());

    begin_step(&state, id, FlowState::Profile)?;

    // A flow only reaches the profile step through a successful account
    // creation, so the id is present here.
    let account_id = match state.sessions.get(id).and_then(|s| s.account_id.clone()) {
        Some(account_id) => account_id,
        None => {
            state.sessions.with(id, |s| s.fail_step());
            return Err(AppError::Internal(anyhow::anyhow!(
                "flow {id} is in the profile step without an account id"
            )));
        }
    };

    match state.backend.save_profile(&account_id, &profile).await {
        Ok(()) => {
            let session = state
                .sessions
                .with(id, |s| {
                    s.complete_step();
                    s.clone()
                })
                .ok_or_else(flow_not_found)?;
            finish_conversion(&state, id, "profile_saved", &headers);
            Ok(Json(SubmitResponse {
                flow_id: id,
                state: session.state,
                message: "Profile saved".to_string(),
                account_id: Some(account_id),
                app_url: Some(state.config.app_url.clone()),
            }))
        }
        Err(e) => {
            state.sessions.with(id, |s| s.fail_step());
            Err(e.into())
        }
    }
}

/// POST /api/v1/signup/:id/skip
/// Skip the optional profile step: no backend call, straight to success.
pub async fn handle_skip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<SubmitResponse>, AppError> {
    let skipped = state
        .sessions
        .with(id, |s| s.skip_profile())
        .ok_or_else(flow_not_found)?;
    skipped?;

    finish_conversion(&state, id, "profile_skipped", &headers);

    let session = state.sessions.get(id).ok_or_else(flow_not_found)?;
    Ok(Json(SubmitResponse {
        flow_id: id,
        state: session.state,
        message: "Profile skipped".to_string(),
        account_id: session.account_id,
        app_url: Some(state.config.app_url.clone()),
    }))
}

#[derive(Debug, Serialize)]
pub struct CalendarLinkResponse {
    pub url: String,
}

/// GET /api/v1/signup/:id/calendar-link
/// Success-panel action: the weekly reminder event URL. Does not change
/// state.
pub async fn handle_calendar_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CalendarLinkResponse>, AppError> {
    let session = state.sessions.get(id).ok_or_else(flow_not_found)?;
    if !session.state.is_terminal() {
        return Err(AppError::Conflict(
            "Finish signing up to get your reminder link".to_string(),
        ));
    }
    Ok(Json(CalendarLinkResponse {
        url: calendar::reminder_link(Utc::now()).to_string(),
    }))
}

fn flow_not_found() -> AppError {
    AppError::NotFound("No signup flow with that id".to_string())
}

/// Guard a step start: unknown flow → 404, wrong step / in flight → 409.
fn begin_step(state: &AppState, id: Uuid, step: FlowState) -> Result<(), AppError> {
    let begun = state
        .sessions
        .with(id, |s| s.begin_step(step))
        .ok_or_else(flow_not_found)?;
    begun?;
    Ok(())
}

/// Emit the conversion event if this call won the one-shot latch.
fn finish_conversion(state: &AppState, id: Uuid, step: &str, headers: &HeaderMap) {
    let won = state
        .sessions
        .with(id, |s| s.mark_converted().then(|| s.utm.utm_source.clone()));
    let Some(Some(utm_source)) = won else {
        return;
    };

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let event = ConversionEvent::signup_completed(step, utm_source, user_agent);
    let sink = state.analytics.clone();
    // Fire-and-forget: losing an event is acceptable, delaying the response
    // is not.
    tokio::spawn(async move { sink.emit(event).await });
}

/// Trim name and email, lowercase the email, keep the password as typed.
fn normalized_draft(req: AccountRequest, utm_source: String) -> SignupDraft {
    SignupDraft {
        first_name: req.first_name.trim().to_string(),
        email: req.email.trim().to_lowercase(),
        password: req.password,
        send_reminder: req.send_reminder,
        utm_source,
    }
}

/// Trim the job title; empty strings mean "not provided" for both fields.
fn normalized_profile(req: ProfileRequest) -> ProfileDraft {
    ProfileDraft {
        job_title: req
            .job_title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        career_goal: req.career_goal.filter(|g| !g.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_normalization_trims_and_lowercases() {
        let draft = normalized_draft(
            AccountRequest {
                first_name: "  Ada ".into(),
                email: " Ada@Company.COM ".into(),
                password: " secret1 ".into(),
                send_reminder: false,
            },
            "newsletter".into(),
        );
        assert_eq!(draft.first_name, "Ada");
        assert_eq!(draft.email, "ada@company.com");
        assert_eq!(draft.password, " secret1 ", "passwords are never trimmed");
        assert!(!draft.send_reminder);
        assert_eq!(draft.utm_source, "newsletter");
    }

    #[test]
    fn test_profile_normalization_drops_empty_fields() {
        let profile = normalized_profile(ProfileRequest {
            job_title: Some("   ".into()),
            career_goal: Some(String::new()),
        });
        assert!(profile.job_title.is_none());
        assert!(profile.career_goal.is_none());

        let profile = normalized_profile(ProfileRequest {
            job_title: Some(" Staff Engineer ".into()),
            career_goal: Some("promotion".into()),
        });
        assert_eq!(profile.job_title.as_deref(), Some("Staff Engineer"));
        assert_eq!(profile.career_goal.as_deref(), Some("promotion"));
    }
}
