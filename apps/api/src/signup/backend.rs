//! Account-creation / profile-save backend.
//!
//! `AppState` holds an `Arc<dyn SignupBackend>`, selected at startup via
//! `SIGNUP_BACKEND`. The controller and handlers only ever see the trait, so
//! swapping the simulated backend for a real one touches nothing else.
//!
//! Default: `SimulatedBackend` (fixed-delay stand-in for the hosted
//! platform). Production: `PostgresBackend` against the service's own schema.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::models::user::{JournalSettingsRow, UserRow};
use crate::signup::{ProfileDraft, SignupDraft};

/// Opaque account identifier produced by a successful account creation.
pub type AccountId = String;

/// The single backend error kind: a submission failed, with a message fit
/// for the step-level banner. Every occurrence is recoverable by retrying.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        BackendError {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait SignupBackend: Send + Sync {
    async fn create_account(&self, draft: &SignupDraft) -> Result<AccountId, BackendError>;

    async fn save_profile(
        &self,
        account_id: &str,
        profile: &ProfileDraft,
    ) -> Result<(), BackendError>;
}

// ────────────────────────────────────────────────────────────────────────────
// SimulatedBackend — default, fixed-delay stand-in
// ────────────────────────────────────────────────────────────────────────────

/// Sleeps for a fixed delay, then succeeds (or fails, when constructed with
/// `failing`; used in tests to exercise the error path).
pub struct SimulatedBackend {
    delay: Duration,
    fail_with: Option<String>,
}

impl SimulatedBackend {
    pub fn new(delay: Duration) -> Self {
        SimulatedBackend {
            delay,
            fail_with: None,
        }
    }

    /// A backend whose every call fails with `message`.
    #[allow(dead_code)]
    pub fn failing(message: impl Into<String>) -> Self {
        SimulatedBackend {
            delay: Duration::ZERO,
            fail_with: Some(message.into()),
        }
    }
}

#[async_trait]
impl SignupBackend for SimulatedBackend {
    async fn create_account(&self, draft: &SignupDraft) -> Result<AccountId, BackendError> {
        tokio::time::sleep(self.delay).await;
        if let Some(message) = &self.fail_with {
            return Err(BackendError::new(message.clone()));
        }
        let account_id = format!("sim-{}", Uuid::new_v4());
        info!(
            account_id,
            utm_source = %draft.utm_source,
            send_reminder = draft.send_reminder,
            "simulated account created"
        );
        Ok(account_id)
    }

    async fn save_profile(
        &self,
        account_id: &str,
        profile: &ProfileDraft,
    ) -> Result<(), BackendError> {
        tokio::time::sleep(self.delay).await;
        if let Some(message) = &self.fail_with {
            return Err(BackendError::new(message.clone()));
        }
        info!(
            account_id,
            job_title = ?profile.job_title,
            career_goal = ?profile.career_goal,
            "simulated profile saved"
        );
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// PostgresBackend — production implementation
// ────────────────────────────────────────────────────────────────────────────

/// Writes straight into the migrated schema. Settings and analytics rows are
/// provisioned by the `users` insert trigger; credential storage stays with
/// the auth platform and is out of scope here.
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    pub fn new(pool: PgPool) -> Self {
        PostgresBackend { pool }
    }
}

#[async_trait]
impl SignupBackend for PostgresBackend {
    async fn create_account(&self, draft: &SignupDraft) -> Result<AccountId, BackendError> {
        let user: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (first_name, email, auth_provider, utm_source)
            VALUES ($1, $2, 'email', $3)
            RETURNING id, first_name, email, auth_provider::text AS auth_provider,
                      utm_source, onboarding_completed, created_at, updated_at
            "#,
        )
        .bind(&draft.first_name)
        .bind(&draft.email)
        .bind(&draft.utm_source)
        .fetch_one(&self.pool)
        .await
        .map_err(submission_error)?;

        // The insert trigger provisions settings with reminders on; only an
        // explicit opt-out needs a write.
        if !draft.send_reminder {
            sqlx::query("UPDATE journal_settings SET send_reminder = FALSE WHERE user_id = $1")
                .bind(user.id)
                .execute(&self.pool)
                .await
                .map_err(submission_error)?;
        }

        info!(user_id = %user.id, utm_source = %user.utm_source, "account created");
        Ok(user.id.to_string())
    }

    async fn save_profile(
        &self,
        account_id: &str,
        profile: &ProfileDraft,
    ) -> Result<(), BackendError> {
        let user_id = Uuid::parse_str(account_id)
            .map_err(|_| BackendError::new("Unknown account. Please start over."))?;

        let settings: Option<JournalSettingsRow> = sqlx::query_as(
            r#"
            UPDATE journal_settings
            SET job_title = $2, career_goal = $3::career_goal_type
            WHERE user_id = $1
            RETURNING id, user_id, send_reminder, reminder_day::text AS reminder_day,
                      reminder_time, career_goal::text AS career_goal, job_title,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(&profile.job_title)
        .bind(&profile.career_goal)
        .fetch_optional(&self.pool)
        .await
        .map_err(submission_error)?;

        let settings = settings
            .ok_or_else(|| BackendError::new("Unknown account. Please start over."))?;

        sqlx::query("UPDATE users SET onboarding_completed = TRUE WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(submission_error)?;

        debug!(
            user_id = %user_id,
            job_title = ?settings.job_title,
            career_goal = ?settings.career_goal,
            "profile saved"
        );
        Ok(())
    }
}

/// Collapse database failures into the single user-facing submission error.
/// The only case worth distinguishing for the user is a duplicate email.
fn submission_error(e: sqlx::Error) -> BackendError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return BackendError::new("An account with this email already exists");
        }
    }
    error!("signup backend database error: {e}");
    BackendError::new("An error occurred during signup. Please try again.")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> SignupDraft {
        SignupDraft {
            first_name: "Ada".into(),
            email: "ada@company.com".into(),
            password: "secret1".into(),
            send_reminder: true,
            utm_source: "direct".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_backend_succeeds_after_delay() {
        let backend = SimulatedBackend::new(Duration::from_millis(1500));
        let account_id = backend.create_account(&draft()).await.unwrap();
        assert!(account_id.starts_with("sim-"));
        backend
            .save_profile(&account_id, &ProfileDraft::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_failing_backend_surfaces_its_message() {
        let backend = SimulatedBackend::failing("upstream unavailable");
        let err = backend.create_account(&draft()).await.unwrap_err();
        assert_eq!(err.to_string(), "upstream unavailable");

        let err = backend
            .save_profile("sim-x", &ProfileDraft::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "upstream unavailable");
    }
}
