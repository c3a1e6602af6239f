use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A row in `users`. Enum columns come back as text (queries cast them) so
/// the row type stays plain.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub first_name: String,
    pub email: String,
    pub auth_provider: String,
    pub utm_source: String,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row in `journal_settings`: one per user, provisioned by trigger on
/// signup with reminders defaulting to Friday 16:00.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JournalSettingsRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub send_reminder: bool,
    pub reminder_day: String,
    pub reminder_time: NaiveTime,
    pub career_goal: Option<String>,
    pub job_title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
