//! Field validators for the credentials step.
//!
//! Every validator is pure and synchronous: raw string in, result out, no
//! side effects. Surfacing the result next to the field is the handler's and
//! the client's job, not ours.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::signup::SignupDraft;

/// local@domain.tld, nothing fancier. Deliverability is the auth platform's
/// problem; this only catches obvious typos before submission.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Consumer webmail domains that trigger the non-blocking work-email
/// advisory. Policy data, not a hard rule; `Config` can override the list.
pub const DEFAULT_ADVISORY_DOMAINS: &[&str] =
    &["gmail.com", "yahoo.com", "hotmail.com", "outlook.com"];

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_FIRST_NAME_LEN: usize = 2;

/// Outcome of validating one field. `advisory` never blocks submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

impl FieldValidationResult {
    fn ok() -> Self {
        FieldValidationResult {
            valid: true,
            message: None,
            advisory: None,
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        FieldValidationResult {
            valid: false,
            message: Some(message.into()),
            advisory: None,
        }
    }

    fn ok_with_advisory(advisory: impl Into<String>) -> Self {
        FieldValidationResult {
            valid: true,
            message: None,
            advisory: Some(advisory.into()),
        }
    }
}

/// Required after trimming; at least two characters.
pub fn validate_first_name(value: &str) -> FieldValidationResult {
    let value = value.trim();
    if value.is_empty() {
        return FieldValidationResult::invalid("First name is required");
    }
    if value.chars().count() < MIN_FIRST_NAME_LEN {
        return FieldValidationResult::invalid("First name must be at least 2 characters");
    }
    FieldValidationResult::ok()
}

/// Required after trimming; must match the email pattern. A valid address on
/// one of the advisory domains passes with a work-email advisory attached.
pub fn validate_email(value: &str, advisory_domains: &[String]) -> FieldValidationResult {
    let value = value.trim();
    if value.is_empty() {
        return FieldValidationResult::invalid("Email is required");
    }
    if !EMAIL_RE.is_match(value) {
        return FieldValidationResult::invalid("Please enter a valid email address");
    }
    let domain = value.rsplit('@').next().unwrap_or_default().to_lowercase();
    if advisory_domains.iter().any(|d| d.eq_ignore_ascii_case(&domain)) {
        return FieldValidationResult::ok_with_advisory(
            "Consider using your work email for better experience",
        );
    }
    FieldValidationResult::ok()
}

/// Required; at least six characters. Not trimmed, since whitespace is
/// password material.
pub fn validate_password(value: &str) -> FieldValidationResult {
    if value.is_empty() {
        return FieldValidationResult::invalid("Password is required");
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return FieldValidationResult::invalid("Password must be at least 6 characters");
    }
    FieldValidationResult::ok()
}

/// Per-field results for a full credentials submission.
#[derive(Debug, Clone, Serialize)]
pub struct SignupValidation {
    pub first_name: FieldValidationResult,
    pub email: FieldValidationResult,
    pub password: FieldValidationResult,
}

impl SignupValidation {
    /// Submission is permitted iff every field is valid. Advisories don't
    /// count against this.
    pub fn is_valid(&self) -> bool {
        self.first_name.valid && self.email.valid && self.password.valid
    }
}

pub fn validate_signup(draft: &SignupDraft, advisory_domains: &[String]) -> SignupValidation {
    SignupValidation {
        first_name: validate_first_name(&draft.first_name),
        email: validate_email(&draft.email, advisory_domains),
        password: validate_password(&draft.password),
    }
}
