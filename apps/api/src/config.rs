use anyhow::{bail, Context, Result};

use crate::signup::validation::DEFAULT_ADVISORY_DOMAINS;

/// Which `SignupBackend` implementation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Fixed-delay stand-in for the hosted platform (default).
    Simulated,
    /// Writes into the service's own migrated schema.
    Postgres,
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub backend: BackendKind,
    /// Delay for the simulated backend's calls, in milliseconds.
    pub simulated_delay_ms: u64,
    /// When set, conversion events are POSTed here instead of logged.
    pub analytics_endpoint: Option<String>,
    /// Consumer webmail domains that trigger the work-email advisory.
    pub advisory_email_domains: Vec<String>,
    /// Where the success panel's "start journaling" action points.
    pub app_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let backend = match std::env::var("SIGNUP_BACKEND")
            .unwrap_or_else(|_| "simulated".to_string())
            .to_lowercase()
            .as_str()
        {
            "simulated" => BackendKind::Simulated,
            "postgres" => BackendKind::Postgres,
            other => bail!("SIGNUP_BACKEND must be 'simulated' or 'postgres', got '{other}'"),
        };

        let advisory_email_domains = std::env::var("ADVISORY_EMAIL_DOMAINS")
            .map(|raw| {
                raw.split(',')
                    .map(|d| d.trim().to_lowercase())
                    .filter(|d| !d.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| {
                DEFAULT_ADVISORY_DOMAINS
                    .iter()
                    .map(|d| d.to_string())
                    .collect()
            });

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            backend,
            simulated_delay_ms: std::env::var("SIMULATED_DELAY_MS")
                .unwrap_or_else(|_| "1500".to_string())
                .parse::<u64>()
                .context("SIMULATED_DELAY_MS must be a number of milliseconds")?,
            analytics_endpoint: std::env::var("ANALYTICS_ENDPOINT").ok(),
            advisory_email_domains,
            app_url: std::env::var("APP_URL").unwrap_or_else(|_| "/app".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
