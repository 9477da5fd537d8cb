use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub screening_api_url: String,
    pub screening_username: String,
    pub screening_token: String,
    /// Directory holding the persisted decision badges.
    pub draft_store_dir: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            screening_api_url: require_env("SCREENING_API_URL")?,
            screening_username: require_env("SCREENING_USERNAME")?,
            screening_token: require_env("SCREENING_TOKEN")?,
            draft_store_dir: std::env::var("DRAFT_STORE_DIR")
                .unwrap_or_else(|_| ".screening".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
