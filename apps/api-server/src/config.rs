//! Application configuration loaded from environment variables.

use std::env;

use blogicum_infra::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    /// Absolute base URL used in links sent by mail.
    pub site_url: String,
    pub mail_from: String,
    pub mail_webhook_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database: DatabaseConfig::from_env(),
            site_url: env::var("SITE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string()),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "noreply@blogicum.local".to_string()),
            mail_webhook_url: env::var("MAIL_WEBHOOK_URL").ok(),
        }
    }
}
