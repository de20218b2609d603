//! Process configuration, read once from the environment at startup.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `APP_URL` | `http://localhost:3000` | Public base URL used in tracking links |
//! | `SMTP_HOST` | unset | SMTP relay; console mailer when unset |
//! | `SMTP_PORT` | `587` | |
//! | `SMTP_USER` / `SMTP_PASSWORD` | unset | Relay credentials |
//! | `SMTP_FROM` | required with `SMTP_HOST` | Sender address |
//! | `SMTP_TLS` | `starttls` | `starttls`, `tls` or `none` |
//! | `PHISHING_SIM_API_KEY` | unset | Bearer key for admin routes |
//! | `PHISHING_SIM_CORS_ORIGINS` | unset | Comma-separated allowed origins |
//! | `PHISHING_SIM_DB` | platform data dir | Database file path |

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::api::SecurityConfig;
use crate::mail::{MailError, MailerConfig, TlsMode};
use crate::phishing::PhishingConfig;

pub const DEFAULT_APP_URL: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub phishing: PhishingConfig,
    /// `None` means mail is logged instead of delivered.
    pub mailer: Option<MailerConfig>,
    pub security: SecurityConfig,
    pub database_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let app_url = var("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string());

        let mailer = match var("SMTP_HOST") {
            Some(host) => {
                let from = var("SMTP_FROM").ok_or_else(|| {
                    MailError::MissingConfig("SMTP_FROM is required when SMTP_HOST is set".into())
                })?;
                let mut config = MailerConfig::new(host, from);
                if let Some(port) = var("SMTP_PORT") {
                    config.port = port
                        .parse()
                        .with_context(|| format!("Invalid SMTP_PORT: {}", port))?;
                }
                if let Some(tls) = var("SMTP_TLS") {
                    config.tls = TlsMode::from_str(&tls)
                        .ok_or_else(|| anyhow!("Invalid SMTP_TLS: {}", tls))?;
                }
                config.username = var("SMTP_USER");
                config.password = var("SMTP_PASSWORD");
                Some(config)
            }
            None => None,
        };

        let security = SecurityConfig {
            api_key: var("PHISHING_SIM_API_KEY"),
            cors_origins: var("PHISHING_SIM_CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect()),
        };

        Ok(Self {
            phishing: PhishingConfig::new(app_url),
            mailer,
            security,
            database_path: var("PHISHING_SIM_DB").map(PathBuf::from),
        })
    }
}
