//! Service configuration loaded from the environment
//!
//! Every setting has a default so the service starts in demo mode with no
//! environment at all. Values are validated once, at start-up.

use anyhow::{Context, Result, bail};
use auth::rate_limiter::RateLimiterConfig;
use config::{Config, Environment};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Signing key used outside production when `JWT_SECRET` is unset
pub const DEVELOPMENT_JWT_SECRET: &str = "eventsphere-development-secret";

/// Storage and token variant the service runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Seeded in-memory store and unverified `demo-` tokens
    Demo,
    /// PostgreSQL store and signed JWTs
    Database,
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppMode::Demo => f.write_str("demo"),
            AppMode::Database => f.write_str("database"),
        }
    }
}

impl FromStr for AppMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "demo" => Ok(AppMode::Demo),
            "database" | "db" => Ok(AppMode::Database),
            other => Err(format!(
                "Unknown APP_MODE '{}'; expected 'demo' or 'database'",
                other
            )),
        }
    }
}

/// Raw settings as read from the environment
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app_mode: String,
    pub rust_env: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: Option<String>,
    pub jwt_expiry_seconds: u64,
    pub payment_success_rate: f64,
    pub seed_enabled: Option<bool>,
    pub cors_allowed_origins: String,
    pub login_max_attempts: u32,
    pub login_window_seconds: u64,
    pub login_ban_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let throttling = RateLimiterConfig::default();
        Self {
            app_mode: "demo".to_string(),
            rust_env: "development".to_string(),
            host: "0.0.0.0".to_string(),
            port: 5000,
            jwt_secret: None,
            jwt_expiry_seconds: auth::jwt::DEFAULT_TOKEN_EXPIRY,
            payment_success_rate: 0.9,
            seed_enabled: None,
            cors_allowed_origins: "*".to_string(),
            login_max_attempts: throttling.max_attempts,
            login_window_seconds: throttling.window_seconds,
            login_ban_seconds: throttling.ban_duration_seconds,
        }
    }
}

impl AppConfig {
    /// Load and validate settings from environment variables
    pub fn from_env() -> Result<Self> {
        let config: AppConfig = Config::builder()
            .add_source(Environment::default().try_parsing(true).ignore_empty(true))
            .build()
            .context("Failed to read configuration from the environment")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot start with
    pub fn validate(&self) -> Result<()> {
        self.mode()?;

        if !(0.0..=1.0).contains(&self.payment_success_rate) {
            bail!(
                "PAYMENT_SUCCESS_RATE must be between 0 and 1, got {}",
                self.payment_success_rate
            );
        }

        if self.jwt_expiry_seconds == 0 {
            bail!("JWT_EXPIRY_SECONDS must be greater than zero");
        }

        if self.login_max_attempts == 0 {
            bail!("LOGIN_MAX_ATTEMPTS must be greater than zero");
        }

        if self.is_production()
            && self.mode()? == AppMode::Database
            && self.explicit_secret().is_none()
        {
            bail!("JWT_SECRET must be set in production");
        }

        Ok(())
    }

    pub fn mode(&self) -> Result<AppMode> {
        self.app_mode.parse::<AppMode>().map_err(anyhow::Error::msg)
    }

    pub fn is_production(&self) -> bool {
        self.rust_env.trim().eq_ignore_ascii_case("production")
    }

    /// Seeding defaults to on everywhere except production
    pub fn seed_enabled(&self) -> bool {
        self.seed_enabled.unwrap_or(!self.is_production())
    }

    fn explicit_secret(&self) -> Option<&str> {
        self.jwt_secret
            .as_deref()
            .map(str::trim)
            .filter(|secret| !secret.is_empty())
    }

    /// Signing key, falling back to the development secret outside production
    pub fn jwt_secret(&self) -> Result<String> {
        match self.explicit_secret() {
            Some(secret) => Ok(secret.to_string()),
            None if self.is_production() => bail!("JWT_SECRET must be set in production"),
            None => Ok(DEVELOPMENT_JWT_SECRET.to_string()),
        }
    }

    pub fn rate_limiter_config(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_attempts: self.login_max_attempts,
            window_seconds: self.login_window_seconds,
            ban_duration_seconds: self.login_ban_seconds,
        }
    }

    /// Allowed CORS origins; `None` means any origin
    pub fn cors_origins(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            None
        } else {
            Some(origins)
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
