//! Application state shared across handlers

use auth::password::PasswordService;
use auth::rate_limiter::{RateLimiter, RateLimiterConfig};
use auth::tokens::TokenAuthority;
use std::sync::Arc;

use crate::booking::EventLocks;
use crate::config::AppMode;
use crate::payment::PaymentGateway;
use crate::repositories::Store;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenAuthority,
    pub passwords: PasswordService,
    pub payments: Arc<dyn PaymentGateway>,
    pub booking_locks: EventLocks,
    pub login_limiter: RateLimiter,
    pub mode: AppMode,
    pub seed_enabled: bool,
    /// Whether 500 responses carry the underlying error text
    pub expose_error_details: bool,
}

impl AppState {
    /// Assemble state with default throttling and seeding enabled; the mode
    /// follows the token authority
    pub fn new(
        store: Arc<dyn Store>,
        tokens: TokenAuthority,
        passwords: PasswordService,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        let mode = if tokens.is_demo() {
            AppMode::Demo
        } else {
            AppMode::Database
        };

        Self {
            store,
            tokens,
            passwords,
            payments,
            booking_locks: EventLocks::default(),
            login_limiter: RateLimiter::new(RateLimiterConfig::default()),
            mode,
            seed_enabled: true,
            expose_error_details: true,
        }
    }

    pub fn with_login_limiter(mut self, config: RateLimiterConfig) -> Self {
        self.login_limiter = RateLimiter::new(config);
        self
    }

    pub fn with_seed_enabled(mut self, enabled: bool) -> Self {
        self.seed_enabled = enabled;
        self
    }

    pub fn with_error_details(mut self, expose: bool) -> Self {
        self.expose_error_details = expose;
        self
    }

    pub fn is_demo(&self) -> bool {
        self.mode == AppMode::Demo
    }
}
