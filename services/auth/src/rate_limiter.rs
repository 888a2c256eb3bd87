//! Rate limiter for preventing brute force logins
//!
//! Only failed attempts count. Once a key collects `max_attempts` failures
//! inside the window it is banned for `ban_duration_seconds`; a successful
//! login clears the key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of failed attempts allowed
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,       // 5 minutes
            ban_duration_seconds: 900, // 15 minutes
        }
    }
}

/// Rate limiter entry
#[derive(Debug)]
struct RateLimiterEntry {
    /// Number of failed attempts in the current window
    failures: u32,
    /// Start of the current window
    window_start: Instant,
    /// Ban expiration time
    ban_expires: Option<Instant>,
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Rate limiter configuration
    config: RateLimiterConfig,
    /// Rate limiter entries
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check whether a key may attempt a login right now
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let ban_expires = match entries.get(key) {
            Some(entry) => entry.ban_expires,
            None => return true,
        };

        match ban_expires {
            Some(ban_expires) if now < ban_expires => false,
            Some(_) => {
                // Ban expired
                entries.remove(key);
                true
            }
            None => true,
        }
    }

    /// Record a failed attempt, banning the key once it reaches the limit
    pub async fn record_failure(&self, key: &str) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        // Forget stale windows so unknown keys cannot pile up
        entries.retain(|_, entry| {
            entry.ban_expires.is_some_and(|ban_expires| now < ban_expires)
                || now.duration_since(entry.window_start) < window
        });

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            failures: 0,
            window_start: now,
            ban_expires: None,
        });

        if now.duration_since(entry.window_start) >= window {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures += 1;
        warn!(key, failures = entry.failures, "Failed login attempt");

        if entry.failures >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            info!(
                "Banned key {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
        }
    }

    /// Forget a key after a successful attempt
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}
