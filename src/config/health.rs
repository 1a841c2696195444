// ABOUTME: Health verification policy for the post-deploy probe loop.
// ABOUTME: Fixed attempt budget and fixed delay; defaults are 30 attempts, 5s apart.

use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_HEALTH_PORT: u16 = 8080;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthPolicy {
    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between two failed attempts. No backoff, no jitter.
    #[serde(default = "default_delay", with = "humantime_serde")]
    pub delay: Duration,

    /// Upper bound for a single probe request.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            path: default_path(),
            port: default_port(),
            max_attempts: default_max_attempts(),
            delay: default_delay(),
            timeout: default_timeout(),
        }
    }
}

fn default_path() -> String {
    "/health".to_string()
}

fn default_port() -> u16 {
    DEFAULT_HEALTH_PORT
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_delay() -> Duration {
    DEFAULT_RETRY_DELAY
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}
