use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Timing parameters of the distributed lease guarding one watcher id.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LeaseConfig {
    /// How long the lease stays valid without a refresh (milliseconds)
    /// A crashed holder blocks takeover for at most this long
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Background renewal period (milliseconds)
    /// Must leave the TTL at least four renewal chances before it lapses
    #[serde(default = "default_renew_interval_ms")]
    pub renew_interval_ms: u64,

    /// Pause between acquire attempts while another holder owns the lease
    /// (milliseconds). Fixed pacing, no backoff growth
    #[serde(default = "default_acquire_retry_interval_ms")]
    pub acquire_retry_interval_ms: u64,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            ttl_ms: default_ttl_ms(),
            renew_interval_ms: default_renew_interval_ms(),
            acquire_retry_interval_ms: default_acquire_retry_interval_ms(),
        }
    }
}

impl LeaseConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn renew_interval(&self) -> Duration {
        Duration::from_millis(self.renew_interval_ms)
    }

    pub fn acquire_retry_interval(&self) -> Duration {
        Duration::from_millis(self.acquire_retry_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ttl_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "lease.ttl_ms must be greater than 0".into(),
            )));
        }

        if self.renew_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "lease.renew_interval_ms must be greater than 0".into(),
            )));
        }

        if self.acquire_retry_interval_ms == 0 {
            return Err(Error::Config(ConfigError::Message(
                "lease.acquire_retry_interval_ms must be greater than 0".into(),
            )));
        }

        // A holder must get several renewal chances before its lease lapses
        if self.ttl_ms < self.renew_interval_ms.saturating_mul(4) {
            return Err(Error::Config(ConfigError::Message(format!(
                "lease.ttl_ms ({}) must be at least four times lease.renew_interval_ms ({})",
                self.ttl_ms, self.renew_interval_ms
            ))));
        }

        Ok(())
    }
}

// in ms
fn default_ttl_ms() -> u64 {
    60_000
}
fn default_renew_interval_ms() -> u64 {
    10_000
}
fn default_acquire_retry_interval_ms() -> u64 {
    10_000
}
