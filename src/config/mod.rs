//! Configuration for the exclusive change-stream watcher.
//!
//! Provides hierarchical configuration loading with priority:
//! 1. Default values (hardcoded)
//! 2. Optional config file
//! 3. Environment variables (highest priority)

mod lease;
pub use lease::*;

//---
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Configuration parameters for an exclusive change-stream watcher.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct WatcherConfig {
    /// Distributed lease timing
    #[serde(default)]
    pub lease: LeaseConfig,

    /// How long one instance may keep ownership before voluntarily handing
    /// the stream over to whoever acquires next (milliseconds)
    /// Zero keeps ownership until the process or the lease dies
    #[serde(default)]
    pub ownership_max_duration_ms: u64,

    /// How many durable retries one event gets before it is skipped
    /// Zero retries the failing event forever and records nothing
    #[serde(default)]
    pub max_retries: u64,

    /// Ask sources to attach the full document to update events
    #[serde(default)]
    pub attach_full_document: bool,
}

impl WatcherConfig {
    /// Rotation period, if voluntary handover is enabled.
    pub fn ownership_max_duration(&self) -> Option<Duration> {
        if self.ownership_max_duration_ms > 0 {
            Some(Duration::from_millis(self.ownership_max_duration_ms))
        } else {
            None
        }
    }

    /// Validates the watcher parameters.
    pub fn validate(&self) -> Result<()> {
        self.lease.validate()
    }

    /// Load configuration from multiple sources with priority:
    /// 1. Hardcoded defaults
    /// 2. Optional config file
    /// 3. Environment variables (highest priority)
    ///
    /// # Arguments
    /// * `path` - Optional path to a TOML config file
    ///
    /// # Returns
    /// Merged and validated configuration
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = Config::builder();

        if let Some(path) = path {
            config = config.add_source(File::with_name(path).required(true));
        }

        config = config.add_source(
            Environment::with_prefix("WATCHER")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        let loaded: WatcherConfig = config.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }
}
