use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use syndica_error::{ConfigError, SyndicaResult};
use syndica_resolve::OptionsMapper;
use syndica_schedule::SchedulerTiming;
use typed_builder::TypedBuilder;

/// Configuration for the syndication pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Getters, TypedBuilder)]
pub struct SyndicaConfig {
    /// Opaque credential selecting the connected social account set
    #[builder(setter(into))]
    profile_key: String,
    /// Base URL of the media conversion proxy
    #[builder(setter(into))]
    media_proxy_base: String,
    /// Hosts whose image URLs are routed through the proxy
    #[serde(default)]
    #[builder(default)]
    og_hosts: Vec<String>,
    /// Seconds between scheduler evaluation ticks
    #[serde(default = "default_tick_interval_secs")]
    #[builder(default = default_tick_interval_secs())]
    tick_interval_secs: u64,
    /// Seconds past the scheduled time within which a post still fires
    #[serde(default = "default_window_secs")]
    #[builder(default = default_window_secs())]
    grace_window_secs: u64,
    /// Minimum seconds of lead a future schedule must have to commit
    #[serde(default = "default_window_secs")]
    #[builder(default = default_window_secs())]
    min_lead_secs: u64,
    /// Seconds between container readiness polls
    #[serde(default = "default_poll_interval_secs")]
    #[builder(default = default_poll_interval_secs())]
    poll_interval_secs: u64,
    /// Bound in seconds on the readiness wait per container; absent
    /// means poll until the platform answers
    #[serde(default = "default_poll_timeout_secs")]
    #[builder(default = default_poll_timeout_secs())]
    poll_timeout_secs: Option<u64>,
    /// Environment-default option bags, keyed by platform alias or
    /// canonical options key
    #[serde(default)]
    #[builder(default)]
    platform_defaults: serde_json::Map<String, serde_json::Value>,
}

fn default_tick_interval_secs() -> u64 {
    10
}

fn default_window_secs() -> u64 {
    300
}

fn default_poll_interval_secs() -> u64 {
    3
}

fn default_poll_timeout_secs() -> Option<u64> {
    Some(300)
}

impl SyndicaConfig {
    /// Load configuration from a TOML file.
    #[tracing::instrument(skip(path))]
    pub fn from_file(path: impl AsRef<Path>) -> SyndicaResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            syndica_error::SyndicaError::from(ConfigError::new(format!(
                "Failed to read config file: {}",
                e
            )))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> SyndicaResult<Self> {
        toml::from_str(content).map_err(|e| {
            syndica_error::SyndicaError::from(ConfigError::new(format!(
                "Failed to parse config: {}",
                e
            )))
        })
    }

    /// Scheduler timing derived from the configured seconds.
    pub fn scheduler_timing(&self) -> SchedulerTiming {
        SchedulerTiming::default()
            .with_tick_interval(Duration::from_secs(self.tick_interval_secs))
            .with_grace_window(chrono::Duration::seconds(self.grace_window_secs as i64))
            .with_min_lead(chrono::Duration::seconds(self.min_lead_secs as i64))
    }

    /// Delay between container readiness polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Bound on the readiness wait per container, if configured.
    pub fn poll_timeout(&self) -> Option<Duration> {
        self.poll_timeout_secs.map(Duration::from_secs)
    }

    /// Options mapper seeded with the configured platform defaults.
    pub fn options_mapper(&self) -> OptionsMapper {
        OptionsMapper::new(self.platform_defaults.clone())
    }
}
