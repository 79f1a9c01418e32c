use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::store::{CategoryFilter, SortDirection, SortField};

/// Real-time price update configuration.
///
/// Controls the polling loop that perturbs prices on the canonical
/// collection while real-time updates are enabled.
#[derive(Debug, Deserialize, Clone)]
pub struct UpdateSettings {
    /// Start with real-time updates enabled
    #[serde(default = "default_real_time_updates")]
    pub real_time_updates: bool,
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Maximum relative price move per tick (0.01 = ±1%)
    #[serde(default = "default_price_volatility")]
    pub price_volatility: f64,
    /// Maximum move of the 24h change per tick, in percentage points
    #[serde(default = "default_change_jitter")]
    pub change_jitter: f64,
}

fn default_real_time_updates() -> bool {
    true
}

fn default_refresh_interval_ms() -> u64 {
    5_000
}

fn default_price_volatility() -> f64 {
    0.01
}

fn default_change_jitter() -> f64 {
    1.0
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            real_time_updates: default_real_time_updates(),
            refresh_interval_ms: default_refresh_interval_ms(),
            price_volatility: default_price_volatility(),
            change_jitter: default_change_jitter(),
        }
    }
}

/// Notification queue configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct NotificationSettings {
    /// Maximum number of notifications kept, most recent first
    #[serde(default = "default_notification_cap")]
    pub cap: usize,
}

fn default_notification_cap() -> usize {
    10
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            cap: default_notification_cap(),
        }
    }
}

/// Synthetic feed configuration.
///
/// The mock source simulates a launchpad API with artificial latency and
/// optional failure injection for exercising the error path.
#[derive(Debug, Deserialize, Clone)]
pub struct MockSettings {
    #[serde(default = "default_token_count")]
    pub token_count: usize,
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
    /// Probability in [0, 1] that a fetch fails
    #[serde(default)]
    pub failure_rate: f64,
}

fn default_token_count() -> usize {
    30
}

fn default_latency_ms() -> u64 {
    1_000
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            token_count: default_token_count(),
            latency_ms: default_latency_ms(),
            failure_rate: 0.0,
        }
    }
}

/// Initial view parameters.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ViewSettings {
    #[serde(default)]
    pub category: CategoryFilter,
    #[serde(default)]
    pub sort_field: SortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
}

/// Root application configuration.
///
/// Loaded from an optional `pulse.{yaml,toml,json}` file in the working
/// directory, overridden by `PULSE_*` environment variables
/// (e.g. `PULSE_UPDATES__REFRESH_INTERVAL_MS=2000`).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub updates: UpdateSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub mock: MockSettings,
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("pulse").required(false))
            .add_source(
                Environment::with_prefix("PULSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = s.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    /// Reject values the dashboard cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.updates.refresh_interval_ms == 0 {
            return Err(ConfigError::Message(
                "updates.refresh_interval_ms must be greater than zero".to_string(),
            ));
        }
        let volatility = self.updates.price_volatility;
        if !(volatility > 0.0 && volatility <= 0.5) {
            return Err(ConfigError::Message(format!(
                "updates.price_volatility must be in (0, 0.5], got {}",
                volatility
            )));
        }
        if !(self.updates.change_jitter.is_finite() && self.updates.change_jitter >= 0.0) {
            return Err(ConfigError::Message(
                "updates.change_jitter must be a non-negative number".to_string(),
            ));
        }
        if self.notifications.cap == 0 {
            return Err(ConfigError::Message(
                "notifications.cap must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mock.failure_rate) {
            return Err(ConfigError::Message(format!(
                "mock.failure_rate must be in [0, 1], got {}",
                self.mock.failure_rate
            )));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.updates.refresh_interval_ms)
    }
}
