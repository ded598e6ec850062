//! Configuration structures for the gateway.
//!
//! The configuration system supports:
//! - Bundled defaults (include_str! from bomgate.toml)
//! - User overrides (./bomgate.toml or ~/.config/bomgate/bomgate.toml)
//! - Automatic merging with user values taking precedence

use crate::{BackoffCurve, JitterRange};
use bomgate_cache::ResultCacheConfig;
use bomgate_error::{ConfigError, GatewayResult};
use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Parameters of one exponential backoff curve.
///
/// ```toml
/// [retry.rate_limit_backoff]
/// base_ms = 2000
/// multiplier = 2.5
/// max_ms = 60000
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackoffConfig {
    /// Delay before the first retry (milliseconds)
    pub base_ms: u64,
    /// Growth factor per further retry
    pub multiplier: f64,
    /// Upper bound before jitter (milliseconds)
    pub max_ms: u64,
}

impl BackoffConfig {
    /// Build the curve described by this configuration.
    pub fn curve(&self) -> BackoffCurve {
        BackoffCurve::new(
            Duration::from_millis(self.base_ms),
            self.multiplier,
            Duration::from_millis(self.max_ms),
        )
    }
}

/// Retry policy of the executor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Curve used after a rate-limit failure
    #[serde(default = "default_rate_limit_backoff")]
    pub rate_limit_backoff: BackoffConfig,

    /// Curve used after any other retryable failure
    #[serde(default = "default_transient_backoff")]
    pub transient_backoff: BackoffConfig,

    /// Lower bound of the multiplicative backoff jitter
    #[serde(default = "default_jitter_min")]
    pub jitter_min: f64,

    /// Upper bound of the multiplicative backoff jitter
    #[serde(default = "default_jitter_max")]
    pub jitter_max: f64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_rate_limit_backoff() -> BackoffConfig {
    BackoffConfig {
        base_ms: 2000,
        multiplier: 2.5,
        max_ms: 60_000,
    }
}

fn default_transient_backoff() -> BackoffConfig {
    BackoffConfig {
        base_ms: 1000,
        multiplier: 2.0,
        max_ms: 30_000,
    }
}

fn default_jitter_min() -> f64 {
    0.8
}

fn default_jitter_max() -> f64 {
    1.2
}

impl RetryConfig {
    /// Jitter range applied to backoff sleeps.
    pub fn jitter(&self) -> JitterRange {
        JitterRange::new(self.jitter_min, self.jitter_max)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            rate_limit_backoff: default_rate_limit_backoff(),
            transient_backoff: default_transient_backoff(),
            jitter_min: default_jitter_min(),
            jitter_max: default_jitter_max(),
        }
    }
}

/// Inputs of the adaptive pacing delay applied after every attempt.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PacingConfig {
    /// Floor of the pacing delay (milliseconds)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Delay used while in cooldown (milliseconds)
    #[serde(default = "default_cooldown_delay_ms")]
    pub cooldown_delay_ms: u64,

    /// Cap on the error-scaled delay (milliseconds)
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Largest power of two applied for consecutive errors
    #[serde(default = "default_max_error_exponent")]
    pub max_error_exponent: u32,

    /// Share of the average response time used as a pacing floor
    #[serde(default = "default_latency_weight")]
    pub latency_weight: f64,

    /// Minimum width of the additive jitter window (milliseconds)
    #[serde(default = "default_min_jitter_ms")]
    pub min_jitter_ms: u64,

    /// Number of latency samples kept
    #[serde(default = "default_tracker_capacity")]
    pub tracker_capacity: usize,
}

fn default_base_delay_ms() -> u64 {
    300
}

fn default_cooldown_delay_ms() -> u64 {
    2000
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_max_error_exponent() -> u32 {
    5
}

fn default_latency_weight() -> f64 {
    0.75
}

fn default_min_jitter_ms() -> u64 {
    50
}

fn default_tracker_capacity() -> usize {
    15
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            cooldown_delay_ms: default_cooldown_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_error_exponent: default_max_error_exponent(),
            latency_weight: default_latency_weight(),
            min_jitter_ms: default_min_jitter_ms(),
            tracker_capacity: default_tracker_capacity(),
        }
    }
}

/// Cooldown window entered after server throttling.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CooldownConfig {
    /// Length of the cooldown window (seconds). Reduced concurrency is
    /// restored after twice this period.
    #[serde(default = "default_cooldown_period_secs")]
    pub period_secs: u64,
}

fn default_cooldown_period_secs() -> u64 {
    30
}

impl CooldownConfig {
    /// Cooldown window as a duration.
    pub fn period(&self) -> Duration {
        Duration::from_secs(self.period_secs)
    }
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            period_secs: default_cooldown_period_secs(),
        }
    }
}

/// Admission control settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConcurrencyConfig {
    /// Initial number of concurrently admitted calls
    #[serde(default = "default_initial_concurrency")]
    pub initial: usize,

    /// Optional steady-rate quota applied before admission
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_minute: Option<u32>,
}

fn default_initial_concurrency() -> usize {
    1
}

impl Default for ConcurrencyConfig {
    fn default() -> Self {
        Self {
            initial: default_initial_concurrency(),
            requests_per_minute: None,
        }
    }
}

/// Cache lifetimes of the named read operations.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OperationTtlConfig {
    /// Resource listing TTL (seconds)
    #[serde(default = "default_list_secs")]
    pub list_secs: u64,

    /// Single resource TTL (seconds)
    #[serde(default = "default_fetch_secs")]
    pub fetch_secs: u64,

    /// Resource item listing TTL (seconds)
    #[serde(default = "default_items_secs")]
    pub items_secs: u64,

    /// Time allowed for the non-essential item listing of an overview (milliseconds)
    #[serde(default = "default_overview_items_timeout_ms")]
    pub overview_items_timeout_ms: u64,
}

fn default_list_secs() -> u64 {
    300
}

fn default_fetch_secs() -> u64 {
    600
}

fn default_items_secs() -> u64 {
    600
}

fn default_overview_items_timeout_ms() -> u64 {
    5000
}

impl OperationTtlConfig {
    /// Resource listing TTL.
    pub fn list(&self) -> Duration {
        Duration::from_secs(self.list_secs)
    }

    /// Single resource TTL.
    pub fn fetch(&self) -> Duration {
        Duration::from_secs(self.fetch_secs)
    }

    /// Item listing TTL.
    pub fn items(&self) -> Duration {
        Duration::from_secs(self.items_secs)
    }

    /// Soft timeout for the overview's item listing.
    pub fn overview_items_timeout(&self) -> Duration {
        Duration::from_millis(self.overview_items_timeout_ms)
    }
}

impl Default for OperationTtlConfig {
    fn default() -> Self {
        Self {
            list_secs: default_list_secs(),
            fetch_secs: default_fetch_secs(),
            items_secs: default_items_secs(),
            overview_items_timeout_ms: default_overview_items_timeout_ms(),
        }
    }
}

/// Top-level gateway configuration.
///
/// # Example
///
/// ```no_run
/// use bomgate_rate_limit::GatewayConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = GatewayConfig::load()?;
/// println!("retries: {}", config.retry.max_retries);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
pub struct GatewayConfig {
    /// Retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Pacing delay inputs
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Cooldown window
    #[serde(default)]
    pub cooldown: CooldownConfig,

    /// Admission control
    #[serde(default)]
    pub concurrency: ConcurrencyConfig,

    /// Result cache
    #[serde(default)]
    pub cache: ResultCacheConfig,

    /// Named operation cache lifetimes
    #[serde(default)]
    pub ttl: OperationTtlConfig,
}

impl GatewayConfig {
    /// Load configuration from a specific file path.
    ///
    /// Missing keys fall back to the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> GatewayResult<Self> {
        debug!("Loading configuration from file");

        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                ))
            })?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        Ok(config)
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override earlier):
    /// 1. Bundled defaults (bomgate.toml shipped with library)
    /// 2. User config in home directory (~/.config/bomgate/bomgate.toml)
    /// 3. User config in current directory (./bomgate.toml)
    ///
    /// User config files are optional and will be silently skipped if not found.
    #[instrument]
    pub fn load() -> GatewayResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../bomgate.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/bomgate/bomgate.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("bomgate").required(false));

        let config = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        Ok(config)
    }
}
