//! Log output for hosts embedding the gateway.
//!
//! The gateway only emits `tracing` events; it never installs a subscriber on
//! its own. A host binary calls [`init_observability`] once at startup to get
//! filtered text or JSON logs of every attempt, retry and cooldown transition.
//! With [`ObservabilityConfig::with_operation_timings`] the spans opened by the
//! catalog operations are also logged when they close, with their duration.

use tracing_subscriber::{
    EnvFilter, Layer, filter::ParseError, fmt::format::FmtSpan, layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Directive used when neither `RUST_LOG` nor the host sets one.
const DEFAULT_DIRECTIVE: &str = "info";

/// How the host wants gateway logs rendered.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Name of the host service, logged once at startup
    pub service_name: String,
    /// Filter directives (e.g. "info", "bomgate=debug,bomgate_rate_limit=trace")
    pub log_level: String,
    /// Emit one JSON object per line instead of text
    pub json_logs: bool,
    /// Log each catalog operation span when it closes, with its busy and idle time
    pub operation_timings: bool,
}

impl ObservabilityConfig {
    /// Configuration for `service_name`, filtered by `RUST_LOG` or `info`.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| DEFAULT_DIRECTIVE.to_string()),
            json_logs: false,
            operation_timings: false,
        }
    }

    /// Replace the filter directives.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Switch between text and JSON lines.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }

    /// Log operation spans as they close.
    pub fn with_operation_timings(mut self, enabled: bool) -> Self {
        self.operation_timings = enabled;
        self
    }

    /// Parse the configured directives.
    pub fn filter(&self) -> Result<EnvFilter, ParseError> {
        EnvFilter::try_new(&self.log_level)
    }

    fn span_events(&self) -> FmtSpan {
        if self.operation_timings {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

/// Install the global subscriber with [`ObservabilityConfig::default`].
pub fn init_observability() -> Result<(), Box<dyn std::error::Error>> {
    init_observability_with_config(ObservabilityConfig::default())
}

/// Install the global subscriber described by `config`.
///
/// Fails if the directives do not parse or a global subscriber is already
/// installed.
pub fn init_observability_with_config(
    config: ObservabilityConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = config.filter()?;

    let output = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(config.span_events());
    let output = if config.json_logs {
        output.json().boxed()
    } else {
        output.boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        gateway_version = env!("CARGO_PKG_VERSION"),
        json = config.json_logs,
        operation_timings = config.operation_timings,
        "Gateway logging installed"
    );

    Ok(())
}
