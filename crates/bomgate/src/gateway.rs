//! The retry/backoff executor.
//!
//! [`Gateway::execute`] wraps a single remote call. In order, it
//!
//! 1. serves the result from the cache when a live entry exists,
//! 2. waits for admission through the concurrency gate,
//! 3. times the call and records the outcome,
//! 4. applies the adaptive pacing delay before giving the permit back,
//! 5. on failure, backs off on the curve matching the failure class and tries
//!    again until the retry budget is spent.
//!
//! Rate-limit failures additionally put the gateway into cooldown, which
//! slows every caller sharing the gateway, not just the one that was throttled.

use crate::GatewayEvent;
use bomgate_cache::ResultCache;
use bomgate_error::{
    ClassifyFailure, ExhaustedError, FailureClass, GatewayError, GatewayResult, TransportError,
};
use bomgate_rate_limit::{
    AdaptivePacer, ConcurrencyGate, CooldownMachine, CooldownTransition, GatewayConfig,
    TransitionListener,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Where and for how long a successful result is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// Cache key, stable for identical logical requests
    pub key: String,
    /// Lifetime of the cached result
    pub ttl: Duration,
}

impl CachePolicy {
    /// Cache under `key` for `ttl`.
    pub fn new(key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            ttl,
        }
    }
}

/// Point-in-time view of the gateway's adaptive state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayStats {
    /// Current admission capacity
    pub capacity: usize,
    /// Permits free right now
    pub available_permits: usize,
    /// Calls currently admitted
    pub in_flight: usize,
    /// Errors since the last success
    pub consecutive_errors: u32,
    /// Whether a cooldown window is open
    pub cooldown_active: bool,
    /// Mean of recent successful latencies
    pub average_latency: Option<Duration>,
    /// Entries held by the result cache
    pub cache_entries: usize,
}

struct GatewayInner {
    config: GatewayConfig,
    cache: ResultCache,
    pacer: AdaptivePacer,
    gate: ConcurrencyGate,
    cooldown: CooldownMachine,
    events: broadcast::Sender<GatewayEvent>,
}

/// Shared gateway to the remote catalog service.
///
/// All adaptive state (cache, latency history, error streak, cooldown and
/// admission gate) belongs to one instance. Clones share that state, so one
/// gateway is normally created per remote service and cloned into every task
/// that talks to it.
///
/// # Example
///
/// ```
/// use bomgate::{CachePolicy, Gateway, GatewayConfig};
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let gateway = Gateway::new(GatewayConfig::default());
///
/// let policy = CachePolicy::new("Answer", Duration::from_secs(60));
/// let answer: u32 = gateway.execute("Answer", Some(policy), || async { Ok(42) }).await?;
/// assert_eq!(answer, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a gateway from configuration.
    #[instrument(skip(config), fields(
        concurrency = config.concurrency.initial,
        max_retries = config.retry.max_retries,
    ))]
    pub fn new(config: GatewayConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let gate = ConcurrencyGate::with_quota(
            config.concurrency.initial,
            config.concurrency.requests_per_minute,
        );
        let cooldown = CooldownMachine::with_listener(
            config.cooldown.period(),
            gate.clone(),
            cooldown_listener(events.clone()),
        );
        let cache = ResultCache::new(config.cache.clone());
        let pacer = AdaptivePacer::new(config.pacing.clone());

        debug!("Gateway created");
        Self {
            inner: Arc::new(GatewayInner {
                config,
                cache,
                pacer,
                gate,
                cooldown,
                events,
            }),
        }
    }

    /// Execute a named remote operation.
    ///
    /// `op` is invoked once per attempt. With a cache policy, a live cached
    /// result is returned without calling `op` at all, and a successful result
    /// is stored under the policy's key.
    ///
    /// # Errors
    ///
    /// - Fatal transport failures are returned at once
    /// - Retryable failures are returned once `max_retries` retries are spent,
    ///   carrying the last error the transport reported
    #[instrument(skip_all, fields(operation = %name))]
    pub async fn execute<T, F, Fut>(
        &self,
        name: &str,
        cache: Option<CachePolicy>,
        mut op: F,
    ) -> GatewayResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        if let Some(policy) = &cache
            && let Some(hit) = self.inner.cache.get_typed::<T>(&policy.key)
        {
            debug!(key = %policy.key, "Serving from cache");
            self.emit(GatewayEvent::CacheHit {
                operation: name.to_string(),
            });
            return Ok(hit);
        }

        let retry = &self.inner.config.retry;
        let max_attempts = retry.max_retries.saturating_add(1);
        let mut last_error: Option<TransportError> = None;

        for attempt in 1..=max_attempts {
            let permit = self.inner.gate.acquire().await;

            info!(attempt, max_attempts, "Executing operation");
            self.emit(GatewayEvent::AttemptStarted {
                operation: name.to_string(),
                attempt,
            });

            let started = Instant::now();
            let outcome = op().await;
            let latency = started.elapsed();

            let err = match outcome {
                Ok(value) => {
                    self.inner.pacer.record_success(latency);
                    if let Some(policy) = &cache
                        && let Err(e) =
                            self.inner
                                .cache
                                .put_typed(&policy.key, &value, Some(policy.ttl))
                    {
                        warn!(key = %policy.key, error = %e, "Result could not be cached");
                    }

                    self.pace().await;
                    drop(permit);

                    info!(
                        attempt,
                        latency_ms = latency.as_millis() as u64,
                        "Operation succeeded"
                    );
                    self.emit(GatewayEvent::Succeeded {
                        operation: name.to_string(),
                        attempt,
                        latency,
                    });
                    return Ok(value);
                }
                Err(err) => err,
            };

            let consecutive_errors = self.inner.pacer.record_error();
            let class = err.failure_class();

            match class {
                FailureClass::Fatal => {
                    drop(permit);
                    return Err(self.fail(name, attempt, err));
                }
                FailureClass::RateLimited => {
                    self.inner.cooldown.enter();
                }
                FailureClass::Transient => {}
            }

            self.pace().await;
            drop(permit);

            if attempt < max_attempts {
                let curve = match class {
                    FailureClass::RateLimited => retry.rate_limit_backoff.curve(),
                    _ => retry.transient_backoff.curve(),
                };
                let delay = curve.jittered(attempt - 1, retry.jitter(), &mut rand::thread_rng());

                warn!(
                    attempt,
                    max_attempts,
                    class = %class,
                    consecutive_errors,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                self.emit(GatewayEvent::RetryScheduled {
                    operation: name.to_string(),
                    attempt,
                    class,
                    delay,
                });
                tokio::time::sleep(delay).await;
            }

            last_error = Some(err);
        }

        match last_error {
            Some(err) => Err(self.fail(name, max_attempts, err)),
            None => {
                error!("Operation made no attempts");
                Err(ExhaustedError::new(name, 0).into())
            }
        }
    }

    async fn pace(&self) {
        let delay = self
            .inner
            .pacer
            .current_delay(self.inner.cooldown.is_active());
        debug!(delay_ms = delay.as_millis() as u64, "Pacing before release");
        tokio::time::sleep(delay).await;
    }

    fn fail(&self, name: &str, attempts: u32, err: TransportError) -> GatewayError {
        error!(attempts, class = %err.failure_class(), error = %err, "Operation failed");
        self.emit(GatewayEvent::Failed {
            operation: name.to_string(),
            attempts,
            message: err.to_string(),
        });
        GatewayError::from_transport(err)
    }

    fn emit(&self, event: GatewayEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    /// Change the admission capacity (minimum 1). Returns the previous value.
    ///
    /// Raising it admits waiting calls at once; lowering it never interrupts
    /// calls already admitted.
    pub fn set_concurrency(&self, capacity: usize) -> usize {
        let previous = self.inner.gate.set_capacity(capacity);
        self.emit(GatewayEvent::ConcurrencyChanged {
            previous,
            current: self.inner.gate.capacity(),
        });
        previous
    }

    /// Drop every cached result.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Drop one cached result. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.cache.invalidate(key)
    }

    /// Drop several cached results. Returns how many existed.
    pub fn invalidate_many<I, K>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.inner.cache.invalidate_many(keys)
    }

    /// Subscribe to progress events.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.events.subscribe()
    }

    /// Snapshot the adaptive state.
    pub fn stats(&self) -> GatewayStats {
        GatewayStats {
            capacity: self.inner.gate.capacity(),
            available_permits: self.inner.gate.available_permits(),
            in_flight: self.inner.gate.in_flight(),
            consecutive_errors: self.inner.pacer.consecutive_errors(),
            cooldown_active: self.inner.cooldown.is_active(),
            average_latency: self.inner.pacer.tracker().average(),
            cache_entries: self.inner.cache.len(),
        }
    }

    /// Configuration the gateway was built with.
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// Result cache.
    pub fn cache(&self) -> &ResultCache {
        &self.inner.cache
    }

    /// Cooldown state machine.
    pub fn cooldown(&self) -> &CooldownMachine {
        &self.inner.cooldown
    }
}

fn cooldown_listener(events: broadcast::Sender<GatewayEvent>) -> TransitionListener {
    Arc::new(move |transition| {
        let event = match transition {
            CooldownTransition::Entered { saved_concurrency } => {
                GatewayEvent::CooldownEntered { saved_concurrency }
            }
            CooldownTransition::Exited => GatewayEvent::CooldownExited,
            CooldownTransition::ConcurrencyRestored(current) => {
                GatewayEvent::ConcurrencyChanged {
                    previous: 1,
                    current,
                }
            }
        };
        let _ = events.send(event);
    })
}
