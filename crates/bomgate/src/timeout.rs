//! Time-boxed optional work.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Run a non-essential step with a deadline.
///
/// Returns `None`, after logging a warning, if the step fails or does not
/// finish within `limit`. Callers use this for data they can do without, so
/// the surrounding operation can continue in degraded form.
///
/// # Example
///
/// ```
/// use bomgate::soft_timeout;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let quick = soft_timeout("quick", Duration::from_secs(1), async { Ok::<_, String>(7) }).await;
/// assert_eq!(quick, Some(7));
///
/// let broken = soft_timeout("broken", Duration::from_secs(1), async { Err::<u8, _>("nope") }).await;
/// assert_eq!(broken, None);
/// # }
/// ```
pub async fn soft_timeout<T, E, F>(name: &str, limit: Duration, step: F) -> Option<T>
where
    E: Display,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, step).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!(step = name, error = %e, "Optional step failed, continuing without it");
            None
        }
        Err(_) => {
            warn!(
                step = name,
                limit_ms = limit.as_millis() as u64,
                "Optional step timed out, continuing without it"
            );
            None
        }
    }
}
