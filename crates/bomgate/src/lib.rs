//! bomgate - adaptive rate-limited gateway for a catalog/BOM service
//!
//! Every call the application makes to the remote catalog goes through a
//! [`Gateway`], which
//!
//! - bounds how many requests are in flight at once,
//! - paces requests according to the server's own observed response times,
//! - backs off with jitter when the server throttles or fails,
//! - caches idempotent reads and invalidates them on writes.
//!
//! The named catalog operations live on [`CatalogClient`], which is generic
//! over the [`CatalogTransport`] that actually talks to the service.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bomgate::{CatalogClient, Gateway, GatewayConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     bomgate::init_observability()?;
//!
//!     let gateway = Gateway::new(GatewayConfig::load()?);
//!     let client = CatalogClient::new(gateway, MyHttpTransport::new()?);
//!
//!     for resource in client.list_resources().await? {
//!         println!("{} ({} items)", resource.name, resource.item_count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `bomgate_error` - error types and failure classification
//! - `bomgate_core` - catalog data types
//! - `bomgate_cache` - TTL result cache
//! - `bomgate_rate_limit` - gate, pacing, backoff, cooldown and configuration
//!
//! This crate re-exports everything for convenience.

#![forbid(unsafe_code)]

mod events;
mod gateway;
mod observability;
mod operations;
mod timeout;
mod transport;

pub use bomgate_cache::*;
pub use bomgate_core::*;
pub use bomgate_error::*;
pub use bomgate_rate_limit::*;

pub use events::GatewayEvent;
pub use gateway::{CachePolicy, Gateway, GatewayStats};
pub use observability::{ObservabilityConfig, init_observability, init_observability_with_config};
pub use operations::{CatalogClient, cache_keys};
pub use timeout::soft_timeout;
pub use transport::CatalogTransport;
