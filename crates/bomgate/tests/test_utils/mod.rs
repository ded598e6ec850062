//! Test utilities for bomgate tests.
//!
//! This module provides an in-memory catalog transport with scripted failures.

pub mod mock_catalog;

#[allow(unused_imports)]
pub use mock_catalog::{MockCatalog, MockResponse};

use bomgate::{Gateway, GatewayConfig};

/// Gateway with default settings and the given starting concurrency.
#[allow(dead_code)]
pub fn gateway_with_concurrency(initial: usize) -> Gateway {
    let mut config = GatewayConfig::default();
    config.concurrency.initial = initial;
    Gateway::new(config)
}
