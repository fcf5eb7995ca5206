//! Shared HTTP Client Module
//!
//! Provides a global, lazy-initialized HTTP client with connection pooling
//! for all proxy API calls. Clients with a non-default timeout are built on
//! demand with the same pool settings.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;
use tracing::warn;

use crate::config::DEFAULT_TIMEOUT_SECS;

/// Global HTTP client for proxy API calls
///
/// - 120s timeout, AI replies are generated synchronously by the proxy
/// - 20 idle connections per host
/// - 90s idle timeout
pub static API_CLIENT: Lazy<Client> =
    Lazy::new(|| build_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS)));

fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .pool_max_idle_per_host(20)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
        .tcp_nodelay(true)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build tuned HTTP client, using defaults");
            Client::new()
        })
}

/// Get the global API client
#[inline]
pub fn api_client() -> &'static Client {
    &API_CLIENT
}

/// Client for the given timeout, reusing the global pool when possible
pub fn client_with_timeout(timeout: Duration) -> Client {
    if timeout == Duration::from_secs(DEFAULT_TIMEOUT_SECS) {
        api_client().clone()
    } else {
        build_client(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_are_same_instance() {
        let client1 = api_client();
        let client2 = api_client();
        assert!(std::ptr::eq(client1, client2));
    }

    #[test]
    fn test_custom_timeout_client_builds() {
        let _ = client_with_timeout(Duration::from_secs(5));
        let _ = client_with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
