//! Upstream Adapters: one HTTP call plus a provider-specific DTO → canonical
//! [`Token`] mapping per adapter.

pub mod dex;
pub mod market;

use std::time::Duration;

use async_trait::async_trait;
use tokenwatch_types::{AggError, Token};

const USER_AGENT: &str = concat!("tokenwatch/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A single upstream data source: rate-limited, retried, and responsible for
/// producing canonical [`Token`]s tagged with its own identifier.
#[async_trait]
pub trait UpstreamAdapter: Send + Sync {
    /// Stable tag used in `sources`, the Rate Limiter key, and logs.
    fn tag(&self) -> &str;

    /// Acquire a permit, issue the HTTP GET, parse, map, and filter. Wrapped
    /// in [`tokenwatch_middleware::retry`] by the Scheduler.
    async fn fetch_once(&self) -> Result<Vec<Token>, AggError>;
}

/// Build the shared `reqwest::Client` used by every adapter: a fixed 10 s
/// timeout and a static User-Agent, per the adapter contract.
pub fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .expect("static client configuration is always valid")
}
