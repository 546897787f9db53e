//! Process entry point: loads configuration from the environment, wires the
//! pipeline together, and runs until a shutdown signal arrives.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokenwatch::adapters::UpstreamAdapter;
use tokenwatch::{
    AppConfig, Broadcaster, CacheConfig, DexAdapter, MarketAdapter, RateLimiterConfig,
    RetryConfig, SchedulerConfig, Scheduler, UpstreamConfig,
};
use tokenwatch_middleware::{RateLimiter, SnapshotStore};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Assemble [`AppConfig`] from the environment, falling back to the
/// documented defaults (§6) for anything unset.
fn load_config() -> AppConfig {
    let cache = CacheConfig {
        cache_url: env_or("CACHE_URL", "redis://127.0.0.1:6379"),
        ttl: Duration::from_secs(env_parse("CACHE_TTL_SECONDS", 30)),
    };

    let scheduler = SchedulerConfig {
        update_interval: Duration::from_secs(env_parse("UPDATE_INTERVAL_SECONDS", 10)),
        batch_size: env_parse("BATCH_SIZE", 50),
        max_tokens: env_parse("MAX_TOKENS", 1000),
        per_token_cache_cap: env_parse("PER_TOKEN_CACHE_CAP", 100),
    };

    let upstreams = vec![
        UpstreamConfig {
            tag: "dex".to_string(),
            base_url: env_or("DEX_BASE_URL", "https://api.dexscreener.com/latest/dex"),
            rate_limiter: RateLimiterConfig {
                points: env_parse("DEX_RATE_LIMIT_POINTS", 300),
                duration: Duration::from_secs(env_parse("DEX_RATE_LIMIT_SECONDS", 60)),
            },
            retry: RetryConfig {
                max_attempts: env_parse("DEX_RETRY_ATTEMPTS", 3),
                base_delay: Duration::from_secs(env_parse("DEX_RETRY_BASE_DELAY_SECONDS", 1)),
            },
        },
        UpstreamConfig {
            tag: "market".to_string(),
            base_url: env_or("MARKET_BASE_URL", "https://api.coingecko.com/api/v3"),
            rate_limiter: RateLimiterConfig {
                points: env_parse("MARKET_RATE_LIMIT_POINTS", 300),
                duration: Duration::from_secs(env_parse("MARKET_RATE_LIMIT_SECONDS", 60)),
            },
            retry: RetryConfig {
                max_attempts: env_parse("MARKET_RETRY_ATTEMPTS", 3),
                base_delay: Duration::from_secs(env_parse("MARKET_RETRY_BASE_DELAY_SECONDS", 1)),
            },
        },
    ];

    AppConfig {
        cache,
        scheduler,
        upstreams,
        listen_port: env_parse("LISTEN_PORT", 8080),
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = load_config();

    let rate_limiter_configs: HashMap<String, RateLimiterConfig> = config
        .upstreams
        .iter()
        .map(|u| (u.tag.clone(), u.rate_limiter))
        .collect();
    let rate_limiter = Arc::new(RateLimiter::new(rate_limiter_configs));

    let adapters: Vec<Arc<dyn UpstreamAdapter>> = config
        .upstreams
        .iter()
        .map(|u| -> Arc<dyn UpstreamAdapter> {
            match u.tag.as_str() {
                "dex" => Arc::new(DexAdapter::new(
                    u.base_url.clone(),
                    Arc::clone(&rate_limiter),
                    config.scheduler.batch_size,
                )),
                _ => Arc::new(MarketAdapter::new(
                    u.base_url.clone(),
                    Arc::clone(&rate_limiter),
                    config.scheduler.batch_size,
                )),
            }
        })
        .collect();

    // All upstreams share one retry policy in this deployment; a per-upstream
    // policy would key off `UpstreamConfig::retry` instead.
    let retry_config = config
        .upstreams
        .first()
        .map(|u| u.retry)
        .unwrap_or_default();

    let store = Arc::new(SnapshotStore::with_moka(
        &config.cache,
        config.scheduler.per_token_cache_cap,
    ));
    let broadcaster = Arc::new(Broadcaster::new());

    let scheduler = Arc::new(Scheduler::new(
        adapters,
        retry_config,
        store,
        broadcaster,
        config.scheduler.update_interval,
        config.scheduler.max_tokens,
    ));

    let stream = scheduler.spawn();

    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    tracing::info!("shutdown signal received, stopping scheduler");
    stream.stop().await;
}
