//! Market-data adapter: `{base}/coins/markets?vs_currency=usd&platform=solana`
//! → canonical [`Token`]s.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tokenwatch_middleware::RateLimiter;
use tokenwatch_types::{AggError, Token, UpstreamTag};

use super::{UpstreamAdapter, build_client};

pub const TAG: &str = "market";

#[derive(Debug, Deserialize)]
struct CoinDto {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    symbol: String,
    current_price: Option<f64>,
    price_change_24h: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    market_cap: Option<f64>,
    market_cap_change_24h: Option<f64>,
    market_cap_change_percentage_24h: Option<f64>,
    total_volume: Option<f64>,
    circulating_supply: Option<f64>,
    total_supply: Option<f64>,
    high_24h: Option<f64>,
    low_24h: Option<f64>,
    ath: Option<f64>,
    ath_change_percentage: Option<f64>,
    ath_date: Option<DateTime<Utc>>,
    atl: Option<f64>,
    atl_change_percentage: Option<f64>,
    atl_date: Option<DateTime<Utc>>,
    roi: Option<RoiDto>,
    image: Option<String>,
    market_cap_rank: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RoiDto {
    percentage: Option<f64>,
}

fn decimal_from_f64(value: Option<f64>) -> Decimal {
    value
        .and_then(Decimal::from_f64_retain)
        .unwrap_or(Decimal::ZERO)
}

/// The market-data DTO identifies a coin by its provider-internal `id`
/// rather than an on-chain address; that id becomes `Token::address` unless
/// the DEX side later supplies the canonical address during merge.
fn map_coin(coin: CoinDto) -> Option<Token> {
    let address = coin.id;
    if address.trim().is_empty() {
        return None;
    }
    let price = decimal_from_f64(coin.current_price);
    if price <= Decimal::ZERO {
        return None;
    }

    Some(Token {
        address,
        name: coin.name,
        ticker: coin.symbol,
        price,
        change_1h: Decimal::ZERO,
        change_6h: Decimal::ZERO,
        change_24h: decimal_from_f64(coin.price_change_24h),
        change_pct_24h: decimal_from_f64(coin.price_change_percentage_24h),
        market_cap: decimal_from_f64(coin.market_cap),
        market_cap_change_24h: decimal_from_f64(coin.market_cap_change_24h),
        market_cap_change_pct_24h: decimal_from_f64(coin.market_cap_change_percentage_24h),
        volume_24h: decimal_from_f64(coin.total_volume),
        high_24h: decimal_from_f64(coin.high_24h),
        low_24h: decimal_from_f64(coin.low_24h),
        circulating_supply: decimal_from_f64(coin.circulating_supply),
        total_supply: decimal_from_f64(coin.total_supply),
        liquidity: Decimal::ZERO,
        transaction_count_24h: 0,
        dex: String::new(),
        dex_url: String::new(),
        ath: decimal_from_f64(coin.ath),
        ath_change_pct: decimal_from_f64(coin.ath_change_percentage),
        ath_date: coin.ath_date,
        atl: decimal_from_f64(coin.atl),
        atl_change_pct: decimal_from_f64(coin.atl_change_percentage),
        atl_date: coin.atl_date,
        roi: coin.roi.and_then(|r| r.percentage).and_then(Decimal::from_f64_retain),
        sources: BTreeSet::from([UpstreamTag::new(TAG)]),
        rank: coin.market_cap_rank,
        image: coin.image,
        last_updated: Utc::now(),
        is_merged: false,
    })
}

/// Adapter over a CoinGecko-shaped `/coins/markets` listing endpoint.
pub struct MarketAdapter {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
    batch_size: usize,
}

impl MarketAdapter {
    #[must_use]
    pub fn new(base_url: impl Into<String>, rate_limiter: Arc<RateLimiter>, batch_size: usize) -> Self {
        Self {
            client: build_client(),
            base_url: base_url.into(),
            rate_limiter,
            batch_size,
        }
    }
}

#[async_trait]
impl UpstreamAdapter for MarketAdapter {
    fn tag(&self) -> &str {
        TAG
    }

    async fn fetch_once(&self) -> Result<Vec<Token>, AggError> {
        self.rate_limiter.acquire(TAG)?;

        let url = format!("{}/coins/markets?vs_currency=usd&platform=solana", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AggError::transport(TAG, e.to_string()))?;

        if !response.status().is_success() {
            return Err(AggError::transport(
                TAG,
                format!("HTTP {}", response.status()),
            ));
        }

        let body: Vec<CoinDto> = response
            .json()
            .await
            .map_err(|e| AggError::transport(TAG, format!("parse error: {e}")))?;

        let mut tokens: Vec<Token> = body.into_iter().filter_map(map_coin).collect();
        tokens.truncate(self.batch_size);
        Ok(tokens)
    }
}
