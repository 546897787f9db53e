//! DEX-pair indexer adapter: `{base}/search?q=SOLANA` → canonical [`Token`]s.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokenwatch_middleware::RateLimiter;
use tokenwatch_types::{AggError, Token, UpstreamTag};

use super::{UpstreamAdapter, build_client};

pub const TAG: &str = "dex";
const QUERY: &str = "SOLANA";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    pairs: Vec<PairDto>,
}

#[derive(Debug, Deserialize)]
struct PairDto {
    #[serde(rename = "baseToken")]
    base_token: BaseTokenDto,
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
    #[serde(rename = "priceChange", default)]
    price_change: PriceChangeDto,
    #[serde(default)]
    volume: VolumeDto,
    #[serde(default)]
    liquidity: LiquidityDto,
    #[serde(default)]
    txns: TxnsDto,
    #[serde(rename = "dexId", default)]
    dex_id: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    info: Option<InfoDto>,
}

#[derive(Debug, Deserialize)]
struct BaseTokenDto {
    address: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    symbol: String,
}

#[derive(Debug, Default, Deserialize)]
struct PriceChangeDto {
    h1: Option<f64>,
    h6: Option<f64>,
    h24: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct VolumeDto {
    h24: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LiquidityDto {
    usd: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct TxnsDto {
    h24: Option<TxnCountDto>,
}

#[derive(Debug, Deserialize)]
struct TxnCountDto {
    #[serde(default)]
    buys: u64,
    #[serde(default)]
    sells: u64,
}

#[derive(Debug, Deserialize)]
struct InfoDto {
    #[serde(rename = "imageUrl")]
    image_url: Option<String>,
}

fn decimal_from_f64(value: Option<f64>) -> Decimal {
    value
        .and_then(Decimal::from_f64_retain)
        .unwrap_or(Decimal::ZERO)
}

fn map_pair(pair: PairDto) -> Option<Token> {
    let address = pair.base_token.address;
    if address.trim().is_empty() {
        return None;
    }
    let price = pair
        .price_usd
        .as_deref()
        .and_then(|s| s.parse::<Decimal>().ok())
        .unwrap_or(Decimal::ZERO);
    if price <= Decimal::ZERO {
        return None;
    }

    let txn_count = pair
        .txns
        .h24
        .map(|t| t.buys + t.sells)
        .unwrap_or_default();

    Some(Token {
        address,
        name: pair.base_token.name,
        ticker: pair.base_token.symbol,
        price,
        change_1h: decimal_from_f64(pair.price_change.h1),
        change_6h: decimal_from_f64(pair.price_change.h6),
        change_24h: decimal_from_f64(pair.price_change.h24),
        change_pct_24h: Decimal::ZERO,
        market_cap: Decimal::ZERO,
        market_cap_change_24h: Decimal::ZERO,
        market_cap_change_pct_24h: Decimal::ZERO,
        volume_24h: decimal_from_f64(pair.volume.h24),
        high_24h: Decimal::ZERO,
        low_24h: Decimal::ZERO,
        circulating_supply: Decimal::ZERO,
        total_supply: Decimal::ZERO,
        liquidity: decimal_from_f64(pair.liquidity.usd),
        transaction_count_24h: txn_count,
        dex: pair.dex_id,
        dex_url: pair.url,
        ath: Decimal::ZERO,
        ath_change_pct: Decimal::ZERO,
        ath_date: None,
        atl: Decimal::ZERO,
        atl_change_pct: Decimal::ZERO,
        atl_date: None,
        roi: None,
        sources: BTreeSet::from([UpstreamTag::new(TAG)]),
        rank: None,
        image: pair.info.and_then(|i| i.image_url),
        last_updated: Utc::now(),
        is_merged: false,
    })
}

/// Adapter over a Dexscreener-shaped pair search endpoint.
pub struct DexAdapter {
    client: reqwest::Client,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
    batch_size: usize,
}

impl DexAdapter {
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
impl UpstreamAdapter for DexAdapter {
    fn tag(&self) -> &str {
        TAG
    }

    async fn fetch_once(&self) -> Result<Vec<Token>, AggError> {
        self.rate_limiter.acquire(TAG)?;

        let url = format!("{}/search?q={QUERY}", self.base_url);
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

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AggError::transport(TAG, format!("parse error: {e}")))?;

        let mut tokens: Vec<Token> = body.pairs.into_iter().filter_map(map_pair).collect();
        tokens.truncate(self.batch_size);
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_pairs_missing_address_or_non_positive_price() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"pairs": [
                {"baseToken": {"address": "", "name": "a", "symbol": "A"}, "priceUsd": "1.0"},
                {"baseToken": {"address": "0xabc", "name": "b", "symbol": "B"}, "priceUsd": "0"},
                {"baseToken": {"address": "0xdef", "name": "c", "symbol": "C"}, "priceUsd": "2.50"}
            ]}"#,
        )
        .unwrap();
        let tokens: Vec<Token> = body.pairs.into_iter().filter_map(map_pair).collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].address, "0xdef");
    }

    #[test]
    fn maps_dex_side_fields_and_zero_fills_market_side() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"pairs": [{
                "baseToken": {"address": "0xAAA", "name": "Token A", "symbol": "TA"},
                "priceUsd": "1.25",
                "priceChange": {"h1": 0.5, "h6": 1.2, "h24": -3.4},
                "volume": {"h24": 5000.0},
                "liquidity": {"usd": 20000.0},
                "txns": {"h24": {"buys": 10, "sells": 4}},
                "dexId": "raydium",
                "url": "https://dexscreener.com/solana/0xaaa",
                "info": {"imageUrl": "https://example.com/a.png"}
            }]}"#,
        )
        .unwrap();
        let token = body.pairs.into_iter().find_map(map_pair).unwrap();
        assert_eq!(token.address, "0xAAA");
        assert_eq!(token.dex, "raydium");
        assert_eq!(token.transaction_count_24h, 14);
        assert_eq!(token.change_pct_24h, Decimal::ZERO);
        assert_eq!(token.circulating_supply, Decimal::ZERO);
        assert!(token.sources.contains(&UpstreamTag::new(TAG)));
    }
}
