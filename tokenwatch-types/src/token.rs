//! The canonical `Token` record and the small set of upstream tags that feed it.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Stable identifier for an upstream data provider.
///
/// Carried in [`Token::sources`], used as the Rate Limiter's bucket key, and
/// logged on every adapter failure.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UpstreamTag(String);

impl UpstreamTag {
    /// Wrap an arbitrary tag string (e.g. `"dex"`, `"market"`).
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Borrow the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UpstreamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UpstreamTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// The canonical, post-merge record for one token listing.
///
/// Keyed by [`address`](Self::address), which callers must canonicalize to
/// lowercase before using it as a map key (see [`crate::merge`] helpers in
/// `tokenwatch-core`, which do this for you).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// On-chain address, canonical form is lowercase. Non-empty for an admissible record.
    pub address: String,
    /// Human-readable project name.
    pub name: String,
    /// Ticker symbol.
    pub ticker: String,

    /// Quote-currency (USD) price. Must be positive for the record to be publishable.
    pub price: Decimal,
    /// Absolute price change over the trailing hour.
    pub change_1h: Decimal,
    /// Absolute price change over the trailing six hours.
    pub change_6h: Decimal,
    /// Absolute price change over the trailing 24 hours.
    pub change_24h: Decimal,
    /// Percentage price change over the trailing 24 hours.
    pub change_pct_24h: Decimal,

    /// Market capitalization.
    pub market_cap: Decimal,
    /// Absolute market cap change over the trailing 24 hours.
    pub market_cap_change_24h: Decimal,
    /// Percentage market cap change over the trailing 24 hours.
    pub market_cap_change_pct_24h: Decimal,
    /// Trailing 24h trade volume.
    pub volume_24h: Decimal,
    /// Trailing 24h high.
    pub high_24h: Decimal,
    /// Trailing 24h low.
    pub low_24h: Decimal,

    /// Circulating supply.
    pub circulating_supply: Decimal,
    /// Total supply.
    pub total_supply: Decimal,

    /// Liquidity locked in the venue reporting this record.
    pub liquidity: Decimal,
    /// Trailing 24h transaction count.
    pub transaction_count_24h: u64,
    /// Venue tag (e.g. `"raydium"`).
    pub dex: String,
    /// Venue URL for this listing.
    pub dex_url: String,

    /// All-time high price.
    pub ath: Decimal,
    /// Percentage change from all-time high to the current price.
    pub ath_change_pct: Decimal,
    /// Timestamp of the all-time high, if known.
    pub ath_date: Option<DateTime<Utc>>,
    /// All-time low price.
    pub atl: Decimal,
    /// Percentage change from all-time low to the current price.
    pub atl_change_pct: Decimal,
    /// Timestamp of the all-time low, if known.
    pub atl_date: Option<DateTime<Utc>>,
    /// Return on investment since listing, if the upstream supplies it.
    pub roi: Option<Decimal>,

    /// Non-empty set of upstream tags that contributed to this record.
    pub sources: BTreeSet<UpstreamTag>,
    /// Market rank, if known.
    pub rank: Option<u32>,
    /// Logo/image URL.
    pub image: Option<String>,
    /// Instant this record was produced: the fetch instant for a single-source
    /// record, or the merge instant for a fused one.
    pub last_updated: DateTime<Utc>,
    /// `true` once this record has been fused from two or more sources.
    pub is_merged: bool,
}

impl Token {
    /// A record is admissible into the pipeline once it carries a non-empty address.
    #[must_use]
    pub fn has_address(&self) -> bool {
        !self.address.trim().is_empty()
    }

    /// A record is valid for publication once its price is strictly positive.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.has_address() && self.price > Decimal::ZERO
    }

    /// Canonicalize `address` to lowercase in place.
    pub fn canonicalize_address(&mut self) {
        self.address = self.address.to_lowercase();
    }
}
