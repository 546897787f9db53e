//! Thin filter/sort/paginate layer over the Snapshot Store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokenwatch_middleware::SnapshotStore;
use tokenwatch_types::{AggError, Token};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

/// Sort key for [`get_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    Volume,
    PriceChange,
    MarketCap,
    Liquidity,
    TransactionCount,
}

/// Sort direction for [`get_all`]; default is [`SortOrder::Desc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Trailing window used by the `time_period` filter. `SevenDay` is a no-op
/// per the source system this contract follows (§9 open question).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePeriod {
    OneHour,
    TwentyFourHour,
    SevenDay,
}

/// Filter/sort/pagination parameters for [`get_all`].
#[derive(Debug, Clone)]
pub struct ListFilters {
    pub min_liquidity: Option<Decimal>,
    pub min_volume: Option<Decimal>,
    pub protocol: Option<String>,
    pub time_period: Option<TimePeriod>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub limit: usize,
    pub cursor: usize,
}

impl Default for ListFilters {
    fn default() -> Self {
        Self {
            min_liquidity: None,
            min_volume: None,
            protocol: None,
            time_period: None,
            sort_by: SortBy::Volume,
            sort_order: SortOrder::Desc,
            limit: DEFAULT_LIMIT,
            cursor: 0,
        }
    }
}

/// Response shape for [`get_all`].
#[derive(Debug, Clone)]
pub struct ListResponse {
    pub tokens: Vec<Token>,
    pub next_cursor: Option<usize>,
    pub has_more: bool,
    pub total_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Read-only facade over the [`SnapshotStore`]; owns no mutable state.
pub struct ReadApi {
    store: std::sync::Arc<SnapshotStore>,
}

impl ReadApi {
    #[must_use]
    pub fn new(store: std::sync::Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    /// Filter, sort, and paginate the current snapshot.
    ///
    /// `total_count` reflects post-filter cardinality, matching the source
    /// contract this follows (§9 open question). Missing `time_period`
    /// change fields exclude the record from the result.
    pub async fn get_all(&self, filters: &ListFilters) -> Result<ListResponse, AggError> {
        let snapshot = self.store.get().await?;
        let tokens = snapshot.map(|s| s.tokens).unwrap_or_default();

        let mut filtered: Vec<Token> = tokens
            .into_iter()
            .filter(|t| passes_filters(t, filters))
            .collect();

        sort_tokens(&mut filtered, filters.sort_by, filters.sort_order);

        let total_count = filtered.len();
        let start = filters.cursor.min(total_count);
        let end = (start + filters.limit.min(MAX_LIMIT)).min(total_count);
        let page = filtered[start..end].to_vec();
        let has_more = end < total_count;

        Ok(ListResponse {
            tokens: page,
            next_cursor: has_more.then_some(end),
            has_more,
            total_count,
            timestamp: Utc::now(),
        })
    }

    /// Case-insensitive lookup by address: tries the per-token cache first,
    /// then falls back to scanning the full snapshot.
    pub async fn get_by_address(&self, address: &str) -> Result<Option<Token>, AggError> {
        let lowered = address.to_lowercase();
        if let Some(token) = self.store.get_token(&lowered).await? {
            return Ok(Some(token));
        }
        let snapshot = self.store.get().await?;
        Ok(snapshot.and_then(|s| s.find(&lowered).cloned()))
    }
}

fn passes_filters(token: &Token, filters: &ListFilters) -> bool {
    if let Some(min_liquidity) = filters.min_liquidity {
        if token.liquidity < min_liquidity {
            return false;
        }
    }
    if let Some(min_volume) = filters.min_volume {
        if token.volume_24h < min_volume {
            return false;
        }
    }
    if let Some(protocol) = &filters.protocol {
        if !token.dex.to_lowercase().contains(&protocol.to_lowercase()) {
            return false;
        }
    }
    if let Some(period) = filters.time_period {
        match period {
            TimePeriod::OneHour => {
                if token.change_1h.is_zero() {
                    return false;
                }
            }
            TimePeriod::TwentyFourHour => {
                if token.change_24h.is_zero() {
                    return false;
                }
            }
            TimePeriod::SevenDay => {}
        }
    }
    true
}

fn sort_tokens(tokens: &mut [Token], sort_by: SortBy, order: SortOrder) {
    tokens.sort_by(|a, b| {
        let ordering = match sort_by {
            SortBy::Volume => a.volume_24h.cmp(&b.volume_24h),
            SortBy::PriceChange => a.change_pct_24h.cmp(&b.change_pct_24h),
            SortBy::MarketCap => a.market_cap.cmp(&b.market_cap),
            SortBy::Liquidity => a.liquidity.cmp(&b.liquidity),
            SortBy::TransactionCount => a.transaction_count_24h.cmp(&b.transaction_count_24h),
        };
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}
