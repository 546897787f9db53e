//! Change-detector output: a tagged event variant per alert kind, never an
//! untyped property bag.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::snapshot::Snapshot;

/// Direction of a price move, carried alongside a [`EventPayload::PriceAlert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Price increased.
    Up,
    /// Price decreased.
    Down,
}

/// One arm per event kind, each carrying a typed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum EventPayload {
    /// The full current snapshot, emitted once per tick.
    #[serde(rename = "batch_update")]
    BatchUpdate {
        /// The snapshot just published.
        snapshot: Snapshot,
    },
    /// `|Δprice| / prev_price > 0.05`.
    #[serde(rename = "price_alert")]
    PriceAlert {
        /// Address the alert concerns.
        address: String,
        /// Previous price.
        old_price: Decimal,
        /// Current price.
        new_price: Decimal,
        /// Signed relative change, e.g. `0.08` for +8%.
        pct_change: Decimal,
        /// Direction of the move.
        direction: Direction,
    },
    /// `current.volume_24h > 2 * prev.volume_24h`.
    #[serde(rename = "volume_alert")]
    VolumeAlert {
        /// Address the alert concerns.
        address: String,
        /// Current trailing-24h volume.
        volume_24h: Decimal,
        /// Current price, for display alongside the volume spike.
        price: Decimal,
        /// Current market cap, for display alongside the volume spike.
        market_cap: Decimal,
    },
    /// `|Δmarket_cap| / prev_market_cap > 0.10`.
    #[serde(rename = "market_cap_alert")]
    MarketCapAlert {
        /// Address the alert concerns.
        address: String,
        /// Previous market cap.
        old_market_cap: Decimal,
        /// Current market cap.
        new_market_cap: Decimal,
        /// Signed relative change.
        pct_change: Decimal,
        /// Current market rank, if known.
        rank: Option<u32>,
    },
    /// `|Δliquidity| / prev_liquidity > 0.20`.
    #[serde(rename = "liquidity_alert")]
    LiquidityAlert {
        /// Address the alert concerns.
        address: String,
        /// Previous liquidity.
        old_liquidity: Decimal,
        /// Current liquidity.
        new_liquidity: Decimal,
        /// Signed relative change.
        pct_change: Decimal,
        /// Venue tag, for display alongside the liquidity move.
        dex: String,
    },
}

impl EventPayload {
    /// The address this event concerns, if any (`BatchUpdate` has none).
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        match self {
            Self::BatchUpdate { .. } => None,
            Self::PriceAlert { address, .. }
            | Self::VolumeAlert { address, .. }
            | Self::MarketCapAlert { address, .. }
            | Self::LiquidityAlert { address, .. } => Some(address),
        }
    }

    /// Stable string tag for logging, matching the wire `kind` field.
    #[must_use]
    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::BatchUpdate { .. } => "batch_update",
            Self::PriceAlert { .. } => "price_alert",
            Self::VolumeAlert { .. } => "volume_alert",
            Self::MarketCapAlert { .. } => "market_cap_alert",
            Self::LiquidityAlert { .. } => "liquidity_alert",
        }
    }
}

/// A timestamped, typed event handed from the Change Detector to the Broadcaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// The tagged payload.
    #[serde(flatten)]
    pub payload: EventPayload,
    /// Instant the event was produced.
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Wrap a payload with the current instant.
    #[must_use]
    pub fn new(payload: EventPayload, timestamp: DateTime<Utc>) -> Self {
        Self { payload, timestamp }
    }
}
