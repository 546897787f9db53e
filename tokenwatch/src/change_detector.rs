//! Diffs successive snapshots into typed change events.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use tokenwatch_types::{Direction, Event, EventPayload, Snapshot, Token};

const VOLUME_MULTIPLIER: u32 = 2;

fn price_threshold() -> Decimal {
    Decimal::new(5, 2) // 0.05
}

fn market_cap_threshold() -> Decimal {
    Decimal::new(10, 2) // 0.10
}

fn liquidity_threshold() -> Decimal {
    Decimal::new(20, 2) // 0.20
}

/// `|current - previous| / previous`, or `None` if `previous <= 0` (the
/// comparison is meaningless, and per the source this suppresses the alert
/// rather than firing on an undefined ratio).
fn relative_change(previous: Decimal, current: Decimal) -> Option<Decimal> {
    if previous <= Decimal::ZERO {
        return None;
    }
    Some(((current - previous) / previous).abs())
}

/// Diff `current` against `previous`, producing one `batch_update` plus any
/// alert events fired by tokens present in both snapshots.
///
/// If `previous` is `None` (first tick), only a `batch_update` is emitted —
/// appearance of a brand-new snapshot is never itself an alert.
#[must_use]
pub fn detect(previous: Option<&Snapshot>, current: &Snapshot) -> Vec<Event> {
    let now = Utc::now();
    let mut events = vec![Event::new(
        EventPayload::BatchUpdate {
            snapshot: current.clone(),
        },
        now,
    )];

    let Some(previous) = previous else {
        return events;
    };

    let previous_by_address: HashMap<&str, &Token> = previous
        .tokens
        .iter()
        .map(|t| (t.address.as_str(), t))
        .collect();

    for token in &current.tokens {
        let Some(prev) = previous_by_address.get(token.address.as_str()) else {
            continue;
        };
        events.extend(alerts_for(prev, token, now));
    }

    events
}

fn alerts_for(prev: &Token, current: &Token, now: chrono::DateTime<Utc>) -> Vec<Event> {
    let mut events = Vec::new();

    if let Some(pct) = relative_change(prev.price, current.price) {
        if pct > price_threshold() {
            let direction = if current.price > prev.price {
                Direction::Up
            } else {
                Direction::Down
            };
            events.push(Event::new(
                EventPayload::PriceAlert {
                    address: current.address.clone(),
                    old_price: prev.price,
                    new_price: current.price,
                    pct_change: signed_pct(prev.price, current.price),
                    direction,
                },
                now,
            ));
        }
    }

    if prev.volume_24h > Decimal::ZERO {
        let doubled = prev.volume_24h * Decimal::from(VOLUME_MULTIPLIER);
        if current.volume_24h > doubled {
            events.push(Event::new(
                EventPayload::VolumeAlert {
                    address: current.address.clone(),
                    volume_24h: current.volume_24h,
                    price: current.price,
                    market_cap: current.market_cap,
                },
                now,
            ));
        }
    }

    if let Some(pct) = relative_change(prev.market_cap, current.market_cap) {
        if pct > market_cap_threshold() {
            events.push(Event::new(
                EventPayload::MarketCapAlert {
                    address: current.address.clone(),
                    old_market_cap: prev.market_cap,
                    new_market_cap: current.market_cap,
                    pct_change: signed_pct(prev.market_cap, current.market_cap),
                    rank: current.rank,
                },
                now,
            ));
        }
    }

    if let Some(pct) = relative_change(prev.liquidity, current.liquidity) {
        if pct > liquidity_threshold() {
            events.push(Event::new(
                EventPayload::LiquidityAlert {
                    address: current.address.clone(),
                    old_liquidity: prev.liquidity,
                    new_liquidity: current.liquidity,
                    pct_change: signed_pct(prev.liquidity, current.liquidity),
                    dex: current.dex.clone(),
                },
                now,
            ));
        }
    }

    events
}

fn signed_pct(previous: Decimal, current: Decimal) -> Decimal {
    if previous.is_zero() {
        return Decimal::ZERO;
    }
    (current - previous) / previous
}
