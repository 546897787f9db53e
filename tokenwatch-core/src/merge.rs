//! Normalizer/Validator and Merger: reject bad records, then fuse multi-sourced
//! records by address using the field-precedence table.
//!
//! Precedence is tag-based, not positional: a field group's "preferred source"
//! is resolved by looking for a token whose `sources` contains the matching
//! canonical tag, so `merge([[a],[b]])` and `merge([[b],[a]])` agree on every
//! precedence-owned field.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tokenwatch_types::{Token, UpstreamTag};

/// Canonical tag for the DEX-pair indexer upstream.
pub const DEX_TAG: &str = "dex";
/// Canonical tag for the market-data upstream.
pub const MARKET_TAG: &str = "market";

/// Drop records missing an address or carrying a non-positive price.
///
/// This is the Normalizer/Validator step (§2); offending records are dropped
/// silently, matching the Upstream Adapter's own filtering contract.
#[must_use]
pub fn normalize(tokens: Vec<Token>) -> Vec<Token> {
    let _before = tokens.len();
    let valid: Vec<Token> = tokens.into_iter().filter(Token::is_valid).collect();
    #[cfg(feature = "tracing")]
    if valid.len() < _before {
        tracing::warn!(dropped = _before - valid.len(), "normalizer dropped invalid records");
    }
    valid
}

/// Group a flattened token list by lowercase address, fuse each group, then
/// sort by `volume_24h` descending and truncate to `max_tokens`.
///
/// `sources` is a list of per-adapter token lists, e.g. `[dex_tokens,
/// market_tokens]`; order does not affect the result.
#[must_use]
pub fn merge(sources: Vec<Vec<Token>>, max_tokens: usize) -> Vec<Token> {
    let mut groups: BTreeMap<String, Vec<Token>> = BTreeMap::new();
    for mut token in sources.into_iter().flatten() {
        token.canonicalize_address();
        if token.address.is_empty() {
            continue;
        }
        groups.entry(token.address.clone()).or_default().push(token);
    }

    let mut fused: Vec<Token> = groups.into_values().map(fuse_group).collect();
    fused.sort_by(|a, b| b.volume_24h.cmp(&a.volume_24h));
    fused.truncate(max_tokens);
    fused
}

/// Fuse one address group. A singleton group passes through unmerged; larger
/// groups left-fold `fuse_pair` across the group in arrival order.
fn fuse_group(mut group: Vec<Token>) -> Token {
    if group.len() == 1 {
        let mut only = group.remove(0);
        only.is_merged = false;
        return only;
    }
    let mut iter = group.into_iter();
    let first = iter.next().expect("group is non-empty");
    iter.fold(first, fuse_pair)
}

/// Fuse two token records for the same address, applying the field-precedence
/// table. Commutative with respect to `a`/`b` ordering: precedence is
/// resolved by tag lookup, not by which argument is which.
fn fuse_pair(a: Token, b: Token) -> Token {
    let dex_side = pick_side(&a, &b, DEX_TAG);
    let market_side = pick_side(&a, &b, MARKET_TAG);

    let address = first_non_empty(&dex_side.address, &market_side.address, &a.address);
    let name = first_non_empty(&dex_side.name, &market_side.name, &a.name);
    let ticker = first_non_empty(&dex_side.ticker, &market_side.ticker, &a.ticker);

    let price = dex_preferred(dex_side.price, market_side.price);
    let volume_24h = dex_preferred(dex_side.volume_24h, market_side.volume_24h);
    let liquidity = dex_preferred(dex_side.liquidity, market_side.liquidity);
    let transaction_count_24h = if dex_side.transaction_count_24h != 0 {
        dex_side.transaction_count_24h
    } else {
        market_side.transaction_count_24h
    };
    let dex = first_non_empty(&dex_side.dex, &market_side.dex, &a.dex);
    let dex_url = first_non_empty(&dex_side.dex_url, &market_side.dex_url, &a.dex_url);

    let change_pct_24h = market_preferred(market_side.change_pct_24h, dex_side.change_pct_24h);
    let market_cap = market_preferred(market_side.market_cap, dex_side.market_cap);
    let market_cap_change_24h =
        market_preferred(market_side.market_cap_change_24h, dex_side.market_cap_change_24h);
    let market_cap_change_pct_24h = market_preferred(
        market_side.market_cap_change_pct_24h,
        dex_side.market_cap_change_pct_24h,
    );
    let circulating_supply =
        market_preferred(market_side.circulating_supply, dex_side.circulating_supply);
    let total_supply = market_preferred(market_side.total_supply, dex_side.total_supply);
    let high_24h = market_preferred(market_side.high_24h, dex_side.high_24h);
    let low_24h = market_preferred(market_side.low_24h, dex_side.low_24h);
    let ath = market_preferred(market_side.ath, dex_side.ath);
    let ath_change_pct = market_preferred(market_side.ath_change_pct, dex_side.ath_change_pct);
    let ath_date = market_side.ath_date.or(dex_side.ath_date);
    let atl = market_preferred(market_side.atl, dex_side.atl);
    let atl_change_pct = market_preferred(market_side.atl_change_pct, dex_side.atl_change_pct);
    let atl_date = market_side.atl_date.or(dex_side.atl_date);
    let roi = market_side.roi.or(dex_side.roi);
    let rank = market_side.rank.or(dex_side.rank);
    let image = market_side.image.clone().or_else(|| dex_side.image.clone());

    let mut sources = a.sources.clone();
    sources.extend(b.sources.iter().cloned());

    // change_1h / change_6h are not named in the precedence table; both upstream
    // shapes (§6) only ever populate one side, so first-non-zero is a safe default.
    let change_1h = dex_preferred(dex_side.change_1h, market_side.change_1h);
    let change_6h = dex_preferred(dex_side.change_6h, market_side.change_6h);
    let change_24h = dex_preferred(dex_side.change_24h, market_side.change_24h);

    Token {
        address,
        name,
        ticker,
        price,
        change_1h,
        change_6h,
        change_24h,
        change_pct_24h,
        market_cap,
        market_cap_change_24h,
        market_cap_change_pct_24h,
        volume_24h,
        high_24h,
        low_24h,
        circulating_supply,
        total_supply,
        liquidity,
        transaction_count_24h,
        dex,
        dex_url,
        ath,
        ath_change_pct,
        ath_date,
        atl,
        atl_change_pct,
        atl_date,
        roi,
        sources,
        rank,
        image,
        last_updated: chrono::Utc::now(),
        is_merged: true,
    }
}

/// Return whichever of `a`/`b` is tagged with `tag`, defaulting to `a` so the
/// fold always has a stable side to prefer when neither carries the tag.
fn pick_side<'a>(a: &'a Token, b: &'a Token, tag: &str) -> &'a Token {
    if a.sources.contains(&UpstreamTag::new(tag)) {
        a
    } else if b.sources.contains(&UpstreamTag::new(tag)) {
        b
    } else {
        a
    }
}

fn first_non_empty(preferred: &str, fallback: &str, last_resort: &str) -> String {
    if !preferred.is_empty() {
        preferred.to_string()
    } else if !fallback.is_empty() {
        fallback.to_string()
    } else {
        last_resort.to_string()
    }
}

fn dex_preferred(dex_value: Decimal, market_value: Decimal) -> Decimal {
    if dex_value != Decimal::ZERO {
        dex_value
    } else {
        market_value
    }
}

fn market_preferred(market_value: Decimal, dex_value: Decimal) -> Decimal {
    if market_value != Decimal::ZERO {
        market_value
    } else {
        dex_value
    }
}
