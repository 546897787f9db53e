use std::collections::BTreeSet;

use chrono::Utc;
use rust_decimal::Decimal;
use tokenwatch_core::merge;
use tokenwatch_types::{Token, UpstreamTag};

fn base_token(address: &str, tag: &str) -> Token {
    Token {
        address: address.to_string(),
        name: String::new(),
        ticker: String::new(),
        price: Decimal::ZERO,
        change_1h: Decimal::ZERO,
        change_6h: Decimal::ZERO,
        change_24h: Decimal::ZERO,
        change_pct_24h: Decimal::ZERO,
        market_cap: Decimal::ZERO,
        market_cap_change_24h: Decimal::ZERO,
        market_cap_change_pct_24h: Decimal::ZERO,
        volume_24h: Decimal::ZERO,
        high_24h: Decimal::ZERO,
        low_24h: Decimal::ZERO,
        circulating_supply: Decimal::ZERO,
        total_supply: Decimal::ZERO,
        liquidity: Decimal::ZERO,
        transaction_count_24h: 0,
        dex: String::new(),
        dex_url: String::new(),
        ath: Decimal::ZERO,
        ath_change_pct: Decimal::ZERO,
        ath_date: None,
        atl: Decimal::ZERO,
        atl_change_pct: Decimal::ZERO,
        atl_date: None,
        roi: None,
        sources: BTreeSet::from([UpstreamTag::new(tag)]),
        rank: None,
        image: None,
        last_updated: Utc::now(),
        is_merged: false,
    }
}

// S3: DEX side wins price/liquidity/volume, market side wins change_pct_24h
// and circulating_supply, and the merged record unions sources.
#[test]
fn merge_precedence_fuses_dex_and_market_records() {
    let dex = Token {
        price: Decimal::new(10, 1),
        liquidity: Decimal::from(200),
        volume_24h: Decimal::from(500),
        change_pct_24h: Decimal::ZERO,
        ..base_token("0x1", "dex")
    };
    let market = Token {
        price: Decimal::new(11, 1),
        liquidity: Decimal::ZERO,
        volume_24h: Decimal::from(600),
        change_pct_24h: Decimal::from(12),
        circulating_supply: Decimal::new(1_000_000, 0),
        ..base_token("0x1", "market")
    };

    let merged = merge(vec![vec![dex], vec![market]], 1000);
    assert_eq!(merged.len(), 1);
    let token = &merged[0];

    assert_eq!(token.price, Decimal::new(10, 1));
    assert_eq!(token.liquidity, Decimal::from(200));
    assert_eq!(token.volume_24h, Decimal::from(500));
    assert_eq!(token.change_pct_24h, Decimal::from(12));
    assert_eq!(token.circulating_supply, Decimal::new(1_000_000, 0));
    assert!(token.is_merged);
    assert_eq!(token.sources.len(), 2);
}

#[test]
fn merge_is_commutative_regardless_of_source_order() {
    let dex = Token {
        price: Decimal::ONE,
        liquidity: Decimal::from(10),
        ..base_token("0xabc", "dex")
    };
    let market = Token {
        change_pct_24h: Decimal::from(5),
        ..base_token("0xabc", "market")
    };

    let forward = merge(vec![vec![dex.clone()], vec![market.clone()]], 1000);
    let reverse = merge(vec![vec![market], vec![dex]], 1000);

    assert_eq!(forward[0].sources, reverse[0].sources);
    assert_eq!(forward[0].address, reverse[0].address);
    assert_eq!(forward[0].price, reverse[0].price);
    assert_eq!(forward[0].change_pct_24h, reverse[0].change_pct_24h);
}

#[test]
fn singleton_group_passes_through_unmerged() {
    let token = base_token("0xsolo", "dex");
    let merged = merge(vec![vec![token]], 1000);
    assert_eq!(merged.len(), 1);
    assert!(!merged[0].is_merged);
    assert_eq!(merged[0].sources.len(), 1);
}
