// tests/rate_cache_tests.rs
// Snapshot publication under concurrent readers, and ticker validation.

use custodial_wallet::pricing::client::parse_body;
use custodial_wallet::pricing::{RateCache, RateTable};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn generation(n: u32) -> RateTable {
    let base = 10000.0 * f64::from(n + 1);
    vec![
        ("USD".to_string(), base),
        ("EUR".to_string(), base + 1.0),
        ("GBP".to_string(), base + 2.0),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_readers_never_see_a_mixed_snapshot() {
    let cache = RateCache::with_table(generation(0));
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = cache.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut reads = 0u64;
                while !done.load(Ordering::Acquire) {
                    let snapshot = cache.snapshot();
                    let usd = snapshot.get("USD").unwrap();
                    assert_eq!(snapshot.get("EUR"), Some(usd + 1.0));
                    assert_eq!(snapshot.get("GBP"), Some(usd + 2.0));
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    for n in 1..=500 {
        cache.publish(generation(n));
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(cache.lookup("USD"), Some(5010000.0));
}

#[test]
fn test_ticker_keeps_only_btc_pairs() {
    let body = json!({
        "timestamp": "Wed, 05 Sep 2018 14:02:31 -0000",
        "BTCUSD": { "last": 7012.5, "volume": 1200.0 },
        "BTCEUR": { "last": 6050.1 },
        "ETHUSD": { "last": 280.0 },
        "LTCBTC": { "last": 0.0085 }
    });

    let table = RateTable::from_ticker(&body).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.get("USD"), Some(7012.5));
    assert_eq!(table.get("EUR"), Some(6050.1));
    assert_eq!(table.get("ETH"), None);
}

#[test]
fn test_ticker_with_unexpected_key_is_rejected() {
    let body = json!({ "BTCUSD": { "last": 7012.5 }, "error": "rate limited" });

    assert!(RateTable::from_ticker(&body).is_err());
}

#[test]
fn test_ticker_with_non_positive_rate_is_rejected() {
    let body = json!({ "BTCUSD": { "last": 0.0 } });

    assert!(RateTable::from_ticker(&body).is_err());
}

#[test]
fn test_failed_parse_leaves_cache_untouched() {
    let cache = RateCache::with_table(generation(0));

    if let Ok(table) = parse_body("<html><body>Service Unavailable</body></html>") {
        cache.publish(table);
    }

    assert_eq!(cache.lookup("USD"), Some(10000.0));
}
