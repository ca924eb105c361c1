use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta};

use crate::cache::{CacheEntry, ResponseCache};
use crate::clock::ManualClock;

fn setup(ttl_secs: u64) -> (ResponseCache<String>, Arc<ManualClock>) {
    let start = DateTime::from_timestamp(1_700_000_000, 0).expect("valid timestamp");
    let clock = Arc::new(ManualClock::new(start));
    let cache = ResponseCache::with_clock(Duration::from_secs(ttl_secs), clock.clone());
    (cache, clock)
}

#[test]
fn get_returns_none_for_unknown_key() {
    let (cache, _) = setup(60);
    assert!(cache.get("pkg:left-pad:0:0").is_none());
}

#[test]
fn set_then_get_returns_value() {
    let (cache, _) = setup(60);
    cache.set("k", "v".to_string());
    assert_eq!(cache.get("k").as_deref(), Some("v"));
}

#[test]
fn value_survives_until_ttl_minus_one() {
    let (cache, clock) = setup(60);
    cache.set("k", "v".to_string());
    clock.advance(TimeDelta::seconds(59));
    assert_eq!(cache.get("k").as_deref(), Some("v"));
}

#[test]
fn value_survives_exactly_at_ttl() {
    let (cache, clock) = setup(60);
    cache.set("k", "v".to_string());
    clock.advance(TimeDelta::seconds(60));
    assert_eq!(cache.get("k").as_deref(), Some("v"));
}

#[test]
fn value_expires_after_ttl_plus_one() {
    let (cache, clock) = setup(60);
    cache.set("k", "v".to_string());
    clock.advance(TimeDelta::seconds(61));
    assert!(cache.get("k").is_none());
}

#[test]
fn ttl_boundaries_hold_for_other_ttls() {
    for ttl in [1_u64, 5, 300, 3600] {
        let (cache, clock) = setup(ttl);
        cache.set("k", "v".to_string());
        clock.advance(TimeDelta::seconds(ttl as i64 - 1));
        assert!(cache.get("k").is_some(), "ttl {ttl} expired early");
        clock.advance(TimeDelta::seconds(2));
        assert!(cache.get("k").is_none(), "ttl {ttl} did not expire");
    }
}

#[test]
fn expired_entry_is_removed_on_read() {
    let (cache, clock) = setup(10);
    cache.set("k", "v".to_string());
    assert_eq!(cache.len(), 1);
    clock.advance(TimeDelta::seconds(11));
    assert!(cache.get("k").is_none());
    assert!(cache.is_empty());
}

#[test]
fn expired_entry_stays_until_read() {
    let (cache, clock) = setup(10);
    cache.set("k", "v".to_string());
    clock.advance(TimeDelta::seconds(100));
    assert_eq!(cache.len(), 1);
}

#[test]
fn set_overwrites_and_resets_timestamp() {
    let (cache, clock) = setup(10);
    cache.set("k", "old".to_string());
    clock.advance(TimeDelta::seconds(8));
    cache.set("k", "new".to_string());
    clock.advance(TimeDelta::seconds(8));
    assert_eq!(cache.get("k").as_deref(), Some("new"));
    assert_eq!(cache.len(), 1);
}

#[test]
fn zero_ttl_serves_only_within_same_instant() {
    let (cache, clock) = setup(0);
    cache.set("k", "v".to_string());
    assert!(cache.get("k").is_some());
    clock.advance(TimeDelta::milliseconds(1));
    assert!(cache.get("k").is_none());
}

#[test]
fn purge_expired_removes_only_stale_entries() {
    let (cache, clock) = setup(10);
    cache.set("old", "1".to_string());
    clock.advance(TimeDelta::seconds(6));
    cache.set("young", "2".to_string());
    clock.advance(TimeDelta::seconds(6));

    assert_eq!(cache.purge_expired(), 1);
    assert!(cache.get("old").is_none());
    assert_eq!(cache.get("young").as_deref(), Some("2"));
}

#[test]
fn stats_counts_fresh_and_total() {
    let (cache, clock) = setup(10);
    cache.set("a", "1".to_string());
    clock.advance(TimeDelta::seconds(11));
    cache.set("b", "2".to_string());

    let stats = cache.stats();
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.fresh_entries, 1);
    assert_eq!(stats.ttl_secs, 10);
}

#[test]
fn ttl_accessor_round_trips() {
    let (cache, _) = setup(42);
    assert_eq!(cache.ttl(), Duration::from_secs(42));
}

#[test]
fn entry_freshness_is_inclusive() {
    let stored = DateTime::from_timestamp(100, 0).unwrap();
    let entry = CacheEntry::new((), stored);
    let ttl = TimeDelta::seconds(5);
    assert!(entry.is_fresh(stored, ttl));
    assert!(entry.is_fresh(stored + ttl, ttl));
    assert!(!entry.is_fresh(stored + ttl + TimeDelta::seconds(1), ttl));
}

#[test]
fn concurrent_writers_do_not_lose_entries() {
    let (cache, _) = setup(60);
    let cache = Arc::new(cache);
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for i in 0..50 {
                    cache.set(format!("{t}:{i}"), format!("{i}"));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(cache.len(), 400);
}
