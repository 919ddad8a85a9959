// EntityStore tests: upsert/lookup, record/query, concurrency, retention

mod common;

use common::*;
use serverload::error::CoreError;
use serverload::models::WindowSpec;
use serverload::store::EntityStore;
use std::sync::Arc;

#[test]
fn lookup_unknown_returns_none() {
    let store = EntityStore::new();
    assert!(store.lookup("nope").is_none());
    assert!(store.is_empty());
}

#[test]
fn upsert_then_lookup_contains_sample_once() {
    let store = EntityStore::new();
    let s = sample(t0(), 1.0, 2.0);
    store.upsert("web-01", s).unwrap();
    for _ in 0..3 {
        let handle = store.lookup("web-01").expect("history");
        let history = handle.read();
        assert_eq!(history.len(), 1);
        assert_eq!(history.samples(), &[s]);
    }
    assert_eq!(store.len(), 1);
}

#[test]
fn upsert_rejects_empty_name() {
    let store = EntityStore::new();
    let err = store.upsert("", sample(t0(), 1.0, 1.0)).unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
    assert!(store.is_empty());
    assert!(store.lookup("").is_none());
}

#[test]
fn record_sample_rejects_empty_name() {
    let store = EntityStore::new();
    let err = store.record_sample("", 1.0, 1.0, t0()).unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
    assert!(store.is_empty());
}

#[test]
fn lookup_handle_observes_store_mutations_only() {
    let store = EntityStore::new();
    let now = t0();
    store.record_sample("e", 1.0, 1.0, now - hours(30)).unwrap();
    let handle = store.lookup("e").unwrap();
    let copy = handle.clone();
    assert_eq!(handle.read().len(), 1);

    // appends and retention go through the store and are visible through every handle
    store.record_sample("e", 2.0, 2.0, now).unwrap();
    assert_eq!(copy.read().len(), 2);
    assert_eq!(store.prune_older_than(now - hours(24)), 1);
    assert_eq!(handle.read().len(), 1);
    assert_eq!(handle.read().latest().map(|s| s.cpu), Some(2.0));

    // reading through a handle leaves the history untouched
    let before = handle.read().samples().to_vec();
    let _ = handle.read().averages(now + mins(1), &WindowSpec::LAST_HOUR_BY_MINUTE);
    assert_eq!(store.lookup("e").unwrap().read().samples(), before.as_slice());
}

#[test]
fn record_and_query_scenario() {
    let store = EntityStore::new();
    let t = t0();
    store.record_sample("web-01", 10.0, 50.0, t).unwrap();
    store.record_sample("web-01", 20.0, 60.0, t + secs(30)).unwrap();

    let out = store
        .query_averages_at("web-01", &[WindowSpec::LAST_HOUR_BY_MINUTE], t + mins(1))
        .unwrap();
    assert_eq!(out.entity, "web-01");
    assert_eq!(out.samples, 2);
    assert_eq!(out.windows.len(), 1);
    assert_eq!(out.windows[0].cpu(), vec![15.0]);
    assert_eq!(out.windows[0].mem(), vec![55.0]);
}

#[test]
fn query_unknown_entity_is_not_found() {
    let store = EntityStore::new();
    store.record_sample("web-01", 1.0, 1.0, t0()).unwrap();
    let err = store
        .query_averages_at("web-02", &WindowSpec::defaults(), t0())
        .unwrap_err();
    assert_eq!(
        err,
        CoreError::NotFound {
            entity: "web-02".into()
        }
    );
}

#[test]
fn query_empty_history_returns_empty_windows() {
    let store = EntityStore::new();
    let now = t0();
    store.record_sample("web-01", 1.0, 1.0, now - hours(30)).unwrap();
    assert_eq!(store.prune_older_than(now - hours(24)), 1);

    let out = store
        .query_averages_at("web-01", &WindowSpec::defaults(), now)
        .unwrap();
    assert!(out.is_empty_history());
    assert_eq!(out.windows.len(), 2);
    assert!(out.windows.iter().all(|w| w.is_empty()));
}

#[test]
fn query_returns_one_result_per_window_in_order() {
    let store = EntityStore::new();
    let now = t0();
    store.record_sample("db", 5.0, 6.0, now - mins(90)).unwrap();
    store.record_sample("db", 7.0, 8.0, now - secs(30)).unwrap();
    let out = store
        .query_averages_at("db", &WindowSpec::defaults(), now)
        .unwrap();
    assert_eq!(out.windows[0].window, WindowSpec::LAST_HOUR_BY_MINUTE);
    assert_eq!(out.windows[0].cpu(), vec![7.0]);
    assert_eq!(out.windows[1].window, WindowSpec::LAST_DAY_BY_HOUR);
    assert_eq!(out.windows[1].cpu(), vec![7.0, 5.0]);
}

#[test]
fn entities_are_independent() {
    let store = EntityStore::new();
    let now = t0();
    store.record_sample("a", 10.0, 10.0, now - secs(5)).unwrap();
    store.record_sample("b", 90.0, 90.0, now - secs(5)).unwrap();
    let a = store
        .query_averages_at("a", &[WindowSpec::LAST_HOUR_BY_MINUTE], now)
        .unwrap();
    let b = store
        .query_averages_at("b", &[WindowSpec::LAST_HOUR_BY_MINUTE], now)
        .unwrap();
    assert_eq!(a.windows[0].cpu(), vec![10.0]);
    assert_eq!(b.windows[0].cpu(), vec![90.0]);
}

#[test]
fn concurrent_upserts_to_same_entity_lose_nothing() {
    let store = EntityStore::new();
    let threads = 8;
    let per_thread = 500;
    std::thread::scope(|s| {
        for t in 0..threads {
            let store = &store;
            s.spawn(move || {
                for i in 0..per_thread {
                    let ts = t0() + secs((i * threads + t) as i64);
                    store.upsert("shared", sample(ts, t as f64, i as f64)).unwrap();
                }
            });
        }
    });
    let handle = store.lookup("shared").unwrap();
    let history = handle.read();
    assert_eq!(history.len(), threads * per_thread);
    assert!(
        history
            .samples()
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    );
}

#[test]
fn concurrent_upserts_across_entities_and_readers() {
    let store = Arc::new(EntityStore::new());
    let now = t0();
    std::thread::scope(|s| {
        for t in 0..4 {
            let store = &store;
            s.spawn(move || {
                for i in 0..250 {
                    let name = format!("srv-{}", i % 50);
                    store
                        .record_sample(&name, t as f64, 1.0, now - secs(i as i64 + 1))
                        .unwrap();
                }
            });
        }
        let store = &store;
        s.spawn(move || {
            for i in 0..200 {
                let name = format!("srv-{}", i % 50);
                if let Ok(out) = store.query_averages_at(&name, &WindowSpec::defaults(), now) {
                    for w in &out.windows {
                        assert_eq!(w.cpu().len(), w.mem().len());
                    }
                }
            }
        });
    });
    let stats = store.stats();
    assert_eq!(stats.entities, 50);
    assert_eq!(stats.samples, 1000);
}

#[test]
fn causally_ordered_upserts_with_equal_timestamps_keep_order() {
    let store = EntityStore::new();
    let t = t0();
    store.upsert("e", sample(t, 1.0, 0.0)).unwrap();
    store.upsert("e", sample(t, 2.0, 0.0)).unwrap();
    store.upsert("e", sample(t - secs(1), 0.0, 0.0)).unwrap();
    store.upsert("e", sample(t, 3.0, 0.0)).unwrap();
    let handle = store.lookup("e").unwrap();
    let cpus: Vec<f64> = handle.read().samples().iter().map(|s| s.cpu).collect();
    assert_eq!(cpus, vec![0.0, 1.0, 2.0, 3.0]);
}

#[test]
fn prune_drops_only_old_samples_and_keeps_entities() {
    let store = EntityStore::new();
    let now = t0();
    store.record_sample("old", 1.0, 1.0, now - hours(48)).unwrap();
    store.record_sample("mixed", 1.0, 1.0, now - hours(26)).unwrap();
    store.record_sample("mixed", 2.0, 2.0, now - hours(1)).unwrap();

    let removed = store.prune_older_than(now - hours(24));
    assert_eq!(removed, 2);
    assert_eq!(store.len(), 2);
    assert_eq!(store.lookup("old").unwrap().read().len(), 0);
    assert_eq!(store.lookup("mixed").unwrap().read().len(), 1);
    assert_eq!(store.prune_older_than(now - hours(24)), 0);
}

#[test]
fn entities_lists_sorted_summaries() {
    let store = EntityStore::new();
    let now = t0();
    store.record_sample("zeta", 1.0, 1.0, now).unwrap();
    store.record_sample("alpha", 1.0, 1.0, now - secs(10)).unwrap();
    store.record_sample("alpha", 1.0, 1.0, now).unwrap();
    let list = store.entities();
    let names: Vec<&str> = list.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
    assert_eq!(list[0].samples, 2);
    assert_eq!(list[0].latest, Some(now));
}
