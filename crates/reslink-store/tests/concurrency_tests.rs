//! Concurrent replacements on one key
//!
//! Run with: cargo test --package reslink-store --test concurrency_tests

use reslink_store::{replace_links, InMemoryLinkStore, LinkStore, ReplaceOptions};
use reslink_types::{EntityRef, LinkData};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Barrier;
use std::time::Duration;

fn process(id: u64) -> EntityRef {
    EntityRef::new("process", id)
}

fn outbound(store: &InMemoryLinkStore, from: &EntityRef) -> Vec<EntityRef> {
    store
        .find_by_from_and_name(from, "related_to")
        .unwrap()
        .into_iter()
        .map(|link| link.to().clone())
        .collect()
}

#[test]
fn concurrent_replacements_leave_one_whole_set() {
    let store = InMemoryLinkStore::new();
    let from = process(1);
    let set_a = vec![process(2), process(3), process(4)];
    let set_b = vec![process(5), process(6)];
    let opts = ReplaceOptions::new().with_lock_timeout(Duration::from_secs(10));
    let barrier = Barrier::new(2);

    std::thread::scope(|s| {
        for targets in [&set_a, &set_b] {
            let (store, from, opts, barrier) = (&store, &from, &opts, &barrier);
            s.spawn(move || {
                barrier.wait();
                for _ in 0..200 {
                    replace_links(store, from, targets.clone(), "related_to", &LinkData::new(), opts)
                        .unwrap();
                }
            });
        }
    });

    let final_set = outbound(&store, &from);
    assert!(final_set == set_a || final_set == set_b, "mixed state: {final_set:?}");
    assert_eq!(store.len(), final_set.len());
}

#[test]
fn readers_never_see_partial_replacement() {
    let store = InMemoryLinkStore::new();
    let from = process(1);
    let set_a = vec![process(2), process(3), process(4)];
    let set_b = vec![process(5), process(6)];
    let opts = ReplaceOptions::new().with_lock_timeout(Duration::from_secs(10));
    replace_links(&store, &from, set_a.clone(), "related_to", &LinkData::new(), &opts).unwrap();

    let done = AtomicBool::new(false);

    std::thread::scope(|s| {
        s.spawn(|| {
            for i in 0..500 {
                let targets = if i % 2 == 0 { set_b.clone() } else { set_a.clone() };
                replace_links(&store, &from, targets, "related_to", &LinkData::new(), &opts)
                    .unwrap();
            }
            done.store(true, Ordering::Release);
        });

        s.spawn(|| {
            while !done.load(Ordering::Acquire) {
                let seen = outbound(&store, &from);
                assert!(seen == set_a || seen == set_b, "partial state: {seen:?}");
            }
        });
    });
}

#[test]
fn disjoint_keys_proceed_in_parallel() {
    let store = InMemoryLinkStore::new();
    let opts = ReplaceOptions::new();

    // Hold one key for the whole test; replacements elsewhere must not wait on it.
    let held = store
        .lock_key(
            &reslink_types::LinkKey::new(&process(1), "related_to"),
            Duration::from_millis(10),
        )
        .unwrap();

    std::thread::scope(|s| {
        for id in 2..10u64 {
            let (store, opts) = (&store, &opts);
            s.spawn(move || {
                replace_links(
                    store,
                    &process(id),
                    [process(100 + id)],
                    "related_to",
                    &LinkData::new(),
                    &opts.with_lock_timeout(Duration::from_millis(50)),
                )
                .unwrap();
            });
        }
    });

    drop(held);
    assert_eq!(store.len(), 8);
}
