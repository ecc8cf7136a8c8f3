use pretty_assertions::assert_eq;
use reslink_store::{replace_links, InMemoryLinkStore, LinkStore, ReplaceOptions};
use reslink_types::{EntityRef, LinkData, StorageError};

fn process(id: u64) -> EntityRef {
    EntityRef::new("process", id)
}

fn proposal(id: u64) -> EntityRef {
    EntityRef::new("proposal", id)
}

#[test]
fn snapshot_restores_both_indices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.json");

    let store = InMemoryLinkStore::new();
    let data = LinkData::new().with("origin", "import");
    replace_links(&store, &process(1), [proposal(7), proposal(8)], "included", &data, &ReplaceOptions::new())
        .unwrap();
    replace_links(&store, &proposal(7), [process(1)], "endorses", &LinkData::new(), &ReplaceOptions::new())
        .unwrap();
    store.save_snapshot(&path).unwrap();

    let restored = InMemoryLinkStore::load_snapshot(&path).unwrap();

    assert_eq!(restored.all_links(), store.all_links());
    assert_eq!(restored.stats(), store.stats());
    assert_eq!(
        restored.find_by_to_and_name(&proposal(8), "included").unwrap()[0].data(),
        &data
    );
    assert_eq!(restored.links_to(&process(1)).unwrap().len(), 1);
}

#[test]
fn restored_store_accepts_replacements() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.json");

    let store = InMemoryLinkStore::new();
    replace_links(&store, &process(1), [process(2)], "related_to", &LinkData::new(), &ReplaceOptions::new())
        .unwrap();
    store.save_snapshot(&path).unwrap();

    let restored = InMemoryLinkStore::load_snapshot(&path).unwrap();
    let replaced = replace_links(
        &restored,
        &process(1),
        [process(3)],
        "related_to",
        &LinkData::new(),
        &ReplaceOptions::new(),
    )
    .unwrap();

    assert_eq!(replaced.removed, 1);
    assert!(restored.find_by_to_and_name(&process(2), "related_to").unwrap().is_empty());
}

#[test]
fn snapshot_with_duplicate_ids_is_corrupted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.json");

    let store = InMemoryLinkStore::new();
    store
        .insert(reslink_types::NewLink::new(process(1), process(2), "related_to"))
        .unwrap();
    let link = serde_json::to_value(&store.all_links()[0]).unwrap();
    let doc = serde_json::json!({ "version": 1, "links": [link.clone(), link] });
    std::fs::write(&path, serde_json::to_vec(&doc).unwrap()).unwrap();

    let err = InMemoryLinkStore::load_snapshot(&path).unwrap_err();
    assert!(matches!(err, StorageError::Corrupted(_)));
}

#[test]
fn concurrent_saves_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("links.json");
    let store = InMemoryLinkStore::new();
    let barrier = std::sync::Barrier::new(4);

    let failures: usize = std::thread::scope(|s| {
        let workers: Vec<_> = (0..4u64)
            .map(|worker| {
                let (store, path, barrier) = (&store, &path, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    let mut failures = 0;
                    for round in 0..50 {
                        replace_links(
                            store,
                            &process(worker),
                            [proposal(round)],
                            "included",
                            &LinkData::new(),
                            &ReplaceOptions::new(),
                        )
                        .unwrap();
                        if store.save_snapshot(path).is_err() {
                            failures += 1;
                        }
                    }
                    failures
                })
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).sum()
    });

    assert_eq!(failures, 0);

    // Whichever save landed last, the file is a whole snapshot and no temp files remain.
    let landed = InMemoryLinkStore::load_snapshot(&path).unwrap();
    assert!(landed.len() <= 4);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);

    store.save_snapshot(&path).unwrap();
    assert_eq!(InMemoryLinkStore::load_snapshot(&path).unwrap().len(), 4);
}
