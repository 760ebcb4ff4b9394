//! Runs the provider conformance suite against the bundled stores.

use cachexp_core::Provider;
use cachexp_storage::conformance::run_conformance_suite;
use cachexp_storage::{CacheProvider, CacheStore, DirStore, KeyNormalizer, MemoryStore};

#[test]
fn memory_store_conformance() {
    let report = run_conformance_suite(|config, seed| {
        let store = MemoryStore::from_json(seed.iter().cloned()).expect("seed store");
        CacheProvider::new(store, config)
    });
    assert!(report.failed == 0, "{report}");
    assert!(report.total > 0);
}

#[test]
fn dir_store_conformance() {
    let dir = tempfile::tempdir().unwrap();
    let counter = std::cell::Cell::new(0usize);
    let root = dir.path().to_path_buf();

    let report = run_conformance_suite(|config, seed| {
        // Fresh directory per test.
        let n = counter.get();
        counter.set(n + 1);
        let store = DirStore::new(root.join(format!("run-{n}")));
        for (key, doc) in seed {
            store
                .put(key, &serde_json::to_vec(doc).unwrap())
                .expect("seed entry");
        }
        CacheProvider::new(store, config)
    });
    assert!(report.failed == 0, "{report}");
}

#[test]
fn namespaced_provider_conformance() {
    let report = run_conformance_suite(|config, seed| {
        let provider = CacheProvider::new(MemoryStore::new(), config)
            .with_normalizer(KeyNormalizer::new().with_namespace("tenant-a").lowercase(true));
        for (key, doc) in seed {
            provider
                .store()
                .put(&provider.normalize(key), &serde_json::to_vec(doc).unwrap())
                .expect("seed entry");
        }
        provider
    });
    assert!(report.failed == 0, "{report}");
}
