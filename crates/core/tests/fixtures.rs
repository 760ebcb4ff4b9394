//! Fixture-driven expansion tests.
//!
//! Every `testdata/<name>-expandable.json` is expanded against the entries
//! in `testdata/store.json` and compared with `testdata/<name>-expanded.json`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use cachexp_core::{expand, BatchError, Config, Entries, Provider, ProviderError};
use serde_json::Value;

fn testdata() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/testdata")
}

struct FixtureProvider {
    config: Config,
    entries: HashMap<String, Vec<u8>>,
}

impl FixtureProvider {
    fn load() -> Self {
        let raw = fs::read(testdata().join("store.json")).expect("store.json");
        let store: serde_json::Map<String, Value> =
            serde_json::from_slice(&raw).expect("store.json must be an object");
        let entries = store
            .into_iter()
            .map(|(k, v)| (k, serde_json::to_vec(&v).unwrap()))
            .collect();
        Self {
            config: Config::default().exclude("self"),
            entries,
        }
    }
}

impl Provider for FixtureProvider {
    type Context = ();

    fn serialize(&self, value: &Value) -> Result<Vec<u8>, ProviderError> {
        serde_json::to_vec(value).map_err(|e| ProviderError::Encode(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Value, ProviderError> {
        serde_json::from_slice(bytes).map_err(|e| ProviderError::Decode(e.to_string()))
    }

    fn read_one(&self, key: &str, _ctx: &()) -> Result<Vec<u8>, ProviderError> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                key: key.to_string(),
            })
    }

    fn read_many(&self, keys: &[String], _ctx: &()) -> Result<Entries, BatchError> {
        Ok(keys
            .iter()
            .filter_map(|k| self.entries.get(k).map(|b| (k.clone(), b.clone())))
            .collect())
    }

    fn normalize(&self, key: &str) -> String {
        key.to_string()
    }

    fn config(&self) -> &Config {
        &self.config
    }
}

fn fixture_names() -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(testdata())
        .expect("testdata directory")
        .filter_map(|entry| {
            let name = entry.ok()?.file_name().to_string_lossy().to_string();
            name.strip_suffix("-expandable.json").map(str::to_string)
        })
        .collect();
    names.sort();
    names
}

#[test]
fn fixtures_expand_as_recorded() {
    let provider = FixtureProvider::load();
    let names = fixture_names();
    assert!(names.len() >= 4, "expected fixtures, found {:?}", names);

    for name in names {
        let input = fs::read(testdata().join(format!("{name}-expandable.json"))).unwrap();
        let expected: Value = serde_json::from_slice(
            &fs::read(testdata().join(format!("{name}-expanded.json"))).unwrap(),
        )
        .unwrap();

        let out = expand(&provider, &input, &()).unwrap();
        assert!(out.errors.is_empty(), "{name}: {}", out.errors);

        let actual: Value = serde_json::from_slice(&out.bytes).unwrap();
        assert_eq!(actual, expected, "fixture {name}");
    }
}

#[test]
fn shallower_depth_truncates_chain() {
    let mut provider = FixtureProvider::load();
    provider.config = provider.config.clone().with_max_depth(1);

    let input = fs::read(testdata().join("chain-expandable.json")).unwrap();
    let out = expand(&provider, &input, &()).unwrap();
    let actual: Value = serde_json::from_slice(&out.bytes).unwrap();
    assert_eq!(actual, serde_json::json!({"id": "a", "next": {"id": "b"}}));
}

#[test]
fn provider_behind_trait_object() {
    let provider = FixtureProvider::load();
    let dynamic: &dyn Provider<Context = ()> = &provider;

    let input = br#"{"_expand": {"origin": "country/v1/id"}}"#;
    let out = expand(dynamic, input, &()).unwrap();
    let actual: Value = serde_json::from_slice(&out.bytes).unwrap();
    assert_eq!(
        actual,
        serde_json::json!({"origin": {"code": "ID", "name": "Indonesia"}})
    );
}
