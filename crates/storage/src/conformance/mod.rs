//! Conformance test suite for `Provider` implementations.
//!
//! This module provides a backend-agnostic test suite that any
//! [`Provider`] implementation can run to verify that it behaves the way the
//! expansion engine expects. The suite covers:
//!
//! - **Codec**: tree values survive encode/decode, garbage is rejected
//! - **Single reads**: seeded keys are found, unknown keys fail
//! - **Batched reads**: results indexed by normalized key, misses absent
//! - **Expansion**: named and list references resolve end to end
//! - **Concurrency**: one provider serves many threads at once
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that builds a
//! fresh provider holding exactly the given entries, each stored under
//! `provider.normalize(key)`, and using the given [`Config`]:
//!
//! ```ignore
//! use cachexp_storage::conformance::run_conformance_suite;
//!
//! #[test]
//! fn memory_conformance() {
//!     let report = run_conformance_suite(|config, seed| {
//!         let store = MemoryStore::from_json(seed.iter().cloned()).unwrap();
//!         CacheProvider::new(store, config)
//!     });
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod batch;
mod codec;
mod concurrent;
mod expand;
mod read;

use std::fmt;

use cachexp_core::{Config, Provider};
use serde_json::{json, Value};

/// Outcome of one check, e.g. `batch/read_many_omits_unknown_keys`.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// One of `codec`, `read`, `batch`, `expand`, `concurrent`.
    pub category: String,
    pub name: String,
    pub passed: bool,
    /// Why the provider misbehaved; `None` when the check passed.
    pub message: Option<String>,
}

impl TestResult {
    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: result.is_ok(),
            message: result.err(),
        }
    }

    /// `category/name`, as printed in failure listings.
    pub fn id(&self) -> String {
        format!("{}/{}", self.category, self.name)
    }
}

/// Every [`TestResult`] of a suite run plus pass/fail counts.
///
/// `Display` prints a one-line summary followed by each failing check.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl ConformanceReport {
    fn from_results(results: Vec<TestResult>) -> Self {
        let passed = results.iter().filter(|r| r.passed).count();
        let total = results.len();
        Self {
            results,
            passed,
            failed: total - passed,
            total,
        }
    }

    /// The checks that failed, in run order.
    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "provider conformance: {} of {} checks passed",
            self.passed, self.total
        )?;
        for r in self.failures() {
            writeln!(f, "  {}: {}", r.id(), r.message.as_deref().unwrap_or("failed"))?;
        }
        Ok(())
    }
}

/// Check a provider implementation against every category of the suite.
///
/// `factory` builds a fresh provider for each check from the suite's
/// [`Config`] and the [`seed`] entries.
pub fn run_conformance_suite<P, F>(factory: F) -> ConformanceReport
where
    P: Provider,
    P::Context: Default + Sync,
    F: Fn(Config, &[(String, Value)]) -> P,
{
    let build = || factory(suite_config(), &seed());

    let mut results = Vec::new();

    results.extend(codec::run_codec_tests(&build));
    results.extend(read::run_read_tests(&build));
    results.extend(batch::run_batch_tests(&build));
    results.extend(expand::run_expand_tests(&build));
    results.extend(concurrent::run_concurrent_tests(&build));

    ConformanceReport::from_results(results)
}

// ── Fixed data set ────────────────────────────────────────────────────────────

const EXPAND_KEY: &str = "_expand";
const PLACEHOLDER_KEY: &str = "_items";

fn suite_config() -> Config {
    Config::default()
        .with_expand_key(EXPAND_KEY)
        .with_placeholder_key(PLACEHOLDER_KEY)
        .with_max_depth(2)
        .exclude("self")
}

/// Entries every provider under test is seeded with.
pub fn seed() -> Vec<(String, Value)> {
    vec![
        (
            "conformance/user/1".to_string(),
            json!({"id": 1, "name": "Ana"}),
        ),
        (
            "conformance/user/2".to_string(),
            json!({"id": 2, "name": "Budi"}),
        ),
        (
            "conformance/post/1".to_string(),
            json!({
                "id": 10,
                "title": "Hello",
                EXPAND_KEY: {"author": "conformance/user/1", "self": "conformance/post/1"}
            }),
        ),
        (
            "conformance/post/2".to_string(),
            json!({
                "id": 11,
                "title": "Again",
                EXPAND_KEY: {"author": "conformance/user/2", "liked_by": ["conformance/user/1"]}
            }),
        ),
        (
            "conformance/wrap/1".to_string(),
            json!({"kind": "wrap", EXPAND_KEY: {"post": "conformance/post/2"}}),
        ),
    ]
}

fn decode(provider: &impl Provider, bytes: &[u8]) -> Result<Value, String> {
    provider
        .deserialize(bytes)
        .map_err(|e| format!("deserialize: {e}"))
}

fn seeded(key: &str) -> Result<Value, String> {
    seed()
        .into_iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
        .ok_or_else(|| format!("no seeded entry '{key}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_only_failures() {
        let report = ConformanceReport::from_results(vec![
            TestResult::from_result("read", "read_one_returns_seeded_entry", Ok(())),
            TestResult::from_result("batch", "read_many_empty_batch", Err("got 1 entry".into())),
        ]);
        assert_eq!((report.passed, report.failed, report.total), (1, 1, 2));

        let text = report.to_string();
        assert!(text.starts_with("provider conformance: 1 of 2 checks passed"));
        assert!(text.contains("batch/read_many_empty_batch: got 1 entry"));
        assert!(!text.contains("read_one_returns_seeded_entry"));
    }
}
