use std::collections::HashSet;

use cachexp_core::Provider;

use super::{decode, seeded, TestResult};

pub(super) fn run_batch_tests<P, F>(build: &F) -> Vec<TestResult>
where
    P: Provider,
    P::Context: Default,
    F: Fn() -> P,
{
    vec![
        TestResult::from_result(
            "batch",
            "read_many_returns_every_seeded_key",
            read_many_returns_every_seeded_key(build),
        ),
        TestResult::from_result(
            "batch",
            "read_many_omits_unknown_keys",
            read_many_omits_unknown_keys(build),
        ),
        TestResult::from_result(
            "batch",
            "read_many_indexes_by_normalized_key",
            read_many_indexes_by_normalized_key(build),
        ),
        TestResult::from_result(
            "batch",
            "read_many_empty_batch",
            read_many_empty_batch(build),
        ),
    ]
}

fn keys(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|k| k.to_string()).collect()
}

fn read_many_returns_every_seeded_key<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    let requested = keys(&["conformance/user/1", "conformance/user/2", "conformance/post/1"]);
    let entries = p
        .read_many(&requested, &P::Context::default())
        .map_err(|e| format!("read_many: {e}"))?;
    for key in &requested {
        let bytes = entries
            .get(&p.normalize(key))
            .ok_or_else(|| format!("missing '{key}' in batch result"))?;
        if decode(&p, bytes)? != seeded(key)? {
            return Err(format!("payload for '{key}' differs from the seed"));
        }
    }
    Ok(())
}

/// Unknown keys are simply absent; they do not fail the batch.
fn read_many_omits_unknown_keys<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    let requested = keys(&["conformance/user/1", "conformance/user/404"]);
    let entries = p
        .read_many(&requested, &P::Context::default())
        .map_err(|e| format!("read_many: {e}"))?;
    if entries.contains_key(&p.normalize("conformance/user/404")) {
        return Err("unknown key present in batch result".to_string());
    }
    if entries.len() != 1 {
        return Err(format!("expected 1 entry, got {}", entries.len()));
    }
    Ok(())
}

fn read_many_indexes_by_normalized_key<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    let requested = keys(&["conformance/user/1", "conformance/post/2"]);
    let expected: HashSet<String> = requested.iter().map(|k| p.normalize(k)).collect();
    let entries = p
        .read_many(&requested, &P::Context::default())
        .map_err(|e| format!("read_many: {e}"))?;
    for key in entries.keys() {
        if !expected.contains(key) {
            return Err(format!("result key '{key}' is not a normalized request key"));
        }
    }
    Ok(())
}

fn read_many_empty_batch<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    let entries = p
        .read_many(&[], &P::Context::default())
        .map_err(|e| format!("read_many: {e}"))?;
    if !entries.is_empty() {
        return Err(format!("expected no entries, got {}", entries.len()));
    }
    Ok(())
}
