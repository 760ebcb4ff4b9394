use cachexp_core::Provider;

use super::{decode, seeded, TestResult};

pub(super) fn run_read_tests<P, F>(build: &F) -> Vec<TestResult>
where
    P: Provider,
    P::Context: Default,
    F: Fn() -> P,
{
    vec![
        TestResult::from_result(
            "read",
            "read_one_returns_seeded_entry",
            read_one_returns_seeded_entry(build),
        ),
        TestResult::from_result(
            "read",
            "read_one_unknown_key_fails",
            read_one_unknown_key_fails(build),
        ),
        TestResult::from_result(
            "read",
            "read_one_accepts_normalized_key",
            read_one_accepts_normalized_key(build),
        ),
        TestResult::from_result(
            "read",
            "normalize_is_idempotent",
            normalize_is_idempotent(build),
        ),
    ]
}

fn read_one_returns_seeded_entry<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    let ctx = P::Context::default();
    let bytes = p
        .read_one("conformance/user/1", &ctx)
        .map_err(|e| format!("read_one: {e}"))?;
    let got = decode(&p, &bytes)?;
    let want = seeded("conformance/user/1")?;
    if got != want {
        return Err(format!("expected {want}, got {got}"));
    }
    Ok(())
}

fn read_one_unknown_key_fails<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    match p.read_one("conformance/user/404", &P::Context::default()) {
        Err(_) => Ok(()),
        Ok(bytes) => Err(format!(
            "expected an error, got {} bytes",
            bytes.len()
        )),
    }
}

/// Reading by the canonical form of a key finds the same entry.
fn read_one_accepts_normalized_key<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    let ctx = P::Context::default();
    let key = "conformance/user/2";
    let raw = p.read_one(key, &ctx).map_err(|e| format!("read_one: {e}"))?;
    let canonical = p
        .read_one(&p.normalize(key), &ctx)
        .map_err(|e| format!("read_one normalized: {e}"))?;
    if decode(&p, &raw)? != decode(&p, &canonical)? {
        return Err("raw and normalized reads differ".to_string());
    }
    Ok(())
}

fn normalize_is_idempotent<P: Provider>(build: &impl Fn() -> P) -> Result<(), String> {
    let p = build();
    for key in ["conformance/user/1", " Conformance//User/1/ ", "a", ""] {
        let once = p.normalize(key);
        let twice = p.normalize(&once);
        if once != twice {
            return Err(format!("normalize({key:?}) = {once:?}, again = {twice:?}"));
        }
    }
    Ok(())
}
