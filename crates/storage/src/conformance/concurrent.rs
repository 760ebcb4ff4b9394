use std::thread;

use cachexp_core::{expand, Provider};
use serde_json::{json, Value};

use super::{TestResult, EXPAND_KEY};

/// Number of threads sharing one provider in each test.
const N: usize = 8;

pub(super) fn run_concurrent_tests<P, F>(build: &F) -> Vec<TestResult>
where
    P: Provider,
    P::Context: Default + Sync,
    F: Fn() -> P,
{
    vec![
        TestResult::from_result(
            "concurrent",
            "parallel_expansions_agree",
            parallel_expansions_agree(build),
        ),
        TestResult::from_result(
            "concurrent",
            "parallel_batches_agree",
            parallel_batches_agree(build),
        ),
    ]
}

/// N threads expand the same document through one provider and all get
/// the same tree.
fn parallel_expansions_agree<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default + Sync,
{
    let p = build();
    let ctx = P::Context::default();
    let input = p
        .serialize(&json!({
            "feed": {EXPAND_KEY: ["conformance/post/1", "conformance/post/2"]}
        }))
        .map_err(|e| format!("serialize: {e}"))?;

    let outputs: Vec<Result<Value, String>> = thread::scope(|s| {
        let handles: Vec<_> = (0..N)
            .map(|_| {
                s.spawn(|| {
                    let out = expand(&p, &input, &ctx).map_err(|e| e.to_string())?;
                    p.deserialize(&out.bytes).map_err(|e| e.to_string())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| Err("thread panicked".to_string())))
            .collect()
    });

    let mut first: Option<Value> = None;
    for (i, output) in outputs.into_iter().enumerate() {
        let value = output.map_err(|e| format!("thread {i}: {e}"))?;
        match &first {
            None => first = Some(value),
            Some(f) if *f != value => {
                return Err(format!("thread {i} produced {value}, thread 0 produced {f}"))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn parallel_batches_agree<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default + Sync,
{
    let p = build();
    let ctx = P::Context::default();
    let keys: Vec<String> = ["conformance/user/1", "conformance/user/2", "conformance/user/404"]
        .iter()
        .map(|k| k.to_string())
        .collect();

    let sizes: Vec<Result<usize, String>> = thread::scope(|s| {
        let handles: Vec<_> = (0..N)
            .map(|_| {
                s.spawn(|| {
                    p.read_many(&keys, &ctx)
                        .map(|entries| entries.len())
                        .map_err(|e| e.to_string())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| Err("thread panicked".to_string())))
            .collect()
    });

    for (i, size) in sizes.into_iter().enumerate() {
        let size = size.map_err(|e| format!("thread {i}: {e}"))?;
        if size != 2 {
            return Err(format!("thread {i}: expected 2 entries, got {size}"));
        }
    }
    Ok(())
}
