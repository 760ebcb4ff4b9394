use cachexp_core::{expand, Provider};
use serde_json::{json, Value};

use super::{TestResult, EXPAND_KEY, PLACEHOLDER_KEY};

pub(super) fn run_expand_tests<P, F>(build: &F) -> Vec<TestResult>
where
    P: Provider,
    P::Context: Default,
    F: Fn() -> P,
{
    vec![
        TestResult::from_result(
            "expand",
            "named_reference_becomes_sibling",
            named_reference_becomes_sibling(build),
        ),
        TestResult::from_result(
            "expand",
            "list_reference_keeps_order",
            list_reference_keeps_order(build),
        ),
        TestResult::from_result(
            "expand",
            "list_next_to_fields_uses_placeholder",
            list_next_to_fields_uses_placeholder(build),
        ),
        TestResult::from_result(
            "expand",
            "missing_reference_is_dropped",
            missing_reference_is_dropped(build),
        ),
        TestResult::from_result(
            "expand",
            "depth_budget_is_respected",
            depth_budget_is_respected(build),
        ),
    ]
}

fn run<P>(p: &P, input: Value) -> Result<Value, String>
where
    P: Provider,
    P::Context: Default,
{
    let bytes = p.serialize(&input).map_err(|e| format!("serialize: {e}"))?;
    let out = expand(p, &bytes, &P::Context::default()).map_err(|e| format!("expand: {e}"))?;
    if !out.errors.is_empty() {
        return Err(format!("unexpected errors: {}", out.errors));
    }
    p.deserialize(&out.bytes)
        .map_err(|e| format!("deserialize output: {e}"))
}

fn expect(got: Value, want: Value) -> Result<(), String> {
    if got != want {
        return Err(format!("expected {want}, got {got}"));
    }
    Ok(())
}

fn named_reference_becomes_sibling<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    let got = run(&p, json!({"id": 1, EXPAND_KEY: {"author": "conformance/user/1"}}))?;
    expect(got, json!({"id": 1, "author": {"id": 1, "name": "Ana"}}))
}

fn list_reference_keeps_order<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    let got = run(
        &p,
        json!({EXPAND_KEY: ["conformance/user/2", "conformance/user/1"]}),
    )?;
    expect(
        got,
        json!([{"id": 2, "name": "Budi"}, {"id": 1, "name": "Ana"}]),
    )
}

fn list_next_to_fields_uses_placeholder<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    let got = run(
        &p,
        json!({"page": 1, EXPAND_KEY: ["conformance/post/1"]}),
    )?;
    expect(
        got,
        json!({
            "page": 1,
            PLACEHOLDER_KEY: [
                {"id": 10, "title": "Hello", "author": {"id": 1, "name": "Ana"}}
            ]
        }),
    )
}

fn missing_reference_is_dropped<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    let got = run(
        &p,
        json!({
            "id": 1,
            EXPAND_KEY: {"author": "conformance/user/404", "editor": "conformance/user/2"}
        }),
    )?;
    expect(got, json!({"id": 1, "editor": {"id": 2, "name": "Budi"}}))
}

/// With a budget of two, the post reached through the wrapper is inlined
/// but its own references are dropped.
fn depth_budget_is_respected<P>(build: &impl Fn() -> P) -> Result<(), String>
where
    P: Provider,
    P::Context: Default,
{
    let p = build();
    let got = run(
        &p,
        json!({EXPAND_KEY: {"wrapper": "conformance/wrap/1"}}),
    )?;
    expect(
        got,
        json!({
            "wrapper": {
                "kind": "wrap",
                "post": {"id": 11, "title": "Again"}
            }
        }),
    )
}
