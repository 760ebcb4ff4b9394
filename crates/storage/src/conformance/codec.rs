use cachexp_core::{Provider, ProviderError};
use serde_json::json;

use super::{decode, TestResult};

pub(super) fn run_codec_tests<P, F>(build: &F) -> Vec<TestResult>
where
    P: Provider,
    F: Fn() -> P,
{
    vec![
        TestResult::from_result(
            "codec",
            "round_trip_preserves_tree",
            round_trip_preserves_tree(build),
        ),
        TestResult::from_result(
            "codec",
            "garbage_is_a_decode_error",
            garbage_is_a_decode_error(build),
        ),
    ]
}

/// Every value kind survives serialize → deserialize.
fn round_trip_preserves_tree<P: Provider>(build: &impl Fn() -> P) -> Result<(), String> {
    let p = build();
    let value = json!({
        "null": null,
        "bool": true,
        "int": -7,
        "float": 1.5,
        "string": "héllo",
        "list": [1, "two", {"three": 3}],
        "map": {"nested": {"deep": []}}
    });
    let bytes = p.serialize(&value).map_err(|e| format!("serialize: {e}"))?;
    let back = decode(&p, &bytes)?;
    if back != value {
        return Err(format!("round trip changed the tree: {back}"));
    }
    Ok(())
}

/// Undecodable bytes are reported as `ProviderError::Decode`.
fn garbage_is_a_decode_error<P: Provider>(build: &impl Fn() -> P) -> Result<(), String> {
    let p = build();
    match p.deserialize(b"{\"unterminated\": [") {
        Err(ProviderError::Decode(_)) => Ok(()),
        other => Err(format!("expected Decode error, got {:?}", other)),
    }
}
