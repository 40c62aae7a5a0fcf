//! Replays API-shaped fixtures through the built-in unions and checks that
//! re-encoding is stable.
use json_union::{NullableOptional, SingularOrPlural, StringOrInteger};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkflowRun {
    id: StringOrInteger,
    #[serde(rename = "runs-on")]
    runs_on: SingularOrPlural<String>,
    #[serde(default, skip_serializing_if = "NullableOptional::is_not_set")]
    milestone: NullableOptional<u64>,
}

const FIXTURES: &[&str] = &[
    r#"{"id": 42, "runs-on": "ubuntu-latest"}"#,
    r#"{"id": "42", "runs-on": ["self-hosted", "linux"], "milestone": null}"#,
    r#"{"id": 7, "runs-on": [], "milestone": 3}"#,
    r#"{"id": 1.5, "runs-on": 12}"#,
];

fn main() {
    let mut failures = 0;
    for (index, fixture) in FIXTURES.iter().enumerate() {
        match check(fixture) {
            Ok(encoded) => println!("fixture {index}: ok {encoded}"),
            Err(message) => {
                failures += 1;
                eprintln!("fixture {index}: {message}");
            }
        }
    }
    if failures > 0 {
        eprintln!("{failures} of {} fixtures failed", FIXTURES.len());
        std::process::exit(1);
    }
}

fn check(fixture: &str) -> Result<String, String> {
    let de = &mut serde_json::Deserializer::from_str(fixture);
    let once: WorkflowRun = serde_path_to_error::deserialize(de)
        .map_err(|err| format!("decode failed at {}: {}", err.path(), err.inner()))?;
    let encoded = serde_json::to_string(&once).map_err(|err| format!("encode failed: {err}"))?;
    let twice: WorkflowRun =
        serde_json::from_str(&encoded).map_err(|err| format!("re-decode failed: {err}"))?;
    if once != twice {
        return Err(format!("unstable round trip: {once:?} became {twice:?}"));
    }
    Ok(encoded)
}
