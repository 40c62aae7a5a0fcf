use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::strict_de::StrictDeserializer;

/// A bind failure together with the JSON path where it happened.
pub type PathError = serde_path_to_error::Error<serde_json::Error>;

/// Which reader a candidate is bound with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reader {
    /// Unknown keys at any depth fail the bind.
    Strict,
    /// Unknown keys are skipped.
    Lenient,
}

/// Deserialize with JSON-path context in error messages.
pub fn from_value_with_path<T: DeserializeOwned>(
    value: &Value,
    reader: Reader,
) -> Result<T, PathError> {
    match reader {
        Reader::Strict => serde_path_to_error::deserialize(StrictDeserializer::new(value)),
        Reader::Lenient => serde_path_to_error::deserialize(value),
    }
}

pub fn describe(err: &PathError) -> String {
    let path = err.path().to_string();
    format!("at JSON path {path} → {}", err.inner())
}
