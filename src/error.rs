use thiserror::Error;

use crate::nullable::State;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The input is not JSON at all. Never swallowed by the union engine.
    #[error("malformed JSON input: {0}")]
    Parse(#[source] serde_json::Error),

    /// A branch payload could not be turned into JSON.
    #[error("failed to encode {type_name}: {source}")]
    Encode {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("value cannot be null, use NullableOptional::of_null() for an explicit null")]
    NullPayload,

    #[error("no value present, state is {state}")]
    NoValue { state: State },
}

impl Error {
    /// Tokenizer and I/O failures are hard errors; data mismatches are not.
    pub(crate) fn is_hard(err: &serde_json::Error) -> bool {
        use serde_json::error::Category;
        matches!(err.classify(), Category::Io | Category::Syntax | Category::Eof)
    }
}
