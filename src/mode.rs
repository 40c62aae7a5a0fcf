//! Which JSON-Schema combinator a union type follows.
use std::fmt;

/// Fixed per union type; selects both the decode and the encode algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// `anyOf`: any subset of branches may hold a value at once.
    AnyOf,
    /// `allOf`: every branch overlays the same JSON object.
    AllOf,
    /// `oneOf`: exactly one branch holds the value.
    OneOf,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::AnyOf => "anyOf",
            Mode::AllOf => "allOf",
            Mode::OneOf => "oneOf",
        }
    }

    /// Whether decoding stops at the first branch that binds.
    pub fn stops_at_first_match(self) -> bool {
        matches!(self, Mode::OneOf)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much a union tolerates input it does not fully recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Policy {
    /// Unknown keys anywhere in a candidate fail that candidate.
    #[default]
    Strict,
    /// Hand-authored input: `oneOf` objects are scored by recognized keys
    /// and retried with unknown keys filtered out or ignored.
    Lenient,
}
