//! Tri-state optional for request bodies.
//!
//! PATCH-style endpoints distinguish "leave this field alone" from "clear
//! this field". `Option<T>` cannot: both `None`-and-skip and `None`-as-null
//! collapse into one state. [`NullableOptional`] keeps them apart:
//!
//! ```
//! use json_union::NullableOptional;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct UpdateIssue {
//!     #[serde(default, skip_serializing_if = "NullableOptional::is_not_set")]
//!     milestone: NullableOptional<u64>,
//! }
//!
//! let keep = UpdateIssue { milestone: NullableOptional::not_set() };
//! let clear = UpdateIssue { milestone: NullableOptional::of_null() };
//! let set = UpdateIssue { milestone: NullableOptional::of(3)? };
//! assert_eq!(serde_json::to_string(&keep).unwrap(), "{}");
//! assert_eq!(serde_json::to_string(&clear).unwrap(), r#"{"milestone":null}"#);
//! assert_eq!(serde_json::to_string(&set).unwrap(), r#"{"milestone":3}"#);
//! # Ok::<(), json_union::Error>(())
//! ```
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    NotSet,
    Null,
    Value,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::NotSet => "NOT_SET",
            State::Null => "NULL",
            State::Value => "VALUE",
        })
    }
}

/// Absent, explicit null, or a payload that is not itself null.
///
/// The payload state can only be entered through the checked constructors,
/// so a `NullableOptional` never holds a value that would encode as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NullableOptional<T>(Repr<T>);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Repr<T> {
    /// Omitted from the payload.
    NotSet,
    /// Sent as an explicit JSON `null`.
    Null,
    Value(T),
}

impl<T> NullableOptional<T> {
    pub fn not_set() -> Self {
        NullableOptional(Repr::NotSet)
    }

    pub fn of_null() -> Self {
        NullableOptional(Repr::Null)
    }

    pub fn is_not_set(&self) -> bool {
        matches!(self.0, Repr::NotSet)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.0, Repr::Null)
    }

    pub fn is_value(&self) -> bool {
        matches!(self.0, Repr::Value(_))
    }

    pub fn state(&self) -> State {
        match self.0 {
            Repr::NotSet => State::NotSet,
            Repr::Null => State::Null,
            Repr::Value(_) => State::Value,
        }
    }

    pub fn get_value(&self) -> Result<&T> {
        match &self.0 {
            Repr::Value(value) => Ok(value),
            _ => Err(Error::NoValue {
                state: self.state(),
            }),
        }
    }

    pub fn or_else<'a>(&'a self, default: &'a T) -> &'a T {
        self.or_else_null().unwrap_or(default)
    }

    /// The payload, or `None` for both absent and null.
    pub fn or_else_null(&self) -> Option<&T> {
        match &self.0 {
            Repr::Value(value) => Some(value),
            _ => None,
        }
    }

    pub fn if_value(&self, consumer: impl FnOnce(&T)) {
        if let Repr::Value(value) = &self.0 {
            consumer(value);
        }
    }

    pub fn as_ref(&self) -> NullableOptional<&T> {
        NullableOptional(match &self.0 {
            Repr::NotSet => Repr::NotSet,
            Repr::Null => Repr::Null,
            Repr::Value(value) => Repr::Value(value),
        })
    }

    /// For payloads already known not to be null.
    fn from_present(value: Option<T>) -> Self {
        NullableOptional(value.map_or(Repr::Null, Repr::Value))
    }
}

impl<T: Serialize> NullableOptional<T> {
    /// A payload. One that serializes to `null` (`Value::Null`, `None`, `()`)
    /// is [`Error::NullPayload`]: an explicit null is spelled
    /// [`of_null`](Self::of_null).
    pub fn of(value: T) -> Result<Self> {
        match serde_json::to_value(&value) {
            Ok(Value::Null) => Err(Error::NullPayload),
            Ok(_) => Ok(NullableOptional(Repr::Value(value))),
            Err(source) => Err(Error::Encode {
                type_name: std::any::type_name::<T>(),
                source,
            }),
        }
    }

    /// `None`, or a payload that serializes to `null`, becomes an explicit
    /// null.
    pub fn of_nullable(value: Option<T>) -> Self {
        match value.map(Self::of) {
            Some(Ok(present)) => present,
            _ => NullableOptional(Repr::Null),
        }
    }

    /// Applies `mapper` to a payload; null and absent are preserved.
    pub fn map<U: Serialize>(self, mapper: impl FnOnce(T) -> U) -> Result<NullableOptional<U>> {
        match self.0 {
            Repr::NotSet => Ok(NullableOptional(Repr::NotSet)),
            Repr::Null => Ok(NullableOptional(Repr::Null)),
            Repr::Value(value) => NullableOptional::of(mapper(value)),
        }
    }
}

impl<T> Default for NullableOptional<T> {
    fn default() -> Self {
        NullableOptional::not_set()
    }
}

impl<T: Serialize> From<Option<T>> for NullableOptional<T> {
    fn from(value: Option<T>) -> Self {
        NullableOptional::of_nullable(value)
    }
}

impl<T: fmt::Display> fmt::Display for NullableOptional<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::NotSet => f.write_str("NullableOptional.notSet()"),
            Repr::Null => f.write_str("NullableOptional.ofNull()"),
            Repr::Value(value) => write!(f, "NullableOptional[{value}]"),
        }
    }
}

impl<T: Serialize> Serialize for NullableOptional<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match &self.0 {
            Repr::Value(value) => value.serialize(serializer),
            // a NotSet that reaches the serializer was not skipped by its container
            Repr::Null | Repr::NotSet => serializer.serialize_none(),
        }
    }
}

// `null` is taken by `Option`, so a decoded payload is never null itself.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for NullableOptional<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(NullableOptional::from_present)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Patch {
        #[serde(default, skip_serializing_if = "NullableOptional::is_not_set")]
        field: NullableOptional<String>,
    }

    fn encoded(field: NullableOptional<String>) -> String {
        serde_json::to_string(&Patch { field }).unwrap()
    }

    #[test]
    fn three_states_serialize_distinctly() {
        assert_eq!(encoded(NullableOptional::not_set()), "{}");
        assert_eq!(encoded(NullableOptional::of_null()), r#"{"field":null}"#);
        let set = NullableOptional::of("x".to_string()).unwrap();
        assert_eq!(encoded(set), r#"{"field":"x"}"#);
    }

    #[test]
    fn three_states_deserialize_distinctly() {
        let absent: Patch = serde_json::from_value(json!({})).unwrap();
        assert!(absent.field.is_not_set());
        let null: Patch = serde_json::from_value(json!({"field": null})).unwrap();
        assert!(null.field.is_null());
        let value: Patch = serde_json::from_value(json!({"field": "x"})).unwrap();
        assert_eq!(value.field.get_value().unwrap(), "x");
    }

    #[test]
    fn unskipped_not_set_writes_null() {
        let bare: NullableOptional<i32> = NullableOptional::not_set();
        assert_eq!(serde_json::to_value(bare).unwrap(), Value::Null);
    }

    #[test]
    fn get_value_reports_the_state() {
        let err = NullableOptional::<i32>::not_set().get_value().unwrap_err();
        assert!(matches!(err, Error::NoValue { state: State::NotSet }));
        assert_eq!(err.to_string(), "no value present, state is NOT_SET");
        let err = NullableOptional::<i32>::of_null().get_value().unwrap_err();
        assert!(matches!(err, Error::NoValue { state: State::Null }));
    }

    #[test]
    fn of_refuses_payloads_that_encode_as_null() {
        assert!(matches!(NullableOptional::of(Value::Null), Err(Error::NullPayload)));
        assert!(matches!(NullableOptional::<Option<u8>>::of(None), Err(Error::NullPayload)));
        assert!(matches!(NullableOptional::of(()), Err(Error::NullPayload)));
        let zero = NullableOptional::of(json!(0)).unwrap();
        assert_eq!(zero.get_value().unwrap(), &json!(0));
        assert!(NullableOptional::of(Some(0u8)).unwrap().is_value());
    }

    #[test]
    fn null_payloads_stay_null_across_a_round_trip() {
        let from_none: NullableOptional<Value> = NullableOptional::of_nullable(Some(Value::Null));
        assert!(from_none.is_null());
        let text = serde_json::to_string(&from_none).unwrap();
        let back: NullableOptional<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, from_none);

        let mapped = NullableOptional::of(1).unwrap().map(|_| Value::Null);
        assert!(matches!(mapped, Err(Error::NullPayload)));
    }

    #[test]
    fn accessors_and_combinators() {
        let three = NullableOptional::of(3).unwrap();
        assert_eq!(three.or_else(&0), &3);
        assert_eq!(NullableOptional::of_null().or_else(&0), &0);
        assert_eq!(NullableOptional::<i32>::not_set().or_else_null(), None);
        let six = three.clone().map(|n| n * 2).unwrap();
        assert_eq!(six.get_value().unwrap(), &6);
        let still_null = NullableOptional::<i32>::of_null().map(|n| n * 2).unwrap();
        assert!(still_null.is_null());
        assert_eq!(three.as_ref().get_value().unwrap(), &&3);

        let mut seen = None;
        three.if_value(|n| seen = Some(*n));
        assert_eq!(seen, Some(3));
        NullableOptional::<i32>::not_set().if_value(|_| panic!("no payload"));

        assert_eq!(NullableOptional::from(Some(1)), three.map(|_| 1).unwrap());
        assert!(NullableOptional::<i32>::from(None).is_null());
        assert_eq!(NullableOptional::<i32>::default().state(), State::NotSet);
    }

    #[test]
    fn display_matches_state() {
        assert_eq!(NullableOptional::<i32>::not_set().to_string(), "NullableOptional.notSet()");
        assert_eq!(NullableOptional::<i32>::of_null().to_string(), "NullableOptional.ofNull()");
        let a = NullableOptional::of("a").unwrap();
        assert_eq!(a.to_string(), "NullableOptional[a]");
    }
}
