//! Unions that recur across the whole API surface.
use std::fmt;

use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::field::{GettableField, SettableField};
use crate::mode::Mode;
use crate::union::Union;
use crate::union_serde;

/// A value the API sends either as a JSON string or as an integer.
///
/// `42` decodes to `integer_value`, `"42"` to `string_value`. Any other
/// scalar (`1.5`, `true`, integers beyond `i64`) is kept as its JSON text in
/// `string_value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StringOrInteger {
    pub string_value: Option<String>,
    pub integer_value: Option<i64>,
}

impl StringOrInteger {
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            string_value: Some(value.into()),
            integer_value: None,
        }
    }

    pub fn integer(value: i64) -> Self {
        Self {
            string_value: None,
            integer_value: Some(value),
        }
    }
}

/// A non-string JSON scalar, read as its JSON text.
struct ScalarText(String);

impl Serialize for ScalarText {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ScalarTextVisitor)
    }
}

struct ScalarTextVisitor;

impl Visitor<'_> for ScalarTextVisitor {
    type Value = ScalarText;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number or a boolean")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<ScalarText, E> {
        Ok(ScalarText(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<ScalarText, E> {
        Ok(ScalarText(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<ScalarText, E> {
        Ok(ScalarText(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<ScalarText, E> {
        // serde_json's float text, so `1e300` stays short
        let text = serde_json::Number::from_f64(v).map_or_else(|| v.to_string(), |n| n.to_string());
        Ok(ScalarText(text))
    }
}

impl Union for StringOrInteger {
    const MODE: Mode = Mode::OneOf;

    fn settable_fields() -> Vec<SettableField<Self>> {
        vec![
            SettableField::new(|s: &mut Self, v: i64| s.integer_value = Some(v)),
            SettableField::new(|s: &mut Self, v: String| s.string_value = Some(v)),
            SettableField::new(|s: &mut Self, v: ScalarText| s.string_value = Some(v.0)),
        ]
    }

    fn gettable_fields() -> Vec<GettableField<Self>> {
        vec![
            GettableField::new(|s: &Self| s.integer_value.as_ref()),
            GettableField::new(|s: &Self| s.string_value.as_ref()),
        ]
    }
}

union_serde!(StringOrInteger);

/// One `T`, or a list of them. The list branch is tried first, so `[]` is an
/// empty plural rather than a failed singular.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SingularOrPlural<T> {
    pub singular: Option<T>,
    pub plural: Option<Vec<T>>,
}

impl<T> SingularOrPlural<T> {
    pub fn singular(value: T) -> Self {
        Self {
            singular: Some(value),
            plural: None,
        }
    }

    pub fn plural(values: Vec<T>) -> Self {
        Self {
            singular: None,
            plural: Some(values),
        }
    }

    /// Every value held, whichever branch holds them.
    pub fn as_slice(&self) -> &[T] {
        match (&self.plural, &self.singular) {
            (Some(values), _) => values,
            (None, Some(value)) => std::slice::from_ref(value),
            (None, None) => &[],
        }
    }
}

impl<T> Default for SingularOrPlural<T> {
    fn default() -> Self {
        Self {
            singular: None,
            plural: None,
        }
    }
}

impl<T: Serialize + DeserializeOwned + 'static> Union for SingularOrPlural<T> {
    const MODE: Mode = Mode::OneOf;

    fn settable_fields() -> Vec<SettableField<Self>> {
        vec![
            SettableField::new(|s: &mut Self, v: Vec<T>| s.plural = Some(v)),
            SettableField::new(|s: &mut Self, v: T| s.singular = Some(v)),
        ]
    }

    fn gettable_fields() -> Vec<GettableField<Self>> {
        vec![
            GettableField::new(|s: &Self| s.plural.as_ref()),
            GettableField::new(|s: &Self| s.singular.as_ref()),
        ]
    }
}

union_serde!(SingularOrPlural<T>);

/// An object schema without properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmptyObject {}
