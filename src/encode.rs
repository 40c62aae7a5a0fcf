//! Union encode engine.
use indexmap::IndexMap;
use log::trace;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::field::GettableField;
use crate::mode::Mode;

pub struct UnionEncoder<T> {
    type_name: &'static str,
    mode: Mode,
    fields: Vec<GettableField<T>>,
}

impl<T: 'static> UnionEncoder<T> {
    pub fn new(mode: Mode, fields: Vec<GettableField<T>>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            mode,
            fields,
        }
    }

    /// `oneOf` and `anyOf` emit the first populated branch as-is, or `null`
    /// when none is set. `allOf` merges every populated object branch into
    /// one object, later branches overwriting earlier keys in place.
    pub fn to_value(&self, source: &T) -> Result<Value> {
        match self.mode {
            Mode::OneOf | Mode::AnyOf => self.first_populated(source),
            Mode::AllOf => self.merge_objects(source),
        }
    }

    /// Type names of the branches currently holding a value.
    pub fn populated_branches(&self, source: &T) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|field| field.is_set(source))
            .map(GettableField::type_name)
            .collect()
    }

    fn first_populated(&self, source: &T) -> Result<Value> {
        for field in &self.fields {
            if let Some(value) = field.read(source) {
                return value.map_err(|source| encode_error(field, source));
            }
        }
        trace!("no branch of {} is set, writing null", self.type_name);
        Ok(Value::Null)
    }

    fn merge_objects(&self, source: &T) -> Result<Value> {
        let mut merged: IndexMap<String, Value> = IndexMap::new();
        for field in &self.fields {
            let Some(value) = field.read(source) else {
                continue;
            };
            match value.map_err(|source| encode_error(field, source))? {
                Value::Object(object) => {
                    // `insert` keeps the original position of a repeated key
                    for (key, value) in object {
                        merged.insert(key, value);
                    }
                }
                other => trace!(
                    "allOf branch {} of {} is not an object ({other}), skipped",
                    field.type_name(),
                    self.type_name
                ),
            }
        }
        Ok(Value::Object(merged.into_iter().collect()))
    }
}

fn encode_error<T>(field: &GettableField<T>, source: serde_json::Error) -> Error {
    Error::Encode {
        type_name: field.type_name(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser;
    use serde::{Deserialize, Serialize, Serializer};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Base {
        a: i64,
        b: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Extension {
        b: i64,
        c: i64,
    }

    #[derive(Default)]
    struct Composite {
        base: Option<Base>,
        extension: Option<Extension>,
        note: Option<String>,
    }

    fn encoder(mode: Mode) -> UnionEncoder<Composite> {
        UnionEncoder::new(
            mode,
            vec![
                GettableField::new(|c: &Composite| c.base.as_ref()),
                GettableField::new(|c: &Composite| c.extension.as_ref()),
                GettableField::new(|c: &Composite| c.note.as_ref()),
            ],
        )
    }

    fn both() -> Composite {
        Composite {
            base: Some(Base { a: 1, b: 2 }),
            extension: Some(Extension { b: 3, c: 4 }),
            note: None,
        }
    }

    #[test]
    fn all_of_merges_with_later_keys_winning_in_place() {
        let value = encoder(Mode::AllOf).to_value(&both()).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"a":1,"b":3,"c":4}"#);
    }

    #[test]
    fn all_of_skips_scalars_and_empty_is_an_object() {
        let mut composite = both();
        composite.note = Some("ignored".into());
        let value = encoder(Mode::AllOf).to_value(&composite).unwrap();
        assert_eq!(value, json!({"a": 1, "b": 3, "c": 4}));

        let empty = encoder(Mode::AllOf).to_value(&Composite::default()).unwrap();
        assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");
    }

    #[test]
    fn one_of_and_any_of_write_the_first_populated_branch() {
        let mut composite = Composite::default();
        composite.extension = Some(Extension { b: 3, c: 4 });
        composite.note = Some("later".into());
        for mode in [Mode::OneOf, Mode::AnyOf] {
            assert_eq!(encoder(mode).to_value(&composite).unwrap(), json!({"b": 3, "c": 4}));
        }
        assert_eq!(encoder(Mode::OneOf).to_value(&Composite::default()).unwrap(), Value::Null);
    }

    #[test]
    fn populated_branches_lists_type_names() {
        let names = encoder(Mode::AnyOf).populated_branches(&both());
        assert_eq!(names.len(), 2);
        assert!(names[0].ends_with("Base") && names[1].ends_with("Extension"));
        assert!(encoder(Mode::AnyOf).populated_branches(&Composite::default()).is_empty());
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(ser::Error::custom("refusing to serialize"))
        }
    }

    #[test]
    fn branch_encode_failure_names_the_branch() {
        let encoder = UnionEncoder::new(
            Mode::OneOf,
            vec![GettableField::new(|_: &Composite| Some(&Unencodable))],
        );
        let err = encoder.to_value(&Composite::default()).unwrap_err();
        match err {
            Error::Encode { type_name, .. } => assert!(type_name.ends_with("Unencodable")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
