use std::fmt;

use serde_json::{Map, Value};

/// The JSON shape a raw value was interpreted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Object,
    Array,
    String,
    Number,
    Boolean,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShapeKind::Object => "object",
            ShapeKind::Array => "array",
            ShapeKind::String => "string",
            ShapeKind::Number => "number",
            ShapeKind::Boolean => "boolean",
        })
    }
}

/// A raw value together with the shape it matched.
#[derive(Debug, Clone, Copy)]
pub struct Shape<'a> {
    pub kind: ShapeKind,
    pub value: &'a Value,
}

impl<'a> Shape<'a> {
    pub fn as_object(&self) -> Option<&'a Map<String, Value>> {
        self.value.as_object()
    }
}

pub enum Probe<'a> {
    Matched(Shape<'a>),
    NoMatch,
}

type ProbeFn = for<'a> fn(&'a Value) -> Probe<'a>;

/// Structured shapes before scalars, strings before numbers.
const PROBES: [ProbeFn; 5] = [object, array, string, number, boolean];

/// First shape in probe order that `raw` has, or `None` (e.g. for `null`).
pub fn probe(raw: &Value) -> Option<Shape<'_>> {
    PROBES.iter().find_map(|attempt| match attempt(raw) {
        Probe::Matched(shape) => Some(shape),
        Probe::NoMatch => None,
    })
}

fn matched(kind: ShapeKind, value: &Value) -> Probe<'_> {
    Probe::Matched(Shape { kind, value })
}

fn object(raw: &Value) -> Probe<'_> {
    match raw {
        Value::Object(_) => matched(ShapeKind::Object, raw),
        _ => Probe::NoMatch,
    }
}

fn array(raw: &Value) -> Probe<'_> {
    match raw {
        Value::Array(_) => matched(ShapeKind::Array, raw),
        _ => Probe::NoMatch,
    }
}

fn string(raw: &Value) -> Probe<'_> {
    match raw {
        Value::String(_) => matched(ShapeKind::String, raw),
        _ => Probe::NoMatch,
    }
}

fn number(raw: &Value) -> Probe<'_> {
    match raw {
        Value::Number(_) => matched(ShapeKind::Number, raw),
        _ => Probe::NoMatch,
    }
}

fn boolean(raw: &Value) -> Probe<'_> {
    match raw {
        Value::Bool(_) => matched(ShapeKind::Boolean, raw),
        _ => Probe::NoMatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kind(v: &Value) -> Option<ShapeKind> {
        probe(v).map(|shape| shape.kind)
    }

    #[test]
    fn each_json_kind_maps_to_one_shape() {
        assert_eq!(kind(&json!({"a": 1})), Some(ShapeKind::Object));
        assert_eq!(kind(&json!([1, 2])), Some(ShapeKind::Array));
        assert_eq!(kind(&json!("x")), Some(ShapeKind::String));
        assert_eq!(kind(&json!(1.5)), Some(ShapeKind::Number));
        assert_eq!(kind(&json!(false)), Some(ShapeKind::Boolean));
        assert_eq!(kind(&json!(null)), None);
    }

    #[test]
    fn matched_shape_borrows_the_input() {
        let v = json!({"k": "v"});
        let shape = probe(&v).unwrap();
        assert!(std::ptr::eq(shape.value, &v));
        assert_eq!(shape.as_object().map(|m| m.len()), Some(1));
        assert_eq!(ShapeKind::Number.to_string(), "number");
    }
}
