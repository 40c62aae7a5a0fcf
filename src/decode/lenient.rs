//! Best-fit `oneOf` binding for object input.
//!
//! The strict pass rejects any candidate that does not recognize every key,
//! which is too brittle when the server adds properties. Candidates are
//! ranked by how many of the input's top-level keys they recognize, and the
//! best-ranked one that binds wins.
use std::cmp::Reverse;

use log::trace;
use serde_json::{Map, Value};

use super::UnionDecoder;
use crate::error::Result;
use crate::field::SettableField;
use crate::introspect;
use crate::path_de::Reader;

/// Returns 1 if a candidate was bound, 0 otherwise.
pub(super) fn bind_best_fit<T: Default + 'static>(
    decoder: &UnionDecoder<T>,
    input: &Map<String, Value>,
    raw: &Value,
    out: &mut T,
) -> Result<usize> {
    for (field, recognized) in rank_candidates(decoder.fields(), input) {
        if bind_candidate(decoder, field, recognized, input, raw, out)? {
            return Ok(1);
        }
    }
    Ok(0)
}

/// Fields ordered by recognized-key count, highest first; ties keep
/// declaration order.
pub(super) fn rank_candidates<'f, T>(
    fields: &'f [SettableField<T>],
    input: &Map<String, Value>,
) -> Vec<(&'f SettableField<T>, usize)> {
    let mut ranked: Vec<_> = fields
        .iter()
        .map(|field| {
            let known = field.recognized_keys();
            (field, introspect::count_recognized(input.keys().map(String::as_str), known))
        })
        .collect();
    ranked.sort_by_key(|(_, recognized)| Reverse(*recognized));
    ranked
}

fn bind_candidate<T: Default + 'static>(
    decoder: &UnionDecoder<T>,
    field: &SettableField<T>,
    recognized: usize,
    input: &Map<String, Value>,
    raw: &Value,
    out: &mut T,
) -> Result<bool> {
    if decoder.try_bind(field, raw, Reader::Strict, out)? {
        return Ok(true);
    }

    let known = field.recognized_keys();
    if known.is_empty() || recognized == 0 {
        trace!("{} recognizes none of the input keys", field.type_name());
        return Ok(false);
    }

    if recognized == input.len() {
        // every top-level key is known, the unknown one is nested
        return decoder.try_bind(field, raw, Reader::Lenient, out);
    }

    let filtered: Map<String, Value> = input
        .iter()
        .filter(|(key, _)| known.iter().any(|k| *k == key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let filtered = Value::Object(filtered);
    if decoder.try_bind(field, &filtered, Reader::Strict, out)? {
        return Ok(true);
    }
    decoder.try_bind(field, raw, Reader::Lenient, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::GettableField;
    use crate::mode::{Mode, Policy};
    use crate::union::{self, Union};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Inner {
        id: i64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct BranchA {
        a: i64,
        b: i64,
        #[serde(default)]
        inner: Option<Inner>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct BranchB {
        b: i64,
        c: i64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct BranchC {
        #[serde(default)]
        a: Option<i64>,
        d: String,
    }

    /// Lenient oneOf { B, A, C }: B is declared first on purpose.
    #[derive(Debug, Default, PartialEq)]
    struct Drifting {
        b: Option<BranchB>,
        a: Option<BranchA>,
        c: Option<BranchC>,
    }

    impl Union for Drifting {
        const MODE: Mode = Mode::OneOf;
        const POLICY: Policy = Policy::Lenient;

        fn settable_fields() -> Vec<SettableField<Self>> {
            vec![
                SettableField::new(|d: &mut Self, v: BranchB| d.b = Some(v)),
                SettableField::new(|d: &mut Self, v: BranchA| d.a = Some(v)),
                SettableField::new(|d: &mut Self, v: BranchC| d.c = Some(v)),
            ]
        }

        fn gettable_fields() -> Vec<GettableField<Self>> {
            vec![
                GettableField::new(|d: &Self| d.b.as_ref()),
                GettableField::new(|d: &Self| d.a.as_ref()),
                GettableField::new(|d: &Self| d.c.as_ref()),
            ]
        }
    }

    #[test]
    fn best_fit_beats_declaration_order() {
        let resolved: Drifting = union::decode(&json!({"a": 1, "b": 2, "z": 3}))
            .unwrap()
            .unwrap();
        let expected = BranchA {
            a: 1,
            b: 2,
            inner: None,
        };
        assert_eq!(resolved.a.as_ref(), Some(&expected));
        assert_eq!(resolved.b, None);
        assert_eq!(resolved.c, None);

        let exact: Drifting = union::decode(&json!({"a": 1, "b": 2})).unwrap().unwrap();
        assert_eq!(exact.a, Some(expected));
        assert_eq!(exact.b, None);
    }

    #[test]
    fn exact_input_still_binds_strictly() {
        let resolved: Drifting = union::decode(&json!({"b": 2, "c": 3})).unwrap().unwrap();
        assert_eq!(resolved.b, Some(BranchB { b: 2, c: 3 }));
        assert_eq!(resolved.a, None);
    }

    #[test]
    fn nested_unknown_key_is_ignored_when_top_level_keys_are_known() {
        let raw = json!({"a": 1, "b": 2, "inner": {"id": 9, "node_id": "x"}});
        let resolved: Drifting = union::decode(&raw).unwrap().unwrap();
        assert_eq!(resolved.a.and_then(|a| a.inner), Some(Inner { id: 9 }));
    }

    #[test]
    fn lenient_original_is_the_last_resort() {
        // filtered {"a": "one", "d": "x"} fails on the type of `a`, and so
        // does the lenient read of the original, so nothing binds
        let raw = json!({"a": "one", "d": "x", "e": 0});
        let none: Drifting = union::decode(&raw).unwrap().unwrap();
        assert_eq!(none, Drifting::default());

        let c: Drifting = union::decode(&json!({"d": "x", "e": 0})).unwrap().unwrap();
        let expected = BranchC {
            a: None,
            d: "x".into(),
        };
        assert_eq!(c.c, Some(expected));
    }

    #[test]
    fn unrecognized_object_leaves_every_branch_absent() {
        let resolved: Drifting = union::decode(&json!({"x": 1, "y": 2})).unwrap().unwrap();
        assert_eq!(resolved, Drifting::default());
    }

    #[test]
    fn ranking_is_stable_for_ties() {
        let fields = Drifting::settable_fields();
        let input = json!({"b": 1, "q": 0});
        let ranked = rank_candidates(&fields, input.as_object().unwrap());
        let order: Vec<_> = ranked
            .iter()
            .map(|(f, n)| (f.type_name().rsplit("::").next().unwrap(), *n))
            .collect();
        assert_eq!(order, vec![("BranchB", 1), ("BranchA", 1), ("BranchC", 0)]);
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Meta {
        created: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Flattened {
        kind: String,
        #[serde(flatten)]
        meta: Meta,
    }

    /// Lenient oneOf { BranchB, Flattened }
    #[derive(Debug, Default, PartialEq)]
    struct Tagged {
        b: Option<BranchB>,
        flattened: Option<Flattened>,
    }

    impl Union for Tagged {
        const MODE: Mode = Mode::OneOf;
        const POLICY: Policy = Policy::Lenient;

        fn settable_fields() -> Vec<SettableField<Self>> {
            vec![
                SettableField::new(|t: &mut Self, v: BranchB| t.b = Some(v)),
                SettableField::new(|t: &mut Self, v: Flattened| t.flattened = Some(v))
                    .with_recognized_keys(&["kind", "created"]),
            ]
        }

        fn gettable_fields() -> Vec<GettableField<Self>> {
            vec![
                GettableField::new(|t: &Self| t.b.as_ref()),
                GettableField::new(|t: &Self| t.flattened.as_ref()),
            ]
        }
    }

    #[test]
    fn flattened_struct_ranks_by_its_declared_keys() {
        let fields = Tagged::settable_fields();
        // serde reads a flattened struct as a map and reports no fields
        assert!(fields[1].shape().recognized_keys().is_empty());
        assert_eq!(fields[1].recognized_keys(), &["kind", "created"]);

        let input = json!({"kind": "x", "created": "now", "b": 1});
        let ranked = rank_candidates(&fields, input.as_object().unwrap());
        assert_eq!(ranked[0].1, 2);
        assert!(ranked[0].0.type_name().ends_with("Flattened"));

        let resolved: Tagged = union::decode(&input).unwrap().unwrap();
        assert_eq!(resolved.b, None);
        let created = resolved.flattened.map(|f| f.meta.created);
        assert_eq!(created.as_deref(), Some("now"));
    }

    #[test]
    fn scalars_skip_the_ranking_entirely() {
        let resolved: Drifting = union::decode(&json!("plain")).unwrap().unwrap();
        assert_eq!(resolved, Drifting::default());
    }
}
