//! Union decode engine.
//!
//! Resolves one raw JSON value against the branches of a union:
//!
//! 1. Probe the value's shape (object, array, string, number, boolean).
//!    A value with none of these shapes resolves to `None`.
//! 2. Bind the value onto each branch in declaration order with the strict
//!    reader. `oneOf` stops at the first branch that binds; `anyOf` and
//!    `allOf` try every branch, a failure on one never aborting the rest.
//! 3. Branch failures are soft: logged at debug level and skipped. Only
//!    tokenizer-level failures propagate.
//!
//! Lenient unions replace step 2 for `oneOf` objects, see [`lenient`].
pub mod lenient;
pub mod shape;

use std::any::TypeId;

use log::{debug, trace};
use serde_json::Value;

pub use shape::{Shape, ShapeKind};

use crate::error::{Error, Result};
use crate::field::SettableField;
use crate::guard::{self, InProgress};
use crate::mismatch::{self, Mismatch, Reason};
use crate::mode::{Mode, Policy};
use crate::path_de::{self, Reader};

pub struct UnionDecoder<T> {
    type_id: TypeId,
    type_name: &'static str,
    mode: Mode,
    policy: Policy,
    fields: Vec<SettableField<T>>,
    /// Index of the single enum branch, when list-of-enum coercion applies.
    enum_branch: Option<usize>,
}

impl<T: Default + 'static> UnionDecoder<T> {
    pub fn new(mode: Mode, policy: Policy, fields: Vec<SettableField<T>>) -> Self {
        let enum_branch = detect_enum_branch(&fields);
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            mode,
            policy,
            fields,
            enum_branch,
        }
    }

    /// `Ok(None)` when `raw` has no shape the engine can represent.
    pub fn decode(&self, raw: &Value) -> Result<Option<T>> {
        let _in_progress = InProgress::enter(self.type_id);

        let Some(shape) = shape::probe(raw) else {
            mismatch::report(Mismatch {
                type_name: self.type_name,
                mode: self.mode,
                shape: None,
                reason: Reason::NoShape,
            });
            return Ok(None);
        };
        trace!("decoding {} from {} input", self.type_name, shape.kind);

        let mut out = T::default();
        let populated = match (self.policy, self.mode, shape.as_object()) {
            (Policy::Lenient, Mode::OneOf, Some(map)) => {
                lenient::bind_best_fit(self, map, shape.value, &mut out)?
            }
            _ => self.bind_all(shape.value, &mut out)?,
        };
        if populated == 0 {
            mismatch::report(Mismatch {
                type_name: self.type_name,
                mode: self.mode,
                shape: Some(shape.kind),
                reason: Reason::NoBranch,
            });
        }
        Ok(Some(out))
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub(crate) fn fields(&self) -> &[SettableField<T>] {
        &self.fields
    }

    /// Strict pass over every branch; returns how many were populated.
    fn bind_all(&self, value: &Value, out: &mut T) -> Result<usize> {
        let mut populated = 0;
        for field in &self.fields {
            if self.try_bind(field, value, Reader::Strict, out)? {
                populated += 1;
                if self.mode.stops_at_first_match() {
                    break;
                }
            }
        }
        Ok(populated)
    }

    /// `Ok(false)` is a soft mismatch; `Err` only for malformed input.
    pub(crate) fn try_bind(
        &self,
        field: &SettableField<T>,
        value: &Value,
        reader: Reader,
        out: &mut T,
    ) -> Result<bool> {
        // a union behind `Box` or `Option` is the same union
        let recursing = guard::is_in_progress(field.type_id())
            || field.shape().union_id().is_some_and(guard::is_in_progress);
        if recursing {
            debug!(
                "not trying {} as a branch of {}: already decoding it",
                field.type_name(),
                self.type_name
            );
            return Ok(false);
        }

        let coerced = self.coerce_enum_list(field, value);
        let value = coerced.as_ref().unwrap_or(value);

        match field.bind(out, value, reader) {
            Ok(()) => {
                trace!("bound {} as {}", self.type_name, field.type_name());
                Ok(true)
            }
            Err(err) if Error::is_hard(err.inner()) => Err(Error::Parse(err.into_inner())),
            Err(err) => {
                debug!(
                    "failed to bind {value} as {} ({reader:?}): {}",
                    field.type_name(),
                    path_de::describe(&err)
                );
                Ok(false)
            }
        }
    }

    /// Routes each string of a list through the union's enum branch so that
    /// a plain list of strings lands on the list branch in enum wire form.
    /// Any element the enum rejects leaves the list untouched.
    fn coerce_enum_list(&self, field: &SettableField<T>, value: &Value) -> Option<Value> {
        let enum_field = &self.fields[self.enum_branch?];
        if !field.shape().is_collection() || field.type_id() == enum_field.type_id() {
            return None;
        }
        let items = value.as_array().filter(|items| !items.is_empty())?;
        let mut converted = Vec::with_capacity(items.len());
        for item in items {
            if !item.is_string() {
                return None;
            }
            match enum_field.canonicalize(item) {
                Ok(canonical) => converted.push(canonical),
                Err(err) => {
                    trace!("{item} is not a {}: {err}", enum_field.type_name());
                    return None;
                }
            }
        }
        Some(Value::Array(converted))
    }
}

/// The enum branch, if the branches name exactly one enum type and exactly
/// one collection type.
fn detect_enum_branch<T>(fields: &[SettableField<T>]) -> Option<usize> {
    let mut enum_branch: Option<usize> = None;
    for (index, field) in fields.iter().enumerate() {
        if !field.shape().is_enum() {
            continue;
        }
        match enum_branch {
            None => enum_branch = Some(index),
            Some(first) if fields[first].type_id() == field.type_id() => {}
            Some(_) => return None,
        }
    }
    let collections = fields.iter().filter(|field| field.shape().is_collection()).count();
    if collections == 1 { enum_branch } else { None }
}
