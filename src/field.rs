//! Field descriptors: one per branch of a union.
use std::any::{TypeId, type_name};
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::introspect::{self, TypeShape};
use crate::path_de::{self, PathError, Reader};

type Bind<T> = Box<dyn Fn(&mut T, &Value, Reader) -> Result<(), PathError> + Send + Sync>;
type Read<T> = Box<dyn Fn(&T) -> Option<serde_json::Result<Value>> + Send + Sync>;
type Present<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Decode side of a branch: binds a JSON value of type `X` onto the union `T`.
pub struct SettableField<T> {
    type_id: TypeId,
    type_name: &'static str,
    shape: fn() -> TypeShape,
    recognized: Option<&'static [&'static str]>,
    canonicalize: fn(&Value) -> serde_json::Result<Value>,
    bind: Bind<T>,
}

impl<T: 'static> SettableField<T> {
    pub fn new<X, F>(setter: F) -> Self
    where
        X: Serialize + DeserializeOwned + 'static,
        F: Fn(&mut T, X) + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<X>(),
            type_name: type_name::<X>(),
            shape: introspect::shape_of::<X>,
            recognized: None,
            canonicalize: canonicalize::<X>,
            bind: Box::new(move |target: &mut T, value: &Value, reader: Reader| {
                let bound = path_de::from_value_with_path::<X>(value, reader)?;
                setter(target, bound);
                Ok(())
            }),
        }
    }

    /// Overrides the property names this branch recognizes. Needed when `X`
    /// uses `#[serde(flatten)]`, which hides its field table from serde.
    pub fn with_recognized_keys(mut self, keys: &'static [&'static str]) -> Self {
        self.recognized = Some(keys);
        self
    }
}

impl<T> SettableField<T> {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn shape(&self) -> TypeShape {
        (self.shape)()
    }

    /// Top-level property names used to rank lenient candidates.
    pub fn recognized_keys(&self) -> &'static [&'static str] {
        self.recognized.unwrap_or_else(|| self.shape().recognized_keys())
    }

    /// Round-trips `value` through `X`, yielding `X`'s own wire form.
    pub(crate) fn canonicalize(&self, value: &Value) -> serde_json::Result<Value> {
        (self.canonicalize)(value)
    }

    pub(crate) fn bind(
        &self,
        target: &mut T,
        value: &Value,
        reader: Reader,
    ) -> Result<(), PathError> {
        (self.bind)(target, value, reader)
    }
}

fn canonicalize<X: Serialize + DeserializeOwned>(value: &Value) -> serde_json::Result<Value> {
    serde_json::to_value(X::deserialize(value)?)
}

/// Encode side of a branch: reads the branch's value, if set, as JSON.
pub struct GettableField<T> {
    type_name: &'static str,
    read: Read<T>,
    present: Present<T>,
}

impl<T: 'static> GettableField<T> {
    pub fn new<X, F>(getter: F) -> Self
    where
        X: Serialize + 'static,
        F: Fn(&T) -> Option<&X> + Send + Sync + 'static,
    {
        let getter = Arc::new(getter);
        let presence = Arc::clone(&getter);
        Self {
            type_name: type_name::<X>(),
            read: Box::new(move |source: &T| (*getter)(source).map(serde_json::to_value)),
            present: Box::new(move |source: &T| (*presence)(source).is_some()),
        }
    }
}

impl<T> GettableField<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `None` when the branch is absent.
    pub(crate) fn read(&self, source: &T) -> Option<serde_json::Result<Value>> {
        (self.read)(source)
    }

    pub(crate) fn is_set(&self, source: &T) -> bool {
        (self.present)(source)
    }
}

impl<T> std::fmt::Debug for SettableField<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettableField").field("type", &self.type_name).finish()
    }
}

impl<T> std::fmt::Debug for GettableField<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GettableField").field("type", &self.type_name).finish()
    }
}
