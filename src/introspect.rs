//! Schema introspection without reflection.
//!
//! Every derived `Deserialize` announces its wire layout to the deserializer
//! it is handed: structs pass their field table to `deserialize_struct`,
//! enums their variant names to `deserialize_enum`, and so on. Feeding a type
//! a deserializer that records that announcement and stops yields the set of
//! property names the type recognizes. The result is memoized per type for
//! the life of the process.
//!
//! Union types announce themselves through a marker newtype, so `Box<U>`,
//! `Option<U>` and newtypes around a union all resolve to that union's
//! identity.
use std::any::TypeId;
use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::forward_to_deserialize_any;

/// What a type expects to be deserialized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    /// A struct with a fixed set of wire property names.
    Struct(&'static [&'static str]),
    /// An enumeration of named variants.
    Enum(&'static [&'static str]),
    /// A homogeneous collection.
    Seq,
    /// An open key/value map.
    Map,
    /// A union type, possibly behind transparent wrappers.
    Union(TypeId),
    /// Scalars and anything that decides its shape at runtime.
    Opaque,
}

impl TypeShape {
    /// Property names recognized at the top level; empty for non-structs.
    pub fn recognized_keys(&self) -> &'static [&'static str] {
        match self {
            TypeShape::Struct(fields) => fields,
            _ => &[],
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, TypeShape::Enum(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, TypeShape::Seq)
    }

    /// Identity of the union this type resolves to, if any.
    pub fn union_id(&self) -> Option<TypeId> {
        match self {
            TypeShape::Union(id) => Some(*id),
            _ => None,
        }
    }
}

/// Newtype name union types deserialize through. Every deserializer treats
/// it as a transparent newtype; the shape probe reads the announced union
/// identity instead.
pub(crate) const UNION_MARKER: &str = "$json_union::Union";

thread_local! {
    static ANNOUNCED: Cell<Option<TypeId>> = const { Cell::new(None) };
}

/// Called by a union's `Deserialize` right before it requests
/// [`UNION_MARKER`].
pub(crate) fn announce_union(id: TypeId) {
    ANNOUNCED.with(|announced| announced.set(Some(id)));
}

static SHAPES: Lazy<RwLock<HashMap<TypeId, TypeShape>>> = Lazy::new(Default::default);

/// Shape of `X`, computed on first use and cached.
///
/// Concurrent first calls may both probe; the probe is pure, so whichever
/// insert lands first wins and the other result is identical.
pub fn shape_of<X: DeserializeOwned + 'static>() -> TypeShape {
    let id = TypeId::of::<X>();
    let cached = SHAPES
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .copied();
    if let Some(shape) = cached {
        return shape;
    }
    let shape = probe::<X>();
    *SHAPES
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(id)
        .or_insert(shape)
}

/// Number of `input_keys` that `known` recognizes.
pub fn count_recognized<'a>(
    input_keys: impl IntoIterator<Item = &'a str>,
    known: &[&str],
) -> usize {
    if known.is_empty() {
        return 0;
    }
    input_keys
        .into_iter()
        .filter(|key| known.iter().any(|k| k == key))
        .count()
}

fn probe<X: DeserializeOwned>() -> TypeShape {
    match X::deserialize(ShapeProbe) {
        Err(Found(shape)) => shape,
        Ok(_) => TypeShape::Opaque,
    }
}

/// Carries the discovered shape out through the `Err` channel.
#[derive(Debug)]
struct Found(TypeShape);

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape probe stopped at {:?}", self.0)
    }
}

impl std::error::Error for Found {}

impl de::Error for Found {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Found(TypeShape::Opaque)
    }
}

struct ShapeProbe;

impl<'de> Deserializer<'de> for ShapeProbe {
    type Error = Found;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Found> {
        Err(Found(TypeShape::Opaque))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Found> {
        Err(Found(TypeShape::Struct(fields)))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Found> {
        Err(Found(TypeShape::Enum(variants)))
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Found> {
        Err(Found(TypeShape::Seq))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Found> {
        Err(Found(TypeShape::Map))
    }

    // `Option<T>`, `Box<T>` and newtypes are transparent.
    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Found> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Found> {
        if name == UNION_MARKER {
            let announced = ANNOUNCED.with(Cell::take);
            return Err(Found(announced.map_or(TypeShape::Opaque, TypeShape::Union)));
        }
        visitor.visit_newtype_struct(self)
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct tuple tuple_struct identifier ignored_any
    }
}
