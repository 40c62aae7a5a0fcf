//! The `Union` trait and its serde bridge.
//!
//! A union is a plain struct with one `Option` per branch. Implementing
//! [`Union`] declares the branches once; the decoder and encoder built from
//! that declaration are cached per type, and [`union_serde!`](crate::union_serde)
//! routes the type's `Serialize`/`Deserialize` through them so unions nest
//! inside ordinary serde models.
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde::de::value::{MapAccessDeserializer, SeqAccessDeserializer};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{self, Serialize, Serializer};
use serde_json::Value;

use crate::decode::UnionDecoder;
use crate::encode::UnionEncoder;
use crate::error::{Error, Result};
use crate::field::{GettableField, SettableField};
use crate::introspect;
use crate::mode::{Mode, Policy};

pub trait Union: Default + Sized + 'static {
    const MODE: Mode;
    const POLICY: Policy = Policy::Strict;

    /// Decode branches, in the order they are tried.
    fn settable_fields() -> Vec<SettableField<Self>>;

    /// Encode branches, in the order they are written.
    fn gettable_fields() -> Vec<GettableField<Self>>;
}

struct Codec<U> {
    decoder: UnionDecoder<U>,
    encoder: UnionEncoder<U>,
}

type Registry = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static CODECS: Lazy<RwLock<Registry>> = Lazy::new(Default::default);

fn codec<U: Union>() -> Arc<Codec<U>> {
    let id = TypeId::of::<U>();
    let cached = CODECS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&id)
        .cloned();
    let entry = match cached {
        Some(entry) => entry,
        None => {
            // built outside the lock: building introspects branch types
            let built: Arc<dyn Any + Send + Sync> = Arc::new(Codec {
                decoder: UnionDecoder::new(U::MODE, U::POLICY, U::settable_fields()),
                encoder: UnionEncoder::new(U::MODE, U::gettable_fields()),
            });
            Arc::clone(
                CODECS
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(id)
                    .or_insert(built),
            )
        }
    };
    match entry.downcast::<Codec<U>>() {
        Ok(codec) => codec,
        Err(_) => unreachable!("codec registry is keyed by the codec's own type"),
    }
}

/// Decodes `raw` as `U`. `Ok(None)` for input with no representable shape
/// (`null`); an all-absent `U` when no branch accepts the input.
pub fn decode<U: Union>(raw: &Value) -> Result<Option<U>> {
    codec::<U>().decoder.decode(raw)
}

/// Like [`decode`], from JSON text. Malformed text is [`Error::Parse`].
pub fn decode_str<U: Union>(text: &str) -> Result<Option<U>> {
    let raw: Value = serde_json::from_str(text).map_err(Error::Parse)?;
    decode(&raw)
}

pub fn encode<U: Union>(union: &U) -> Result<Value> {
    codec::<U>().encoder.to_value(union)
}

pub fn encode_string<U: Union>(union: &U) -> Result<String> {
    Ok(encode(union)?.to_string())
}

pub fn populated_branches<U: Union>(union: &U) -> Vec<&'static str> {
    codec::<U>().encoder.populated_branches(union)
}

/// `Serialize` body for union types; see [`union_serde!`](crate::union_serde).
pub fn serialize<U: Union, S: Serializer>(
    union: &U,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    encode(union).map_err(ser::Error::custom)?.serialize(serializer)
}

/// `Deserialize` body for union types. A `null` yields the all-absent value.
///
/// The value is requested as a marker newtype so that schema introspection
/// can tell `U` apart from any wrapper around it.
pub fn deserialize<'de, U: Union, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<U, D::Error> {
    introspect::announce_union(TypeId::of::<U>());
    deserializer.deserialize_newtype_struct(introspect::UNION_MARKER, UnionVisitor(PhantomData))
}

struct UnionVisitor<U>(PhantomData<fn() -> U>);

impl<U: Union> UnionVisitor<U> {
    fn resolve<E: de::Error>(raw: Value) -> std::result::Result<U, E> {
        decode::<U>(&raw)
            .map(Option::unwrap_or_default)
            .map_err(E::custom)
    }
}

// Deserializers that do not special-case newtypes hand the value to the
// plain visit methods instead.
impl<'de, U: Union> Visitor<'de> for UnionVisitor<U> {
    type Value = U;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a JSON value for {}", std::any::type_name::<U>())
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> std::result::Result<U, D::Error> {
        Self::resolve(Value::deserialize(deserializer)?)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<U, D::Error> {
        Self::resolve(Value::deserialize(deserializer)?)
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<U, E> {
        Self::resolve(Value::Null)
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<U, E> {
        Self::resolve(Value::Null)
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<U, E> {
        Self::resolve(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<U, E> {
        Self::resolve(Value::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<U, E> {
        Self::resolve(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<U, E> {
        Self::resolve(Value::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<U, E> {
        Self::resolve(Value::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<U, E> {
        Self::resolve(Value::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, seq: A) -> std::result::Result<U, A::Error> {
        Self::resolve(Value::deserialize(SeqAccessDeserializer::new(seq))?)
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> std::result::Result<U, A::Error> {
        Self::resolve(Value::deserialize(MapAccessDeserializer::new(map))?)
    }
}

/// Implements `Serialize` and `Deserialize` for a [`Union`] type.
#[macro_export]
macro_rules! union_serde {
    ($ty:ident $(< $($generic:ident),+ >)?) => {
        impl $(< $($generic),+ >)? ::serde::Serialize for $ty $(< $($generic),+ >)?
        where
            Self: $crate::union::Union,
        {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::std::result::Result<S::Ok, S::Error> {
                $crate::union::serialize(self, serializer)
            }
        }

        impl<'de, $($($generic),+)?> ::serde::Deserialize<'de> for $ty $(< $($generic),+ >)?
        where
            Self: $crate::union::Union,
        {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::std::result::Result<Self, D::Error> {
                $crate::union::deserialize(deserializer)
            }
        }
    };
}
