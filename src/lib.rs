//! Resolve JSON-Schema `oneOf` / `anyOf` / `allOf` unions onto plain Rust
//! structs, and write them back.
//!
//! A union is a struct with one `Option` per branch:
//!
//! ```
//! use json_union::{GettableField, Mode, SettableField, Union, union_serde};
//!
//! #[derive(Debug, Default)]
//! struct Reviewer {
//!     login: Option<String>,
//!     id: Option<u64>,
//! }
//!
//! impl Union for Reviewer {
//!     const MODE: Mode = Mode::OneOf;
//!
//!     fn settable_fields() -> Vec<SettableField<Self>> {
//!         vec![
//!             SettableField::new(|r: &mut Self, v: String| r.login = Some(v)),
//!             SettableField::new(|r: &mut Self, v: u64| r.id = Some(v)),
//!         ]
//!     }
//!
//!     fn gettable_fields() -> Vec<GettableField<Self>> {
//!         vec![
//!             GettableField::new(|r: &Self| r.login.as_ref()),
//!             GettableField::new(|r: &Self| r.id.as_ref()),
//!         ]
//!     }
//! }
//!
//! union_serde!(Reviewer);
//!
//! let reviewer: Reviewer = serde_json::from_str("42").unwrap();
//! assert_eq!(reviewer.id, Some(42));
//! assert_eq!(serde_json::to_string(&reviewer).unwrap(), "42");
//! ```
//!
//! Decoding never fails on data that merely fits no branch: the result is an
//! all-absent union, reported through the [`mismatch`] hook. Only malformed
//! JSON is an error.
pub mod decode;
pub mod encode;
pub mod error;
pub mod field;
pub mod guard;
pub mod introspect;
pub mod mismatch;
pub mod mode;
pub mod nullable;
pub mod path_de;
pub mod strict_de;
pub mod timestamp;
pub mod types;
pub mod union;

pub use error::{Error, Result};
pub use field::{GettableField, SettableField};
pub use mismatch::{Mismatch, clear_mismatch_hook, set_mismatch_hook};
pub use mode::{Mode, Policy};
pub use nullable::{NullableOptional, State};
pub use types::{EmptyObject, SingularOrPlural, StringOrInteger};
pub use union::Union;
