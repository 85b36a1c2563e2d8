// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recursive object serialization for Gwyddion data files.
//!
//! An object is written as a self-describing blob:
//!
//! ```text
//! TypeName NUL Size Component*      Component := Name NUL Type Value
//! ```
//!
//! where `Size` bounds the component list exactly and nested objects are
//! blobs of the same shape. Types implement [`Serializable`] to list their
//! components and [`Deserialize`] to rebuild themselves; a [`Registry`]
//! maps stored type names back to constructors.
//!
//! ```
//! use gwy_serialize::{deserialize, serialize, Registry, SizeMode, Surface, Unit};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut surface = Surface::from_points(&[[0.0, 0.0, 1.5], [1.0, 0.0, 2.5]]);
//! surface.zunit = Unit::symbol("m");
//!
//! let bytes = serialize(&surface, SizeMode::U32)?;
//! let registry = Registry::with_builtin();
//! let (back, warnings) = deserialize(&bytes, SizeMode::U32, &registry)?.downcast::<Surface>()?;
//! assert_eq!(back, surface);
//! assert!(warnings.is_empty());
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]

mod ctype;
mod error;
mod file;
mod reader;
mod registry;
mod serializable;
mod types;
mod value;
mod writer;

pub use ctype::ComponentType;
pub use error::{AssignError, DeserializeError, SerializeError, Warning};
pub use file::{deserialize_file, serialize_file, Magic};
pub use reader::{deserialize, Deserialized, Encoding, Slot, Unpacker, MAX_NESTING};
pub use registry::{DeserializeFn, Registry, TypeOps};
pub use serializable::{assign_clone, downcast, Deserialize, Serializable};
pub use types::{Container, Item, Rgba, Surface, Unit, MAX_POWER};
pub use value::{Component, Value, ValueRef};
pub use writer::{component_list_size, serialize, struct_size, Packer, SizeMode};
