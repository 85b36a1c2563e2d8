// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The serializable object interface.

use std::any::Any;
use std::fmt;

use crate::error::{AssignError, DeserializeError};
use crate::reader::Unpacker;
use crate::registry::Registry;
use crate::value::Component;

/// An object that can be written as a self-describing blob.
///
/// Implementors list their state as named components; the writer takes care
/// of sizes, nesting and byte layout. Reading goes through [`Deserialize`]
/// and a [`Registry`].
pub trait Serializable: Any + fmt::Debug {
    /// Name stored at the head of the blob.
    fn type_name(&self) -> &'static str;

    /// Whether the type is a boxed value (`x`) rather than an object (`o`).
    fn is_boxed(&self) -> bool {
        false
    }

    /// Components in write order. Components at their default value may be
    /// omitted.
    fn components(&self) -> Vec<Component<'_>>;

    /// Deep copy of the whole object graph.
    fn duplicate(&self) -> Box<dyn Serializable>;

    /// Copies the state of `source` into `self`.
    ///
    /// Fails without touching `self` when `source` is a different type.
    fn assign(&mut self, source: &dyn Serializable) -> Result<(), AssignError>;

    /// Upcast for downcasting by reference.
    fn as_any(&self) -> &dyn Any;

    /// Upcast for downcasting by value.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A [`Serializable`] type that can be rebuilt from its blob.
pub trait Deserialize: Serializable + Sized {
    /// Name stored at the head of the blob.
    const TYPE_NAME: &'static str;

    /// Whether values are stored as boxed (`x`) components.
    const BOXED: bool = false;

    /// Reads one blob of this type at the unpacker's cursor.
    ///
    /// Implementations call [`Unpacker::unpack_object_struct`] with their
    /// component slots and then validate cross-component invariants.
    fn deserialize(unpacker: &mut Unpacker<'_>, registry: &Registry) -> Result<Self, DeserializeError>;
}

impl Clone for Box<dyn Serializable> {
    fn clone(&self) -> Self {
        self.duplicate()
    }
}

/// Downcasts an owned object to a concrete type.
///
/// Returns `None`, dropping the object, when it is of another type.
pub fn downcast<T: Serializable>(object: Box<dyn Serializable>) -> Option<T> {
    object.into_any().downcast::<T>().ok().map(|concrete| *concrete)
}

/// Implements [`Serializable::assign`] for `Clone` types.
pub fn assign_clone<T: Serializable + Clone>(
    dest: &mut T,
    source: &dyn Serializable,
) -> Result<(), AssignError> {
    match source.as_any().downcast_ref::<T>() {
        Some(source) => {
            dest.clone_from(source);
            Ok(())
        }
        None => Err(AssignError::TypeMismatch {
            expected: dest.type_name(),
            found: source.type_name(),
        }),
    }
}
