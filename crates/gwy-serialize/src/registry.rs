// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type name to constructor table.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::DeserializeError;
use crate::reader::Unpacker;
use crate::serializable::{Deserialize, Serializable};
use crate::types::{Container, Rgba, Surface, Unit};

/// Reads one blob and returns it as a trait object.
pub type DeserializeFn =
    fn(&mut Unpacker<'_>, &Registry) -> Result<Box<dyn Serializable>, DeserializeError>;

/// What the reader needs to know about a registered type.
#[derive(Clone, Copy)]
pub struct TypeOps {
    /// Constructor reading the blob.
    pub deserialize: DeserializeFn,
    /// Whether the type is stored as a boxed value.
    pub boxed: bool,
}

impl fmt::Debug for TypeOps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeOps").field("boxed", &self.boxed).finish_non_exhaustive()
    }
}

fn deserialize_boxed<T: Deserialize>(
    unpacker: &mut Unpacker<'_>,
    registry: &Registry,
) -> Result<Box<dyn Serializable>, DeserializeError> {
    Ok(Box::new(T::deserialize(unpacker, registry)?))
}

/// Explicit table of the types a reader can construct.
///
/// Passed to every deserialization call; there is no global instance.
#[derive(Default, Clone)]
pub struct Registry {
    types: BTreeMap<&'static str, TypeOps>,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding [`Unit`], [`Surface`], [`Rgba`] and [`Container`].
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register::<Unit>()
            .register::<Surface>()
            .register::<Rgba>()
            .register::<Container>();
        registry
    }

    /// Adds `T` under its type name, replacing any earlier entry.
    pub fn register<T: Deserialize>(&mut self) -> &mut Self {
        self.types.insert(
            T::TYPE_NAME,
            TypeOps {
                deserialize: deserialize_boxed::<T>,
                boxed: T::BOXED,
            },
        );
        self
    }

    /// Looks up a type by name.
    pub fn get(&self, type_name: &str) -> Option<&TypeOps> {
        self.types.get(type_name)
    }

    /// Whether a type of that name is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Registered type names in sorted order.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.types.keys()).finish()
    }
}
