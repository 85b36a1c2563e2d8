// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Keyed document store, the usual root of a data file.
//!
//! Each entry is written as one component named by its key, e.g.
//! `/0/data/title`.

use std::any::Any;
use std::collections::BTreeMap;

use crate::error::{AssignError, DeserializeError, Warning};
use crate::reader::Unpacker;
use crate::registry::Registry;
use crate::serializable::{assign_clone, Deserialize, Serializable};
use crate::value::{Component, Value, ValueRef};

/// A value held by a [`Container`].
#[derive(Debug, Clone)]
pub enum Item {
    /// Boolean flag.
    Boolean(bool),
    /// Single byte.
    Char(u8),
    /// 32-bit integer.
    Int32(i32),
    /// 64-bit integer.
    Int64(i64),
    /// Double.
    Double(f64),
    /// String.
    String(String),
    /// Nested object.
    Object(Box<dyn Serializable>),
    /// Boxed value.
    Boxed(Box<dyn Serializable>),
}

impl Item {
    fn borrowed(&self) -> ValueRef<'_> {
        match self {
            Self::Boolean(v) => ValueRef::Boolean(*v),
            Self::Char(v) => ValueRef::Char(*v),
            Self::Int32(v) => ValueRef::Int32(*v),
            Self::Int64(v) => ValueRef::Int64(*v),
            Self::Double(v) => ValueRef::Double(*v),
            Self::String(v) => ValueRef::String(v),
            Self::Object(v) => ValueRef::Object(&**v),
            Self::Boxed(v) => ValueRef::Boxed(&**v),
        }
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(match value {
            Value::Boolean(v) => Self::Boolean(v),
            Value::Char(v) => Self::Char(v),
            Value::Int32(v) => Self::Int32(v),
            Value::Int64(v) => Self::Int64(v),
            Value::Double(v) => Self::Double(v),
            Value::String(v) => Self::String(v),
            Value::Object(v) => Self::Object(v),
            Value::Boxed(v) => Self::Boxed(v),
            other => return Err(other),
        })
    }
}

/// Ordered map from string keys to [`Item`]s.
#[derive(Debug, Clone, Default)]
pub struct Container {
    items: BTreeMap<String, Item>,
}

impl Container {
    /// Empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `item` under `key`, returning the previous item.
    pub fn set(&mut self, key: impl Into<String>, item: Item) -> Option<Item> {
        self.items.insert(key.into(), item)
    }

    /// Stores an object under `key`.
    pub fn set_object(&mut self, key: impl Into<String>, object: impl Serializable) -> Option<Item> {
        let object: Box<dyn Serializable> = Box::new(object);
        let item = if object.is_boxed() {
            Item::Boxed(object)
        } else {
            Item::Object(object)
        };
        self.set(key, item)
    }

    /// Item under `key`.
    pub fn get(&self, key: &str) -> Option<&Item> {
        self.items.get(key)
    }

    /// Object of type `T` under `key`.
    pub fn get_object<T: Serializable>(&self, key: &str) -> Option<&T> {
        match self.items.get(key)? {
            Item::Object(o) | Item::Boxed(o) => o.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Double under `key`.
    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.items.get(key)? {
            Item::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// String under `key`.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.items.get(key)? {
            Item::String(v) => Some(v),
            _ => None,
        }
    }

    /// Removes and returns the item under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Item> {
        self.items.remove(key)
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the container is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.keys().map(String::as_str)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Item)> + '_ {
        self.items.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serializable for Container {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn components(&self) -> Vec<Component<'_>> {
        self.items
            .iter()
            .map(|(key, item)| Component::new(key, item.borrowed()))
            .collect()
    }

    fn duplicate(&self) -> Box<dyn Serializable> {
        Box::new(self.clone())
    }

    fn assign(&mut self, source: &dyn Serializable) -> Result<(), AssignError> {
        assign_clone(self, source)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl Deserialize for Container {
    const TYPE_NAME: &'static str = "GwyContainer";

    fn deserialize(unpacker: &mut Unpacker<'_>, registry: &Registry) -> Result<Self, DeserializeError> {
        let components = unpacker.unpack_object_components(Self::TYPE_NAME, registry)?;
        let mut container = Self::new();
        for (position, key, value) in components {
            match Item::from_value(value) {
                Ok(item) => {
                    container.items.insert(key, item);
                }
                Err(value) => unpacker.push_warning(Warning::UnknownComponent {
                    position,
                    type_name: Self::TYPE_NAME.to_owned(),
                    component: key,
                    ctype: value.ctype(),
                }),
            }
        }
        Ok(container)
    }
}
