// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Object blob writer.
//!
//! Sizes are computed up front from the component lists, so the writer
//! never has to seek back and patch a size field.

use tracing::warn;

use crate::error::SerializeError;
use crate::serializable::Serializable;
use crate::value::{Component, ValueRef};

/// Width of object sizes and array counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SizeMode {
    /// 32-bit sizes, as in `GWYP` files.
    #[default]
    U32,
    /// 64-bit sizes, as in `GWYQ` files.
    U64,
}

impl SizeMode {
    /// Bytes taken by one size or count field.
    pub fn width(self) -> usize {
        match self {
            Self::U32 => 4,
            Self::U64 => 8,
        }
    }
}

/// Size of the whole blob: type name, size field and component list.
pub fn struct_size(type_name: &str, components: &[Component<'_>], mode: SizeMode) -> usize {
    type_name.len() + 1 + mode.width() + component_list_size(components, mode)
}

/// Size of the component list, the value stored in the size field.
pub fn component_list_size(components: &[Component<'_>], mode: SizeMode) -> usize {
    components
        .iter()
        .map(|c| c.name.len() + 2 + value_size(&c.value, mode))
        .sum()
}

fn object_size(object: &dyn Serializable, mode: SizeMode) -> usize {
    struct_size(object.type_name(), &object.components(), mode)
}

fn value_size(value: &ValueRef<'_>, mode: SizeMode) -> usize {
    let count = mode.width();
    match value {
        ValueRef::Boolean(_) | ValueRef::Char(_) => 1,
        ValueRef::Int16(_) => 2,
        ValueRef::Int32(_) => 4,
        ValueRef::Int64(_) | ValueRef::Double(_) => 8,
        ValueRef::String(s) => s.len() + 1,
        ValueRef::Object(o) | ValueRef::Boxed(o) => object_size(*o, mode),
        ValueRef::CharArray(v) => count + v.len(),
        ValueRef::Int16Array(v) => count + 2 * v.len(),
        ValueRef::Int32Array(v) => count + 4 * v.len(),
        ValueRef::Int64Array(v) => count + 8 * v.len(),
        ValueRef::DoubleArray(v) => count + 8 * v.len(),
        ValueRef::StringArray(v) => count + v.iter().map(|s| s.len() + 1).sum::<usize>(),
        ValueRef::ObjectArray(v) | ValueRef::BoxedArray(v) => {
            count + v.iter().map(|o| object_size(*o, mode)).sum::<usize>()
        }
    }
}

/// Appends object blobs to a growable buffer.
#[derive(Debug, Default)]
pub struct Packer {
    buf: Vec<u8>,
    mode: SizeMode,
    boxed: Vec<&'static str>,
}

impl Packer {
    /// Empty packer writing sizes of the given width.
    pub fn new(mode: SizeMode) -> Self {
        Self {
            buf: Vec::new(),
            mode,
            boxed: Vec::new(),
        }
    }

    /// Starts from existing bytes, e.g. a file magic.
    pub fn with_prefix(prefix: &[u8], mode: SizeMode) -> Self {
        let mut packer = Self::new(mode);
        packer.buf.extend_from_slice(prefix);
        packer
    }

    /// Size width in use.
    pub fn mode(&self) -> SizeMode {
        self.mode
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the packer and returns the buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Writes `object` as one blob.
    pub fn pack_object(&mut self, object: &dyn Serializable) -> Result<(), SerializeError> {
        let components = object.components();
        if object.is_boxed() {
            self.boxed.push(object.type_name());
            let result = self.pack_object_struct(object.type_name(), &components);
            self.boxed.pop();
            result
        } else {
            self.pack_object_struct(object.type_name(), &components)
        }
    }

    /// Writes `TypeName NUL Size Components` for an explicit component list.
    pub fn pack_object_struct(
        &mut self,
        type_name: &str,
        components: &[Component<'_>],
    ) -> Result<(), SerializeError> {
        self.put_cstr(type_name, type_name, "type name")?;
        let size = component_list_size(components, self.mode);
        self.put_size(type_name, size)?;
        for component in components {
            self.put_cstr(type_name, component.name, "component name")?;
            self.buf.push(component.value.ctype().tag());
            self.put_value(type_name, component.name, &component.value)?;
        }
        Ok(())
    }

    fn put_cstr(&mut self, type_name: &str, s: &str, what: &str) -> Result<(), SerializeError> {
        if s.as_bytes().contains(&0) {
            return Err(SerializeError::InteriorNul {
                type_name: type_name.to_owned(),
                what: what.to_owned(),
            });
        }
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        Ok(())
    }

    fn put_size(&mut self, type_name: &str, size: usize) -> Result<(), SerializeError> {
        match self.mode {
            SizeMode::U32 => {
                let size = u32::try_from(size).map_err(|_| SerializeError::SizeOverflow {
                    type_name: type_name.to_owned(),
                    size,
                })?;
                self.buf.extend_from_slice(&size.to_le_bytes());
            }
            SizeMode::U64 => self.buf.extend_from_slice(&(size as u64).to_le_bytes()),
        }
        Ok(())
    }

    fn put_nested(&mut self, name: &str, object: &dyn Serializable) -> Result<(), SerializeError> {
        if let Some(outer) = self.boxed.last() {
            warn!(boxed = outer, component = name, "boxed value contains an object");
        }
        self.pack_object(object)
    }

    fn put_value(
        &mut self,
        type_name: &str,
        name: &str,
        value: &ValueRef<'_>,
    ) -> Result<(), SerializeError> {
        match value {
            ValueRef::Boolean(v) => self.buf.push(u8::from(*v)),
            ValueRef::Char(v) => self.buf.push(*v),
            ValueRef::Int16(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            ValueRef::Int32(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            ValueRef::Int64(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            ValueRef::Double(v) => self.buf.extend_from_slice(&v.to_le_bytes()),
            ValueRef::String(s) => self.put_cstr(type_name, s, name)?,
            ValueRef::Object(o) => self.put_nested(name, *o)?,
            ValueRef::Boxed(o) => self.pack_object(*o)?,
            ValueRef::CharArray(v) => {
                self.put_size(type_name, v.len())?;
                self.buf.extend_from_slice(v);
            }
            ValueRef::Int16Array(v) => {
                self.put_size(type_name, v.len())?;
                v.iter().for_each(|x| self.buf.extend_from_slice(&x.to_le_bytes()));
            }
            ValueRef::Int32Array(v) => {
                self.put_size(type_name, v.len())?;
                v.iter().for_each(|x| self.buf.extend_from_slice(&x.to_le_bytes()));
            }
            ValueRef::Int64Array(v) => {
                self.put_size(type_name, v.len())?;
                v.iter().for_each(|x| self.buf.extend_from_slice(&x.to_le_bytes()));
            }
            ValueRef::DoubleArray(v) => {
                self.put_size(type_name, v.len())?;
                v.iter().for_each(|x| self.buf.extend_from_slice(&x.to_le_bytes()));
            }
            ValueRef::StringArray(v) => {
                self.put_size(type_name, v.len())?;
                for s in *v {
                    self.put_cstr(type_name, s, name)?;
                }
            }
            ValueRef::ObjectArray(v) => {
                self.put_size(type_name, v.len())?;
                for o in v {
                    self.put_nested(name, *o)?;
                }
            }
            ValueRef::BoxedArray(v) => {
                self.put_size(type_name, v.len())?;
                for o in v {
                    self.pack_object(*o)?;
                }
            }
        }
        Ok(())
    }
}

/// Serializes `object` to a standalone blob.
pub fn serialize(object: &dyn Serializable, mode: SizeMode) -> Result<Vec<u8>, SerializeError> {
    let mut packer = Packer::new(mode);
    packer.buf.reserve(object_size(object, mode));
    packer.pack_object(object)?;
    Ok(packer.into_bytes())
}
