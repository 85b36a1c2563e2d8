// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Object blob reader.

use std::collections::HashSet;

use gwy_pack::Reader;
use tracing::{debug, warn};

use crate::ctype::ComponentType;
use crate::error::{DeserializeError, Warning};
use crate::registry::Registry;
use crate::serializable::{downcast, Deserialize, Serializable};
use crate::value::Value;
use crate::writer::SizeMode;

/// Deepest object nesting the reader follows.
pub const MAX_NESTING: usize = 200;

/// How component headers and sizes are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// One-character type tags with sizes of the given width.
    Tagged(SizeMode),
    /// `GWYO`: 32-bit GLib type codes and 32-bit sizes.
    Legacy,
}

impl Encoding {
    fn size_width(self) -> usize {
        match self {
            Self::Tagged(mode) => mode.width(),
            Self::Legacy => 4,
        }
    }
}

/// A component an object expects, filled in by [`Unpacker::unpack_object_struct`].
#[derive(Debug)]
pub struct Slot {
    name: &'static str,
    ctype: ComponentType,
    object_type: Option<&'static str>,
    value: Option<Value>,
}

macro_rules! slot_takers {
    ($($(#[$doc:meta])* $fn_name:ident => $variant:ident($ty:ty);)*) => {
        $(
            $(#[$doc])*
            pub fn $fn_name(&mut self) -> Option<$ty> {
                match self.value.take()? {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        )*
    };
}

impl Slot {
    /// Expects a component of the given type.
    pub fn new(name: &'static str, ctype: ComponentType) -> Self {
        Self {
            name,
            ctype,
            object_type: None,
            value: None,
        }
    }

    /// Expects a nested object or boxed value of type `T`.
    ///
    /// A blob of any other type under this name is rejected.
    pub fn of<T: Deserialize>(name: &'static str) -> Self {
        let ctype = if T::BOXED {
            ComponentType::Boxed
        } else {
            ComponentType::Object
        };
        Self {
            object_type: Some(T::TYPE_NAME),
            ..Self::new(name, ctype)
        }
    }

    /// Component name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Expected component type.
    pub fn ctype(&self) -> ComponentType {
        self.ctype
    }

    /// Whether the component was present.
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Takes the value out of the slot.
    pub fn take(&mut self) -> Option<Value> {
        self.value.take()
    }

    /// Takes a nested object and downcasts it to `T`.
    pub fn take_object<T: Serializable>(&mut self) -> Option<T> {
        match self.value.take()? {
            Value::Object(o) | Value::Boxed(o) => downcast(o),
            _ => None,
        }
    }

    slot_takers! {
        /// Takes a `b` value.
        take_bool => Boolean(bool);
        /// Takes a `c` value.
        take_char => Char(u8);
        /// Takes an `h` value.
        take_i16 => Int16(i16);
        /// Takes an `i` value.
        take_i32 => Int32(i32);
        /// Takes a `q` value.
        take_i64 => Int64(i64);
        /// Takes a `d` value.
        take_f64 => Double(f64);
        /// Takes an `s` value.
        take_string => String(String);
        /// Takes a `C` value.
        take_char_array => CharArray(Vec<u8>);
        /// Takes an `H` value.
        take_i16_array => Int16Array(Vec<i16>);
        /// Takes an `I` value.
        take_i32_array => Int32Array(Vec<i32>);
        /// Takes a `Q` value.
        take_i64_array => Int64Array(Vec<i64>);
        /// Takes a `D` value.
        take_f64_array => DoubleArray(Vec<f64>);
        /// Takes an `S` value.
        take_string_array => StringArray(Vec<String>);
        /// Takes an `O` value.
        take_object_array => ObjectArray(Vec<Box<dyn Serializable>>);
        /// Takes an `X` value.
        take_boxed_array => BoxedArray(Vec<Box<dyn Serializable>>);
    }
}

/// Cursor over serialized blobs.
///
/// Reads never cross `end`, the end of the innermost object being read.
/// Warnings accumulate on the unpacker and are handed out at the end.
#[derive(Debug)]
pub struct Unpacker<'a> {
    reader: Reader<'a>,
    end: usize,
    encoding: Encoding,
    warnings: Vec<Warning>,
    boxed: Vec<String>,
    nesting: usize,
}

impl<'a> Unpacker<'a> {
    /// Reads `bytes` from the start.
    pub fn new(bytes: &'a [u8], encoding: Encoding) -> Self {
        Self {
            reader: Reader::new(bytes),
            end: bytes.len(),
            encoding,
            warnings: Vec::new(),
            boxed: Vec::new(),
            nesting: 0,
        }
    }

    /// Reads `bytes` starting at `offset`, keeping positions absolute.
    pub fn at(bytes: &'a [u8], offset: usize, encoding: Encoding) -> Result<Self, DeserializeError> {
        let mut unpacker = Self::new(bytes, encoding);
        unpacker.reader.skip(offset)?;
        Ok(unpacker)
    }

    /// Absolute cursor position.
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Bytes left before the end of the current object.
    pub fn remaining(&self) -> usize {
        self.end - self.position()
    }

    /// Header encoding in use.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Warnings recorded so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Consumes the unpacker and returns its warnings.
    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    /// Records a warning and logs it.
    pub fn push_warning(&mut self, warning: Warning) {
        warn!("{warning}");
        self.warnings.push(warning);
    }

    fn need(&self, needed: usize) -> Result<(), DeserializeError> {
        let position = self.position();
        if needed <= self.end - position {
            return Ok(());
        }
        if self.nesting == 0 {
            Err(DeserializeError::Truncated {
                position,
                needed,
                available: self.end - position,
            })
        } else {
            Err(DeserializeError::SizeMismatch {
                position,
                end: self.end,
            })
        }
    }

    fn read_cstr(&mut self) -> Result<&'a [u8], DeserializeError> {
        let position = self.position();
        let window = &self.reader.rest()[..self.end - position];
        let len = window
            .iter()
            .position(|&b| b == 0)
            .ok_or(DeserializeError::RunawayString { position })?;
        let bytes = self.reader.take(len)?;
        self.reader.skip(1)?;
        Ok(bytes)
    }

    fn read_str(&mut self) -> Result<&'a str, DeserializeError> {
        let position = self.position();
        let bytes = self.read_cstr()?;
        std::str::from_utf8(bytes).map_err(|_| DeserializeError::InvalidUtf8 { position })
    }

    fn read_size(&mut self) -> Result<usize, DeserializeError> {
        let position = self.position();
        self.need(self.encoding.size_width())?;
        let raw = match self.encoding {
            Encoding::Tagged(SizeMode::U64) => self.reader.read_uint64_le()?,
            _ => u64::from(self.reader.read_uint32_le()?),
        };
        usize::try_from(raw).map_err(|_| DeserializeError::CountOverflow {
            position,
            count: raw,
        })
    }

    fn read_ctype(&mut self) -> Result<ComponentType, DeserializeError> {
        let position = self.position();
        match self.encoding {
            Encoding::Tagged(_) => {
                self.need(1)?;
                let tag = self.reader.read_u8()?;
                ComponentType::from_tag(tag).ok_or(DeserializeError::UnknownTypeTag {
                    position,
                    tag: u32::from(tag),
                })
            }
            Encoding::Legacy => {
                self.need(4)?;
                let code = self.reader.read_uint32_le()?;
                ComponentType::from_legacy_code(code)
                    .ok_or(DeserializeError::UnknownTypeTag { position, tag: code })
            }
        }
    }

    /// Reads an array count and checks that `count` items of `width` bytes fit.
    fn read_count(&mut self, width: usize) -> Result<usize, DeserializeError> {
        let position = self.position();
        let count = self.read_size()?;
        let bytes = count.checked_mul(width).ok_or(DeserializeError::CountOverflow {
            position,
            count: count as u64,
        })?;
        self.need(bytes)?;
        Ok(count)
    }

    fn read_fixed<const N: usize, T>(
        &mut self,
        convert: fn([u8; N]) -> T,
    ) -> Result<Vec<T>, DeserializeError> {
        let count = self.read_count(N)?;
        let bytes = self.reader.take(count * N)?;
        Ok(bytes
            .chunks_exact(N)
            .map(|chunk| {
                let mut raw = [0u8; N];
                raw.copy_from_slice(chunk);
                convert(raw)
            })
            .collect())
    }

    /// Reads the blob header and narrows the cursor to its component list.
    ///
    /// Returns the type name and the enclosing end to restore afterwards.
    fn enter_object(&mut self) -> Result<(&'a str, usize), DeserializeError> {
        let position = self.position();
        if self.nesting >= MAX_NESTING {
            return Err(DeserializeError::NestingTooDeep {
                position,
                limit: MAX_NESTING,
            });
        }
        let type_name = self.read_str()?;
        let size = self.read_size()?;
        let body = self.position();
        if size > self.end - body {
            return Err(DeserializeError::Truncated {
                position: body,
                needed: size,
                available: self.end - body,
            });
        }
        let outer = self.end;
        self.end = body + size;
        self.nesting += 1;
        Ok((type_name, outer))
    }

    fn leave_object(&mut self, outer: usize) {
        self.end = outer;
        self.nesting -= 1;
    }

    /// Reads a blob of type `expected` and fills the matching slots.
    ///
    /// Components are matched on name and type. Those without a matching
    /// slot are skipped with a warning. A component appearing twice is fatal.
    pub fn unpack_object_struct(
        &mut self,
        expected: &str,
        slots: &mut [Slot],
        registry: &Registry,
    ) -> Result<(), DeserializeError> {
        let position = self.position();
        let (type_name, outer) = self.enter_object()?;
        let result = if type_name == expected {
            self.unpack_slots(type_name, slots, registry)
        } else {
            Err(DeserializeError::TypeNameMismatch {
                position,
                expected: expected.to_owned(),
                found: type_name.to_owned(),
            })
        };
        self.leave_object(outer);
        result
    }

    fn unpack_slots(
        &mut self,
        type_name: &str,
        slots: &mut [Slot],
        registry: &Registry,
    ) -> Result<(), DeserializeError> {
        while self.remaining() > 0 {
            let position = self.position();
            let name = self.read_str()?;
            let ctype = self.read_ctype()?;
            let Some(slot) = slots.iter_mut().find(|s| s.name == name && s.ctype == ctype) else {
                self.push_warning(Warning::UnknownComponent {
                    position,
                    type_name: type_name.to_owned(),
                    component: name.to_owned(),
                    ctype,
                });
                self.skip_value(ctype)?;
                continue;
            };
            if slot.value.is_some() {
                return Err(DeserializeError::DuplicateComponent {
                    position,
                    type_name: type_name.to_owned(),
                    component: name.to_owned(),
                });
            }
            slot.value = Some(self.read_value(ctype, slot.object_type, registry)?);
        }
        Ok(())
    }

    /// Reads a blob of type `expected` keeping every component, in stream
    /// order, together with the offset of its header. Used by open-ended
    /// types such as containers.
    pub fn unpack_object_components(
        &mut self,
        expected: &str,
        registry: &Registry,
    ) -> Result<Vec<(usize, String, Value)>, DeserializeError> {
        let position = self.position();
        let (type_name, outer) = self.enter_object()?;
        let result = if type_name == expected {
            self.unpack_all(type_name, registry)
        } else {
            Err(DeserializeError::TypeNameMismatch {
                position,
                expected: expected.to_owned(),
                found: type_name.to_owned(),
            })
        };
        self.leave_object(outer);
        result
    }

    fn unpack_all(
        &mut self,
        type_name: &str,
        registry: &Registry,
    ) -> Result<Vec<(usize, String, Value)>, DeserializeError> {
        let mut components = Vec::new();
        let mut seen = HashSet::new();
        while self.remaining() > 0 {
            let position = self.position();
            let name = self.read_str()?;
            let ctype = self.read_ctype()?;
            if !seen.insert(name) {
                return Err(DeserializeError::DuplicateComponent {
                    position,
                    type_name: type_name.to_owned(),
                    component: name.to_owned(),
                });
            }
            let value = self.read_value(ctype, None, registry)?;
            components.push((position, name.to_owned(), value));
        }
        Ok(components)
    }

    /// Reads one object or boxed blob of any registered type.
    pub fn unpack_object(&mut self, registry: &Registry) -> Result<Box<dyn Serializable>, DeserializeError> {
        self.read_blob(None, None, registry)
    }

    fn read_blob(
        &mut self,
        boxed: Option<bool>,
        expected: Option<&str>,
        registry: &Registry,
    ) -> Result<Box<dyn Serializable>, DeserializeError> {
        let position = self.position();
        let type_name = {
            let mut peek = self.clone_cursor();
            peek.read_str()?
        };
        if let Some(expected) = expected {
            if type_name != expected {
                return Err(DeserializeError::TypeNameMismatch {
                    position,
                    expected: expected.to_owned(),
                    found: type_name.to_owned(),
                });
            }
        }
        let ops = registry.get(type_name).ok_or_else(|| DeserializeError::UnknownType {
            position,
            type_name: type_name.to_owned(),
        })?;
        if boxed.is_some_and(|boxed| boxed != ops.boxed) {
            return Err(DeserializeError::KindMismatch {
                position,
                type_name: type_name.to_owned(),
                boxed: ops.boxed,
            });
        }
        debug!(position, type_name, "reading object");
        if ops.boxed {
            self.boxed.push(type_name.to_owned());
            let result = (ops.deserialize)(self, registry);
            self.boxed.pop();
            result
        } else {
            (ops.deserialize)(self, registry)
        }
    }

    fn clone_cursor(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            end: self.end,
            encoding: self.encoding,
            warnings: Vec::new(),
            boxed: Vec::new(),
            nesting: self.nesting,
        }
    }

    fn read_object(
        &mut self,
        expected: Option<&str>,
        registry: &Registry,
    ) -> Result<Box<dyn Serializable>, DeserializeError> {
        if let Some(boxed_type) = self.boxed.last() {
            let warning = Warning::ObjectInBoxed {
                position: self.position(),
                boxed_type: boxed_type.clone(),
            };
            self.push_warning(warning);
        }
        self.read_blob(Some(false), expected, registry)
    }

    fn read_value(
        &mut self,
        ctype: ComponentType,
        expected: Option<&str>,
        registry: &Registry,
    ) -> Result<Value, DeserializeError> {
        if let Some(width) = ctype.fixed_width() {
            self.need(width)?;
        }
        Ok(match ctype {
            ComponentType::Boolean => Value::Boolean(self.reader.read_boolean8()?),
            ComponentType::Char => Value::Char(self.reader.read_u8()?),
            ComponentType::Int16 => Value::Int16(self.reader.read_int16_le()?),
            ComponentType::Int32 => Value::Int32(self.reader.read_int32_le()?),
            ComponentType::Int64 => Value::Int64(self.reader.read_int64_le()?),
            ComponentType::Double => Value::Double(self.reader.read_double_le()?),
            ComponentType::String => Value::String(self.read_str()?.to_owned()),
            ComponentType::Object => Value::Object(self.read_object(expected, registry)?),
            ComponentType::Boxed => Value::Boxed(self.read_blob(Some(true), expected, registry)?),
            ComponentType::CharArray => Value::CharArray(self.read_fixed(|[b]: [u8; 1]| b)?),
            ComponentType::Int16Array => Value::Int16Array(self.read_fixed(i16::from_le_bytes)?),
            ComponentType::Int32Array => Value::Int32Array(self.read_fixed(i32::from_le_bytes)?),
            ComponentType::Int64Array => Value::Int64Array(self.read_fixed(i64::from_le_bytes)?),
            ComponentType::DoubleArray => Value::DoubleArray(self.read_fixed(f64::from_le_bytes)?),
            ComponentType::StringArray => {
                // Every string takes at least its NUL.
                let count = self.read_count(1)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read_str()?.to_owned());
                }
                Value::StringArray(items)
            }
            ComponentType::ObjectArray => {
                let count = self.read_count(1)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read_object(expected, registry)?);
                }
                Value::ObjectArray(items)
            }
            ComponentType::BoxedArray => {
                let count = self.read_count(1)?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    items.push(self.read_blob(Some(true), expected, registry)?);
                }
                Value::BoxedArray(items)
            }
        })
    }

    /// Skips a blob without constructing it; its type need not be registered.
    fn skip_blob(&mut self) -> Result<(), DeserializeError> {
        let (_, outer) = self.enter_object()?;
        let len = self.remaining();
        let skipped = self.reader.skip(len);
        self.leave_object(outer);
        Ok(skipped?)
    }

    fn skip_value(&mut self, ctype: ComponentType) -> Result<(), DeserializeError> {
        if let Some(width) = ctype.fixed_width() {
            self.need(width)?;
            return Ok(self.reader.skip(width)?);
        }
        match ctype {
            ComponentType::String => {
                self.read_cstr()?;
            }
            ComponentType::Object | ComponentType::Boxed => self.skip_blob()?,
            ComponentType::StringArray => {
                let count = self.read_count(1)?;
                for _ in 0..count {
                    self.read_cstr()?;
                }
            }
            ComponentType::ObjectArray | ComponentType::BoxedArray => {
                let count = self.read_count(1)?;
                for _ in 0..count {
                    self.skip_blob()?;
                }
            }
            array => {
                let width = array.item().and_then(ComponentType::fixed_width).unwrap_or(1);
                let count = self.read_count(width)?;
                self.reader.skip(count * width)?;
            }
        }
        Ok(())
    }
}

/// Outcome of a successful top-level read.
#[derive(Debug)]
pub struct Deserialized {
    /// The root object.
    pub object: Box<dyn Serializable>,
    /// Offset of the root blob in the input.
    pub position: usize,
    /// Recoverable problems met on the way.
    pub warnings: Vec<Warning>,
}

impl Deserialized {
    /// Downcasts the root object, returning it with the warnings.
    pub fn downcast<T: Deserialize>(self) -> Result<(T, Vec<Warning>), DeserializeError> {
        let found = self.object.type_name();
        downcast::<T>(self.object)
            .map(|object| (object, self.warnings))
            .ok_or_else(|| DeserializeError::TypeNameMismatch {
                position: self.position,
                expected: T::TYPE_NAME.to_owned(),
                found: found.to_owned(),
            })
    }
}

/// Reads one root blob from `bytes`.
///
/// Bytes after the root object are ignored with [`Warning::TrailingData`].
pub fn deserialize(bytes: &[u8], mode: SizeMode, registry: &Registry) -> Result<Deserialized, DeserializeError> {
    read_root(Unpacker::new(bytes, Encoding::Tagged(mode)), registry)
}

pub(crate) fn read_root(
    mut unpacker: Unpacker<'_>,
    registry: &Registry,
) -> Result<Deserialized, DeserializeError> {
    let position = unpacker.position();
    let object = unpacker.unpack_object(registry)?;
    let left = unpacker.remaining();
    if left > 0 {
        let warning = Warning::TrailingData {
            position: unpacker.position(),
            len: left,
        };
        unpacker.push_warning(warning);
    }
    Ok(Deserialized {
        object,
        position,
        warnings: unpacker.into_warnings(),
    })
}
