// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Packing and unpacking of value lists.

use crate::error::PackError;
use crate::format::{ByteOrder, Directive, Format};
use crate::read::Reader;
use crate::real::encode_pascal_real;

/// A value moved through [`pack`] and [`unpack`].
///
/// `r` (Pascal real) uses [`PackValue::F64`] like `d`; `S` uses
/// [`PackValue::Bytes`]; `s` and `p` use [`PackValue::Str`].
#[derive(Debug, Clone, PartialEq)]
pub enum PackValue {
    /// `b`/`B`.
    Bool(bool),
    /// `c`.
    I8(i8),
    /// `C`.
    U8(u8),
    /// `h`.
    I16(i16),
    /// `H`.
    U16(u16),
    /// `i`.
    I32(i32),
    /// `I`.
    U32(u32),
    /// `q`.
    I64(i64),
    /// `Q`.
    U64(u64),
    /// `f`.
    F32(f32),
    /// `d` and `r`.
    F64(f64),
    /// `S`.
    Bytes(Vec<u8>),
    /// `s` and `p`.
    Str(String),
}

impl PackValue {
    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I8(_) => "i8",
            Self::U8(_) => "u8",
            Self::I16(_) => "i16",
            Self::U16(_) => "u16",
            Self::I32(_) => "i32",
            Self::U32(_) => "u32",
            Self::I64(_) => "i64",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Bytes(_) => "bytes",
            Self::Str(_) => "string",
        }
    }
}

fn expected_kind(directive: Directive) -> &'static str {
    match directive {
        Directive::Pad => "nothing",
        Directive::Bool => "bool",
        Directive::I8 => "i8",
        Directive::U8 => "u8",
        Directive::I16 => "i16",
        Directive::U16 => "u16",
        Directive::I32 => "i32",
        Directive::U32 => "u32",
        Directive::I64 => "i64",
        Directive::U64 => "u64",
        Directive::F32 => "f32",
        Directive::F64 | Directive::PascalReal => "f64",
        Directive::Bytes => "bytes",
        Directive::CString | Directive::PascalString => "string",
    }
}

/// Writer over a caller-provided buffer that checks capacity before copying.
struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl SliceWriter<'_> {
    fn put(&mut self, bytes: &[u8]) -> Result<(), PackError> {
        let available = self.buf.len() - self.pos;
        if bytes.len() > available {
            return Err(PackError::Truncated {
                offset: self.pos,
                needed: bytes.len(),
                available,
            });
        }
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    fn zeros(&mut self, len: usize) -> Result<(), PackError> {
        let available = self.buf.len() - self.pos;
        if len > available {
            return Err(PackError::Truncated {
                offset: self.pos,
                needed: len,
                available,
            });
        }
        self.buf[self.pos..self.pos + len].fill(0);
        self.pos += len;
        Ok(())
    }
}

macro_rules! ordered {
    ($value:expr, $order:expr) => {
        match $order {
            ByteOrder::Little => $value.to_le_bytes(),
            ByteOrder::Big => $value.to_be_bytes(),
        }
    };
}

fn pack_one(
    out: &mut SliceWriter<'_>,
    order: ByteOrder,
    directive: Directive,
    width: usize,
    index: usize,
    value: &PackValue,
) -> Result<(), PackError> {
    let mismatch = || PackError::ArgumentType {
        index,
        directive: directive.as_char(),
        expected: expected_kind(directive),
        found: value.kind(),
    };
    match (directive, value) {
        (Directive::Bool, PackValue::Bool(v)) => out.put(&[u8::from(*v)]),
        (Directive::I8, PackValue::I8(v)) => out.put(&v.to_le_bytes()),
        (Directive::U8, PackValue::U8(v)) => out.put(&[*v]),
        (Directive::I16, PackValue::I16(v)) => out.put(&ordered!(v, order)),
        (Directive::U16, PackValue::U16(v)) => out.put(&ordered!(v, order)),
        (Directive::I32, PackValue::I32(v)) => out.put(&ordered!(v, order)),
        (Directive::U32, PackValue::U32(v)) => out.put(&ordered!(v, order)),
        (Directive::I64, PackValue::I64(v)) => out.put(&ordered!(v, order)),
        (Directive::U64, PackValue::U64(v)) => out.put(&ordered!(v, order)),
        (Directive::F32, PackValue::F32(v)) => out.put(&ordered!(v, order)),
        (Directive::F64, PackValue::F64(v)) => out.put(&ordered!(v, order)),
        (Directive::PascalReal, PackValue::F64(v)) => out.put(&encode_pascal_real(*v, order)?),
        (Directive::Bytes, PackValue::Bytes(v)) => {
            if v.len() != width {
                return Err(PackError::BufferLength {
                    index,
                    expected: width,
                    found: v.len(),
                });
            }
            out.put(v)
        }
        (Directive::CString, PackValue::Str(v)) => {
            if v.as_bytes().contains(&0) {
                return Err(PackError::InteriorNul { index });
            }
            out.put(v.as_bytes())?;
            out.put(&[0])
        }
        (Directive::PascalString, PackValue::Str(v)) => {
            let len = u8::try_from(v.len()).map_err(|_| PackError::StringTooLong { len: v.len() })?;
            out.put(&[len])?;
            out.put(v.as_bytes())
        }
        _ => Err(mismatch()),
    }
}

/// Packs `values` into `buffer` according to `format`.
///
/// Returns the number of bytes written. The value list must match the
/// format exactly; capacity is checked before each item is written.
pub fn pack(format: &str, values: &[PackValue], buffer: &mut [u8]) -> Result<usize, PackError> {
    let format = Format::parse(format)?;
    let expected = format.value_count();
    if values.len() != expected {
        return Err(PackError::ArgumentCount {
            expected,
            found: values.len(),
        });
    }

    let mut out = SliceWriter { buf: buffer, pos: 0 };
    let mut next = 0usize;
    for item in format.items() {
        match item.directive {
            Directive::Pad => out.zeros(item.count)?,
            Directive::Bytes => {
                pack_one(&mut out, format.order(), item.directive, item.count, next, &values[next])?;
                next += 1;
            }
            directive => {
                for _ in 0..item.count {
                    pack_one(&mut out, format.order(), directive, 1, next, &values[next])?;
                    next += 1;
                }
            }
        }
    }
    Ok(out.pos)
}

/// Packs `values` into a freshly allocated buffer of the exact size.
pub fn pack_to_vec(format: &str, values: &[PackValue]) -> Result<Vec<u8>, PackError> {
    let parsed = Format::parse(format)?;
    if values.len() != parsed.value_count() {
        return Err(PackError::ArgumentCount {
            expected: parsed.value_count(),
            found: values.len(),
        });
    }
    let minimum = parsed.size();
    let extra: usize = values
        .iter()
        .map(|v| match v {
            PackValue::Str(s) => s.len(),
            _ => 0,
        })
        .sum();
    let mut buffer = vec![0u8; minimum + extra];
    let written = pack(format, values, &mut buffer)?;
    buffer.truncate(written);
    Ok(buffer)
}

fn unpack_string(reader: &mut Reader<'_>, directive: Directive) -> Result<String, PackError> {
    let offset = reader.position();
    let raw = match directive {
        Directive::PascalString => {
            let len = usize::from(reader.read_u8()?);
            reader.take(len)?
        }
        _ => reader.read_cstr()?,
    };
    String::from_utf8(raw.to_vec()).map_err(|_| PackError::InvalidUtf8 { offset })
}

fn unpack_one(
    reader: &mut Reader<'_>,
    order: ByteOrder,
    directive: Directive,
) -> Result<PackValue, PackError> {
    Ok(match directive {
        Directive::Bool => PackValue::Bool(reader.read_boolean8()?),
        Directive::I8 => PackValue::I8(reader.read_i8()?),
        Directive::U8 => PackValue::U8(reader.read_u8()?),
        Directive::I16 => PackValue::I16(reader.read_i16(order)?),
        Directive::U16 => PackValue::U16(reader.read_u16(order)?),
        Directive::I32 => PackValue::I32(reader.read_i32(order)?),
        Directive::U32 => PackValue::U32(reader.read_u32(order)?),
        Directive::I64 => PackValue::I64(reader.read_i64(order)?),
        Directive::U64 => PackValue::U64(reader.read_u64(order)?),
        Directive::F32 => PackValue::F32(reader.read_f32(order)?),
        Directive::F64 => PackValue::F64(reader.read_f64(order)?),
        Directive::PascalReal => PackValue::F64(reader.read_pascal_real(order)?),
        Directive::CString | Directive::PascalString => {
            PackValue::Str(unpack_string(reader, directive)?)
        }
        // Handled by the caller, they span the whole item.
        Directive::Pad | Directive::Bytes => PackValue::Bytes(Vec::new()),
    })
}

/// Unpacks values from `bytes` according to `format`.
///
/// Returns the decoded values and the number of bytes consumed.
pub fn unpack(format: &str, bytes: &[u8]) -> Result<(Vec<PackValue>, usize), PackError> {
    let format = Format::parse(format)?;
    let mut reader = Reader::new(bytes);
    let mut values = Vec::with_capacity(format.value_count().min(bytes.len()));
    for item in format.items() {
        match item.directive {
            Directive::Pad => reader.skip(item.count)?,
            Directive::Bytes => values.push(PackValue::Bytes(reader.take(item.count)?.to_vec())),
            directive => {
                for _ in 0..item.count {
                    values.push(unpack_one(&mut reader, format.order(), directive)?);
                }
            }
        }
    }
    Ok((values, reader.position()))
}
