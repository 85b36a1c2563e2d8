// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounds-checked cursor with typed readers.

use crate::error::PackError;
use crate::format::ByteOrder;
use crate::real::{decode_pascal_real, PASCAL_REAL_SIZE};

macro_rules! typed_readers {
    ($($(#[$doc:meta])* $name:ident => $ty:ty, $conv:ident;)*) => {
        $(
            $(#[$doc])*
            pub fn $name(&mut self) -> Result<$ty, PackError> {
                Ok(<$ty>::$conv(self.array()?))
            }
        )*
    };
}

/// Cursor over a byte slice.
///
/// Every read checks the remaining length first and leaves the cursor
/// untouched on failure.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    /// Creates a reader positioned at the start of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Current offset from the start of the underlying slice.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Whether the cursor reached the end.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread tail.
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }

    /// Consumes `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], PackError> {
        let truncated = PackError::Truncated {
            offset: self.offset,
            needed: len,
            available: self.remaining(),
        };
        let end = self.offset.checked_add(len).ok_or_else(|| truncated.clone())?;
        if end > self.bytes.len() {
            return Err(truncated);
        }
        let out = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(out)
    }

    /// Skips `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<(), PackError> {
        self.take(len).map(|_| ())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], PackError> {
        let chunk = self.take(N)?;
        let mut raw = [0u8; N];
        raw.copy_from_slice(chunk);
        Ok(raw)
    }

    /// Reads bytes up to a NUL and consumes the terminator.
    ///
    /// The returned slice excludes the NUL.
    pub fn read_cstr(&mut self) -> Result<&'a [u8], PackError> {
        let start = self.offset;
        let len = self
            .rest()
            .iter()
            .position(|&b| b == 0)
            .ok_or(PackError::UnterminatedString { offset: start })?;
        let out = self.take(len)?;
        self.offset += 1;
        Ok(out)
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8, PackError> {
        Ok(self.array::<1>()?[0])
    }

    /// Reads one signed byte.
    pub fn read_i8(&mut self) -> Result<i8, PackError> {
        Ok(i8::from_le_bytes(self.array()?))
    }

    /// Reads a one-byte boolean; any nonzero byte is `true`.
    pub fn read_boolean8(&mut self) -> Result<bool, PackError> {
        Ok(self.read_u8()? != 0)
    }

    typed_readers! {
        /// Reads a little-endian `i16`.
        read_int16_le => i16, from_le_bytes;
        /// Reads a big-endian `i16`.
        read_int16_be => i16, from_be_bytes;
        /// Reads a little-endian `u16`.
        read_uint16_le => u16, from_le_bytes;
        /// Reads a big-endian `u16`.
        read_uint16_be => u16, from_be_bytes;
        /// Reads a little-endian `i32`.
        read_int32_le => i32, from_le_bytes;
        /// Reads a big-endian `i32`.
        read_int32_be => i32, from_be_bytes;
        /// Reads a little-endian `u32`.
        read_uint32_le => u32, from_le_bytes;
        /// Reads a big-endian `u32`.
        read_uint32_be => u32, from_be_bytes;
        /// Reads a little-endian `i64`.
        read_int64_le => i64, from_le_bytes;
        /// Reads a big-endian `i64`.
        read_int64_be => i64, from_be_bytes;
        /// Reads a little-endian `u64`.
        read_uint64_le => u64, from_le_bytes;
        /// Reads a big-endian `u64`.
        read_uint64_be => u64, from_be_bytes;
        /// Reads a little-endian IEEE single.
        read_float_le => f32, from_le_bytes;
        /// Reads a big-endian IEEE single.
        read_float_be => f32, from_be_bytes;
        /// Reads a little-endian IEEE double.
        read_double_le => f64, from_le_bytes;
        /// Reads a big-endian IEEE double.
        read_double_be => f64, from_be_bytes;
    }

    /// Reads a little-endian Pascal real.
    pub fn read_pascal_real_le(&mut self) -> Result<f64, PackError> {
        self.read_pascal_real(ByteOrder::Little)
    }

    /// Reads a big-endian Pascal real.
    pub fn read_pascal_real_be(&mut self) -> Result<f64, PackError> {
        self.read_pascal_real(ByteOrder::Big)
    }

    /// Reads a Pascal real in the given order.
    pub fn read_pascal_real(&mut self, order: ByteOrder) -> Result<f64, PackError> {
        let raw: [u8; PASCAL_REAL_SIZE] = self.array()?;
        Ok(decode_pascal_real(raw, order))
    }

    /// Reads an `i16` in the given order.
    pub fn read_i16(&mut self, order: ByteOrder) -> Result<i16, PackError> {
        match order {
            ByteOrder::Little => self.read_int16_le(),
            ByteOrder::Big => self.read_int16_be(),
        }
    }

    /// Reads a `u16` in the given order.
    pub fn read_u16(&mut self, order: ByteOrder) -> Result<u16, PackError> {
        match order {
            ByteOrder::Little => self.read_uint16_le(),
            ByteOrder::Big => self.read_uint16_be(),
        }
    }

    /// Reads an `i32` in the given order.
    pub fn read_i32(&mut self, order: ByteOrder) -> Result<i32, PackError> {
        match order {
            ByteOrder::Little => self.read_int32_le(),
            ByteOrder::Big => self.read_int32_be(),
        }
    }

    /// Reads a `u32` in the given order.
    pub fn read_u32(&mut self, order: ByteOrder) -> Result<u32, PackError> {
        match order {
            ByteOrder::Little => self.read_uint32_le(),
            ByteOrder::Big => self.read_uint32_be(),
        }
    }

    /// Reads an `i64` in the given order.
    pub fn read_i64(&mut self, order: ByteOrder) -> Result<i64, PackError> {
        match order {
            ByteOrder::Little => self.read_int64_le(),
            ByteOrder::Big => self.read_int64_be(),
        }
    }

    /// Reads a `u64` in the given order.
    pub fn read_u64(&mut self, order: ByteOrder) -> Result<u64, PackError> {
        match order {
            ByteOrder::Little => self.read_uint64_le(),
            ByteOrder::Big => self.read_uint64_be(),
        }
    }

    /// Reads an `f32` in the given order.
    pub fn read_f32(&mut self, order: ByteOrder) -> Result<f32, PackError> {
        match order {
            ByteOrder::Little => self.read_float_le(),
            ByteOrder::Big => self.read_float_be(),
        }
    }

    /// Reads an `f64` in the given order.
    pub fn read_f64(&mut self, order: ByteOrder) -> Result<f64, PackError> {
        match order {
            ByteOrder::Little => self.read_double_le(),
            ByteOrder::Big => self.read_double_be(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn failed_read_does_not_move_cursor() {
        let mut reader = Reader::new(&[1, 2, 3]);
        assert_eq!(reader.read_uint16_le().unwrap(), 0x0201);
        let err = reader.read_uint32_le().unwrap_err();
        assert_eq!(
            err,
            PackError::Truncated {
                offset: 2,
                needed: 4,
                available: 1
            }
        );
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.read_u8().unwrap(), 3);
        assert!(reader.is_empty());
    }

    #[test]
    fn cstr_stops_at_nul() {
        let mut reader = Reader::new(b"abc\0def");
        assert_eq!(reader.read_cstr().unwrap(), b"abc");
        assert_eq!(reader.position(), 4);
        assert_eq!(
            reader.read_cstr().unwrap_err(),
            PackError::UnterminatedString { offset: 4 }
        );
    }

    #[test]
    fn huge_take_is_rejected() {
        let mut reader = Reader::new(&[0; 4]);
        reader.skip(1).unwrap();
        assert!(reader.take(usize::MAX).is_err());
        assert_eq!(reader.position(), 1);
    }
}
