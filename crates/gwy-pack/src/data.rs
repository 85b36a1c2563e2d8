// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bulk conversion of raw numeric arrays to `f64`.
//!
//! File importers typically find a block of N samples of one type and want
//! them scaled into a double array; [`unpack_data`] does that in one pass.

use crate::error::PackError;
use crate::format::ByteOrder;
use crate::read::Reader;

/// Raw item type of a numeric block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    /// `c`.
    I8,
    /// `C`.
    U8,
    /// `h`.
    I16,
    /// `H`.
    U16,
    /// `i`.
    I32,
    /// `I`.
    U32,
    /// `q`.
    I64,
    /// `Q`.
    U64,
    /// `f`.
    F32,
    /// `d`.
    F64,
    /// `r`.
    PascalReal,
}

impl RawKind {
    /// Maps a pack directive character to a raw kind.
    pub fn from_char(ch: char) -> Option<Self> {
        Some(match ch {
            'c' => Self::I8,
            'C' => Self::U8,
            'h' => Self::I16,
            'H' => Self::U16,
            'i' => Self::I32,
            'I' => Self::U32,
            'q' => Self::I64,
            'Q' => Self::U64,
            'f' => Self::F32,
            'd' => Self::F64,
            'r' => Self::PascalReal,
            _ => return None,
        })
    }

    /// Width of one raw item.
    pub fn width(self) -> usize {
        match self {
            Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
            Self::PascalReal => 6,
        }
    }
}

/// Layout and scaling for [`unpack_data`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawLayout {
    /// Byte order of the raw items.
    pub order: ByteOrder,
    /// Raw item type.
    pub kind: RawKind,
    /// Distance between consecutive outputs, in items. Zero acts as one.
    pub stride: usize,
    /// Multiplier applied to each raw value.
    pub factor: f64,
    /// Constant added after scaling.
    pub shift: f64,
}

impl RawLayout {
    /// Unscaled, contiguous layout.
    pub fn new(order: ByteOrder, kind: RawKind) -> Self {
        Self {
            order,
            kind,
            stride: 1,
            factor: 1.0,
            shift: 0.0,
        }
    }

    /// Sets the output stride.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    /// Sets `factor` and `shift`.
    pub fn with_scaling(mut self, factor: f64, shift: f64) -> Self {
        self.factor = factor;
        self.shift = shift;
        self
    }
}

#[allow(clippy::cast_precision_loss)]
fn read_raw(reader: &mut Reader<'_>, layout: &RawLayout) -> Result<f64, PackError> {
    let order = layout.order;
    Ok(match layout.kind {
        RawKind::I8 => f64::from(reader.read_i8()?),
        RawKind::U8 => f64::from(reader.read_u8()?),
        RawKind::I16 => f64::from(reader.read_i16(order)?),
        RawKind::U16 => f64::from(reader.read_u16(order)?),
        RawKind::I32 => f64::from(reader.read_i32(order)?),
        RawKind::U32 => f64::from(reader.read_u32(order)?),
        RawKind::I64 => reader.read_i64(order)? as f64,
        RawKind::U64 => reader.read_u64(order)? as f64,
        RawKind::F32 => f64::from(reader.read_f32(order)?),
        RawKind::F64 => reader.read_f64(order)?,
        RawKind::PascalReal => reader.read_pascal_real(order)?,
    })
}

/// Converts `count` raw items from `bytes` into `out`.
///
/// Item `k` is stored at `out[k * stride]` as `raw * factor + shift`.
/// Both the input length and the output capacity are checked before
/// anything is written. Returns the number of input bytes consumed.
pub fn unpack_data(
    layout: &RawLayout,
    bytes: &[u8],
    count: usize,
    out: &mut [f64],
) -> Result<usize, PackError> {
    if count == 0 {
        return Ok(0);
    }
    let stride = layout.stride.max(1);
    let needed_bytes = count.saturating_mul(layout.kind.width());
    if needed_bytes > bytes.len() {
        return Err(PackError::Truncated {
            offset: 0,
            needed: needed_bytes,
            available: bytes.len(),
        });
    }
    let needed_slots = (count - 1).saturating_mul(stride).saturating_add(1);
    if needed_slots > out.len() {
        return Err(PackError::OutputTooShort {
            needed: needed_slots,
            available: out.len(),
        });
    }

    let mut reader = Reader::new(bytes);
    for slot in out.iter_mut().step_by(stride).take(count) {
        *slot = read_raw(&mut reader, layout)? * layout.factor + layout.shift;
    }
    Ok(reader.position())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn scales_big_endian_shorts_with_stride() {
        let raw = [0x00, 0x01, 0xff, 0xff, 0x00, 0x10];
        let mut out = [0.0f64; 5];
        let layout = RawLayout::new(ByteOrder::Big, RawKind::I16)
            .with_stride(2)
            .with_scaling(0.5, 1.0);
        let consumed = unpack_data(&layout, &raw, 3, &mut out).unwrap();
        assert_eq!(consumed, 6);
        assert_eq!(out, [1.5, 0.0, 0.5, 0.0, 9.0]);
    }

    #[test]
    fn output_capacity_is_checked_first() {
        let raw = [0u8; 8];
        let mut out = [7.0f64; 3];
        let layout = RawLayout::new(ByteOrder::Little, RawKind::U16).with_stride(2);
        let err = unpack_data(&layout, &raw, 3, &mut out).unwrap_err();
        assert_eq!(err, PackError::OutputTooShort { needed: 5, available: 3 });
        assert_eq!(out, [7.0; 3]);
    }

    #[test]
    fn input_length_is_checked_first() {
        let mut out = [0.0f64; 2];
        let layout = RawLayout::new(ByteOrder::Little, RawKind::F64);
        assert!(matches!(
            unpack_data(&layout, &[0u8; 12], 2, &mut out),
            Err(PackError::Truncated { needed: 16, .. })
        ));
    }

    #[test]
    fn pascal_reals_convert() {
        let raw = [0x81, 0, 0, 0, 0, 0, 0x82, 0, 0, 0, 0, 0x80];
        let mut out = [0.0f64; 2];
        let layout = RawLayout::new(ByteOrder::Little, RawKind::PascalReal);
        unpack_data(&layout, &raw, 2, &mut out).unwrap();
        assert_eq!(out, [1.0, -2.0]);
    }

    #[test]
    fn kind_characters_map() {
        assert_eq!(RawKind::from_char('r'), Some(RawKind::PascalReal));
        assert_eq!(RawKind::from_char('s'), None);
        assert_eq!(RawKind::U64.width(), 8);
    }
}
