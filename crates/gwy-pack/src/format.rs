// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Format-string parsing.
//!
//! A format is an optional byte-order marker followed by directives, each
//! optionally prefixed with a decimal count:
//!
//! ```text
//! <x d r i 2h 13x q Q 5S
//! ```
//!
//! For `S` the count is the buffer width; for every other directive it is a
//! repetition. Whitespace is ignored.

use tracing::warn;

use crate::error::PackError;

/// Largest count accepted before the next digit is folded in.
const MAX_COUNT: usize = 100_000_000;

/// Byte order of multi-byte items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    /// Least significant byte first (`<`).
    Little,
    /// Most significant byte first (`>`).
    Big,
}

impl ByteOrder {
    /// Byte order of the host.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::Little;
    /// Byte order of the host.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::Big;

    /// Maps a marker character to a byte order.
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b'<' => Some(Self::Little),
            b'>' => Some(Self::Big),
            _ => None,
        }
    }

    /// Marker character for this byte order.
    pub fn marker(self) -> char {
        match self {
            Self::Little => '<',
            Self::Big => '>',
        }
    }
}

/// A single directive of the mini-language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// `x`: zero padding byte, no value.
    Pad,
    /// `b`/`B`: one-byte boolean.
    Bool,
    /// `c`: signed byte.
    I8,
    /// `C`: unsigned byte.
    U8,
    /// `h`: signed 16-bit integer.
    I16,
    /// `H`: unsigned 16-bit integer.
    U16,
    /// `i`: signed 32-bit integer.
    I32,
    /// `I`: unsigned 32-bit integer.
    U32,
    /// `q`: signed 64-bit integer.
    I64,
    /// `Q`: unsigned 64-bit integer.
    U64,
    /// `f`: IEEE single.
    F32,
    /// `d`: IEEE double.
    F64,
    /// `r`: six-byte Pascal real.
    PascalReal,
    /// `S`: fixed-width byte buffer.
    Bytes,
    /// `s`: NUL-terminated string.
    CString,
    /// `p`: length-prefixed string.
    PascalString,
}

impl Directive {
    /// Parses a directive character.
    pub fn from_char(ch: u8) -> Option<Self> {
        Some(match ch {
            b'x' => Self::Pad,
            b'b' | b'B' => Self::Bool,
            b'c' => Self::I8,
            b'C' => Self::U8,
            b'h' => Self::I16,
            b'H' => Self::U16,
            b'i' => Self::I32,
            b'I' => Self::U32,
            b'q' => Self::I64,
            b'Q' => Self::U64,
            b'f' => Self::F32,
            b'd' => Self::F64,
            b'r' => Self::PascalReal,
            b'S' => Self::Bytes,
            b's' => Self::CString,
            b'p' => Self::PascalString,
            _ => return None,
        })
    }

    /// Canonical directive character.
    pub fn as_char(self) -> char {
        match self {
            Self::Pad => 'x',
            Self::Bool => 'b',
            Self::I8 => 'c',
            Self::U8 => 'C',
            Self::I16 => 'h',
            Self::U16 => 'H',
            Self::I32 => 'i',
            Self::U32 => 'I',
            Self::I64 => 'q',
            Self::U64 => 'Q',
            Self::F32 => 'f',
            Self::F64 => 'd',
            Self::PascalReal => 'r',
            Self::Bytes => 'S',
            Self::CString => 's',
            Self::PascalString => 'p',
        }
    }

    /// Packed width of one item.
    ///
    /// Variable-width strings report their minimum: the terminating NUL for
    /// `s`, the length byte for `p`.
    pub fn width(self) -> usize {
        match self {
            Self::Pad
            | Self::Bool
            | Self::I8
            | Self::U8
            | Self::Bytes
            | Self::CString
            | Self::PascalString => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
            Self::PascalReal => 6,
        }
    }
}

/// A directive with its count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    /// The directive.
    pub directive: Directive,
    /// Repetition, or buffer width for [`Directive::Bytes`].
    pub count: usize,
}

impl Item {
    /// Minimum packed size of the item.
    pub fn size(&self) -> usize {
        self.directive.width().saturating_mul(self.count)
    }

    /// Number of values the item consumes or produces.
    pub fn values(&self) -> usize {
        match self.directive {
            Directive::Pad => 0,
            Directive::Bytes => 1,
            _ => self.count,
        }
    }
}

/// A parsed format string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    order: ByteOrder,
    items: Vec<Item>,
}

impl Format {
    /// Parses a format string.
    ///
    /// Without a leading `<` or `>` the host byte order is used. A count of
    /// zero is treated as one and logged.
    pub fn parse(format: &str) -> Result<Self, PackError> {
        let bytes = format.as_bytes();
        let (order, start) = match bytes.first().copied().and_then(ByteOrder::from_marker) {
            Some(order) => (order, 1),
            None => (ByteOrder::NATIVE, 0),
        };

        let mut items = Vec::new();
        let mut count: Option<usize> = None;
        for (position, &ch) in bytes.iter().enumerate().skip(start) {
            if ch.is_ascii_digit() {
                let so_far = count.unwrap_or(0);
                if so_far > MAX_COUNT {
                    return Err(PackError::CountOverflow { position });
                }
                count = Some(10 * so_far + usize::from(ch - b'0'));
                continue;
            }
            if ch.is_ascii_whitespace() {
                if count.is_some() {
                    return Err(PackError::InvalidFormatChar { ch, position });
                }
                continue;
            }
            let directive =
                Directive::from_char(ch).ok_or(PackError::InvalidFormatChar { ch, position })?;
            let count = match count.take() {
                Some(0) => {
                    warn!(position, "zero count in pack format, using 1");
                    1
                }
                Some(n) => n,
                None => 1,
            };
            items.push(Item { directive, count });
        }
        if count.is_some() {
            return Err(PackError::TrailingCount);
        }

        Ok(Self { order, items })
    }

    /// Byte order of the format.
    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Parsed items in order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Minimum packed size in bytes.
    pub fn size(&self) -> usize {
        self.items
            .iter()
            .fold(0usize, |acc, item| acc.saturating_add(item.size()))
    }

    /// Number of values the format consumes or produces.
    pub fn value_count(&self) -> usize {
        self.items.iter().map(Item::values).sum()
    }
}

/// Computes the packed size of a format without touching any buffer.
///
/// Strings (`s`, `p`) count with their minimum width of one byte.
pub fn pack_size(format: &str) -> Result<usize, PackError> {
    Ok(Format::parse(format)?.size())
}
