// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Component type tags.

use std::fmt;

/// Type of a serialized component.
///
/// Each variant is stored as a single ASCII character after the component
/// name. Upper-case characters are arrays of the corresponding scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// `b`.
    Boolean,
    /// `c`.
    Char,
    /// `h`.
    Int16,
    /// `i`.
    Int32,
    /// `q`.
    Int64,
    /// `d`.
    Double,
    /// `s`, NUL-terminated UTF-8.
    String,
    /// `o`, a nested object blob.
    Object,
    /// `x`, a nested boxed blob.
    Boxed,
    /// `C`.
    CharArray,
    /// `H`.
    Int16Array,
    /// `I`.
    Int32Array,
    /// `Q`.
    Int64Array,
    /// `D`.
    DoubleArray,
    /// `S`.
    StringArray,
    /// `O`.
    ObjectArray,
    /// `X`.
    BoxedArray,
}

impl ComponentType {
    /// Parses a type character.
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            b'b' => Self::Boolean,
            b'c' => Self::Char,
            b'h' => Self::Int16,
            b'i' => Self::Int32,
            b'q' => Self::Int64,
            b'd' => Self::Double,
            b's' => Self::String,
            b'o' => Self::Object,
            b'x' => Self::Boxed,
            b'C' => Self::CharArray,
            b'H' => Self::Int16Array,
            b'I' => Self::Int32Array,
            b'Q' => Self::Int64Array,
            b'D' => Self::DoubleArray,
            b'S' => Self::StringArray,
            b'O' => Self::ObjectArray,
            b'X' => Self::BoxedArray,
            _ => return None,
        })
    }

    /// Maps a GLib fundamental type code used by legacy `GWYO` files.
    ///
    /// Legacy files know no 16-bit integers and no arrays.
    pub fn from_legacy_code(code: u32) -> Option<Self> {
        Some(match code {
            20 => Self::Boolean,
            12 | 16 => Self::Char,
            24 => Self::Int32,
            40 => Self::Int64,
            60 => Self::Double,
            64 => Self::String,
            80 => Self::Object,
            _ => return None,
        })
    }

    /// Type character written to the stream.
    pub fn tag(self) -> u8 {
        match self {
            Self::Boolean => b'b',
            Self::Char => b'c',
            Self::Int16 => b'h',
            Self::Int32 => b'i',
            Self::Int64 => b'q',
            Self::Double => b'd',
            Self::String => b's',
            Self::Object => b'o',
            Self::Boxed => b'x',
            Self::CharArray => b'C',
            Self::Int16Array => b'H',
            Self::Int32Array => b'I',
            Self::Int64Array => b'Q',
            Self::DoubleArray => b'D',
            Self::StringArray => b'S',
            Self::ObjectArray => b'O',
            Self::BoxedArray => b'X',
        }
    }

    /// Whether the value is a count followed by items.
    pub fn is_array(self) -> bool {
        self.tag().is_ascii_uppercase()
    }

    /// Item type of an array, `None` for scalars.
    pub fn item(self) -> Option<Self> {
        Some(match self {
            Self::CharArray => Self::Char,
            Self::Int16Array => Self::Int16,
            Self::Int32Array => Self::Int32,
            Self::Int64Array => Self::Int64,
            Self::DoubleArray => Self::Double,
            Self::StringArray => Self::String,
            Self::ObjectArray => Self::Object,
            Self::BoxedArray => Self::Boxed,
            _ => return None,
        })
    }

    /// Width of a fixed-size scalar, `None` for strings, blobs and arrays.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Boolean | Self::Char => Some(1),
            Self::Int16 => Some(2),
            Self::Int32 => Some(4),
            Self::Int64 | Self::Double => Some(8),
            _ => None,
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", char::from(self.tag()))
    }
}
