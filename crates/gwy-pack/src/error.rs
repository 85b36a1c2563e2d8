// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Errors produced by format parsing, packing and unpacking.

use thiserror::Error;

/// Errors that can occur while parsing a format string or moving bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PackError {
    /// A directive character outside the format alphabet.
    #[error("invalid format character 0x{ch:02x} at position {position}")]
    InvalidFormatChar {
        /// The offending byte of the format string.
        ch: u8,
        /// Index of the byte within the format string.
        position: usize,
    },

    /// A repeat count grew beyond the permitted maximum.
    #[error("item count overflow at position {position}")]
    CountOverflow {
        /// Index of the digit that overflowed.
        position: usize,
    },

    /// The format string ends with a count and no directive.
    #[error("format ends with a count")]
    TrailingCount,

    /// Not enough bytes left in the buffer.
    #[error("buffer too short: need {needed} bytes at offset {offset}, {available} available")]
    Truncated {
        /// Cursor position where the access was attempted.
        offset: usize,
        /// Number of bytes the access needed.
        needed: usize,
        /// Number of bytes remaining from `offset`.
        available: usize,
    },

    /// The number of values does not match the format.
    #[error("format expects {expected} values, got {found}")]
    ArgumentCount {
        /// Values implied by the format.
        expected: usize,
        /// Values supplied.
        found: usize,
    },

    /// A value has the wrong type for its directive.
    #[error("value {index} is {found}, directive '{directive}' expects {expected}")]
    ArgumentType {
        /// Position of the value in the argument list.
        index: usize,
        /// Directive character the value was matched against.
        directive: char,
        /// Name of the expected value type.
        expected: &'static str,
        /// Name of the supplied value type.
        found: &'static str,
    },

    /// A fixed-width `S` buffer of the wrong length.
    #[error("value {index} has {found} bytes, fixed buffer is {expected} bytes")]
    BufferLength {
        /// Position of the value in the argument list.
        index: usize,
        /// Width from the format.
        expected: usize,
        /// Length of the supplied buffer.
        found: usize,
    },

    /// A Pascal string longer than its one-byte length prefix allows.
    #[error("Pascal string is longer than 255 bytes ({len})")]
    StringTooLong {
        /// Length of the rejected string.
        len: usize,
    },

    /// A C string value contains an interior NUL.
    #[error("value {index} contains a NUL byte")]
    InteriorNul {
        /// Position of the value in the argument list.
        index: usize,
    },

    /// A NUL-terminated string runs past the end of the buffer.
    #[error("string at offset {offset} does not end within buffer")]
    UnterminatedString {
        /// Offset where the string starts.
        offset: usize,
    },

    /// Unpacked string bytes are not UTF-8.
    #[error("string at offset {offset} is not valid UTF-8")]
    InvalidUtf8 {
        /// Offset where the string starts.
        offset: usize,
    },

    /// The bulk conversion target cannot hold all items.
    #[error("output holds {available} slots, {needed} needed")]
    OutputTooShort {
        /// Slots required by count and stride.
        needed: usize,
        /// Slots available.
        available: usize,
    },

    /// NaN has no Pascal real encoding.
    #[error("NaN cannot be represented as a Pascal real")]
    NotRepresentable,
}
