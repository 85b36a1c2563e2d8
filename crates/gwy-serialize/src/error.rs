// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error and warning types.

use std::fmt;

use gwy_pack::PackError;
use thiserror::Error;

use crate::ctype::ComponentType;

/// Fatal failures while reconstructing objects from bytes.
///
/// Positions are absolute offsets into the buffer handed to the
/// deserializer, magic header included.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeserializeError {
    /// A read needed more bytes than the buffer holds.
    #[error("at {position}: need {needed} bytes, only {available} remain")]
    Truncated {
        /// Where the read started.
        position: usize,
        /// Bytes the read needed.
        needed: usize,
        /// Bytes left in the enclosing buffer.
        available: usize,
    },

    /// A blob carries a different type name than the reader expected.
    #[error("at {position}: expected object of type {expected}, found {found}")]
    TypeNameMismatch {
        /// Start of the type name.
        position: usize,
        /// Type the caller asked for.
        expected: String,
        /// Type stored in the blob.
        found: String,
    },

    /// Component data runs past the declared object size.
    #[error("at {position}: component data runs past the object end at {end}")]
    SizeMismatch {
        /// Where the overrunning read started.
        position: usize,
        /// End of the object as declared by its size.
        end: usize,
    },

    /// A type character (or legacy type code) outside the known set.
    #[error("at {position}: unknown component type tag 0x{tag:02x}")]
    UnknownTypeTag {
        /// Position of the tag.
        position: usize,
        /// The raw tag value.
        tag: u32,
    },

    /// The blob names a type nobody registered.
    #[error("at {position}: type {type_name} is not registered")]
    UnknownType {
        /// Start of the type name.
        position: usize,
        /// The unregistered type.
        type_name: String,
    },

    /// A component name appearing twice in one object.
    #[error("at {position}: component {component} of {type_name} appears more than once")]
    DuplicateComponent {
        /// Start of the second occurrence.
        position: usize,
        /// Owning object type.
        type_name: String,
        /// Component name.
        component: String,
    },

    /// A name or string without a NUL before the end of its enclosure.
    #[error("at {position}: string is not terminated before the end of data")]
    RunawayString {
        /// Start of the string.
        position: usize,
    },

    /// A string that is not valid UTF-8.
    #[error("at {position}: string is not valid UTF-8")]
    InvalidUtf8 {
        /// Start of the string.
        position: usize,
    },

    /// A size or array count that cannot be addressed on this platform.
    #[error("at {position}: count {count} is too large")]
    CountOverflow {
        /// Position of the count.
        position: usize,
        /// The stored count.
        count: u64,
    },

    /// The file does not start with a known magic header.
    #[error("unknown file magic {found:02x?}")]
    BadMagic {
        /// Up to four leading bytes of the file.
        found: Vec<u8>,
    },

    /// Two co-arrays of one object differ in length.
    #[error("{type_name}: {first} has {first_len} items but {second} has {second_len}")]
    LengthMismatch {
        /// Owning object type.
        type_name: &'static str,
        /// First component name.
        first: &'static str,
        /// Length of the first component.
        first_len: usize,
        /// Second component name.
        second: &'static str,
        /// Length of the second component.
        second_len: usize,
    },

    /// An array whose length must be a multiple of a stride.
    #[error("Data length of {type_name} is {len} which is not a multiple of {stride}")]
    LengthNotMultiple {
        /// Owning object type.
        type_name: &'static str,
        /// Component name.
        component: &'static str,
        /// Stored length.
        len: usize,
        /// Required stride.
        stride: usize,
    },

    /// An array whose length is fixed by its type.
    #[error("{type_name}: {component} has {found} items, expected exactly {expected}")]
    FixedLength {
        /// Owning object type.
        type_name: &'static str,
        /// Component name.
        component: &'static str,
        /// Required length.
        expected: usize,
        /// Stored length.
        found: usize,
    },

    /// An object stored where a boxed value belongs, or vice versa.
    #[error("at {position}: {type_name} is {}, stored as the other kind", kind_text(.boxed))]
    KindMismatch {
        /// Start of the blob.
        position: usize,
        /// Type of the blob.
        type_name: String,
        /// Whether the registered type is boxed.
        boxed: bool,
    },

    /// Objects nested deeper than the reader allows.
    #[error("at {position}: objects nested deeper than {limit} levels")]
    NestingTooDeep {
        /// Start of the blob that crossed the limit.
        position: usize,
        /// The nesting limit.
        limit: usize,
    },
}

fn kind_text(boxed: &bool) -> &'static str {
    if *boxed {
        "boxed"
    } else {
        "an object"
    }
}

impl From<PackError> for DeserializeError {
    fn from(err: PackError) -> Self {
        match err {
            PackError::UnterminatedString { offset } => Self::RunawayString { position: offset },
            PackError::InvalidUtf8 { offset } => Self::InvalidUtf8 { position: offset },
            PackError::Truncated {
                offset,
                needed,
                available,
            } => Self::Truncated {
                position: offset,
                needed,
                available,
            },
            // The cursor only reports the three above.
            _ => Self::Truncated {
                position: 0,
                needed: 0,
                available: 0,
            },
        }
    }
}

/// Failures while writing objects.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializeError {
    /// An object or array too large for 32-bit sizes.
    #[error("{type_name}: size {size} does not fit the 32-bit size field")]
    SizeOverflow {
        /// Type of the object being written.
        type_name: String,
        /// Size that did not fit.
        size: usize,
    },

    /// A type name, component name or string value containing NUL.
    #[error("{type_name}: {what} contains a NUL byte")]
    InteriorNul {
        /// Type of the object being written.
        type_name: String,
        /// What carried the NUL, e.g. a component name.
        what: String,
    },
}

/// Failure of [`crate::Serializable::assign`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssignError {
    /// Source and destination are different types.
    #[error("cannot assign {found} to {expected}")]
    TypeMismatch {
        /// Destination type.
        expected: &'static str,
        /// Source type.
        found: &'static str,
    },
}

/// Recoverable oddities met while reading.
///
/// Each warning is also emitted through `tracing` when it is recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A component the object type does not know; it was skipped.
    UnknownComponent {
        /// Start of the component.
        position: usize,
        /// Owning object type.
        type_name: String,
        /// Component name.
        component: String,
        /// Stored component type.
        ctype: ComponentType,
    },
    /// Bytes left after the root object.
    TrailingData {
        /// End of the root object.
        position: usize,
        /// Number of ignored bytes.
        len: usize,
    },
    /// An object inside a boxed value.
    ObjectInBoxed {
        /// Start of the object component.
        position: usize,
        /// The boxed type containing it.
        boxed_type: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownComponent {
                position,
                type_name,
                component,
                ctype,
            } => write!(
                f,
                "at {position}: skipped unknown component {component} ({ctype}) of {type_name}"
            ),
            Self::TrailingData { position, len } => {
                write!(f, "at {position}: ignored {len} bytes after the root object")
            }
            Self::ObjectInBoxed {
                position,
                boxed_type,
            } => write!(f, "at {position}: boxed {boxed_type} contains an object"),
        }
    }
}
