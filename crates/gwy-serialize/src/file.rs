// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Whole files: a four-byte magic followed by one root blob.

use crate::error::{DeserializeError, SerializeError};
use crate::reader::{read_root, Deserialized, Encoding, Unpacker};
use crate::registry::Registry;
use crate::serializable::Serializable;
use crate::writer::{Packer, SizeMode};

/// File header variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Magic {
    /// `GWYO`: legacy headers, read only.
    Legacy,
    /// `GWYP`: 32-bit sizes.
    Standard,
    /// `GWYQ`: 64-bit sizes.
    Quad,
}

impl Magic {
    /// Length of every magic header.
    pub const LEN: usize = 4;

    /// Header bytes.
    pub fn bytes(self) -> &'static [u8; 4] {
        match self {
            Self::Legacy => b"GWYO",
            Self::Standard => b"GWYP",
            Self::Quad => b"GWYQ",
        }
    }

    /// Identifies the header at the start of `bytes`.
    pub fn detect(bytes: &[u8]) -> Result<Self, DeserializeError> {
        match bytes.get(..Self::LEN) {
            Some(b"GWYO") => Ok(Self::Legacy),
            Some(b"GWYP") => Ok(Self::Standard),
            Some(b"GWYQ") => Ok(Self::Quad),
            _ => Err(DeserializeError::BadMagic {
                found: bytes.iter().take(Self::LEN).copied().collect(),
            }),
        }
    }

    /// Header for files written with `mode`.
    pub fn for_mode(mode: SizeMode) -> Self {
        match mode {
            SizeMode::U32 => Self::Standard,
            SizeMode::U64 => Self::Quad,
        }
    }

    /// Encoding of the blobs following this header.
    pub fn encoding(self) -> Encoding {
        match self {
            Self::Legacy => Encoding::Legacy,
            Self::Standard => Encoding::Tagged(SizeMode::U32),
            Self::Quad => Encoding::Tagged(SizeMode::U64),
        }
    }
}

/// Writes `object` as a complete file, `GWYP` or `GWYQ` by `mode`.
pub fn serialize_file(object: &dyn Serializable, mode: SizeMode) -> Result<Vec<u8>, SerializeError> {
    let mut packer = Packer::with_prefix(Magic::for_mode(mode).bytes(), mode);
    packer.pack_object(object)?;
    Ok(packer.into_bytes())
}

/// Reads a complete file of any supported variant.
///
/// Positions in errors and warnings count from the start of the file.
pub fn deserialize_file(bytes: &[u8], registry: &Registry) -> Result<Deserialized, DeserializeError> {
    let magic = Magic::detect(bytes)?;
    let unpacker = Unpacker::at(bytes, Magic::LEN, magic.encoding())?;
    read_root(unpacker, registry)
}
