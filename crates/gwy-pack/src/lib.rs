// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Primitive pack codec.
//!
//! Converts between byte buffers and scalar values under an explicit byte
//! order, driven by a format string such as `"<x d r i 2h 13x q Q 5S"`. The
//! same format drives [`pack`], [`unpack`] and [`pack_size`], so the three
//! always agree on layout.
//!
//! ```
//! use gwy_pack::{pack_size, pack_to_vec, unpack, PackValue};
//!
//! # fn main() -> Result<(), gwy_pack::PackError> {
//! let values = vec![PackValue::I16(-1), PackValue::F64(0.5)];
//! let bytes = pack_to_vec(">h d", &values)?;
//! assert_eq!(bytes.len(), pack_size(">h d")?);
//! let (back, consumed) = unpack(">h d", &bytes)?;
//! assert_eq!(back, values);
//! assert_eq!(consumed, bytes.len());
//! # Ok(())
//! # }
//! ```
//!
//! Foreign file importers that only need a few fields can use the
//! [`Reader`] cursor directly.
#![forbid(unsafe_code)]

mod data;
mod error;
mod format;
mod pack;
mod read;
mod real;

pub use data::{unpack_data, RawKind, RawLayout};
pub use error::PackError;
pub use format::{pack_size, ByteOrder, Directive, Format, Item};
pub use pack::{pack, pack_to_vec, unpack, PackValue};
pub use read::Reader;
pub use real::{decode_pascal_real, encode_pascal_real, PASCAL_REAL_SIZE};
