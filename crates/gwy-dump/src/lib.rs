// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Independent reader for Gwyddion object blobs.
//!
//! The walker follows the blob grammar alone, without any knowledge of the
//! types that wrote it, so it doubles as a cross-check of the serializer.
//! It prints the component tree or extracts the exact bytes of one
//! component addressed by a [`Path`] such as `/"data"/"xyunit"`.
#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod path;
pub mod walk;

pub use path::{Path, PathError, Segment};
pub use walk::{detect, DumpOptions, FileFormat, WalkError, Walker, MAX_NESTING};
