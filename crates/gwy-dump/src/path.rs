// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Component paths such as `/"data"/"xyunit"/[2]`.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use thiserror::Error;

/// Malformed path text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// Empty input.
    #[error("path is empty")]
    Empty,
    /// A path must start with `/`.
    #[error("path must start with '/'")]
    MissingSlash,
    /// Input ends where a segment was expected.
    #[error("path ends after '/' at {position}")]
    UnexpectedEnd {
        /// Byte offset of the end.
        position: usize,
    },
    /// A character that cannot start or follow a segment.
    #[error("unexpected {ch:?} at {position}")]
    UnexpectedChar {
        /// Byte offset of the character.
        position: usize,
        /// The character.
        ch: char,
    },
    /// A quoted name without its closing quote.
    #[error("name starting at {position} is not terminated")]
    UnterminatedName {
        /// Byte offset of the opening quote.
        position: usize,
    },
    /// An unknown or incomplete escape sequence.
    #[error("invalid escape at {position}")]
    BadEscape {
        /// Byte offset of the backslash.
        position: usize,
    },
    /// An index that is missing, not a number or not closed.
    #[error("invalid index at {position}")]
    BadIndex {
        /// Byte offset of the opening bracket.
        position: usize,
    },
    /// `[a..b]` ranges only appear in dumps; they select nothing.
    #[error("index range at {position} cannot be selected")]
    RangeNotAllowed {
        /// Byte offset of the opening bracket.
        position: usize,
    },
}

/// One step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Component name, raw bytes as stored.
    Name(Vec<u8>),
    /// Array item.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "\"{}\"", escape(name)),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// Location of a component within the object tree.
///
/// The empty path is the root object and displays as `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// The root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses the textual form.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let bytes = text.as_bytes();
        match bytes.first() {
            None => return Err(PathError::Empty),
            Some(b'/') => {}
            Some(_) => return Err(PathError::MissingSlash),
        }
        let mut path = Self::root();
        if bytes.len() == 1 {
            return Ok(path);
        }
        let mut pos = 0;
        while pos < bytes.len() {
            // bytes[pos] is always a slash here.
            pos += 1;
            let (segment, next) = match bytes.get(pos) {
                None => return Err(PathError::UnexpectedEnd { position: pos }),
                Some(b'"') => parse_name(bytes, pos)?,
                Some(b'[') => parse_index(bytes, pos)?,
                Some(_) => return Err(unexpected(text, pos)),
            };
            path.segments.push(segment);
            pos = next;
            if pos < bytes.len() && bytes[pos] != b'/' {
                return Err(unexpected(text, pos));
            }
        }
        Ok(path)
    }

    /// Segments from the root down.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments; the root has none.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment, `None` at the root.
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Appends a segment.
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Removes the last segment.
    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Path {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn unexpected(text: &str, position: usize) -> PathError {
    match text.get(position..).and_then(|rest| rest.chars().next()) {
        Some(ch) => PathError::UnexpectedChar { position, ch },
        None => PathError::UnexpectedEnd { position },
    }
}

/// Parses `"..."` starting at the opening quote; returns the segment and
/// the offset just past the closing quote.
fn parse_name(bytes: &[u8], open: usize) -> Result<(Segment, usize), PathError> {
    let mut name = Vec::new();
    let mut pos = open + 1;
    loop {
        match bytes.get(pos) {
            None => return Err(PathError::UnterminatedName { position: open }),
            Some(b'"') => return Ok((Segment::Name(name), pos + 1)),
            Some(b'\\') => {
                let bad = PathError::BadEscape { position: pos };
                let (byte, len) = match bytes.get(pos + 1) {
                    Some(b'"') => (b'"', 2),
                    Some(b'\\') => (b'\\', 2),
                    Some(b'n') => (b'\n', 2),
                    Some(b't') => (b'\t', 2),
                    Some(b'r') => (b'\r', 2),
                    Some(b'x') => {
                        let hex = bytes.get(pos + 2..pos + 4).ok_or_else(|| bad.clone())?;
                        let hex = std::str::from_utf8(hex).map_err(|_| bad.clone())?;
                        (u8::from_str_radix(hex, 16).map_err(|_| bad)?, 4)
                    }
                    _ => return Err(bad),
                };
                name.push(byte);
                pos += len;
            }
            Some(&b) => {
                name.push(b);
                pos += 1;
            }
        }
    }
}

fn parse_index(bytes: &[u8], open: usize) -> Result<(Segment, usize), PathError> {
    let bad = PathError::BadIndex { position: open };
    let digits = bytes[open + 1..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    let end = open + 1 + digits;
    if bytes[end..].starts_with(b"..") {
        return Err(PathError::RangeNotAllowed { position: open });
    }
    if digits == 0 || bytes.get(end) != Some(&b']') {
        return Err(bad);
    }
    let index = std::str::from_utf8(&bytes[open + 1..end])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(bad)?;
    Ok((Segment::Index(index), end + 1))
}

/// Escapes raw name or string bytes for display, without quotes.
pub fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            b'\r' => out.push_str("\\r"),
            0x20..=0x7e => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\x{b:02x}");
            }
        }
    }
    out
}
