// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Depth-first walk over serialized object blobs.
//!
//! The walker knows nothing about concrete object types. It follows only the
//! blob grammar, checks every size and terminator against the enclosing
//! object, and either prints one line per component or locates the bytes of
//! a single component for extraction.

use std::io::{self, Write};
use std::ops::Range;

use gwy_pack::Reader;
use thiserror::Error;
use tracing::debug;

use crate::path::{escape, Path, Segment};

/// Deepest object nesting the walker follows.
pub const MAX_NESTING: usize = 200;

/// Structural failure found while walking.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The input does not start with a known magic header.
    #[error("not a Gwyddion file (magic {found:02x?})")]
    BadMagic {
        /// Up to four leading bytes.
        found: Vec<u8>,
    },
    /// A component or type name without a NUL inside its object.
    #[error("runaway component name")]
    RunawayName {
        /// Start of the name.
        position: usize,
    },
    /// A string value without a NUL inside its object.
    #[error("runaway string")]
    RunawayString {
        /// Start of the string.
        position: usize,
    },
    /// A value cut off by the end of its object.
    #[error("truncated {what}")]
    Truncated {
        /// Start of the value.
        position: usize,
        /// What was being read.
        what: &'static str,
    },
    /// An array whose items do not fit in its object.
    #[error("truncated {what} array of {count} items")]
    TruncatedArray {
        /// Position of the item count.
        position: usize,
        /// Item type.
        what: &'static str,
        /// Declared item count.
        count: u64,
    },
    /// A type tag or legacy type code nothing maps to.
    #[error("unknown component type {tag:#x}")]
    UnknownTypeTag {
        /// Position of the tag.
        position: usize,
        /// The tag byte or legacy code.
        tag: u32,
    },
    /// An object whose declared size runs past its parent.
    #[error("object data of {size} bytes escapes its parent ({available} available)")]
    ObjectEscapes {
        /// Start of the component list.
        position: usize,
        /// Declared size.
        size: u64,
        /// Bytes left in the parent.
        available: usize,
    },
    /// Bytes after the root object.
    #[error("{len} bytes of trailing data")]
    TrailingData {
        /// End of the root object.
        position: usize,
        /// Number of extra bytes.
        len: usize,
    },
    /// Objects nested deeper than [`MAX_NESTING`].
    #[error("objects nested deeper than {limit}")]
    NestingTooDeep {
        /// Start of the object that would exceed the limit.
        position: usize,
        /// The limit.
        limit: usize,
    },
    /// Writing the dump failed.
    #[error("write failed: {0}")]
    Io(#[from] io::Error),
}

impl WalkError {
    /// Byte offset of the failure, when it has one.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::RunawayName { position }
            | Self::RunawayString { position }
            | Self::Truncated { position, .. }
            | Self::TruncatedArray { position, .. }
            | Self::UnknownTypeTag { position, .. }
            | Self::ObjectEscapes { position, .. }
            | Self::TrailingData { position, .. }
            | Self::NestingTooDeep { position, .. } => Some(*position),
            Self::BadMagic { .. } | Self::Io(_) => None,
        }
    }
}

/// On-disk variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// `GWYO`: 32-bit sizes, 32-bit legacy type codes.
    Legacy,
    /// `GWYP`: 32-bit sizes, one-byte type tags.
    Standard,
    /// `GWYQ`: 64-bit sizes, one-byte type tags.
    Quad,
}

impl FileFormat {
    /// Length of the magic header of files.
    pub const MAGIC_LEN: usize = 4;

    fn size_width(self) -> usize {
        match self {
            Self::Quad => 8,
            Self::Legacy | Self::Standard => 4,
        }
    }
}

/// Identifies the file variant by its magic header.
pub fn detect(bytes: &[u8]) -> Result<FileFormat, WalkError> {
    match bytes.get(..FileFormat::MAGIC_LEN) {
        Some(b"GWYO") => Ok(FileFormat::Legacy),
        Some(b"GWYP") => Ok(FileFormat::Standard),
        Some(b"GWYQ") => Ok(FileFormat::Quad),
        _ => Err(WalkError::BadMagic {
            found: bytes.iter().take(FileFormat::MAGIC_LEN).copied().collect(),
        }),
    }
}

/// What to print, or what to extract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Prefix lines with the component offset.
    pub offsets: bool,
    /// Show type tags.
    pub types: bool,
    /// Show decoded values.
    pub values: bool,
    /// Show declared object sizes.
    pub sizes: bool,
    /// Label components with their full path instead of their name.
    pub paths: bool,
    /// Array items printed before eliding the rest; `None` is unlimited.
    pub length: Option<usize>,
    /// Deepest path printed; `None` is unlimited.
    pub depth: Option<usize>,
    /// Locate this component instead of printing.
    pub extract: Option<Path>,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            indent: 4,
            offsets: false,
            types: false,
            values: false,
            sizes: false,
            paths: false,
            length: None,
            depth: None,
            extract: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Blob<'a> {
    start: usize,
    type_name: &'a [u8],
    body: usize,
    end: usize,
}

/// Walks one root blob. See [`Walker::walk`].
pub struct Walker<'a> {
    bytes: &'a [u8],
    format: FileFormat,
    options: &'a DumpOptions,
    out: &'a mut dyn Write,
    path: Path,
    nesting: usize,
    muted: usize,
    found: Option<Range<usize>>,
}

impl<'a> Walker<'a> {
    /// Walks the root blob starting at `start`.
    ///
    /// In dump mode every component is printed to `out` and `Ok(None)` is
    /// returned once the whole input validated. With `options.extract` set
    /// nothing is printed; the result is the byte range of the selected
    /// component, or `None` when no component has that path.
    pub fn walk(
        bytes: &'a [u8],
        start: usize,
        format: FileFormat,
        options: &'a DumpOptions,
        out: &'a mut dyn Write,
    ) -> Result<Option<Range<usize>>, WalkError> {
        let mut walker = Walker {
            bytes,
            format,
            options,
            out,
            path: Path::root(),
            nesting: 0,
            muted: 0,
            found: None,
        };
        let mut cursor = Reader::new(bytes);
        cursor.skip(start).map_err(|_| WalkError::Truncated {
            position: bytes.len(),
            what: "header",
        })?;
        walker.root(&mut cursor)?;
        if walker.found.is_some() {
            return Ok(walker.found);
        }
        if !cursor.is_empty() {
            return Err(WalkError::TrailingData {
                position: cursor.position(),
                len: cursor.remaining(),
            });
        }
        Ok(None)
    }

    fn root(&mut self, cursor: &mut Reader<'a>) -> Result<(), WalkError> {
        let blob = self.blob(cursor)?;
        if self.check_extract(blob.start..blob.end) {
            return Ok(());
        }
        if self.printing() {
            self.offset(blob.start)?;
            write!(self.out, "{}", escape(blob.type_name))?;
            if self.options.sizes {
                write!(self.out, " [size {}]", blob.end - blob.body)?;
            }
            writeln!(self.out)?;
        }
        self.components(blob)
    }

    fn printing(&self) -> bool {
        self.options.extract.is_none()
            && self.muted == 0
            && self.options.depth.is_none_or(|depth| self.path.len() <= depth)
    }

    /// Records `range` when the current path is the one being extracted.
    fn check_extract(&mut self, range: Range<usize>) -> bool {
        if self.options.extract.as_ref() == Some(&self.path) {
            debug!(path = %self.path, ?range, "found extraction target");
            self.found = Some(range);
        }
        self.found.is_some()
    }

    fn offset(&mut self, offset: usize) -> io::Result<()> {
        if self.options.offsets {
            write!(self.out, "{offset:08x}: ")?;
        }
        Ok(())
    }

    /// Prints the line for the current path unless muted or too deep.
    fn line(
        &mut self,
        offset: usize,
        tag: u8,
        value: &str,
        size: Option<usize>,
    ) -> io::Result<()> {
        if !self.printing() {
            return Ok(());
        }
        self.offset(offset)?;
        let depth = self.path.len().saturating_sub(1);
        write!(self.out, "{:width$}", "", width = depth * self.options.indent)?;
        if self.options.paths {
            write!(self.out, "{}", self.path)?;
        } else if let Some(segment) = self.path.last() {
            write!(self.out, "{segment}")?;
        }
        if self.options.types {
            write!(self.out, " ({})", char::from(tag))?;
        }
        if self.options.values {
            write!(self.out, ": {value}")?;
        }
        if let (true, Some(size)) = (self.options.sizes, size) {
            write!(self.out, " [size {size}]")?;
        }
        writeln!(self.out)
    }

    /// Prints the `[start..end]` line standing for elided array items.
    fn ellipsis(&mut self, offset: usize, first: usize, last: usize) -> io::Result<()> {
        self.path.push(Segment::Index(first));
        let printing = self.printing();
        self.path.pop();
        if !printing {
            return Ok(());
        }
        self.offset(offset)?;
        write!(
            self.out,
            "{:width$}",
            "",
            width = self.path.len() * self.options.indent
        )?;
        if self.options.paths {
            write!(self.out, "{}/", self.path)?;
        }
        writeln!(self.out, "[{first}..{last}]")
    }

    fn read_size(&self, cursor: &mut Reader<'a>, what: &'static str) -> Result<u64, WalkError> {
        let position = cursor.position();
        let truncated = |_| WalkError::Truncated { position, what };
        match self.format.size_width() {
            8 => cursor.read_uint64_le().map_err(truncated),
            _ => cursor.read_uint32_le().map(u64::from).map_err(truncated),
        }
    }

    /// Reads a blob header and skips the cursor past the whole blob.
    fn blob(&mut self, cursor: &mut Reader<'a>) -> Result<Blob<'a>, WalkError> {
        let start = cursor.position();
        if self.nesting >= MAX_NESTING {
            return Err(WalkError::NestingTooDeep {
                position: start,
                limit: MAX_NESTING,
            });
        }
        let type_name = cursor
            .read_cstr()
            .map_err(|_| WalkError::RunawayName { position: start })?;
        let size = self.read_size(cursor, "object size")?;
        let body = cursor.position();
        let available = cursor.remaining();
        let escapes = WalkError::ObjectEscapes {
            position: body,
            size,
            available,
        };
        let len = usize::try_from(size).map_err(|_| WalkError::ObjectEscapes {
            position: body,
            size,
            available,
        })?;
        cursor.skip(len).map_err(|_| escapes)?;
        Ok(Blob {
            start,
            type_name,
            body,
            end: body + len,
        })
    }

    fn components(&mut self, blob: Blob<'a>) -> Result<(), WalkError> {
        let mut cursor = Reader::new(&self.bytes[..blob.end]);
        cursor.skip(blob.body).map_err(|_| WalkError::Truncated {
            position: blob.body,
            what: "object",
        })?;
        self.nesting += 1;
        let result = self.component_list(&mut cursor);
        self.nesting -= 1;
        result
    }

    fn component_list(&mut self, cursor: &mut Reader<'a>) -> Result<(), WalkError> {
        while !cursor.is_empty() {
            let start = cursor.position();
            let name = cursor
                .read_cstr()
                .map_err(|_| WalkError::RunawayName { position: start })?;
            let tag = self.read_tag(cursor)?;
            self.path.push(Segment::Name(name.to_vec()));
            let result = self.value(cursor, start, tag);
            self.path.pop();
            result?;
            if self.found.is_some() {
                break;
            }
        }
        Ok(())
    }

    fn read_tag(&self, cursor: &mut Reader<'a>) -> Result<u8, WalkError> {
        let position = cursor.position();
        let truncated = |_| WalkError::Truncated {
            position,
            what: "component type",
        };
        let tag = match self.format {
            FileFormat::Legacy => {
                let code = cursor.read_uint32_le().map_err(truncated)?;
                legacy_tag(code).ok_or(WalkError::UnknownTypeTag { position, tag: code })?
            }
            FileFormat::Standard | FileFormat::Quad => cursor.read_u8().map_err(truncated)?,
        };
        if scalar_width(tag).is_some() || array_item(tag).is_some() || b"soxSOX".contains(&tag) {
            Ok(tag)
        } else {
            Err(WalkError::UnknownTypeTag {
                position,
                tag: u32::from(tag),
            })
        }
    }

    /// Walks the value of the component at `self.path`, whose header starts
    /// at `start`.
    fn value(&mut self, cursor: &mut Reader<'a>, start: usize, tag: u8) -> Result<(), WalkError> {
        let position = cursor.position();
        match tag {
            b's' => {
                let text = cursor
                    .read_cstr()
                    .map_err(|_| WalkError::RunawayString { position })?;
                if !self.check_extract(position..cursor.position()) {
                    self.line(start, tag, &format!("\"{}\"", escape(text)), None)?;
                }
            }
            b'o' | b'x' => {
                let blob = self.blob(cursor)?;
                if !self.check_extract(blob.start..blob.end) {
                    self.object(start, tag, blob)?;
                }
            }
            b'S' | b'O' | b'X' => self.variable_array(cursor, start, tag)?,
            _ => {
                if let Some(width) = scalar_width(tag) {
                    let raw = cursor.take(width).map_err(|_| WalkError::Truncated {
                        position,
                        what: type_word(tag),
                    })?;
                    if !self.check_extract(position..cursor.position()) {
                        self.line(start, tag, &scalar_text(tag, raw), None)?;
                    }
                } else {
                    self.fixed_array(cursor, start, tag)?;
                }
            }
        }
        Ok(())
    }

    fn object(&mut self, offset: usize, tag: u8, blob: Blob<'a>) -> Result<(), WalkError> {
        self.line(offset, tag, &escape(blob.type_name), Some(blob.end - blob.body))?;
        self.components(blob)
    }

    /// Reads an array count and checks that `count` items of at least
    /// `min_width` bytes fit in the object.
    fn read_count(
        &self,
        cursor: &mut Reader<'a>,
        tag: u8,
        min_width: usize,
    ) -> Result<(usize, usize), WalkError> {
        let position = cursor.position();
        let count = self.read_size(cursor, "array size")?;
        usize::try_from(count)
            .ok()
            .filter(|&n| {
                n.checked_mul(min_width)
                    .is_some_and(|bytes| bytes <= cursor.remaining())
            })
            .map(|n| (n, position))
            .ok_or(WalkError::TruncatedArray {
                position,
                what: type_word(tag),
                count,
            })
    }

    /// Number of items printed for an array of `count`.
    fn shown(&self, count: usize) -> usize {
        self.options.length.map_or(count, |length| count.min(length))
    }

    /// Whether items of an array at the current path would be printed.
    fn printing_items(&mut self) -> bool {
        self.path.push(Segment::Index(0));
        let printing = self.printing();
        self.path.pop();
        printing
    }

    fn fixed_array(&mut self, cursor: &mut Reader<'a>, start: usize, tag: u8) -> Result<(), WalkError> {
        let Some(item) = array_item(tag) else {
            return Err(WalkError::UnknownTypeTag {
                position: start,
                tag: u32::from(tag),
            });
        };
        let width = scalar_width(item).unwrap_or(1);
        let (count, position) = self.read_count(cursor, tag, width)?;
        let items = cursor.position();
        let truncated = WalkError::TruncatedArray {
            position,
            what: type_word(tag),
            count: count as u64,
        };
        cursor.skip(count * width).map_err(|_| truncated)?;
        if self.check_extract(position..cursor.position()) {
            return Ok(());
        }
        if let Some(Segment::Index(index)) = self.extract_child() {
            if index < count {
                let at = items + index * width;
                self.found = Some(at..at + width);
            }
            return Ok(());
        }
        self.line(start, tag, &format!("{count} items"), None)?;
        if !self.printing_items() {
            return Ok(());
        }
        let shown = self.shown(count);
        for k in 0..shown {
            let at = items + k * width;
            let text = scalar_text(item, &self.bytes[at..at + width]);
            self.path.push(Segment::Index(k));
            let result = self.line(at, item, &text, None);
            self.path.pop();
            result?;
        }
        if shown < count {
            self.ellipsis(items + shown * width, shown, count - 1)?;
        }
        Ok(())
    }

    fn variable_array(&mut self, cursor: &mut Reader<'a>, start: usize, tag: u8) -> Result<(), WalkError> {
        let (count, position) = self.read_count(cursor, tag, 1)?;
        self.line(start, tag, &format!("{count} items"), None)?;
        let shown = self.shown(count);
        let item_tag = array_item(tag).unwrap_or(b'o');
        let mut elided = false;
        for k in 0..count {
            let at = cursor.position();
            if k == shown {
                self.ellipsis(at, shown, count - 1)?;
                self.muted += 1;
                elided = true;
            }
            self.path.push(Segment::Index(k));
            let result = self.variable_item(cursor, at, item_tag);
            self.path.pop();
            result?;
            if self.found.is_some() {
                break;
            }
        }
        if elided {
            self.muted -= 1;
        }
        if self.found.is_none() {
            self.check_extract(position..cursor.position());
        }
        Ok(())
    }

    fn variable_item(&mut self, cursor: &mut Reader<'a>, at: usize, tag: u8) -> Result<(), WalkError> {
        if tag == b's' {
            let text = cursor
                .read_cstr()
                .map_err(|_| WalkError::RunawayString { position: at })?;
            if !self.check_extract(at..cursor.position()) {
                self.line(at, tag, &format!("\"{}\"", escape(text)), None)?;
            }
            return Ok(());
        }
        let blob = self.blob(cursor)?;
        if self.check_extract(blob.start..blob.end) {
            return Ok(());
        }
        self.object(at, tag, blob)
    }

    /// The extraction target's last segment when it is a direct child of
    /// the current path.
    fn extract_child(&self) -> Option<Segment> {
        let target = self.options.extract.as_ref()?;
        let (last, parent) = target.segments().split_last()?;
        (parent == self.path.segments()).then(|| last.clone())
    }
}

fn legacy_tag(code: u32) -> Option<u8> {
    Some(match code {
        20 => b'b',
        12 | 16 => b'c',
        24 => b'i',
        40 => b'q',
        60 => b'd',
        64 => b's',
        80 => b'o',
        _ => return None,
    })
}

fn scalar_width(tag: u8) -> Option<usize> {
    Some(match tag {
        b'b' | b'c' => 1,
        b'h' => 2,
        b'i' => 4,
        b'q' | b'd' => 8,
        _ => return None,
    })
}

/// Item tag of a fixed-width array tag.
fn array_item(tag: u8) -> Option<u8> {
    Some(match tag {
        b'C' => b'c',
        b'H' => b'h',
        b'I' => b'i',
        b'Q' => b'q',
        b'D' => b'd',
        b'S' => b's',
        b'O' => b'o',
        b'X' => b'x',
        _ => return None,
    })
}

fn type_word(tag: u8) -> &'static str {
    match tag {
        b'b' => "boolean",
        b'c' | b'C' => "char",
        b'h' | b'H' => "int16",
        b'i' | b'I' => "int32",
        b'q' | b'Q' => "int64",
        b'd' | b'D' => "double",
        b's' | b'S' => "string",
        b'o' | b'O' => "object",
        _ => "boxed",
    }
}

fn scalar_text(tag: u8, raw: &[u8]) -> String {
    let mut buf = [0u8; 8];
    buf[..raw.len()].copy_from_slice(raw);
    match tag {
        b'b' => (raw[0] != 0).to_string(),
        b'c' if raw[0].is_ascii_graphic() || raw[0] == b' ' => {
            format!("0x{:02x} '{}'", raw[0], char::from(raw[0]))
        }
        b'c' => format!("0x{:02x}", raw[0]),
        b'h' => i16::from_le_bytes([buf[0], buf[1]]).to_string(),
        b'i' => i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]).to_string(),
        b'q' => i64::from_le_bytes(buf).to_string(),
        _ => format!("{:?}", f64::from_le_bytes(buf)),
    }
}
