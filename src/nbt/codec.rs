//! Binary reader and writer for tagged record files

use super::tag::{Compound, List, NbtString, Tag, TagKind};
use crate::core::NbtError;
use flate2::Compression as Level;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use std::io::{Read, Write};

/// Deepest compound/list nesting accepted by the decoder
pub const MAX_DEPTH: usize = 512;

type Result<T> = std::result::Result<T, NbtError>;

// ============================================================================
// Document
// ============================================================================

/// Outer framing a file was stored with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    None,
    #[default]
    Gzip,
    Zlib,
}

impl Compression {
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes {
            [0x1F, 0x8B, ..] => Self::Gzip,
            [0x78, second, ..] if (0x7800u16 | *second as u16) % 31 == 0 => Self::Zlib,
            _ => Self::None,
        }
    }
}

/// A decoded file: the named root compound plus the framing it came in
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: NbtString,
    pub root: Compound,
    pub compression: Compression,
}

impl Document {
    pub fn new(root: Compound, compression: Compression) -> Self {
        Self {
            name: NbtString::default(),
            root,
            compression,
        }
    }
}

pub fn decode(bytes: &[u8]) -> Result<Document> {
    if bytes.is_empty() {
        return Err(NbtError::Empty);
    }

    let compression = Compression::detect(bytes);
    let inflated;
    let raw = match compression {
        Compression::None => bytes,
        Compression::Gzip => {
            let mut out = Vec::new();
            GzDecoder::new(bytes).read_to_end(&mut out)?;
            inflated = out;
            &inflated[..]
        }
        Compression::Zlib => {
            let mut out = Vec::new();
            ZlibDecoder::new(bytes).read_to_end(&mut out)?;
            inflated = out;
            &inflated[..]
        }
    };

    let (name, root) = decode_uncompressed(raw)?;
    Ok(Document {
        name,
        root,
        compression,
    })
}

pub fn encode(document: &Document) -> Result<Vec<u8>> {
    let raw = encode_uncompressed(&document.name, &document.root)?;
    let framed = match document.compression {
        Compression::None => raw,
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Level::default());
            encoder.write_all(&raw)?;
            encoder.finish()?
        }
        Compression::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Level::default());
            encoder.write_all(&raw)?;
            encoder.finish()?
        }
    };
    Ok(framed)
}

/// Decodes a bare named root tag that must span all of `bytes`
pub fn decode_uncompressed(bytes: &[u8]) -> Result<(NbtString, Compound)> {
    let mut reader = Reader::new(bytes);
    let offset = reader.pos;
    let id = reader.u8()?;
    let kind = TagKind::from_id(id).ok_or(NbtError::UnknownTag { id, offset })?;
    if kind != TagKind::Compound {
        return Err(NbtError::RootNotCompound(kind.type_name()));
    }
    let name = reader.string()?;
    let root = reader.compound(1)?;
    if reader.remaining() > 0 {
        return Err(NbtError::TrailingData {
            offset: reader.pos,
            len: reader.remaining(),
        });
    }
    Ok((name, root))
}

pub fn encode_uncompressed(name: &NbtString, root: &Compound) -> Result<Vec<u8>> {
    let mut writer = Writer::default();
    writer.u8(TagKind::Compound.id());
    writer.string(name)?;
    writer.compound(root)?;
    Ok(writer.buf)
}

// ============================================================================
// Reader
// ============================================================================

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(NbtError::UnexpectedEof {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    fn i8(&mut self) -> Result<i8> {
        Ok(i8::from_be_bytes(self.array()?))
    }

    fn i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(u32::from_be_bytes(self.array()?)))
    }

    fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(u64::from_be_bytes(self.array()?)))
    }

    fn length(&mut self) -> Result<usize> {
        let offset = self.pos;
        let len = self.i32()?;
        usize::try_from(len).map_err(|_| NbtError::NegativeLength { len, offset })
    }

    fn string(&mut self) -> Result<NbtString> {
        let len = u16::from_be_bytes(self.array()?) as usize;
        Ok(NbtString::from_raw(self.take(len)?.to_vec()))
    }

    fn kind(&mut self) -> Result<TagKind> {
        let offset = self.pos;
        let id = self.u8()?;
        TagKind::from_id(id).ok_or(NbtError::UnknownTag { id, offset })
    }

    /// Caps preallocation so a corrupt length cannot reserve more than the input
    fn capacity(&self, len: usize, width: usize) -> usize {
        len.min(self.remaining() / width.max(1))
    }

    fn compound(&mut self, depth: usize) -> Result<Compound> {
        if depth > MAX_DEPTH {
            return Err(NbtError::TooDeep(MAX_DEPTH));
        }
        let mut compound = Compound::new();
        loop {
            let kind = self.kind()?;
            if kind == TagKind::End {
                return Ok(compound);
            }
            let offset = self.pos;
            let name = self.string()?;
            let tag = self.payload(kind, depth)?;
            compound
                .push_new(name, tag)
                .map_err(|name| NbtError::DuplicateEntry {
                    name: name.to_string(),
                    offset,
                })?;
        }
    }

    fn list(&mut self, depth: usize) -> Result<List> {
        if depth > MAX_DEPTH {
            return Err(NbtError::TooDeep(MAX_DEPTH));
        }
        let element = self.kind()?;
        let len = self.length()?;
        if element == TagKind::End && len > 0 {
            return Err(NbtError::InvalidEndList(len));
        }
        let mut items = Vec::with_capacity(self.capacity(len, 1));
        for _ in 0..len {
            items.push(self.payload(element, depth)?);
        }
        Ok(List::from_parts(element, items))
    }

    fn payload(&mut self, kind: TagKind, depth: usize) -> Result<Tag> {
        let tag = match kind {
            TagKind::End => {
                return Err(NbtError::UnknownTag {
                    id: 0,
                    offset: self.pos,
                });
            }
            TagKind::Byte => Tag::Byte(self.i8()?),
            TagKind::Short => Tag::Short(self.i16()?),
            TagKind::Int => Tag::Int(self.i32()?),
            TagKind::Long => Tag::Long(self.i64()?),
            TagKind::Float => Tag::Float(self.f32()?),
            TagKind::Double => Tag::Double(self.f64()?),
            TagKind::ByteArray => {
                let len = self.length()?;
                let bytes = self.take(len)?;
                Tag::ByteArray(bytes.iter().map(|b| *b as i8).collect())
            }
            TagKind::String => Tag::String(self.string()?),
            TagKind::List => Tag::List(self.list(depth + 1)?),
            TagKind::Compound => Tag::Compound(self.compound(depth + 1)?),
            TagKind::IntArray => {
                let len = self.length()?;
                let mut values = Vec::with_capacity(self.capacity(len, 4));
                for _ in 0..len {
                    values.push(self.i32()?);
                }
                Tag::IntArray(values)
            }
            TagKind::LongArray => {
                let len = self.length()?;
                let mut values = Vec::with_capacity(self.capacity(len, 8));
                for _ in 0..len {
                    values.push(self.i64()?);
                }
                Tag::LongArray(values)
            }
        };
        Ok(tag)
    }
}

// ============================================================================
// Writer
// ============================================================================

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn length(&mut self, len: usize) -> Result<()> {
        let len = i32::try_from(len)
            .map_err(|_| NbtError::TooLarge(format!("sequence of {} elements", len)))?;
        self.buf.extend_from_slice(&len.to_be_bytes());
        Ok(())
    }

    fn string(&mut self, value: &NbtString) -> Result<()> {
        let len = u16::try_from(value.len())
            .map_err(|_| NbtError::TooLarge(format!("string of {} bytes", value.len())))?;
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    fn compound(&mut self, compound: &Compound) -> Result<()> {
        for (name, tag) in compound.iter() {
            self.u8(tag.kind().id());
            self.string(name)?;
            self.payload(tag)?;
        }
        self.u8(TagKind::End.id());
        Ok(())
    }

    fn payload(&mut self, tag: &Tag) -> Result<()> {
        match tag {
            Tag::Byte(v) => self.buf.extend_from_slice(&v.to_be_bytes()),
            Tag::Short(v) => self.buf.extend_from_slice(&v.to_be_bytes()),
            Tag::Int(v) => self.buf.extend_from_slice(&v.to_be_bytes()),
            Tag::Long(v) => self.buf.extend_from_slice(&v.to_be_bytes()),
            Tag::Float(v) => self.buf.extend_from_slice(&v.to_bits().to_be_bytes()),
            Tag::Double(v) => self.buf.extend_from_slice(&v.to_bits().to_be_bytes()),
            Tag::ByteArray(values) => {
                self.length(values.len())?;
                self.buf.extend(values.iter().map(|b| *b as u8));
            }
            Tag::String(value) => self.string(value)?,
            Tag::List(list) => {
                self.u8(list.element_kind().id());
                self.length(list.len())?;
                for item in list.iter() {
                    self.payload(item)?;
                }
            }
            Tag::Compound(compound) => self.compound(compound)?,
            Tag::IntArray(values) => {
                self.length(values.len())?;
                for v in values {
                    self.buf.extend_from_slice(&v.to_be_bytes());
                }
            }
            Tag::LongArray(values) => {
                self.length(values.len())?;
                for v in values {
                    self.buf.extend_from_slice(&v.to_be_bytes());
                }
            }
        }
        Ok(())
    }
}
