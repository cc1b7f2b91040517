use std::borrow::Cow;
use std::fmt;

// ============================================================================
// Tag kinds
// ============================================================================

/// Wire identifier of a tag payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagKind {
    pub fn from_id(id: u8) -> Option<Self> {
        let kind = match id {
            0 => Self::End,
            1 => Self::Byte,
            2 => Self::Short,
            3 => Self::Int,
            4 => Self::Long,
            5 => Self::Float,
            6 => Self::Double,
            7 => Self::ByteArray,
            8 => Self::String,
            9 => Self::List,
            10 => Self::Compound,
            11 => Self::IntArray,
            12 => Self::LongArray,
            _ => return None,
        };
        Some(kind)
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Self::End => "END",
            Self::Byte => "BYTE",
            Self::Short => "SHORT",
            Self::Int => "INT",
            Self::Long => "LONG",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::ByteArray => "BYTE_ARRAY",
            Self::String => "STRING",
            Self::List => "LIST",
            Self::Compound => "COMPOUND",
            Self::IntArray => "INT_ARRAY",
            Self::LongArray => "LONG_ARRAY",
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

// ============================================================================
// Strings
// ============================================================================

/// Modified UTF-8 string kept as its raw wire bytes.
///
/// Record files are written by a JVM, so names and string payloads use the
/// modified encoding (`C0 80` for NUL, surrogate pairs for supplementary
/// characters). Holding the bytes verbatim means a string we never touch is
/// re-encoded exactly as it was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NbtString(Vec<u8>);

impl NbtString {
    pub fn from_raw(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Best-effort rendering for logs and diagnostics
    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    fn push_three(bytes: &mut Vec<u8>, unit: u32) {
        bytes.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
        bytes.push(0x80 | ((unit >> 6) & 0x3F) as u8);
        bytes.push(0x80 | (unit & 0x3F) as u8);
    }
}

impl From<&str> for NbtString {
    fn from(value: &str) -> Self {
        let mut bytes = Vec::with_capacity(value.len());
        for ch in value.chars() {
            let code = ch as u32;
            match code {
                0 => bytes.extend_from_slice(&[0xC0, 0x80]),
                0x01..=0x7F => bytes.push(code as u8),
                0x80..=0x7FF => {
                    bytes.push(0xC0 | (code >> 6) as u8);
                    bytes.push(0x80 | (code & 0x3F) as u8);
                }
                0x800..=0xFFFF => Self::push_three(&mut bytes, code),
                _ => {
                    let offset = code - 0x1_0000;
                    Self::push_three(&mut bytes, 0xD800 + (offset >> 10));
                    Self::push_three(&mut bytes, 0xDC00 + (offset & 0x3FF));
                }
            }
        }
        Self(bytes)
    }
}

impl From<String> for NbtString {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl PartialEq<str> for NbtString {
    fn eq(&self, other: &str) -> bool {
        // ASCII field names encode identically in both forms
        self.0 == other.as_bytes() || *self == NbtString::from(other)
    }
}

impl fmt::Display for NbtString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

// ============================================================================
// Tag values
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(NbtString),
    List(List),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Self::Byte(_) => TagKind::Byte,
            Self::Short(_) => TagKind::Short,
            Self::Int(_) => TagKind::Int,
            Self::Long(_) => TagKind::Long,
            Self::Float(_) => TagKind::Float,
            Self::Double(_) => TagKind::Double,
            Self::ByteArray(_) => TagKind::ByteArray,
            Self::String(_) => TagKind::String,
            Self::List(_) => TagKind::List,
            Self::Compound(_) => TagKind::Compound,
            Self::IntArray(_) => TagKind::IntArray,
            Self::LongArray(_) => TagKind::LongArray,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind().type_name()
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Reads a floating payload of either width
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v as f64),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut List> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }
}

// ============================================================================
// List
// ============================================================================

/// Homogeneous list; the element kind is kept even when the list is empty
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    element: TagKind,
    items: Vec<Tag>,
}

impl List {
    pub fn new(element: TagKind) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }

    /// Builds a list from tags that must all share one kind
    pub fn from_tags(items: Vec<Tag>) -> Option<Self> {
        let element = items.first().map(Tag::kind).unwrap_or(TagKind::End);
        if items.iter().any(|tag| tag.kind() != element) {
            return None;
        }
        Some(Self { element, items })
    }

    pub(crate) fn from_parts(element: TagKind, items: Vec<Tag>) -> Self {
        Self { element, items }
    }

    pub fn element_kind(&self) -> TagKind {
        self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    /// Replaces the element at `index`, refusing a tag of another kind
    pub fn set(&mut self, index: usize, tag: Tag) -> bool {
        if tag.kind() != self.element {
            return false;
        }
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = tag;
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, tag: Tag) -> bool {
        if self.items.is_empty() && self.element == TagKind::End {
            self.element = tag.kind();
        }
        if tag.kind() != self.element {
            return false;
        }
        self.items.push(tag);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.items.iter()
    }
}

// ============================================================================
// Compound
// ============================================================================

/// Named entries in file order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    entries: Vec<(NbtString, Tag)>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, tag)| tag)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Tag> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, tag)| tag)
    }

    /// Inserts or replaces `name`. A replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<NbtString>, tag: Tag) -> Option<Tag> {
        let name = name.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            return Some(std::mem::replace(slot, tag));
        }
        self.entries.push((name, tag));
        None
    }

    /// Appends a new entry; hands `name` back if it is already present
    pub(crate) fn push_new(&mut self, name: NbtString, tag: Tag) -> Result<(), NbtString> {
        if self.entries.iter().any(|(key, _)| *key == name) {
            return Err(name);
        }
        self.entries.push((name, tag));
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<Tag> {
        let index = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(Tag::as_i32)
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(Tag::as_f32)
    }

    pub fn get_list(&self, name: &str) -> Option<&List> {
        self.get(name).and_then(Tag::as_list)
    }

    pub fn get_list_mut(&mut self, name: &str) -> Option<&mut List> {
        self.get_mut(name).and_then(Tag::as_list_mut)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NbtString, &Tag)> {
        self.entries.iter().map(|(key, tag)| (key, tag))
    }
}
