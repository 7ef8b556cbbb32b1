//! The tag tree model shared by every codec in this workspace.

use derive_more::derive::{Constructor, Deref, DerefMut};
use indexmap::IndexMap;

use crate::error::{Error, Result};

/// Wire identifier of a tag variant.
///
/// `End` (0x00) only ever appears on the wire, terminating a Compound payload
/// or marking the element id of an empty list. It is never the id of a
/// materialized [`Tag`].
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagId {
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

impl TagId {
    /// Lowercase name used in diagnostics and the JSON view.
    pub const fn name(self) -> &'static str {
        match self {
            TagId::End => "end",
            TagId::Byte => "byte",
            TagId::Short => "short",
            TagId::Int => "int",
            TagId::Long => "long",
            TagId::Float => "float",
            TagId::Double => "double",
            TagId::ByteArray => "byte_array",
            TagId::String => "string",
            TagId::List => "list",
            TagId::Compound => "compound",
            TagId::IntArray => "int_array",
            TagId::LongArray => "long_array",
        }
    }
}

impl TryFrom<u8> for TagId {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Ok(match value {
            0 => TagId::End,
            1 => TagId::Byte,
            2 => TagId::Short,
            3 => TagId::Int,
            4 => TagId::Long,
            5 => TagId::Float,
            6 => TagId::Double,
            7 => TagId::ByteArray,
            8 => TagId::String,
            9 => TagId::List,
            10 => TagId::Compound,
            11 => TagId::IntArray,
            12 => TagId::LongArray,
            other => return Err(Error::UnknownVariant(other)),
        })
    }
}

/// A node of the tag tree.
///
/// Numeric variants carry exactly the range the wire allows, so a `Tag` that
/// exists is already range-valid. Byte arrays surface unsigned octets; the
/// wire representation is the same bit pattern either way.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<u8>),
    String(String),
    List(ListTag),
    Compound(CompoundTag),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    /// Wire id of this tag.
    pub const fn id(&self) -> TagId {
        match self {
            Tag::Byte(_) => TagId::Byte,
            Tag::Short(_) => TagId::Short,
            Tag::Int(_) => TagId::Int,
            Tag::Long(_) => TagId::Long,
            Tag::Float(_) => TagId::Float,
            Tag::Double(_) => TagId::Double,
            Tag::ByteArray(_) => TagId::ByteArray,
            Tag::String(_) => TagId::String,
            Tag::List(_) => TagId::List,
            Tag::Compound(_) => TagId::Compound,
            Tag::IntArray(_) => TagId::IntArray,
            Tag::LongArray(_) => TagId::LongArray,
        }
    }

    /// Lowercase variant name, as used in diagnostics.
    pub const fn type_name(&self) -> &'static str {
        self.id().name()
    }

    /// Narrow an integer to the smallest variant whose range holds it.
    ///
    /// This is the promotion applied to untyped numbers (JSON ingest, native
    /// maps); typed Rust integers convert via `From` without narrowing.
    pub fn infer_int(value: i64) -> Tag {
        if let Ok(v) = i8::try_from(value) {
            Tag::Byte(v)
        } else if let Ok(v) = i16::try_from(value) {
            Tag::Short(v)
        } else if let Ok(v) = i32::try_from(value) {
            Tag::Int(v)
        } else {
            Tag::Long(value)
        }
    }

    pub fn as_compound(&self) -> Option<&CompoundTag> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut CompoundTag> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListTag> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut ListTag> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }

    /// The value as an `i64`, if this is any integer variant.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Byte(v) => Some(*v as i64),
            Tag::Short(v) => Some(*v as i64),
            Tag::Int(v) => Some(*v as i64),
            Tag::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render the tree to a bounded depth.
    ///
    /// Children below `depth` levels are elided with an ellipsis. Intended
    /// for logs and interactive inspection, not for round-tripping.
    pub fn inspect(&self, depth: usize) -> String {
        let mut out = String::new();
        inspect_into(self, depth, 0, &mut out);
        out
    }
}

fn inspect_into(tag: &Tag, depth: usize, indent: usize, out: &mut String) {
    let pad = "  ".repeat(indent);
    match tag {
        Tag::Compound(c) => {
            out.push_str(&format!("{pad}compound ({} entries)\n", c.len()));
            if depth == 0 && !c.is_empty() {
                out.push_str(&format!("{pad}  …\n"));
                return;
            }
            for (key, value) in c.iter() {
                match value {
                    Tag::Compound(_) | Tag::List(_) => {
                        out.push_str(&format!("{pad}  {key}:\n"));
                        inspect_into(value, depth.saturating_sub(1), indent + 2, out);
                    }
                    scalar => {
                        out.push_str(&format!("{pad}  {key}: {}\n", inspect_scalar(scalar)));
                    }
                }
            }
        }
        Tag::List(l) => {
            out.push_str(&format!(
                "{pad}list<{}> ({} items)\n",
                l.elem().name(),
                l.len()
            ));
            if depth == 0 && !l.is_empty() {
                out.push_str(&format!("{pad}  …\n"));
                return;
            }
            for item in l.iter() {
                match item {
                    Tag::Compound(_) | Tag::List(_) => {
                        inspect_into(item, depth.saturating_sub(1), indent + 1, out);
                    }
                    scalar => out.push_str(&format!("{pad}  {}\n", inspect_scalar(scalar))),
                }
            }
        }
        scalar => out.push_str(&format!("{pad}{}\n", inspect_scalar(scalar))),
    }
}

fn inspect_scalar(tag: &Tag) -> String {
    match tag {
        Tag::Byte(v) => format!("byte {v}"),
        Tag::Short(v) => format!("short {v}"),
        Tag::Int(v) => format!("int {v}"),
        Tag::Long(v) => format!("long {v}"),
        Tag::Float(v) => format!("float {v}"),
        Tag::Double(v) => format!("double {v}"),
        Tag::ByteArray(v) => format!("byte_array ({} bytes)", v.len()),
        Tag::String(s) => format!("string {s:?}"),
        Tag::IntArray(v) => format!("int_array ({} ints)", v.len()),
        Tag::LongArray(v) => format!("long_array ({} longs)", v.len()),
        Tag::Compound(_) | Tag::List(_) => unreachable!("handled by inspect_into"),
    }
}

impl From<bool> for Tag {
    fn from(value: bool) -> Self {
        Tag::Byte(value as i8)
    }
}

impl From<i8> for Tag {
    fn from(value: i8) -> Self {
        Tag::Byte(value)
    }
}

impl From<i16> for Tag {
    fn from(value: i16) -> Self {
        Tag::Short(value)
    }
}

impl From<i32> for Tag {
    fn from(value: i32) -> Self {
        Tag::Int(value)
    }
}

impl From<i64> for Tag {
    fn from(value: i64) -> Self {
        Tag::Long(value)
    }
}

impl From<f32> for Tag {
    fn from(value: f32) -> Self {
        Tag::Float(value)
    }
}

impl From<f64> for Tag {
    fn from(value: f64) -> Self {
        Tag::Double(value)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Tag::String(value.to_owned())
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Tag::String(value)
    }
}

impl From<Vec<u8>> for Tag {
    fn from(value: Vec<u8>) -> Self {
        Tag::ByteArray(value)
    }
}

impl From<Vec<i32>> for Tag {
    fn from(value: Vec<i32>) -> Self {
        Tag::IntArray(value)
    }
}

impl From<Vec<i64>> for Tag {
    fn from(value: Vec<i64>) -> Self {
        Tag::LongArray(value)
    }
}

impl From<ListTag> for Tag {
    fn from(value: ListTag) -> Self {
        Tag::List(value)
    }
}

impl From<CompoundTag> for Tag {
    fn from(value: CompoundTag) -> Self {
        Tag::Compound(value)
    }
}

/// A homogeneous sequence of bare payloads.
///
/// Every payload matches the declared element id; `push` rejects anything
/// else. An empty list defaults to element id `Byte` and adopts the id of
/// the first payload pushed into it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListTag {
    elem: TagId,
    items: Vec<Tag>,
}

impl Default for ListTag {
    fn default() -> Self {
        ListTag::new(TagId::Byte)
    }
}

impl ListTag {
    /// An empty list of the given element id. `End` is promoted to `Byte`,
    /// matching the historical wire convention for empty lists.
    pub fn new(elem: TagId) -> Self {
        let elem = if elem == TagId::End { TagId::Byte } else { elem };
        ListTag {
            elem,
            items: Vec::new(),
        }
    }

    /// Build a list from payloads, checking homogeneity.
    ///
    /// With `elem` unset the element id is taken from the first item; an
    /// empty list without a declared id gets `Byte`.
    pub fn from_items(items: Vec<Tag>, elem: Option<TagId>) -> Result<Self> {
        let elem = match elem.or_else(|| items.first().map(Tag::id)) {
            Some(TagId::End) | None => TagId::Byte,
            Some(id) => id,
        };
        for item in &items {
            if item.id() != elem {
                return Err(Error::ListTypeMismatch {
                    expected: elem.name(),
                    found: item.type_name(),
                });
            }
        }
        Ok(ListTag { elem, items })
    }

    pub fn elem(&self) -> TagId {
        self.elem
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

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Tag> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }

    /// Append a payload of the declared element id.
    pub fn push(&mut self, tag: Tag) -> Result<()> {
        if self.items.is_empty() && self.elem == TagId::Byte && tag.id() != TagId::Byte {
            // A list that has only ever been empty adopts its first payload.
            self.elem = tag.id();
        }
        if tag.id() != self.elem {
            return Err(Error::ListTypeMismatch {
                expected: self.elem.name(),
                found: tag.type_name(),
            });
        }
        self.items.push(tag);
        Ok(())
    }

    /// Replace the payload at `index`, keeping the declared element id.
    pub fn set(&mut self, index: usize, tag: Tag) -> Result<()> {
        if tag.id() != self.elem {
            return Err(Error::ListTypeMismatch {
                expected: self.elem.name(),
                found: tag.type_name(),
            });
        }
        let len = self.items.len();
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = tag;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { index, len }),
        }
    }

    pub fn remove(&mut self, index: usize) -> Result<Tag> {
        if index >= self.items.len() {
            return Err(Error::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }
}

impl<'a> IntoIterator for &'a ListTag {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An ordered mapping of names to tags.
///
/// Insertion order is observable and survives serialization. Inserting an
/// existing key overwrites the value but keeps the key's original position.
#[derive(Debug, Clone, PartialEq, Default, Constructor, Deref, DerefMut)]
pub struct CompoundTag(IndexMap<String, Tag>);

impl CompoundTag {
    /// Insert a value convertible to a tag, returning the previous value.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Tag>) -> Option<Tag> {
        self.0.insert(key.into(), value.into())
    }
}

impl FromIterator<(String, Tag)> for CompoundTag {
    fn from_iter<T: IntoIterator<Item = (String, Tag)>>(iter: T) -> Self {
        CompoundTag(iter.into_iter().collect())
    }
}

/// A top-level tag labeled with its outer name (conventionally empty).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: String,
    pub root: Tag,
}

impl Document {
    pub fn new(name: impl Into<String>, root: impl Into<Tag>) -> Self {
        Document {
            name: name.into(),
            root: root.into(),
        }
    }

    /// An empty compound document, the usual starting point for editing.
    pub fn empty() -> Self {
        Document::new("", CompoundTag::default())
    }

    /// Render the tree to a bounded depth. See [`Tag::inspect`].
    pub fn inspect(&self, depth: usize) -> String {
        self.root.inspect(depth)
    }
}
