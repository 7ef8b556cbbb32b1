//! Path-addressed access to a document.
//!
//! A path is a dot-separated sequence of segments. A segment of decimal
//! digits indexes a list; any other segment keys a compound. `"player.inv.0"`
//! addresses the first element of the list under `inv` inside `player`.

use crate::{
    error::{Error, Result},
    types::{CompoundTag, Document, ListTag, Tag, TagId},
};

enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

fn segment(raw: &str) -> Segment<'_> {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        match raw.parse() {
            Ok(index) => Segment::Index(index),
            Err(_) => Segment::Key(raw),
        }
    } else {
        Segment::Key(raw)
    }
}

fn descend<'t>(tag: &'t Tag, raw: &str) -> Option<&'t Tag> {
    match segment(raw) {
        Segment::Key(key) => tag.as_compound()?.get(key),
        Segment::Index(index) => tag.as_list()?.get(index),
    }
}

fn descend_mut<'t>(tag: &'t mut Tag, raw: &str) -> Option<&'t mut Tag> {
    match segment(raw) {
        Segment::Key(key) => tag.as_compound_mut()?.get_mut(key),
        Segment::Index(index) => tag.as_list_mut()?.get_mut(index),
    }
}

impl Document {
    /// The tag addressed by `path`, or `None` if any segment is missing.
    /// The empty path addresses the root.
    pub fn get(&self, path: &str) -> Option<&Tag> {
        if path.is_empty() {
            return Some(&self.root);
        }
        path.split('.').try_fold(&self.root, descend)
    }

    /// Mutable counterpart of [`Document::get`].
    pub fn get_mut(&mut self, path: &str) -> Option<&mut Tag> {
        if path.is_empty() {
            return Some(&mut self.root);
        }
        path.split('.').try_fold(&mut self.root, descend_mut)
    }

    /// Replace (or, for a new compound key, insert) the tag at `path`.
    ///
    /// Every parent segment must already exist. List indices must be in
    /// bounds and the replacement must match the list's declared element id.
    pub fn set(&mut self, path: &str, value: impl Into<Tag>) -> Result<()> {
        let (parent_path, last) = match path.rsplit_once('.') {
            Some((parent, last)) => (parent, last),
            None if !path.is_empty() => ("", path),
            _ => return Err(Error::InvalidPath(path.to_owned())),
        };

        let parent = self
            .get_mut(parent_path)
            .ok_or_else(|| Error::InvalidPath(path.to_owned()))?;

        match segment(last) {
            Segment::Key(key) => match parent.as_compound_mut() {
                Some(compound) => {
                    compound.insert(key.to_owned(), value.into());
                    Ok(())
                }
                None => Err(Error::TypeMismatch {
                    expected: TagId::Compound.name(),
                    found: parent.type_name(),
                }),
            },
            Segment::Index(index) => match parent.as_list_mut() {
                Some(list) => list.set(index, value.into()),
                None => Err(Error::TypeMismatch {
                    expected: TagId::List.name(),
                    found: parent.type_name(),
                }),
            },
        }
    }

    /// Remove and return the tag at `path`.
    pub fn remove(&mut self, path: &str) -> Result<Tag> {
        let (parent_path, last) = match path.rsplit_once('.') {
            Some((parent, last)) => (parent, last),
            None if !path.is_empty() => ("", path),
            _ => return Err(Error::InvalidPath(path.to_owned())),
        };

        let parent = self
            .get_mut(parent_path)
            .ok_or_else(|| Error::InvalidPath(path.to_owned()))?;

        match segment(last) {
            Segment::Key(key) => match parent.as_compound_mut() {
                Some(compound) => compound
                    .shift_remove(key)
                    .ok_or_else(|| Error::InvalidPath(path.to_owned())),
                None => Err(Error::TypeMismatch {
                    expected: TagId::Compound.name(),
                    found: parent.type_name(),
                }),
            },
            Segment::Index(index) => match parent.as_list_mut() {
                Some(list) => list.remove(index),
                None => Err(Error::TypeMismatch {
                    expected: TagId::List.name(),
                    found: parent.type_name(),
                }),
            },
        }
    }
}

/// Build a compound, promoting each native value through its `From` impl.
pub fn create_compound<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> CompoundTag
where
    K: Into<String>,
    V: Into<Tag>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Build a list from promoted values.
///
/// With `elem` unset the element id is inferred from the first item;
/// heterogeneous inputs fail with `ListTypeMismatch`.
pub fn create_list<V>(items: impl IntoIterator<Item = V>, elem: Option<TagId>) -> Result<ListTag>
where
    V: Into<Tag>,
{
    ListTag::from_items(items.into_iter().map(Into::into).collect(), elem)
}
