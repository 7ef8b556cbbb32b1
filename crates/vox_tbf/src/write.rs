//! Encoding tag trees into TBF byte streams.
//!

use byteorder::{BigEndian, WriteBytesExt};
use tracing::instrument;

use crate::{
    error::{Error, Result},
    types::{Document, ListTag, Tag, TagId},
};

/// Emit a named document: variant id, outer name, payload.
///
/// Output is deterministic; re-encoding a freshly parsed buffer reproduces
/// it byte for byte.
#[instrument(skip(doc), fields(name = %doc.name))]
pub fn write_document(doc: &Document) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.write_u8(doc.root.id() as u8)?;
    write_string(&mut out, &doc.name)?;
    write_payload(&mut out, &doc.root)?;
    Ok(out)
}

/// Alias of [`write_document`] matching the reader-side `read_bytes`.
pub fn write_bytes(doc: &Document) -> Result<Vec<u8>> {
    write_document(doc)
}

fn write_string(out: &mut Vec<u8>, s: &str) -> Result<()> {
    let len = u16::try_from(s.len()).map_err(|_| Error::StringTooLong(s.len()))?;
    out.write_u16::<BigEndian>(len)?;
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

fn write_len(out: &mut Vec<u8>, len: usize) -> Result<()> {
    let len = i32::try_from(len).map_err(|_| Error::LengthOverflow(len))?;
    out.write_i32::<BigEndian>(len)?;
    Ok(())
}

fn write_payload(out: &mut Vec<u8>, tag: &Tag) -> Result<()> {
    match tag {
        Tag::Byte(v) => out.write_i8(*v)?,
        Tag::Short(v) => out.write_i16::<BigEndian>(*v)?,
        Tag::Int(v) => out.write_i32::<BigEndian>(*v)?,
        Tag::Long(v) => out.write_i64::<BigEndian>(*v)?,
        Tag::Float(v) => out.write_f32::<BigEndian>(*v)?,
        Tag::Double(v) => out.write_f64::<BigEndian>(*v)?,
        Tag::ByteArray(v) => {
            write_len(out, v.len())?;
            out.extend_from_slice(v);
        }
        Tag::String(s) => write_string(out, s)?,
        Tag::List(list) => write_list(out, list)?,
        Tag::Compound(entries) => {
            for (name, value) in entries.iter() {
                out.write_u8(value.id() as u8)?;
                write_string(out, name)?;
                write_payload(out, value)?;
            }
            out.write_u8(TagId::End as u8)?;
        }
        Tag::IntArray(v) => {
            write_len(out, v.len())?;
            for item in v {
                out.write_i32::<BigEndian>(*item)?;
            }
        }
        Tag::LongArray(v) => {
            write_len(out, v.len())?;
            for item in v {
                out.write_i64::<BigEndian>(*item)?;
            }
        }
    }
    Ok(())
}

fn write_list(out: &mut Vec<u8>, list: &ListTag) -> Result<()> {
    // An empty list is written with element id End, the historical form.
    let elem = if list.is_empty() { TagId::End } else { list.elem() };
    out.write_u8(elem as u8)?;
    write_len(out, list.len())?;
    for item in list.iter() {
        write_payload(out, item)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::read::read_document;
    use crate::types::{CompoundTag, TagId};

    #[test]
    fn write_named_int() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            0x0A, 0x00, 0x00,
            0x03, 0x00, 0x05, 0x48, 0x65, 0x6C, 0x6C, 0x6F,
            0x00, 0x00, 0x00, 0x2A,
            0x00,
        ];

        let mut root = CompoundTag::default();
        root.put("Hello", 42i32);
        let doc = Document::new("", root);

        assert_eq!(write_document(&doc)?, expected);
        Ok(())
    }

    #[test]
    fn write_empty_list_uses_end_element() -> Result<()> {
        #[rustfmt::skip]
        let expected = vec![
            0x0A, 0x00, 0x00,
            0x09, 0x00, 0x01, 0x4C,
            0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00,
        ];

        let mut root = CompoundTag::default();
        root.put("L", ListTag::new(TagId::Byte));
        let doc = Document::new("", root);

        assert_eq!(write_document(&doc)?, expected);
        Ok(())
    }

    #[test]
    fn encode_is_idempotent() -> Result<()> {
        let mut inner = CompoundTag::default();
        inner.put("flag", true);
        inner.put("pi", 3.14f64);

        let mut root = CompoundTag::default();
        root.put("name", "splines");
        root.put("levels", vec![1i32, 2, 3]);
        root.put("inner", inner);
        let doc = Document::new("root", root);

        let first = write_document(&doc)?;
        let (parsed, consumed) = read_document(&first)?;
        assert_eq!(consumed, first.len());
        assert_eq!(parsed, doc);

        let second = write_document(&parsed)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn write_rejects_oversized_string() {
        let doc = Document::new("", Tag::String("x".repeat(70_000)));
        assert!(matches!(
            write_document(&doc),
            Err(Error::StringTooLong(70_000))
        ));
    }
}
