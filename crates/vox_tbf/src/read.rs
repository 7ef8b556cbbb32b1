//! Decoding TBF byte streams into tag trees.
//!

use byteorder::{BigEndian, ByteOrder};
use tracing::instrument;

use crate::{
    error::{Error, Result},
    types::{CompoundTag, Document, ListTag, Tag, TagId},
};

/// Cursor over a byte buffer tracking the absolute decode position.
struct SliceReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        SliceReader { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.buf.len())
            .ok_or(Error::Truncated(self.pos))?;
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    fn read_i16(&mut self) -> Result<i16> {
        Ok(BigEndian::read_i16(self.take(2)?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(BigEndian::read_i64(self.take(8)?))
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(BigEndian::read_f32(self.take(4)?))
    }

    fn read_f64(&mut self) -> Result<f64> {
        Ok(BigEndian::read_f64(self.take(8)?))
    }

    /// A `u16`-prefixed UTF-8 string.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        let start = self.pos;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidString(start))
    }

    /// A non-negative `i32` element count.
    fn read_len(&mut self) -> Result<usize> {
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| Error::InvalidLength(len))
    }
}

/// Parse a named document from the start of `buf`, returning the tree and
/// the number of bytes consumed.
#[instrument(skip(buf), fields(len = buf.len()))]
pub fn read_document(buf: &[u8]) -> Result<(Document, usize)> {
    let mut reader = SliceReader::new(buf);
    let id = TagId::try_from(reader.read_u8()?)?;
    if id == TagId::End {
        return Err(Error::UnknownVariant(TagId::End as u8));
    }
    let name = reader.read_string()?;
    let root = read_payload(&mut reader, id)?;
    Ok((Document { name, root }, reader.pos))
}

/// Parse a named document, ignoring any trailing bytes.
pub fn read_bytes(buf: &[u8]) -> Result<Document> {
    read_document(buf).map(|(doc, _)| doc)
}

fn read_payload(reader: &mut SliceReader<'_>, id: TagId) -> Result<Tag> {
    Ok(match id {
        TagId::End => return Err(Error::UnknownVariant(TagId::End as u8)),
        TagId::Byte => Tag::Byte(reader.read_i8()?),
        TagId::Short => Tag::Short(reader.read_i16()?),
        TagId::Int => Tag::Int(reader.read_i32()?),
        TagId::Long => Tag::Long(reader.read_i64()?),
        TagId::Float => Tag::Float(reader.read_f32()?),
        TagId::Double => Tag::Double(reader.read_f64()?),
        TagId::ByteArray => {
            let len = reader.read_len()?;
            Tag::ByteArray(reader.take(len)?.to_vec())
        }
        TagId::String => Tag::String(reader.read_string()?),
        TagId::List => Tag::List(read_list(reader)?),
        TagId::Compound => Tag::Compound(read_compound(reader)?),
        TagId::IntArray => {
            let len = reader.read_len()?;
            let mut items = Vec::with_capacity(len.min(1 << 16));
            for _ in 0..len {
                items.push(reader.read_i32()?);
            }
            Tag::IntArray(items)
        }
        TagId::LongArray => {
            let len = reader.read_len()?;
            let mut items = Vec::with_capacity(len.min(1 << 16));
            for _ in 0..len {
                items.push(reader.read_i64()?);
            }
            Tag::LongArray(items)
        }
    })
}

fn read_list(reader: &mut SliceReader<'_>) -> Result<ListTag> {
    let elem = reader.read_u8()?;
    let len = reader.read_len()?;

    // An empty list is written with element id End; it comes back as an
    // empty list of Byte.
    if len == 0 {
        let elem = match TagId::try_from(elem)? {
            TagId::End => TagId::Byte,
            id => id,
        };
        return Ok(ListTag::new(elem));
    }

    let elem = match TagId::try_from(elem)? {
        TagId::End => return Err(Error::UnknownVariant(TagId::End as u8)),
        id => id,
    };
    let mut items = Vec::with_capacity(len.min(1 << 16));
    for _ in 0..len {
        items.push(read_payload(reader, elem)?);
    }
    ListTag::from_items(items, Some(elem))
}

fn read_compound(reader: &mut SliceReader<'_>) -> Result<CompoundTag> {
    let mut entries = CompoundTag::default();
    loop {
        let id = TagId::try_from(reader.read_u8()?)?;
        if id == TagId::End {
            return Ok(entries);
        }
        let name = reader.read_string()?;
        let value = read_payload(reader, id)?;
        entries.insert(name, value);
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn read_named_int() -> Result<()> {
        // { "Hello": Int 42 } with empty outer name
        #[rustfmt::skip]
        let input = [
            0x0A, 0x00, 0x00,
            0x03, 0x00, 0x05, 0x48, 0x65, 0x6C, 0x6C, 0x6F,
            0x00, 0x00, 0x00, 0x2A,
            0x00,
        ];

        let (doc, consumed) = read_document(&input)?;
        assert_eq!(consumed, input.len());
        assert_eq!(doc.name, "");

        let root = doc.root.as_compound().unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root.get("Hello"), Some(&Tag::Int(42)));

        Ok(())
    }

    #[test]
    fn read_empty_list_promotes_to_byte() -> Result<()> {
        // { "L": List<End>[] } — element id End, length 0
        #[rustfmt::skip]
        let input = [
            0x0A, 0x00, 0x00,
            0x09, 0x00, 0x01, 0x4C,
            0x00,
            0x00, 0x00, 0x00, 0x00,
            0x00,
        ];

        let (doc, _) = read_document(&input)?;
        let root = doc.root.as_compound().unwrap();
        let list = root.get("L").and_then(Tag::as_list).unwrap();
        assert!(list.is_empty());
        assert_eq!(list.elem(), TagId::Byte);

        Ok(())
    }

    #[test]
    fn read_reports_truncation_position() {
        // Int payload cut off after two of four bytes.
        let input = [0x03, 0x00, 0x01, 0x78, 0x00, 0x00];
        let err = read_document(&input).unwrap_err();
        assert!(matches!(err, Error::Truncated(4)));
    }

    #[test]
    fn read_rejects_unknown_variant() {
        let input = [0x0D, 0x00, 0x00];
        let err = read_document(&input).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant(0x0D)));
    }

    #[test]
    fn read_rejects_invalid_utf8_name() {
        let input = [0x08, 0x00, 0x02, 0xFF, 0xFE, 0x00, 0x00];
        let err = read_document(&input).unwrap_err();
        assert!(matches!(err, Error::InvalidString(3)));
    }

    #[test]
    fn read_rejects_negative_array_length() {
        #[rustfmt::skip]
        let input = [
            0x07, 0x00, 0x00,
            0xFF, 0xFF, 0xFF, 0xFF,
        ];
        let err = read_document(&input).unwrap_err();
        assert!(matches!(err, Error::InvalidLength(-1)));
    }

    #[test]
    fn read_rejects_end_in_nonempty_list() {
        #[rustfmt::skip]
        let input = [
            0x09, 0x00, 0x00,
            0x00,
            0x00, 0x00, 0x00, 0x01,
        ];
        let err = read_document(&input).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant(0x00)));
    }

    #[test]
    fn consumed_count_ignores_trailing_bytes() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x01, 0x00, 0x01, 0x62, 0x7F,
            0xDE, 0xAD,
        ];
        let (doc, consumed) = read_document(&input)?;
        assert_eq!(consumed, 5);
        assert_eq!(doc.root, Tag::Byte(127));
        Ok(())
    }
}
