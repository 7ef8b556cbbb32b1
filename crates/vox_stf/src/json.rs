//! JSON view of a document, and reconstruction from JSON.
//!
//! The view is `{ "name", "type", "value" }` where `value` is a recursive
//! erasure of tags to native JSON. Longs are rendered as strings so their
//! 64 bits survive JSON number precision; a list's element id is lost.

use serde_json::{json, Map, Number, Value};
use vox_tbf::{CompoundTag, Document, ListTag, Tag, TagId};

use crate::error::{Error, Result};

/// Render a document as a `{ name, type, value }` JSON envelope.
pub fn to_json(doc: &Document) -> Value {
    json!({
        "name": doc.name,
        "type": doc.root.type_name(),
        "value": value_to_json(&doc.root),
    })
}

fn value_to_json(tag: &Tag) -> Value {
    match tag {
        Tag::Byte(v) => Value::Number((*v).into()),
        Tag::Short(v) => Value::Number((*v).into()),
        Tag::Int(v) => Value::Number((*v).into()),
        Tag::Long(v) => Value::String(v.to_string()),
        Tag::Float(v) => float_to_json(*v as f64),
        Tag::Double(v) => float_to_json(*v),
        Tag::ByteArray(v) => Value::Array(v.iter().map(|b| Value::Number((*b).into())).collect()),
        Tag::String(s) => Value::String(s.clone()),
        Tag::List(list) => Value::Array(list.iter().map(value_to_json).collect()),
        Tag::Compound(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect::<Map<_, _>>(),
        ),
        Tag::IntArray(v) => Value::Array(v.iter().map(|i| Value::Number((*i).into())).collect()),
        Tag::LongArray(v) => Value::Array(v.iter().map(|l| Value::String(l.to_string())).collect()),
    }
}

fn float_to_json(v: f64) -> Value {
    // Non-finite floats have no JSON number form.
    Number::from_f64(v).map_or(Value::Null, Value::Number)
}

/// Rebuild a document from its JSON form.
///
/// A `{ name?, type?, value }` envelope is honored at any level; bare
/// values are promoted by type inference: booleans become bytes, integers
/// the smallest fitting variant, other numbers doubles, arrays lists,
/// objects compounds. `null` and anything else unrepresentable becomes the
/// string of its printed form.
pub fn from_json(value: &Value) -> Result<Document> {
    if let Some(envelope) = value.as_object() {
        if envelope.contains_key("value") {
            let name = envelope
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let root = tag_from_json(&envelope["value"], envelope_type(envelope, "$")?, "$.value")?;
            return Ok(Document::new(name, root));
        }
    }
    Ok(Document::new("", tag_from_json(value, None, "$")?))
}

fn envelope_type(envelope: &Map<String, Value>, path: &str) -> Result<Option<TagId>> {
    let Some(raw) = envelope.get("type") else {
        return Ok(None);
    };
    let name = raw
        .as_str()
        .ok_or_else(|| Error::json(path, "`type` must be a string"))?;
    type_by_name(name)
        .map(Some)
        .ok_or_else(|| Error::json(path, format!("unknown type `{name}`")))
}

fn type_by_name(name: &str) -> Option<TagId> {
    Some(match name {
        "byte" => TagId::Byte,
        "short" => TagId::Short,
        "int" => TagId::Int,
        "long" => TagId::Long,
        "float" => TagId::Float,
        "double" => TagId::Double,
        "byte_array" => TagId::ByteArray,
        "string" => TagId::String,
        "list" => TagId::List,
        "compound" => TagId::Compound,
        "int_array" => TagId::IntArray,
        "long_array" => TagId::LongArray,
        _ => return None,
    })
}

fn tag_from_json(value: &Value, hint: Option<TagId>, path: &str) -> Result<Tag> {
    // A nested envelope carries its own hint.
    if hint.is_none() {
        if let Some(envelope) = value.as_object() {
            if envelope.contains_key("value") && envelope.contains_key("type") {
                let inner = envelope_type(envelope, path)?;
                return tag_from_json(&envelope["value"], inner, path);
            }
        }
    }

    match hint {
        None => infer(value, path),
        Some(TagId::End) => Err(Error::json(path, "`end` is not a value type")),
        Some(TagId::Byte) => match value {
            Value::Bool(b) => Ok(Tag::Byte(*b as i8)),
            _ => Ok(Tag::Byte(integer_in_range(value, path, "byte")? as i8)),
        },
        Some(TagId::Short) => Ok(Tag::Short(integer_in_range(value, path, "short")? as i16)),
        Some(TagId::Int) => Ok(Tag::Int(integer_in_range(value, path, "int")? as i32)),
        Some(TagId::Long) => Ok(Tag::Long(long_value(value, path)?)),
        Some(TagId::Float) => Ok(Tag::Float(number_value(value, path)? as f32)),
        Some(TagId::Double) => Ok(Tag::Double(number_value(value, path)?)),
        Some(TagId::String) => match value {
            Value::String(s) => Ok(Tag::String(s.clone())),
            other => Ok(Tag::String(other.to_string())),
        },
        Some(TagId::ByteArray) => {
            let items = array_value(value, path)?;
            let mut bytes = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let v = integer_in_range_raw(item, &format!("{path}[{i}]"), -128, 255, "byte")?;
                bytes.push(v as u8);
            }
            Ok(Tag::ByteArray(bytes))
        }
        Some(TagId::IntArray) => {
            let items = array_value(value, path)?;
            let mut ints = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                ints.push(integer_in_range_raw(
                    item,
                    &format!("{path}[{i}]"),
                    i32::MIN as i64,
                    i32::MAX as i64,
                    "int",
                )? as i32);
            }
            Ok(Tag::IntArray(ints))
        }
        Some(TagId::LongArray) => {
            let items = array_value(value, path)?;
            let mut longs = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                longs.push(long_value(item, &format!("{path}[{i}]"))?);
            }
            Ok(Tag::LongArray(longs))
        }
        Some(TagId::List) => {
            let items = array_value(value, path)?;
            let mut tags = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                tags.push(tag_from_json(item, None, &format!("{path}[{i}]"))?);
            }
            list_from_tags(tags, path)
        }
        Some(TagId::Compound) => {
            let entries = value
                .as_object()
                .ok_or_else(|| Error::json(path, "expected an object"))?;
            let mut compound = CompoundTag::default();
            for (key, item) in entries {
                compound.insert(
                    key.clone(),
                    tag_from_json(item, None, &format!("{path}.{key}"))?,
                );
            }
            Ok(Tag::Compound(compound))
        }
    }
}

fn infer(value: &Value, path: &str) -> Result<Tag> {
    Ok(match value {
        Value::Bool(b) => Tag::Byte(*b as i8),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Tag::infer_int(i)
            } else if let Some(f) = n.as_f64() {
                Tag::Double(f)
            } else {
                return Err(Error::json(path, format!("integer {n} out of range")));
            }
        }
        Value::String(s) => Tag::String(s.clone()),
        Value::Array(items) => {
            let mut tags = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                tags.push(tag_from_json(item, None, &format!("{path}[{i}]"))?);
            }
            list_from_tags(tags, path)?
        }
        Value::Object(entries) => {
            let mut compound = CompoundTag::default();
            for (key, item) in entries {
                compound.insert(
                    key.clone(),
                    tag_from_json(item, None, &format!("{path}.{key}"))?,
                );
            }
            Tag::Compound(compound)
        }
        Value::Null => Tag::String("null".to_owned()),
    })
}

/// Turn inferred tags into a list, widening mixed integer variants to the
/// widest present. JSON numbers carry no width, so `[0, 127, 128]` must
/// come back as one homogeneous list rather than fail as Byte-then-Short.
fn list_from_tags(tags: Vec<Tag>, path: &str) -> Result<Tag> {
    fn rank(tag: &Tag) -> Option<u8> {
        match tag {
            Tag::Byte(_) => Some(0),
            Tag::Short(_) => Some(1),
            Tag::Int(_) => Some(2),
            Tag::Long(_) => Some(3),
            _ => None,
        }
    }

    let homogeneous = tags.windows(2).all(|pair| pair[0].id() == pair[1].id());
    let tags = if !homogeneous && tags.iter().all(|t| rank(t).is_some()) {
        let widest = tags.iter().filter_map(rank).max().unwrap_or(0);
        tags.iter()
            .map(|t| {
                let v = t.as_i64().expect("integer variants convert to i64");
                match widest {
                    0 => Tag::Byte(v as i8),
                    1 => Tag::Short(v as i16),
                    2 => Tag::Int(v as i32),
                    _ => Tag::Long(v),
                }
            })
            .collect()
    } else {
        tags
    };

    ListTag::from_items(tags, None)
        .map(Tag::List)
        .map_err(|e| Error::json(path, e.to_string()))
}

fn integer_in_range(value: &Value, path: &str, variant: &str) -> Result<i64> {
    let (min, max) = match variant {
        "byte" => (i8::MIN as i64, i8::MAX as i64),
        "short" => (i16::MIN as i64, i16::MAX as i64),
        _ => (i32::MIN as i64, i32::MAX as i64),
    };
    integer_in_range_raw(value, path, min, max, variant)
}

fn integer_in_range_raw(
    value: &Value,
    path: &str,
    min: i64,
    max: i64,
    variant: &str,
) -> Result<i64> {
    let v = value
        .as_i64()
        .ok_or_else(|| Error::json(path, format!("expected a {variant}")))?;
    if !(min..=max).contains(&v) {
        return Err(Error::json(
            path,
            format!("value {v} does not fit a {variant}"),
        ));
    }
    Ok(v)
}

/// Longs arrive either as JSON numbers or, round-tripping the view, as
/// decimal strings.
fn long_value(value: &Value, path: &str) -> Result<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| Error::json(path, format!("integer {n} out of range"))),
        Value::String(s) => s
            .parse()
            .map_err(|_| Error::json(path, format!("`{s}` is not a long"))),
        _ => Err(Error::json(path, "expected a long")),
    }
}

fn number_value(value: &Value, path: &str) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| Error::json(path, "expected a number"))
}

fn array_value<'v>(value: &'v Value, path: &str) -> Result<&'v Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::json(path, "expected an array"))
}
