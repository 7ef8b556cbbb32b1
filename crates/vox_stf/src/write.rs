//! Emitting tag trees as STF text.
//!

use vox_tbf::{Document, Tag};

/// Entries whose compact form reaches this length force a compound onto
/// multiple lines in pretty mode.
const COMPOUND_ENTRY_LIMIT: usize = 30;
/// Same threshold for list items.
const LIST_ITEM_LIMIT: usize = 20;

/// Render a document's root tag. The outer name has no textual form.
pub fn to_stf(doc: &Document, pretty: bool) -> String {
    if pretty {
        emit_pretty(&doc.root)
    } else {
        emit(&doc.root)
    }
}

/// Compact rendering: no whitespace outside of strings.
pub fn emit(tag: &Tag) -> String {
    let mut out = String::new();
    emit_into(tag, &mut out);
    out
}

/// Pretty rendering: two-space indent per depth, short children collapsed
/// onto one line. Deterministic for a given tree.
pub fn emit_pretty(tag: &Tag) -> String {
    let mut out = String::new();
    emit_pretty_into(tag, 0, &mut out);
    out
}

fn emit_into(tag: &Tag, out: &mut String) {
    match tag {
        Tag::Byte(v) => {
            out.push_str(&v.to_string());
            out.push('b');
        }
        Tag::Short(v) => {
            out.push_str(&v.to_string());
            out.push('s');
        }
        Tag::Int(v) => out.push_str(&v.to_string()),
        Tag::Long(v) => {
            out.push_str(&v.to_string());
            out.push('L');
        }
        Tag::Float(v) => {
            out.push_str(&v.to_string());
            out.push('f');
        }
        Tag::Double(v) => {
            out.push_str(&v.to_string());
            out.push('d');
        }
        Tag::ByteArray(v) => {
            out.push_str("[B;");
            for (i, item) in v.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&item.to_string());
                out.push('b');
            }
            out.push(']');
        }
        Tag::String(s) => quote_string(s, out),
        Tag::List(list) => {
            out.push('[');
            for (i, item) in list.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                emit_into(item, out);
            }
            out.push(']');
        }
        Tag::Compound(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                emit_key(key, out);
                out.push(':');
                emit_into(value, out);
            }
            out.push('}');
        }
        Tag::IntArray(v) => {
            out.push_str("[I;");
            for (i, item) in v.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&item.to_string());
            }
            out.push(']');
        }
        Tag::LongArray(v) => {
            out.push_str("[L;");
            for (i, item) in v.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&item.to_string());
                out.push('L');
            }
            out.push(']');
        }
    }
}

fn emit_pretty_into(tag: &Tag, indent: usize, out: &mut String) {
    match tag {
        Tag::Compound(entries) => {
            if entries.is_empty() {
                out.push_str("{}");
                return;
            }
            let compact: Vec<String> = entries
                .iter()
                .map(|(key, value)| {
                    let mut entry = String::new();
                    emit_key(key, &mut entry);
                    entry.push_str(": ");
                    emit_into(value, &mut entry);
                    entry
                })
                .collect();
            if compact.iter().all(|e| e.len() < COMPOUND_ENTRY_LIMIT) {
                out.push('{');
                out.push_str(&compact.join(", "));
                out.push('}');
                return;
            }
            out.push_str("{\n");
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(indent + 1, out);
                emit_key(key, out);
                out.push_str(": ");
                emit_pretty_into(value, indent + 1, out);
            }
            out.push('\n');
            push_indent(indent, out);
            out.push('}');
        }
        Tag::List(list) => {
            if list.is_empty() {
                out.push_str("[]");
                return;
            }
            let compact: Vec<String> = list.iter().map(emit).collect();
            if compact.iter().all(|e| e.len() < LIST_ITEM_LIMIT) {
                out.push('[');
                out.push_str(&compact.join(", "));
                out.push(']');
                return;
            }
            out.push_str("[\n");
            for (i, item) in list.iter().enumerate() {
                if i > 0 {
                    out.push_str(",\n");
                }
                push_indent(indent + 1, out);
                emit_pretty_into(item, indent + 1, out);
            }
            out.push('\n');
            push_indent(indent, out);
            out.push(']');
        }
        Tag::ByteArray(v) => {
            out.push_str("[B; ");
            out.push_str(
                &v.iter()
                    .map(|b| format!("{b}b"))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            out.push(']');
        }
        Tag::IntArray(v) => {
            out.push_str("[I; ");
            out.push_str(
                &v.iter()
                    .map(i32::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            out.push(']');
        }
        Tag::LongArray(v) => {
            out.push_str("[L; ");
            out.push_str(
                &v.iter()
                    .map(|l| format!("{l}L"))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            out.push(']');
        }
        scalar => emit_into(scalar, out),
    }
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn emit_key(key: &str, out: &mut String) {
    if key_needs_quotes(key) {
        quote_string(key, out);
    } else {
        out.push_str(key);
    }
}

/// Keys matching `[A-Za-z_][A-Za-z0-9_\-\.\+]*` are emitted bare.
fn key_needs_quotes(key: &str) -> bool {
    let mut chars = key.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return true;
    }
    chars.any(|c| !c.is_ascii_alphanumeric() && !matches!(c, '_' | '-' | '.' | '+'))
}

fn quote_string(s: &str, out: &mut String) {
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;
    use vox_tbf::{create_compound, create_list, CompoundTag, ListTag, Tag, TagId};

    use super::*;

    #[test]
    fn compact_compound_has_no_spaces() {
        let mut root = CompoundTag::default();
        root.put("a", 1i8);
        root.put("b", vec![1i32, 2, 3]);
        root.put("c", "x y");
        assert_eq!(emit(&Tag::Compound(root)), r#"{a:1b,b:[I;1,2,3],c:"x y"}"#);
    }

    #[test]
    fn scalar_suffixes() {
        assert_eq!(emit(&Tag::Byte(-1)), "-1b");
        assert_eq!(emit(&Tag::Short(300)), "300s");
        assert_eq!(emit(&Tag::Int(7)), "7");
        assert_eq!(emit(&Tag::Long(7)), "7L");
        assert_eq!(emit(&Tag::Float(1.5)), "1.5f");
        assert_eq!(emit(&Tag::Double(1.0)), "1d");
    }

    #[test]
    fn strings_are_escaped() {
        assert_eq!(
            emit(&Tag::String("a\"b\\c\nd".into())),
            r#""a\"b\\c\nd""#
        );
    }

    #[test]
    fn awkward_keys_are_quoted() {
        let mut root = CompoundTag::default();
        root.put("plain_key", 1i32);
        root.put("1leading", 2i32);
        root.put("has space", 3i32);
        assert_eq!(
            emit(&Tag::Compound(root)),
            r#"{plain_key:1,"1leading":2,"has space":3}"#
        );
    }

    #[test]
    fn empty_containers() {
        assert_eq!(emit(&Tag::Compound(CompoundTag::default())), "{}");
        assert_eq!(emit(&Tag::List(ListTag::new(TagId::Byte))), "[]");
        assert_eq!(emit(&Tag::ByteArray(Vec::new())), "[B;]");
    }

    #[test]
    fn pretty_collapses_short_children() {
        let tag = Tag::Compound(create_compound([("a", 1i8), ("b", 2i8)]));
        assert_eq!(emit_pretty(&tag), "{a: 1b, b: 2b}");
    }

    #[test]
    fn pretty_expands_long_children() {
        let mut root = CompoundTag::default();
        root.put(
            "description",
            "a string value long enough to not collapse",
        );
        root.put("level", 3i32);
        let expected = "{\n  description: \"a string value long enough to not collapse\",\n  level: 3\n}";
        assert_eq!(emit_pretty(&Tag::Compound(root)), expected);
    }

    #[test]
    fn pretty_list_of_long_strings_is_multiline() {
        let list = create_list(
            ["first rather long entry", "second rather long entry"],
            None,
        )
        .unwrap();
        let expected = "[\n  \"first rather long entry\",\n  \"second rather long entry\"\n]";
        assert_eq!(emit_pretty(&Tag::List(list)), expected);
    }
}
