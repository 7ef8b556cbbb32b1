use pretty_assertions::assert_eq;
use vox_tbf::{
    create_compound, create_list, read_compressed_bytes, read_document, validate,
    write_compressed_bytes, write_document, CompoundTag, Document, ListTag, Tag, TagId,
};

/// A document exercising every variant, with nesting.
fn kitchen_sink() -> Document {
    let mut stats = CompoundTag::default();
    stats.put("byte", -7i8);
    stats.put("short", 1234i16);
    stats.put("int", -123_456i32);
    stats.put("long", 9_007_199_254_740_993i64);
    stats.put("float", 1.5f32);
    stats.put("double", -0.25f64);

    let mut root = CompoundTag::default();
    root.put("stats", stats);
    root.put("raw", vec![0u8, 127, 128, 255]);
    root.put("name", "kitchen sink");
    root.put(
        "words",
        create_list(["alpha", "beta", "gamma"], None).unwrap(),
    );
    root.put("empty", ListTag::new(TagId::Byte));
    root.put(
        "nested",
        create_list(
            vec![
                Tag::Compound(create_compound([("id", 1i32)])),
                Tag::Compound(create_compound([("id", 2i32)])),
            ],
            None,
        )
        .unwrap(),
    );
    root.put("ints", vec![i32::MIN, 0, i32::MAX]);
    root.put("longs", vec![i64::MIN, 0, i64::MAX]);

    Document::new("", root)
}

#[test]
fn parse_emit_round_trip() {
    let doc = kitchen_sink();
    let bytes = write_document(&doc).unwrap();
    let (parsed, consumed) = read_document(&bytes).unwrap();
    assert_eq!(consumed, bytes.len());
    assert_eq!(parsed, doc);
}

#[test]
fn emit_is_idempotent_byte_for_byte() {
    let doc = kitchen_sink();
    let first = write_document(&doc).unwrap();
    let reparsed = read_document(&first).unwrap().0;
    let second = write_document(&reparsed).unwrap();
    assert_eq!(first, second);
}

#[test]
fn gzip_round_trip_preserves_the_tree() {
    let doc = kitchen_sink();
    let compressed = write_compressed_bytes(&doc).unwrap();
    let parsed = read_compressed_bytes(&compressed).unwrap();
    assert_eq!(parsed, doc);
}

#[test]
fn editor_output_validates_clean() {
    let doc = kitchen_sink();
    assert_eq!(validate(&doc), Vec::new());
}

#[test]
fn long_values_survive_exactly() {
    // 2^53 + 1 is the first integer a binary64 cannot represent.
    let doc = kitchen_sink();
    let bytes = write_document(&doc).unwrap();
    let parsed = read_document(&bytes).unwrap().0;
    assert_eq!(
        parsed.get("stats.long"),
        Some(&Tag::Long(9_007_199_254_740_993))
    );
}
