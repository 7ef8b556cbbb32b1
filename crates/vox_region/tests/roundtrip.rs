use std::io::Cursor;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use byteorder::{BigEndian, ByteOrder};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;
use vox_region::{slot_index, Error, LazyRegionArchive, RegionArchive};
use vox_tbf::{create_compound, CompoundTag, Document};

fn chunk(label: &str, value: i32) -> Document {
    let mut root = CompoundTag::default();
    root.put("label", label);
    root.put("value", value);
    Document::new("", root)
}

fn now() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as u32
}

#[traced_test]
#[test]
fn save_and_reload_round_trips_chunks_and_timestamps() {
    let mut archive = RegionArchive::new();
    archive.set_chunk(0, 0, chunk("origin", 1));
    archive.set_chunk(5, 9, chunk("outpost", 2));

    let t0 = archive.timestamp(0, 0);
    assert!(t0.abs_diff(now()) <= 2);

    let bytes = archive.save(Cursor::new(Vec::new())).unwrap().into_inner();
    let reloaded = RegionArchive::load(Cursor::new(&bytes)).unwrap();

    assert_eq!(reloaded.chunk_count(), 2);
    assert!(reloaded.failures().is_empty());
    assert_eq!(reloaded.get_chunk(0, 0), archive.get_chunk(0, 0));
    assert_eq!(reloaded.get_chunk(5, 9), archive.get_chunk(5, 9));
    assert_eq!(reloaded.timestamp(0, 0), t0);
    assert_eq!(reloaded.timestamp(5, 9), archive.timestamp(5, 9));
    assert_eq!(reloaded.region_bounds(), Some(((0, 0), (5, 9))));
}

#[test]
fn layout_obeys_the_sector_contract() {
    let mut archive = RegionArchive::new();
    // Inserted out of slot order on purpose; layout follows insertion.
    archive.set_chunk(5, 9, chunk("first inserted", 1));
    archive.set_chunk(0, 0, chunk("second inserted", 2));

    let bytes = archive.save(Cursor::new(Vec::new())).unwrap().into_inner();

    let entry = |slot: usize| {
        let raw = BigEndian::read_u32(&bytes[slot * 4..]);
        ((raw >> 8) as usize, (raw & 0xFF) as usize)
    };

    let (first_offset, first_count) = entry(slot_index(5, 9));
    let (second_offset, second_count) = entry(slot_index(0, 0));
    assert_eq!(first_offset, 2);
    assert_eq!(second_offset, first_offset + first_count);

    // Every unpopulated slot has a zero location entry.
    for slot in 0..1024 {
        if slot != slot_index(5, 9) && slot != slot_index(0, 0) {
            assert_eq!(entry(slot), (0, 0));
        }
    }

    // Blob headers agree with the sector formula, and padding is zero.
    for (offset, count) in [(first_offset, first_count), (second_offset, second_count)] {
        let start = offset * 4096;
        let payload_len = BigEndian::read_u32(&bytes[start..]) as usize;
        let compressed_len = payload_len - 1;
        assert_eq!(bytes[start + 4], 2, "written chunks are zlib");
        assert_eq!(count, (compressed_len + 5).div_ceil(4096));
        for &b in &bytes[start + 5 + compressed_len..start + count * 4096] {
            assert_eq!(b, 0, "padding bytes are zero");
        }
    }

    assert_eq!(bytes.len(), (second_offset + second_count) * 4096);
}

#[test]
fn reload_preserves_file_order_across_resaves() {
    let mut archive = RegionArchive::new();
    archive.set_chunk(5, 9, chunk("first", 1));
    archive.set_chunk(0, 0, chunk("second", 2));

    let first = archive.save(Cursor::new(Vec::new())).unwrap().into_inner();
    let reloaded = RegionArchive::load(Cursor::new(&first)).unwrap();

    let order: Vec<(u8, u8)> = reloaded.all_chunks().map(|(at, _)| at).collect();
    assert_eq!(order, [(5, 9), (0, 0)]);

    let second = reloaded.save(Cursor::new(Vec::new())).unwrap().into_inner();
    assert_eq!(first, second, "save is stable across a load cycle");
}

#[test]
fn coordinates_wrap_into_the_region() {
    let mut archive = RegionArchive::new();
    archive.set_chunk(0, 0, chunk("wrapped", 7));

    assert_eq!(archive.get_chunk(32, 0), archive.get_chunk(0, 0));
    assert_eq!(archive.get_chunk(-32, 64), archive.get_chunk(0, 0));
    assert!(archive.get_chunk(1, 0).is_none());

    archive.set_chunk(-1, -1, chunk("edge", 8));
    assert!(archive.get_chunk(31, 31).is_some());
}

#[test]
fn remove_chunk_clears_slot_and_timestamp() {
    let mut archive = RegionArchive::new();
    archive.set_chunk(3, 4, chunk("here", 1));
    assert!(archive.timestamp(3, 4) > 0);

    let removed = archive.remove_chunk(3, 4).unwrap();
    assert_eq!(removed.get("label").and_then(|t| t.as_str()), Some("here"));
    assert!(archive.get_chunk(3, 4).is_none());
    assert_eq!(archive.timestamp(3, 4), 0);
    assert!(archive.is_empty());
}

#[test]
fn a_corrupt_chunk_is_a_diagnostic_not_an_abort() {
    let mut archive = RegionArchive::new();
    archive.set_chunk(0, 0, chunk("good", 1));
    archive.set_chunk(1, 0, chunk("doomed", 2));

    let mut bytes = archive.save(Cursor::new(Vec::new())).unwrap().into_inner();

    // Overwrite the second blob's compression code with garbage.
    let raw = BigEndian::read_u32(&bytes[slot_index(1, 0) * 4..]);
    let blob_start = (raw >> 8) as usize * 4096;
    bytes[blob_start + 4] = 9;

    let reloaded = RegionArchive::load(Cursor::new(&bytes)).unwrap();
    assert_eq!(reloaded.chunk_count(), 1);
    assert!(reloaded.get_chunk(0, 0).is_some());
    assert!(reloaded.get_chunk(1, 0).is_none());

    assert_eq!(reloaded.failures().len(), 1);
    let failure = &reloaded.failures()[0];
    assert_eq!((failure.x, failure.z), (1, 0));
    assert!(matches!(failure.cause, Error::InvalidCompression(9)));
}

#[test]
fn a_blob_past_the_end_of_file_is_reported_in_place() {
    let mut archive = RegionArchive::new();
    archive.set_chunk(0, 0, chunk("good", 1));

    let mut bytes = archive.save(Cursor::new(Vec::new())).unwrap().into_inner();

    // Point a second slot far past the end of the file.
    let slot = slot_index(2, 2);
    BigEndian::write_u32(&mut bytes[slot * 4..slot * 4 + 4], (0x40 << 8) | 1);

    let reloaded = RegionArchive::load(Cursor::new(&bytes)).unwrap();
    assert_eq!(reloaded.chunk_count(), 1);
    assert_eq!(reloaded.failures().len(), 1);
    assert!(matches!(
        reloaded.failures()[0].cause,
        Error::SectorOutOfRange(_)
    ));
}

#[test]
fn an_empty_file_is_not_an_archive() {
    let err = RegionArchive::load(Cursor::new(Vec::new())).unwrap_err();
    assert!(matches!(err, Error::InvalidArchive(_)));
}

#[test]
fn an_all_zero_file_is_an_empty_archive() {
    let bytes = vec![0u8; 8192];
    let archive = RegionArchive::load(Cursor::new(&bytes)).unwrap();
    assert!(archive.is_empty());
    assert!(archive.failures().is_empty());
    assert_eq!(archive.region_bounds(), None);
}

/// A chunk with an incompressible payload, to grow files past a size.
fn bulky_chunk(seed: u64, len: usize) -> Document {
    let mut state = seed;
    let noise: Vec<u8> = (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 56) as u8
        })
        .collect();
    let mut root = CompoundTag::default();
    root.put("noise", noise);
    Document::new("", root)
}

#[test]
fn lazy_reads_cache_until_cleared() {
    let mut archive = RegionArchive::new();
    archive.set_chunk(0, 0, bulky_chunk(1, 1 << 20));
    archive.set_chunk(7, 3, chunk("small", 3));

    let bytes = archive.save(Cursor::new(Vec::new())).unwrap().into_inner();
    assert!(bytes.len() > 1 << 20);

    let lazy = LazyRegionArchive::load_lazy(Cursor::new(&bytes)).unwrap();
    assert_eq!(lazy.chunk_count(), 2);
    assert!(lazy.get_chunk(1, 1).unwrap().is_none());

    let first = lazy.get_chunk(0, 0).unwrap().unwrap();
    let again = lazy.get_chunk(0, 0).unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &again), "repeat reads share one tree");

    lazy.clear_cache();
    let fresh = lazy.get_chunk(0, 0).unwrap().unwrap();
    assert!(!Arc::ptr_eq(&first, &fresh), "cleared cache re-materializes");
    assert_eq!(*fresh, *first);

    // Wrapped coordinates hit the same cached slot.
    let wrapped = lazy.get_chunk(32, 32).unwrap().unwrap();
    assert!(Arc::ptr_eq(&fresh, &wrapped));
}

#[test]
fn concurrent_lazy_reads_match_serial_reads() {
    let mut archive = RegionArchive::new();
    for x in 0..8 {
        archive.set_chunk(x, 0, chunk("cell", x));
    }
    let bytes = archive.save(Cursor::new(Vec::new())).unwrap().into_inner();

    let serial = LazyRegionArchive::load_lazy(Cursor::new(bytes.clone())).unwrap();
    let expected: Vec<Document> = (0..8)
        .map(|x| (*serial.get_chunk(x, 0).unwrap().unwrap()).clone())
        .collect();

    let lazy = Arc::new(LazyRegionArchive::load_lazy(Cursor::new(bytes)).unwrap());
    let handles: Vec<_> = (0..8)
        .map(|x| {
            let lazy = Arc::clone(&lazy);
            std::thread::spawn(move || (*lazy.get_chunk(x, 0).unwrap().unwrap()).clone())
        })
        .collect();

    for (x, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), expected[x]);
    }
}

#[test]
fn json_view_round_trips_chunk_contents() {
    let mut archive = RegionArchive::new();
    archive.set_chunk(0, 0, chunk("spawn", 1));
    archive.set_chunk(12, 30, chunk("far", 2));

    let view = archive.to_json();
    assert!(view.get("0,0").is_some());
    assert!(view.get("12,30").is_some());

    let rebuilt = RegionArchive::from_json(&view).unwrap();
    assert_eq!(rebuilt.chunk_count(), 2);
    assert_eq!(
        rebuilt
            .get_chunk(12, 30)
            .unwrap()
            .get("label")
            .and_then(|t| t.as_str()),
        Some("far")
    );

    let err = RegionArchive::from_json(&serde_json::json!({ "nonsense": {} })).unwrap_err();
    assert!(matches!(err, Error::Text(_)));
}

#[test]
fn extract_writes_one_file_per_chunk() {
    let mut archive = RegionArchive::new();
    archive.set_chunk(0, 0, chunk("a", 1));
    archive.set_chunk(2, 5, chunk("b", 2));

    let dir = tempfile::tempdir().unwrap();
    archive.extract(dir.path()).unwrap();

    let a = std::fs::File::open(dir.path().join("chunk.0.0.dat")).unwrap();
    let doc = vox_tbf::read_gzip(a).unwrap();
    assert_eq!(doc, *archive.get_chunk(0, 0).unwrap());

    assert!(dir.path().join("chunk.2.5.dat").exists());
}

#[test]
fn chunks_from_json_with_typed_values() {
    let view = serde_json::json!({
        "3,4": {
            "name": "",
            "type": "compound",
            "value": { "height": { "type": "short", "value": 319 } },
        },
    });
    let archive = RegionArchive::from_json(&view).unwrap();
    let doc = archive.get_chunk(3, 4).unwrap();
    assert_eq!(doc.get("height"), Some(&vox_tbf::Tag::Short(319)));
}

#[test]
fn mutating_a_chunk_in_place_survives_a_save() {
    let mut archive = RegionArchive::new();
    archive.set_chunk(1, 1, chunk("before", 1));

    archive
        .get_chunk_mut(1, 1)
        .unwrap()
        .set("extra", create_compound([("lit", true)]))
        .unwrap();

    let bytes = archive.save(Cursor::new(Vec::new())).unwrap().into_inner();
    let reloaded = RegionArchive::load(Cursor::new(&bytes)).unwrap();
    assert_eq!(
        reloaded.get_chunk(1, 1).unwrap().get("extra.lit"),
        Some(&vox_tbf::Tag::Byte(1))
    );
}
