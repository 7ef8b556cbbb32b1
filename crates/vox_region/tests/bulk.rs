use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use pretty_assertions::assert_eq;
use tracing_test::traced_test;
use vox_region::{load_many, process_directory, save_many, BulkOptions, RegionArchive};
use vox_tbf::{CompoundTag, Document};

fn chunk(value: i32) -> Document {
    let mut root = CompoundTag::default();
    root.put("value", value);
    Document::new("", root)
}

fn archive_with(values: &[(i32, i32)]) -> RegionArchive {
    let mut archive = RegionArchive::new();
    for &(x, z) in values {
        archive.set_chunk(x, z, chunk(x * 100 + z));
    }
    archive
}

fn write_archive(path: &PathBuf, archive: &RegionArchive) {
    archive.save(File::create(path).unwrap()).unwrap();
}

#[traced_test]
#[test]
fn load_many_returns_outcomes_in_input_order() {
    let dir = tempfile::tempdir().unwrap();
    let good_a = dir.path().join("a.region");
    let bad = dir.path().join("broken.region");
    let good_b = dir.path().join("b.region");

    write_archive(&good_a, &archive_with(&[(0, 0)]));
    File::create(&bad).unwrap().write_all(b"not sectors").unwrap();
    write_archive(&good_b, &archive_with(&[(1, 2), (3, 4)]));

    let paths = vec![good_a.clone(), bad.clone(), good_b.clone()];
    let outcomes = load_many(&paths, BulkOptions::default()).unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[0].path, good_a);
    assert_eq!(outcomes[1].path, bad);
    assert_eq!(outcomes[2].path, good_b);

    assert!(outcomes[0].is_ok());
    assert!(!outcomes[1].is_ok());
    assert!(outcomes[2].is_ok());

    let b = outcomes[2].result.as_ref().unwrap();
    assert_eq!(b.chunk_count(), 2);
    assert_eq!(
        b.get_chunk(3, 4).unwrap().get("value"),
        Some(&vox_tbf::Tag::Int(304))
    );
}

#[test]
fn load_many_with_serial_bound_matches_parallel() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = Vec::new();
    for i in 0..4 {
        let path = dir.path().join(format!("{i}.region"));
        write_archive(&path, &archive_with(&[(i, i)]));
        paths.push(path);
    }

    let serial = load_many(&paths, BulkOptions::builder().max_concurrency(1).build()).unwrap();
    let parallel = load_many(&paths, BulkOptions::builder().max_concurrency(4).build()).unwrap();

    for (s, p) in serial.iter().zip(&parallel) {
        assert_eq!(s.path, p.path);
        let (s, p) = (s.result.as_ref().unwrap(), p.result.as_ref().unwrap());
        assert_eq!(s.chunk_count(), p.chunk_count());
        for ((at, chunk), (at_p, chunk_p)) in s.all_chunks().zip(p.all_chunks()) {
            assert_eq!(at, at_p);
            assert_eq!(chunk, chunk_p);
        }
    }
}

#[test]
fn save_many_writes_every_archive() {
    let dir = tempfile::tempdir().unwrap();
    let items = vec![
        (dir.path().join("one.region"), archive_with(&[(0, 0)])),
        (dir.path().join("two.region"), archive_with(&[(9, 9)])),
    ];

    let outcomes = save_many(&items, BulkOptions::default()).unwrap();
    assert!(outcomes.iter().all(|o| o.is_ok()));

    for (path, original) in &items {
        let reloaded = RegionArchive::load(File::open(path).unwrap()).unwrap();
        assert_eq!(reloaded.chunk_count(), original.chunk_count());
    }
}

#[test]
fn process_directory_visits_files_in_path_order() {
    let dir = tempfile::tempdir().unwrap();
    write_archive(&dir.path().join("aa.region"), &archive_with(&[(0, 0)]));
    write_archive(
        &dir.path().join("bb.region"),
        &archive_with(&[(1, 1), (2, 2)]),
    );
    File::create(dir.path().join("zz.junk"))
        .unwrap()
        .write_all(b"junk")
        .unwrap();

    let outcomes = process_directory(dir.path(), BulkOptions::default(), |_, archive| {
        Ok(archive.chunk_count())
    })
    .unwrap();

    assert_eq!(outcomes.len(), 3);
    let names: Vec<_> = outcomes
        .iter()
        .map(|o| o.path.file_name().unwrap().to_str().unwrap().to_owned())
        .collect();
    assert_eq!(names, ["aa.region", "bb.region", "zz.junk"]);

    assert_eq!(*outcomes[0].result.as_ref().unwrap(), 1);
    assert_eq!(*outcomes[1].result.as_ref().unwrap(), 2);
    assert!(!outcomes[2].is_ok(), "junk file fails without aborting");
}
