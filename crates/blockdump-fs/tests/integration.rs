use blockdump_fs::layout::parse_height;
use blockdump_fs::{AtomicWriteOptions, BlockLayout, atomic_read, atomic_write, exists_and_valid, read_json_gz, write_json_gz};
use serde_json::json;
use tempfile::tempdir;

#[test]
fn test_atomic_write_replaces_existing_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("existing.txt");

    std::fs::write(&path, "original").unwrap();

    atomic_write(&path, b"new content", AtomicWriteOptions::new()).unwrap();

    assert_eq!(atomic_read(&path).unwrap(), b"new content");
}

#[test]
fn test_block_written_under_layout_validates() {
    let dir = tempdir().unwrap();
    let layout = BlockLayout::new(dir.path());
    let path = layout.path_for(101);

    write_json_gz(&path, &json!({"height": 101}), 6, AtomicWriteOptions::new()).unwrap();

    assert!(path.starts_with(dir.path().join("blocks").join("000000")));
    assert!(exists_and_valid(&path));
    assert_eq!(read_json_gz(&path).unwrap()["height"], 101);
    assert_eq!(parse_height(path.file_name().unwrap().to_str().unwrap()), Some(101));
}

#[test]
fn test_failed_write_keeps_previous_block() {
    let dir = tempdir().unwrap();
    let layout = BlockLayout::new(dir.path());
    let path = layout.path_for(5);
    write_json_gz(&path, &json!({"height": 5, "v": 1}), 6, AtomicWriteOptions::new()).unwrap();

    // a directory squatting on the staging name makes the next write fail
    std::fs::create_dir(dir.path().join("blocks/000000/5.json.gz.part")).unwrap();
    let result = write_json_gz(&path, &json!({"height": 5, "v": 2}), 6, AtomicWriteOptions::new());

    assert!(result.is_err());
    assert_eq!(read_json_gz(&path).unwrap()["v"], 1);
}
