//! Where the heights to merge come from, and in which order.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use blockdump_fs::BlockLayout;
use blockdump_fs::layout::parse_height;
use blockdump_fs::record::{HEIGHT_FIELD, declared_height};
use serde_json::Value;
use walkdir::WalkDir;

use crate::error::{MergeError, Result};

/// One height and the file that should hold it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeItem {
    pub height: u64,
    pub path:   PathBuf,
}

/// Every block file under `blocks_dir`, ascending by height.
///
/// Staging files and names whose stem is not an integer are ignored.
/// A missing directory yields an empty list.
pub fn scan_blocks(blocks_dir: impl AsRef<Path>) -> Result<Vec<MergeItem>> {
    let blocks_dir = blocks_dir.as_ref();
    if !blocks_dir.exists() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    for entry in WalkDir::new(blocks_dir) {
        let entry = entry.map_err(|source| MergeError::Scan {
            path: blocks_dir.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(height) = entry.file_name().to_str().and_then(parse_height) {
            items.push(MergeItem {
                height,
                path: entry.into_path(),
            });
        }
    }
    items.sort_by(|a, b| a.height.cmp(&b.height).then_with(|| a.path.cmp(&b.path)));
    Ok(items)
}

/// The sharded path of every height in `[start, end]`, present or not.
pub fn range_items(layout: &BlockLayout, start: u64, end: u64) -> Result<Vec<MergeItem>> {
    if start > end {
        return Err(MergeError::InvalidRange { start, end });
    }
    Ok((start..=end)
        .map(|height| MergeItem {
            height,
            path: layout.path_for(height),
        })
        .collect())
}

/// Heights in the order a previously merged file lists them.
///
/// Blank lines are skipped; any other line must be an object with a height.
pub fn heights_from_jsonl(path: impl AsRef<Path>) -> Result<Vec<u64>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path).map_err(MergeError::io(path))?);

    let mut heights = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(MergeError::io(path))?;
        if line.trim().is_empty() {
            continue;
        }
        let bad_line = |reason: String| MergeError::HeightList {
            path: path.to_path_buf(),
            line: idx + 1,
            reason,
        };
        let value: Value = serde_json::from_str(&line).map_err(|e| bad_line(e.to_string()))?;
        let height = value
            .get(HEIGHT_FIELD)
            .and_then(declared_height)
            .ok_or_else(|| bad_line("no integer height".to_string()))?;
        heights.push(height);
    }
    Ok(heights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scan_ignores_staging_and_foreign_files() {
        let dir = tempdir().unwrap();
        let layout = BlockLayout::new(dir.path());
        for height in [1001, 3, 20] {
            let path = layout.path_for(height);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"").unwrap();
        }
        let shard = layout.shard_dir(0);
        std::fs::write(shard.join("7.json.gz.part"), b"").unwrap();
        std::fs::write(shard.join("notes.json.gz"), b"").unwrap();
        std::fs::write(shard.join("8.json"), b"").unwrap();

        let heights: Vec<u64> = scan_blocks(layout.blocks_dir())
            .unwrap()
            .into_iter()
            .map(|item| item.height)
            .collect();
        assert_eq!(heights, vec![3, 20, 1001]);
    }

    #[test]
    fn scan_of_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        assert!(scan_blocks(dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn range_covers_both_ends() {
        let layout = BlockLayout::new("dump");
        let items = range_items(&layout, 999, 1000).unwrap();
        assert_eq!(items[0].path, PathBuf::from("dump/blocks/000000/999.json.gz"));
        assert_eq!(items[1].path, PathBuf::from("dump/blocks/000001/1000.json.gz"));
        assert!(matches!(
            range_items(&layout, 2, 1),
            Err(MergeError::InvalidRange { start: 2, end: 1 })
        ));
    }

    #[test]
    fn height_list_keeps_file_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocks.jsonl");
        std::fs::write(&path, "{\"height\":5}\n\n{\"height\":\"2\",\"x\":1}\n{\"height\":9}\n").unwrap();

        assert_eq!(heights_from_jsonl(&path).unwrap(), vec![5, 2, 9]);
    }

    #[test]
    fn height_list_reports_bad_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocks.jsonl");
        std::fs::write(&path, "{\"height\":5}\n{\"hash\":\"ab\"}\n").unwrap();

        match heights_from_jsonl(&path) {
            Err(MergeError::HeightList { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
