use std::path::{Path, PathBuf};

pub const BLOCKS_DIR: &str = "blocks";
pub const TXS_DIR: &str = "txs";
pub const PROGRESS_FILE: &str = "progress.csv";
pub const BLOCK_EXTENSION: &str = ".json.gz";
pub const TX_EXTENSION: &str = ".jsonl";
pub const SHARD_SIZE: u64 = 1000;

/// Sharded on-disk layout rooted at an output directory.
///
/// `{root}/blocks/{height / 1000:06}/{height}.json.gz`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLayout {
    root: PathBuf,
}

impl BlockLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blocks_dir(&self) -> PathBuf {
        self.root.join(BLOCKS_DIR)
    }

    pub fn shard_dir(&self, height: u64) -> PathBuf {
        self.blocks_dir().join(shard_name(height))
    }

    pub fn path_for(&self, height: u64) -> PathBuf {
        self.shard_dir(height).join(file_name(height))
    }

    /// Per-block transaction list, one JSON document per line.
    pub fn tx_path_for(&self, height: u64) -> PathBuf {
        self.root
            .join(TXS_DIR)
            .join(shard_name(height))
            .join(format!("{height}{TX_EXTENSION}"))
    }

    pub fn progress_path(&self) -> PathBuf {
        self.root.join(PROGRESS_FILE)
    }
}

pub fn shard_name(height: u64) -> String {
    format!("{:06}", height / SHARD_SIZE)
}

pub fn file_name(height: u64) -> String {
    format!("{height}{BLOCK_EXTENSION}")
}

/// Height encoded in a block file name, if it is one.
///
/// Staging files (`*.json.gz.part`) and non-integer stems yield `None`.
pub fn parse_height(file_name: &str) -> Option<u64> {
    file_name.strip_suffix(BLOCK_EXTENSION)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_sharded_by_thousand() {
        let layout = BlockLayout::new("dump");
        assert_eq!(layout.path_for(100), PathBuf::from("dump/blocks/000000/100.json.gz"));
        assert_eq!(layout.path_for(556760), PathBuf::from("dump/blocks/000556/556760.json.gz"));
        assert_eq!(layout.path_for(1_234_567_890), PathBuf::from("dump/blocks/1234567/1234567890.json.gz"));
        assert_eq!(layout.progress_path(), PathBuf::from("dump/progress.csv"));
        assert_eq!(layout.tx_path_for(556760), PathBuf::from("dump/txs/000556/556760.jsonl"));
    }

    #[test]
    fn parse_height_rejects_other_files() {
        assert_eq!(parse_height("556760.json.gz"), Some(556760));
        assert_eq!(parse_height("556760.json.gz.part"), None);
        assert_eq!(parse_height("notes.json.gz"), None);
        assert_eq!(parse_height("556760.json"), None);
    }
}
