use std::path::PathBuf;
use std::time::Duration;

use blockdump_fetch::{BackoffPolicy, FetchOptions};
use blockdump_fs::BlockLayout;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://blockchain.mobick.info";

/// Parameters of one download run.
///
/// Every field has a default so partial sources (a TOML file, the
/// environment, command-line flags) can be layered on top of each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    pub base_url:           String,
    pub start:              u64,
    pub end:                u64,
    pub out_dir:            PathBuf,
    /// Ledger location; `<out_dir>/progress.csv` when unset.
    pub checkpoint:         Option<PathBuf>,
    pub concurrency:        usize,
    pub timeout_secs:       u64,
    pub retries:            u32,
    pub backoff_base_ms:    u64,
    pub backoff_ceiling_ms: u64,
    pub jitter_max_ms:      u64,
    /// Queue capacity as a multiple of `concurrency`.
    pub queue_factor:       usize,
    pub compress_level:     u32,
    /// Re-read every file right after it is placed.
    pub verify_after_write: bool,
    /// JSON-lines sidecar for heights that exhaust their retries.
    pub errors:             Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            base_url:           DEFAULT_BASE_URL.to_string(),
            start:              556_760,
            end:                855_698,
            out_dir:            PathBuf::from("dump"),
            checkpoint:         None,
            concurrency:        100,
            timeout_secs:       30,
            retries:            8,
            backoff_base_ms:    500,
            backoff_ceiling_ms: 60_000,
            jitter_max_ms:      500,
            queue_factor:       4,
            compress_level:     blockdump_fs::gz::DEFAULT_LEVEL,
            verify_after_write: true,
            errors:             None,
        }
    }
}

impl DownloadConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start > self.end {
            return Err(ConfigError::InvalidRange {
                start: self.start,
                end:   self.end,
            });
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.queue_factor == 0 {
            return Err(ConfigError::ZeroQueueFactor);
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyBaseUrl);
        }
        if self.compress_level > 9 {
            return Err(ConfigError::CompressionLevel(self.compress_level));
        }
        Ok(())
    }

    /// Number of heights in the closed range.
    pub fn total(&self) -> u64 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }

    pub fn layout(&self) -> BlockLayout {
        BlockLayout::new(&self.out_dir)
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoint
            .clone()
            .unwrap_or_else(|| self.layout().progress_path())
    }

    pub fn queue_capacity(&self) -> usize {
        self.concurrency.saturating_mul(self.queue_factor).max(1)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            base:         Duration::from_millis(self.backoff_base_ms),
            ceiling:      Duration::from_millis(self.backoff_ceiling_ms),
            jitter_max:   Duration::from_millis(self.jitter_max_ms),
            max_attempts: self.retries,
        }
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::default()
            .timeout(self.timeout())
            .max_connections(self.concurrency)
    }
}
