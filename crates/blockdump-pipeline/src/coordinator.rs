use std::sync::Arc;

use blockdump_fetch::{BlockFetcher, HttpClient};
use blockdump_ledger::Ledger;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::DownloadConfig;
use crate::error::{PipelineError, Result};
use crate::progress::{ProgressCallback, ProgressEvent, RunProgress, RunReport};
use crate::sidecar::ErrorSidecar;
use crate::store::BlockStore;
use crate::worker::{Shared, run_worker};

/// Owns one download run: the queue, the producer and the worker pool.
pub struct Coordinator<C: HttpClient> {
    config:      DownloadConfig,
    client:      C,
    on_progress: Option<ProgressCallback>,
}

impl<C: HttpClient + 'static> Coordinator<C> {
    pub fn new(config: DownloadConfig, client: C) -> Self {
        Self {
            config,
            client,
            on_progress: None,
        }
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Called from worker tasks once per resolved height.
    pub fn on_progress(mut self, callback: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    /// Download `[start, end]` until drained or `cancel` fires.
    ///
    /// Configuration problems are returned before anything touches disk.
    /// Per-height failures never end the run; they are counted in the report.
    pub async fn run(self, cancel: CancellationToken) -> Result<RunReport> {
        let Self {
            config,
            client,
            on_progress,
        } = self;

        config.validate()?;
        let fetcher = BlockFetcher::new(client, config.base_url.clone(), config.timeout())?;

        tokio::fs::create_dir_all(&config.out_dir)
            .await
            .map_err(|source| PipelineError::Io {
                path: config.out_dir.clone(),
                source,
            })?;
        let ledger = Arc::new(Ledger::open(config.checkpoint_path()).await?);

        tracing::info!(
            start = config.start,
            end = config.end,
            concurrency = config.concurrency,
            recorded = ledger.len(),
            "starting download"
        );

        let shared = Arc::new(Shared {
            fetcher,
            ledger,
            store: BlockStore::new(config.layout(), config.compress_level, config.verify_after_write),
            policy: config.backoff_policy(),
            progress: RunProgress::new(config.total()),
            on_progress,
            sidecar: config.errors.clone().map(ErrorSidecar::new),
            cancel: cancel.clone(),
        });

        let (tx, rx) = mpsc::channel(config.queue_capacity());
        let queue = Arc::new(Mutex::new(rx));

        let producer = {
            let cancel = cancel.clone();
            let (start, end) = (config.start, config.end);
            tokio::spawn(async move {
                for height in start..=end {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        sent = tx.send(height) => if sent.is_err() { break },
                    }
                }
            })
        };

        let mut workers = JoinSet::new();
        for id in 0..config.concurrency {
            workers.spawn(run_worker(id, Arc::clone(&shared), Arc::clone(&queue)));
        }

        if let Err(e) = producer.await {
            tracing::error!("producer task failed: {e}");
        }
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("worker task failed: {e}");
            }
        }

        let report = shared.progress.report(cancel.is_cancelled());
        if report.interrupted {
            tracing::warn!(processed = report.processed, total = report.total, "interrupted, rerun to resume");
        } else {
            tracing::info!(
                ok = report.ok(),
                failed = report.failed,
                ledger_errors = report.ledger_errors,
                "download finished"
            );
        }
        Ok(report)
    }
}
