use std::sync::Arc;
use std::time::Duration;

use blockdump_fetch::{BackoffPolicy, BlockFetcher, FetchOutcome, HttpClient, normalize};
use blockdump_ledger::{CheckpointRow, Ledger};
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::item::{Failure, ItemState};
use crate::progress::{ProgressCallback, Resolution, RunProgress};
use crate::sidecar::{ErrorEntry, ErrorSidecar};
use crate::store::BlockStore;

pub(crate) const LEDGER_ATTEMPTS: u32 = 3;
pub(crate) const LEDGER_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Receiving half of the work queue, shared by every worker.
pub(crate) type WorkQueue = Arc<Mutex<mpsc::Receiver<u64>>>;

/// State every worker reads; the ledger is the only thing it mutates.
pub(crate) struct Shared<C: HttpClient> {
    pub fetcher:     BlockFetcher<C>,
    pub ledger:      Arc<Ledger>,
    pub store:       BlockStore,
    pub policy:      BackoffPolicy,
    pub progress:    RunProgress,
    pub on_progress: Option<ProgressCallback>,
    pub sidecar:     Option<ErrorSidecar>,
    pub cancel:      CancellationToken,
}

pub(crate) async fn run_worker<C: HttpClient>(id: usize, shared: Arc<Shared<C>>, queue: WorkQueue) {
    tracing::trace!(worker = id, "worker started");
    loop {
        let next = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => None,
            height = async { queue.lock().await.recv().await } => height,
        };
        let Some(height) = next else { break };

        let resolution = shared.process(height).await;
        let event = shared.progress.record(height, resolution);
        if let Some(callback) = &shared.on_progress {
            callback(&event);
        }
    }
    tracing::trace!(worker = id, "worker stopped");
}

impl<C: HttpClient> Shared<C> {
    pub(crate) async fn process(&self, height: u64) -> Resolution {
        if let Some(row) = self.ledger.latest(height)
            && row.is_ok()
            && self.store.is_valid(&row.path).await
        {
            tracing::trace!(height, "already recorded");
            return Resolution::Skipped;
        }

        let target = self.store.path_for(height);
        if self.store.is_valid(&target).await {
            tracing::debug!(height, "file present without ledger row, recording it");
            let row = CheckpointRow::ok(height, target.display().to_string(), 0, "200");
            return if self.record(row).await {
                Resolution::Repaired
            } else {
                Resolution::LedgerError
            };
        }

        let mut state = ItemState::Pending;
        while !state.is_terminal() {
            state = self.step(height, state).await;
            tracing::trace!(height, state = state.name(), "transition");
        }

        match state {
            ItemState::Succeeded {
                tries,
                http_status,
                path,
            } => {
                tracing::debug!(height, tries, "stored");
                let row = CheckpointRow::ok(height, path.display().to_string(), tries, http_status.to_string());
                if self.record(row).await {
                    Resolution::Succeeded { tries }
                } else {
                    Resolution::LedgerError
                }
            }
            ItemState::FailedExhausted { tries, failure } => {
                tracing::warn!(
                    height,
                    tries,
                    status = %failure.http_status_text(),
                    kind = %failure.kind,
                    "giving up: {}",
                    failure.error
                );
                if let Some(sidecar) = &self.sidecar {
                    sidecar
                        .record(&ErrorEntry {
                            height,
                            tries,
                            http_status: failure.http_status,
                            error: failure.error.clone(),
                        })
                        .await;
                }
                let row = CheckpointRow::fail(
                    height,
                    target.display().to_string(),
                    tries,
                    failure.http_status_text(),
                    failure.error,
                );
                if self.record(row).await {
                    Resolution::Failed { tries }
                } else {
                    Resolution::LedgerError
                }
            }
            _ => {
                tracing::debug!(height, "aborted");
                Resolution::Aborted
            }
        }
    }

    /// Advance one transition.
    async fn step(&self, height: u64, state: ItemState) -> ItemState {
        match state {
            ItemState::Pending => ItemState::Fetching { attempt: 1 },

            ItemState::Fetching { attempt } => match self.fetcher.fetch(height, &self.cancel).await {
                FetchOutcome::Payload { status, payload } => ItemState::Validating {
                    attempt,
                    status,
                    payload,
                },
                FetchOutcome::Http { status, message } => ItemState::Backoff {
                    attempt,
                    failure: Failure::application(status, message),
                },
                FetchOutcome::Transport { message } => ItemState::Backoff {
                    attempt,
                    failure: Failure::transport(message),
                },
                FetchOutcome::Aborted => ItemState::Aborted,
            },

            ItemState::Validating {
                attempt,
                status,
                payload,
            } => match normalize(height, payload) {
                Ok(record) => ItemState::Persisting {
                    attempt,
                    status,
                    record,
                },
                Err(e) => ItemState::Backoff {
                    attempt,
                    failure: Failure::validation(status, e),
                },
            },

            ItemState::Persisting {
                attempt,
                status,
                record,
            } => match self.store.persist(record).await {
                Ok(path) => ItemState::Succeeded {
                    tries: attempt,
                    http_status: status,
                    path,
                },
                Err(e) => ItemState::Backoff {
                    attempt,
                    failure: Failure::persistence(status, e),
                },
            },

            ItemState::Backoff { attempt, failure } => {
                if attempt >= self.policy.max_attempts {
                    return ItemState::FailedExhausted {
                        tries: attempt,
                        failure,
                    };
                }
                if !self.policy.should_retry(attempt, self.cancel.is_cancelled()) {
                    return ItemState::Aborted;
                }

                let delay = self.policy.delay(attempt);
                tracing::debug!(
                    height,
                    attempt,
                    status = %failure.http_status_text(),
                    delay_ms = delay.as_millis() as u64,
                    "retrying: {}",
                    failure.error
                );
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => ItemState::Aborted,
                    _ = tokio::time::sleep(delay) => ItemState::Fetching { attempt: attempt + 1 },
                }
            }

            terminal => terminal,
        }
    }

    /// Append `row`, retrying briefly. `false` means the outcome is unrecorded.
    async fn record(&self, row: CheckpointRow) -> bool {
        let height = row.height;
        match self
            .ledger
            .append_with_retry(row, LEDGER_ATTEMPTS, LEDGER_RETRY_DELAY)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(height, "ledger append failed: {e}");
                false
            }
        }
    }
}
