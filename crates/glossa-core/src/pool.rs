//! Worker pool for extracting many documents concurrently.
//!
//! Each document is processed start to finish by one worker; the pipeline
//! itself is synchronous and CPU-bound, so workers hand the call to the
//! blocking thread pool. Documents share no mutable state, so the only
//! coordination is the job queue and the cancellation token.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{Document, ExtractError, ExtractionResult};

/// Anything that turns one document into an [`ExtractionResult`].
///
/// Implemented by the extraction pipeline; tests substitute their own.
pub trait DocumentExtractor: Send + Sync {
    fn extract(&self, document: &Document) -> Result<ExtractionResult, ExtractError>;
}

/// Progress events emitted while the pool works through its queue.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Started {
        index: usize,
        total: usize,
        source_id: String,
    },
    Finished {
        index: usize,
        total: usize,
        source_id: String,
        terms: usize,
        elapsed: Duration,
    },
    Failed {
        index: usize,
        total: usize,
        source_id: String,
        message: String,
    },
    /// The document was dequeued after cancellation and never started.
    Skipped {
        index: usize,
        total: usize,
        source_id: String,
    },
}

/// A document extraction job submitted to the pool.
pub struct DocumentJob {
    pub document: Document,
    pub result_tx: oneshot::Sender<Result<ExtractionResult, ExtractError>>,
    pub index: usize,
    pub total: usize,
    pub progress: Arc<dyn Fn(ProgressEvent) + Send + Sync>,
}

/// A fixed set of worker tasks pulling [`DocumentJob`]s from a shared queue.
///
/// Submit jobs via [`submit()`](ExtractionPool::submit), receive results via
/// the oneshot receiver paired with each job.
pub struct ExtractionPool {
    job_tx: async_channel::Sender<DocumentJob>,
    pool_handle: JoinHandle<()>,
}

impl ExtractionPool {
    /// Create a pool with `num_workers` workers (at least one).
    ///
    /// `timeout` bounds each whole `extract()` call. A timed-out extraction
    /// keeps running on its blocking thread but its result is discarded.
    pub fn new(
        extractor: Arc<dyn DocumentExtractor>,
        cancel: CancellationToken,
        num_workers: usize,
        timeout: Option<Duration>,
    ) -> Self {
        let (job_tx, job_rx) = async_channel::unbounded::<DocumentJob>();

        let pool_handle = tokio::spawn(async move {
            let mut handles = Vec::with_capacity(num_workers.max(1));
            for _ in 0..num_workers.max(1) {
                handles.push(tokio::spawn(worker_loop(
                    job_rx.clone(),
                    extractor.clone(),
                    cancel.clone(),
                    timeout,
                )));
            }

            // Drop our clone so workers are the last holders
            drop(job_rx);

            for h in handles {
                let _ = h.await;
            }
        });

        Self {
            job_tx,
            pool_handle,
        }
    }

    /// Submit a job to the pool.
    pub async fn submit(&self, job: DocumentJob) {
        let _ = self.job_tx.send(job).await;
    }

    /// Close the queue and wait for every worker to finish.
    pub async fn shutdown(self) {
        self.job_tx.close();
        let _ = self.pool_handle.await;
    }
}

/// Number of workers to use when none is configured.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Extract every document and return the outcomes in input order.
pub async fn extract_all(
    extractor: Arc<dyn DocumentExtractor>,
    documents: Vec<Document>,
    cancel: CancellationToken,
    num_workers: usize,
    timeout: Option<Duration>,
    progress: impl Fn(ProgressEvent) + Send + Sync + 'static,
) -> Vec<Result<ExtractionResult, ExtractError>> {
    let total = documents.len();
    let progress: Arc<dyn Fn(ProgressEvent) + Send + Sync> = Arc::new(progress);
    let pool = ExtractionPool::new(extractor, cancel, num_workers, timeout);

    let mut receivers = Vec::with_capacity(total);
    for (index, document) in documents.into_iter().enumerate() {
        let (tx, rx) = oneshot::channel();
        let source_id = document.source_id.clone();
        pool.submit(DocumentJob {
            document,
            result_tx: tx,
            index,
            total,
            progress: progress.clone(),
        })
        .await;
        receivers.push((source_id, rx));
    }

    pool.shutdown().await;

    let mut results = Vec::with_capacity(total);
    for (source_id, rx) in receivers {
        results.push(rx.await.unwrap_or(Err(ExtractError::Cancelled { source_id })));
    }
    results
}

async fn worker_loop(
    job_rx: async_channel::Receiver<DocumentJob>,
    extractor: Arc<dyn DocumentExtractor>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
) {
    while let Ok(job) = job_rx.recv().await {
        let DocumentJob {
            document,
            result_tx,
            index,
            total,
            progress,
        } = job;
        let source_id = document.source_id.clone();

        if cancel.is_cancelled() {
            tracing::debug!(source_id = %source_id, "skipping: cancelled");
            progress(ProgressEvent::Skipped {
                index,
                total,
                source_id: source_id.clone(),
            });
            let _ = result_tx.send(Err(ExtractError::Cancelled { source_id }));
            continue;
        }

        progress(ProgressEvent::Started {
            index,
            total,
            source_id: source_id.clone(),
        });

        let started = Instant::now();
        let ex = extractor.clone();
        let handle = tokio::task::spawn_blocking(move || ex.extract(&document));

        let outcome = match timeout {
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(joined) => flatten_join(joined, &source_id),
                Err(_) => Err(ExtractError::Timeout {
                    source_id: source_id.clone(),
                    secs: limit.as_secs(),
                }),
            },
            None => flatten_join(handle.await, &source_id),
        };

        match &outcome {
            Ok(result) => {
                tracing::info!(
                    source_id = %source_id,
                    terms = result.terms.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "document extracted"
                );
                progress(ProgressEvent::Finished {
                    index,
                    total,
                    source_id: source_id.clone(),
                    terms: result.terms.len(),
                    elapsed: started.elapsed(),
                });
            }
            Err(err) => {
                tracing::warn!(source_id = %source_id, error = %err, "document failed");
                progress(ProgressEvent::Failed {
                    index,
                    total,
                    source_id: source_id.clone(),
                    message: err.to_string(),
                });
            }
        }

        let _ = result_tx.send(outcome);
    }
}

/// A panicking extraction is a defect in one stage; report it for this
/// document only.
fn flatten_join(
    joined: Result<Result<ExtractionResult, ExtractError>, JoinError>,
    source_id: &str,
) -> Result<ExtractionResult, ExtractError> {
    match joined {
        Ok(outcome) => outcome,
        Err(err) if err.is_panic() => Err(ExtractError::StageFailure {
            source_id: source_id.to_string(),
            message: panic_message(err.into_panic()),
        }),
        Err(_) => Err(ExtractError::Cancelled {
            source_id: source_id.to_string(),
        }),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "stage panicked".to_string()
    }
}
