//! Bounded background execution for the vector pipelines.
//!
//! Triggers never wait: submitting is a `try_send` onto a fixed-capacity
//! channel, and a fixed pool of workers drains it. When the queue is full
//! the job is dropped with a warning — the pipelines are idempotent and the
//! next trigger for the same book or review self-heals.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

use crate::application::{BuildBookVectorUseCase, UpdateReviewVectorsUseCase};

#[derive(Debug, Clone)]
pub enum PipelineJob {
    /// A book row with this ISBN was just persisted.
    BookCreated { isbn: String },
    /// A review row with this id was just persisted.
    ReviewCreated { review_id: i64 },
}

#[derive(Clone)]
pub struct PipelineQueue {
    tx: mpsc::Sender<PipelineJob>,
}

impl PipelineQueue {
    /// Spawn `workers` tasks draining a channel of `capacity` jobs.
    pub fn start(
        build: Arc<BuildBookVectorUseCase>,
        update: Arc<UpdateReviewVectorsUseCase>,
        workers: usize,
        capacity: usize,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<PipelineJob>(capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        for worker in 0..workers.max(1) {
            let rx = Arc::clone(&rx);
            let build = Arc::clone(&build);
            let update = Arc::clone(&update);
            tokio::spawn(async move {
                loop {
                    let job = { rx.lock().await.recv().await };
                    let Some(job) = job else {
                        info!("pipeline worker {worker}: queue closed, exiting");
                        break;
                    };
                    run_job(&build, &update, job).await;
                }
            });
        }

        Self { tx }
    }

    /// Enqueue without blocking. Returns `false` when the queue is full and
    /// the job was dropped.
    pub fn submit(&self, job: PipelineJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!("pipeline queue full, dropping {job:?}");
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                error!("pipeline queue closed, dropping {job:?}");
                false
            }
        }
    }
}

async fn run_job(
    build: &BuildBookVectorUseCase,
    update: &UpdateReviewVectorsUseCase,
    job: PipelineJob,
) {
    match job {
        PipelineJob::BookCreated { isbn } => match build.execute(&isbn).await {
            Ok(outcome) => info!("pipeline: book {isbn} finished with {outcome:?}"),
            Err(e) => error!("pipeline: book {isbn} failed: {e}"),
        },
        PipelineJob::ReviewCreated { review_id } => match update.execute(review_id).await {
            Ok(report) => info!("pipeline: review {review_id} finished with {report:?}"),
            Err(e) => error!("pipeline: review {review_id} failed: {e}"),
        },
    }
}
