use std::sync::Arc;

use anyhow::{Context, Result};
use scanback_config::Config;
use scanback_core::{
    NmapRunner, ScanQueueHandle, ScanRunner, ScanWorker, WorkerHandle,
    WorkerReport, scan_queue,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Queue producer plus the running worker draining it.
#[derive(Debug)]
pub struct ScanPipeline {
    pub queue: ScanQueueHandle,
    pub worker: WorkerHandle,
}

impl ScanPipeline {
    /// Start the nmap-backed pipeline described by `config`. The scan
    /// directory is created up front so a bad path fails startup.
    pub async fn start(
        config: &Config,
        shutdown: CancellationToken,
    ) -> Result<Self> {
        let runner = NmapRunner::from_config(&config.scanner);
        runner.prepare().await.with_context(|| {
            format!(
                "failed to prepare scan directory {}",
                config.scanner.scan_directory.display()
            )
        })?;

        info!(
            nmap = %runner.nmap_path().display(),
            scan_directory = %runner.scan_directory().display(),
            "scanner ready"
        );

        Ok(Self::with_runner(Arc::new(runner), shutdown))
    }

    pub fn with_runner(
        runner: Arc<dyn ScanRunner>,
        shutdown: CancellationToken,
    ) -> Self {
        let (queue, receiver) = scan_queue();
        let worker = ScanWorker::new(receiver, runner)
            .with_shutdown(shutdown)
            .spawn();

        Self { queue, worker }
    }

    /// Stop the worker after its current scan and return its totals.
    pub async fn stop(self) -> Result<WorkerReport> {
        let Self { queue, worker } = self;
        let pending = queue.depth();
        drop(queue);

        if pending > 0 {
            warn!(pending, "stopping with scans still queued");
        }

        worker.shutdown().await.context("scan worker panicked")
    }
}
