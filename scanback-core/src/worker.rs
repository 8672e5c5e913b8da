//! The single background scan worker.
//!
//! One worker drains one queue and runs one scan at a time. A scan is never
//! interrupted: shutdown is only observed between scans, after which anything
//! still queued is discarded.

use std::{fmt, net::IpAddr, sync::Arc};

use tokio::{
    sync::watch,
    task::{JoinError, JoinHandle},
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    queue::ScanQueueReceiver,
    request::ScanRequest,
    runner::ScanRunner,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Scanning { target: IpAddr },
}

/// Totals reported when the worker stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerReport {
    pub completed: u64,
    pub failed: u64,
    /// Requests still queued at shutdown
    pub abandoned: usize,
}

pub struct ScanWorker {
    receiver: ScanQueueReceiver,
    runner: Arc<dyn ScanRunner>,
    state_tx: watch::Sender<WorkerState>,
    shutdown: CancellationToken,
}

impl fmt::Debug for ScanWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanWorker")
            .field("state", &*self.state_tx.borrow())
            .field("shutdown_cancelled", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ScanWorker {
    pub fn new(receiver: ScanQueueReceiver, runner: Arc<dyn ScanRunner>) -> Self {
        let (state_tx, _) = watch::channel(WorkerState::Idle);
        Self {
            receiver,
            runner,
            state_tx,
            shutdown: CancellationToken::new(),
        }
    }

    /// Use an externally owned token so shutdown can be coordinated with the
    /// HTTP server.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn spawn(self) -> WorkerHandle {
        let state = self.state_tx.subscribe();
        let shutdown = self.shutdown.clone();
        let join = tokio::spawn(self.run());

        WorkerHandle {
            join,
            state,
            shutdown,
        }
    }

    /// Consume the queue until it is closed or shutdown is requested.
    pub async fn run(mut self) -> WorkerReport {
        let mut report = WorkerReport::default();
        info!("scan worker started");

        loop {
            let request = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                next = self.receiver.next() => match next {
                    Some(request) => request,
                    None => {
                        info!("scan queue closed");
                        break;
                    }
                },
            };

            if self.scan(request).await {
                report.completed += 1;
            } else {
                report.failed += 1;
            }
        }

        report.abandoned = self.receiver.abandon();
        if report.abandoned > 0 {
            warn!(
                abandoned = report.abandoned,
                "discarding queued scans at shutdown"
            );
        }

        info!(
            completed = report.completed,
            failed = report.failed,
            "scan worker stopped"
        );
        report
    }

    async fn scan(&self, request: ScanRequest) -> bool {
        let target = request.target();
        self.state_tx.send_replace(WorkerState::Scanning { target });
        info!(target = %target, "beginning scan");

        let succeeded = match self.runner.run(&request).await {
            Ok(outcome) => {
                info!(
                    target = %target,
                    artifact_base = %outcome.artifact_base.display(),
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "finished scan"
                );
                true
            }
            Err(err) => {
                error!(target = %target, error = %err, "scan failed");
                false
            }
        };

        self.state_tx.send_replace(WorkerState::Idle);
        succeeded
    }
}

/// Handle to a spawned [`ScanWorker`].
#[derive(Debug)]
pub struct WorkerHandle {
    join: JoinHandle<WorkerReport>,
    state: watch::Receiver<WorkerState>,
    shutdown: CancellationToken,
}

impl WorkerHandle {
    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.clone()
    }

    /// Ask the worker to stop after the scan in progress, then wait for it.
    pub async fn shutdown(self) -> Result<WorkerReport, JoinError> {
        self.shutdown.cancel();
        self.join.await
    }

    /// Wait for the worker to finish on its own, i.e. once every queue
    /// handle has been dropped and the queue is drained.
    pub async fn join(self) -> Result<WorkerReport, JoinError> {
        self.join.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        nmap::NmapRunner,
        queue::scan_queue,
        runner::{ScanError, ScanOutcome},
    };
    use async_trait::async_trait;
    use std::{
        net::Ipv4Addr,
        path::PathBuf,
        sync::Mutex,
        time::Duration,
    };
    use tokio::sync::Notify;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Started(IpAddr),
        Finished(IpAddr),
    }

    #[derive(Default)]
    struct RecordingRunner {
        events: Mutex<Vec<Event>>,
        delay: Duration,
        fail: Vec<IpAddr>,
        gate: Option<Arc<Notify>>,
    }

    impl RecordingRunner {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ScanRunner for RecordingRunner {
        async fn run(
            &self,
            request: &ScanRequest,
        ) -> Result<ScanOutcome, ScanError> {
            let target = request.target();
            self.events.lock().unwrap().push(Event::Started(target));
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            tokio::time::sleep(self.delay).await;
            self.events.lock().unwrap().push(Event::Finished(target));

            if self.fail.contains(&target) {
                return Err(ScanError::Launch {
                    program: PathBuf::from("recording"),
                    source: std::io::Error::other("simulated failure"),
                });
            }
            Ok(ScanOutcome {
                target,
                artifact_base: PathBuf::from(format!("scanback_{target}")),
                elapsed: self.delay,
            })
        }
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(198, 51, 100, last))
    }

    #[tokio::test]
    async fn scans_run_in_fifo_order_without_overlap() {
        let runner = Arc::new(RecordingRunner {
            delay: Duration::from_millis(20),
            ..Default::default()
        });
        let (queue, receiver) = scan_queue();
        for last in 1..=3 {
            queue.enqueue(ScanRequest::new(ip(last))).unwrap();
        }
        drop(queue);

        let handle = ScanWorker::new(receiver, runner.clone()).spawn();
        let report = handle.join().await.unwrap();

        assert_eq!(
            runner.events(),
            vec![
                Event::Started(ip(1)),
                Event::Finished(ip(1)),
                Event::Started(ip(2)),
                Event::Finished(ip(2)),
                Event::Started(ip(3)),
                Event::Finished(ip(3)),
            ]
        );
        assert_eq!(
            report,
            WorkerReport {
                completed: 3,
                failed: 0,
                abandoned: 0
            }
        );
    }

    #[tokio::test]
    async fn failed_scan_does_not_stop_the_worker() {
        let runner = Arc::new(RecordingRunner {
            fail: vec![ip(1)],
            ..Default::default()
        });
        let (queue, receiver) = scan_queue();
        queue.enqueue(ScanRequest::new(ip(1))).unwrap();
        queue.enqueue(ScanRequest::new(ip(2))).unwrap();
        drop(queue);

        let report = ScanWorker::new(receiver, runner.clone())
            .spawn()
            .join()
            .await
            .unwrap();

        assert_eq!(report.completed, 1);
        assert_eq!(report.failed, 1);
        assert!(runner.events().contains(&Event::Started(ip(2))));
    }

    #[tokio::test]
    async fn missing_scanner_binary_keeps_worker_alive() {
        let dir = tempfile::TempDir::new().unwrap();
        let runner = Arc::new(NmapRunner::new(
            dir.path().join("does-not-exist"),
            dir.path(),
        ));
        let (queue, receiver) = scan_queue();
        queue.enqueue(ScanRequest::new(ip(1))).unwrap();
        queue.enqueue(ScanRequest::new(ip(2))).unwrap();
        drop(queue);

        let report =
            ScanWorker::new(receiver, runner).spawn().join().await.unwrap();

        assert_eq!(report.failed, 2);
        assert_eq!(report.completed, 0);
    }

    #[tokio::test]
    async fn enqueue_does_not_wait_for_busy_worker() {
        let gate = Arc::new(Notify::new());
        let runner = Arc::new(RecordingRunner {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });
        let (queue, receiver) = scan_queue();
        let handle = ScanWorker::new(receiver, runner.clone()).spawn();
        let mut state = handle.subscribe();

        queue.enqueue(ScanRequest::new(ip(1))).unwrap();
        state
            .wait_for(|s| *s == WorkerState::Scanning { target: ip(1) })
            .await
            .unwrap();

        // worker is blocked inside the first scan
        assert_eq!(queue.enqueue(ScanRequest::new(ip(2))), Ok(1));
        assert!(!runner.events().contains(&Event::Finished(ip(1))));

        gate.notify_one();
        state
            .wait_for(|s| *s == WorkerState::Scanning { target: ip(2) })
            .await
            .unwrap();
        gate.notify_one();
        drop(queue);

        let report = handle.join().await.unwrap();
        assert_eq!(report.completed, 2);
    }

    #[tokio::test]
    async fn shutdown_finishes_current_scan_and_abandons_rest() {
        let gate = Arc::new(Notify::new());
        let runner = Arc::new(RecordingRunner {
            gate: Some(Arc::clone(&gate)),
            ..Default::default()
        });
        let (queue, receiver) = scan_queue();
        for last in 1..=3 {
            queue.enqueue(ScanRequest::new(ip(last))).unwrap();
        }

        let handle = ScanWorker::new(receiver, runner.clone()).spawn();
        let mut state = handle.subscribe();
        state
            .wait_for(|s| matches!(s, WorkerState::Scanning { .. }))
            .await
            .unwrap();

        let shutdown = tokio::spawn(handle.shutdown());
        tokio::time::sleep(Duration::from_millis(20)).await;
        gate.notify_one();

        let report = shutdown.await.unwrap().unwrap();
        assert_eq!(
            report,
            WorkerReport {
                completed: 1,
                failed: 0,
                abandoned: 2
            }
        );
        assert_eq!(
            runner.events(),
            vec![Event::Started(ip(1)), Event::Finished(ip(1))]
        );
        assert!(queue.is_closed());
    }

    #[tokio::test]
    async fn idle_worker_stops_on_shutdown() {
        let (_queue, receiver) = scan_queue();
        let handle =
            ScanWorker::new(receiver, Arc::new(RecordingRunner::default()))
                .spawn();
        assert_eq!(handle.state(), WorkerState::Idle);

        let report = tokio::time::timeout(
            Duration::from_secs(1),
            handle.shutdown(),
        )
        .await
        .expect("worker should stop promptly")
        .unwrap();
        assert_eq!(report, WorkerReport::default());
    }
}
