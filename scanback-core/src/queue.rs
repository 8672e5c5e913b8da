//! Unbounded FIFO between request handlers and the scan worker.
//!
//! Producers never wait: [`ScanQueueHandle::enqueue`] is synchronous and only
//! fails once the consumer side is gone. The single [`ScanQueueReceiver`]
//! parks on `recv` while the queue is empty.

use std::{
    net::IpAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::request::ScanRequest;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("scan queue is closed; {target} was not queued")]
    Closed { target: IpAddr },
}

/// Create a connected producer handle and consumer.
pub fn scan_queue() -> (ScanQueueHandle, ScanQueueReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    let depth = Arc::new(AtomicUsize::new(0));

    (
        ScanQueueHandle {
            tx,
            depth: Arc::clone(&depth),
        },
        ScanQueueReceiver { rx, depth },
    )
}

/// Cloneable producer side, shared by every request handler.
#[derive(Debug, Clone)]
pub struct ScanQueueHandle {
    tx: mpsc::UnboundedSender<ScanRequest>,
    depth: Arc<AtomicUsize>,
}

impl ScanQueueHandle {
    /// Append a request and return how many requests are now waiting
    /// (including this one, excluding any scan in progress).
    pub fn enqueue(&self, request: ScanRequest) -> Result<usize, QueueError> {
        let pending = self.depth.fetch_add(1, Ordering::AcqRel) + 1;
        if self.tx.send(request).is_err() {
            self.depth.fetch_sub(1, Ordering::AcqRel);
            return Err(QueueError::Closed {
                target: request.target(),
            });
        }
        Ok(pending)
    }

    /// Requests accepted but not yet picked up by the worker.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Single consumer side, owned by the scan worker.
#[derive(Debug)]
pub struct ScanQueueReceiver {
    rx: mpsc::UnboundedReceiver<ScanRequest>,
    depth: Arc<AtomicUsize>,
}

impl ScanQueueReceiver {
    /// Wait for the next request. Returns `None` once every handle has been
    /// dropped and the queue is empty. Cancel safe.
    pub async fn next(&mut self) -> Option<ScanRequest> {
        let request = self.rx.recv().await?;
        self.depth.fetch_sub(1, Ordering::AcqRel);
        Some(request)
    }

    /// Close the queue to producers and discard whatever is still waiting.
    /// Returns the number of discarded requests.
    pub fn abandon(&mut self) -> usize {
        self.rx.close();
        let mut abandoned = 0;
        while self.rx.try_recv().is_ok() {
            self.depth.fetch_sub(1, Ordering::AcqRel);
            abandoned += 1;
        }
        abandoned
    }
}
