//! # scanback core
//!
//! Producer/consumer plumbing between the HTTP endpoint and the external
//! scanner:
//!
//! - [`ScanRequest`]: a validated IP address waiting to be scanned
//! - [`queue`]: unbounded FIFO with many producers and a single consumer
//! - [`worker::ScanWorker`]: the one background task running scans serially
//! - [`nmap::NmapRunner`]: the [`runner::ScanRunner`] that shells out to nmap

pub mod nmap;
pub mod queue;
pub mod request;
pub mod runner;
pub mod worker;

pub use nmap::NmapRunner;
pub use queue::{QueueError, ScanQueueHandle, ScanQueueReceiver, scan_queue};
pub use request::ScanRequest;
pub use runner::{ScanError, ScanOutcome, ScanRunner};
pub use worker::{ScanWorker, WorkerHandle, WorkerReport, WorkerState};
