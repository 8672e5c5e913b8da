use std::{
    net::IpAddr,
    path::PathBuf,
    process::ExitStatus,
    time::Duration,
};

use async_trait::async_trait;
use thiserror::Error;

use crate::request::ScanRequest;

/// Something that can scan one host to completion.
///
/// The worker awaits `run` without a deadline; implementations decide when
/// the scan is over.
#[async_trait]
pub trait ScanRunner: Send + Sync {
    async fn run(&self, request: &ScanRequest) -> Result<ScanOutcome, ScanError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutcome {
    pub target: IpAddr,
    /// Base path handed to the scanner; artifacts share this prefix
    pub artifact_base: PathBuf,
    pub elapsed: Duration,
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to launch {}", program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} exited with {status}{}", program.display(), format_stderr(stderr))]
    Exited {
        program: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[error("failed to prepare scan directory {}", path.display())]
    ScanDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_stderr(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
