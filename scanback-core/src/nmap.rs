//! nmap invocation.
//!
//! Every scan runs `<nmap> -Pn -oA <scan_directory>/scanback_<ip> <ip>`
//! (with `-6` in front for IPv6 targets): host discovery is skipped and all
//! output formats are written next to each other under the artifact base.
//! A repeat scan of the same address overwrites the previous artifacts.

use std::{
    net::IpAddr,
    path::{Path, PathBuf},
    process::Stdio,
    time::Instant,
};

use async_trait::async_trait;
use scanback_config::ScannerConfig;
use tokio::process::Command;
use tracing::debug;

use crate::{
    request::ScanRequest,
    runner::{ScanError, ScanOutcome, ScanRunner},
};

/// File-name prefix for every artifact set.
pub const ARTIFACT_PREFIX: &str = "scanback_";

/// Treat the target as up, skipping the ping sweep.
const SKIP_HOST_DISCOVERY: &str = "-Pn";
/// Write normal, XML and grepable output to `<base>.{nmap,xml,gnmap}`.
const ALL_OUTPUT_FORMATS: &str = "-oA";
/// nmap refuses IPv6 targets without it.
const IPV6: &str = "-6";

/// Maximum stderr bytes carried into an error.
const STDERR_LIMIT: usize = 512;

pub fn artifact_base(scan_directory: &Path, target: IpAddr) -> PathBuf {
    scan_directory.join(format!("{ARTIFACT_PREFIX}{target}"))
}

#[derive(Debug, Clone)]
pub struct NmapRunner {
    nmap_path: PathBuf,
    scan_directory: PathBuf,
}

impl NmapRunner {
    pub fn new(
        nmap_path: impl Into<PathBuf>,
        scan_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            nmap_path: nmap_path.into(),
            scan_directory: scan_directory.into(),
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(&config.nmap_path, &config.scan_directory)
    }

    pub fn nmap_path(&self) -> &Path {
        &self.nmap_path
    }

    pub fn scan_directory(&self) -> &Path {
        &self.scan_directory
    }

    /// Create the scan directory if it does not exist yet.
    pub async fn prepare(&self) -> Result<(), ScanError> {
        tokio::fs::create_dir_all(&self.scan_directory)
            .await
            .map_err(|source| ScanError::ScanDirectory {
                path: self.scan_directory.clone(),
                source,
            })
    }

    pub fn command(&self, target: IpAddr) -> Command {
        let mut command = Command::new(&self.nmap_path);
        if target.is_ipv6() {
            command.arg(IPV6);
        }
        command
            .arg(SKIP_HOST_DISCOVERY)
            .arg(ALL_OUTPUT_FORMATS)
            .arg(artifact_base(&self.scan_directory, target))
            .arg(target.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        command
    }
}

#[async_trait]
impl ScanRunner for NmapRunner {
    async fn run(&self, request: &ScanRequest) -> Result<ScanOutcome, ScanError> {
        let target = request.target();
        let artifact_base = artifact_base(&self.scan_directory, target);
        let started = Instant::now();

        debug!(
            target = %target,
            nmap = %self.nmap_path.display(),
            artifact_base = %artifact_base.display(),
            "launching nmap"
        );

        let output = self.command(target).output().await.map_err(|source| {
            ScanError::Launch {
                program: self.nmap_path.clone(),
                source,
            }
        })?;

        if !output.status.success() {
            return Err(ScanError::Exited {
                program: self.nmap_path.clone(),
                status: output.status,
                stderr: truncate_stderr(&output.stderr),
            });
        }

        Ok(ScanOutcome {
            target,
            artifact_base,
            elapsed: started.elapsed(),
        })
    }
}

fn truncate_stderr(raw: &[u8]) -> String {
    let end = raw.len().min(STDERR_LIMIT);
    String::from_utf8_lossy(&raw[..end]).trim().to_string()
}
