use std::{fmt, net::IpAddr};

/// A single pending scan. Consumed exactly once by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanRequest {
    target: IpAddr,
}

impl ScanRequest {
    /// IPv4-mapped IPv6 addresses are folded back to plain IPv4 so the same
    /// host always maps to the same artifact path.
    pub fn new(target: IpAddr) -> Self {
        Self {
            target: target.to_canonical(),
        }
    }

    pub fn target(&self) -> IpAddr {
        self.target
    }
}

impl From<IpAddr> for ScanRequest {
    fn from(target: IpAddr) -> Self {
        Self::new(target)
    }
}

impl fmt::Display for ScanRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.target.fmt(f)
    }
}
