use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as written in the config file.
///
/// The key set is flat and shared by the JSON and TOML formats, e.g.
///
/// ```json
/// {
///   "port": 8443,
///   "address": "0.0.0.0",
///   "domain": "scanback",
///   "user": "alice",
///   "password": "secret",
///   "nmap": "/usr/bin/nmap",
///   "scanDirectory": "/var/lib/scanback",
///   "certFile": "/etc/scanback/cert.pem",
///   "keyFile": "/etc/scanback/key.pem"
/// }
/// ```
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nmap: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan_directory: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<PathBuf>,
}

/// Values picked up from the process environment. These win over the file.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub port: Option<String>,
    pub address: Option<String>,
    pub nmap: Option<PathBuf>,
    pub scan_directory: Option<PathBuf>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        Self {
            config_path: std::env::var("SCANBACK_CONFIG")
                .ok()
                .map(PathBuf::from),
            port: std::env::var("SCANBACK_PORT").ok(),
            address: std::env::var("SCANBACK_ADDRESS").ok(),
            nmap: std::env::var("SCANBACK_NMAP").ok().map(PathBuf::from),
            scan_directory: std::env::var("SCANBACK_SCAN_DIRECTORY")
                .ok()
                .map(PathBuf::from),
        }
    }
}
