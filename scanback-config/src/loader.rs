use std::{
    fmt, fs,
    net::{AddrParseError, IpAddr, Ipv4Addr},
    num::ParseIntError,
    path::{Path, PathBuf},
};
use thiserror::Error;

use super::{
    models::{
        AuthConfig, Config, ConfigMetadata, ScannerConfig, ServerConfig,
        TlsConfig,
    },
    sources::{EnvConfig, FileConfig},
    validation::{self, ConfigWarnings},
};

const DEFAULT_CONFIG_LOCATIONS: &[&str] =
    &["scanback.conf", "scanback.toml", "config/scanback.toml"];

const DEFAULT_PORT: u16 = 8443;
const DEFAULT_NMAP: &str = "nmap";
const DEFAULT_SCAN_DIRECTORY: &str = "scans";

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
    /// Fixed environment snapshot; when set the process environment and
    /// `.env` files are ignored.
    pub env: Option<EnvConfig>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

/// On-disk format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") | Some("conf") => Self::Json,
            _ => Self::Toml,
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn with_env(mut self, env: EnvConfig) -> Self {
        self.options.env = Some(env);
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env, env_file_loaded) = match &self.options.env {
            Some(env) => (env.clone(), false),
            None => {
                let loaded = self.load_env_file()?;
                (EnvConfig::gather(), loaded)
            }
        };

        let path = self.resolve_config_path(&env)?;
        let file_config = read_file_config(&path)?;

        let config = compose_config(
            file_config,
            env,
            ConfigMetadata {
                config_path: Some(path),
                env_file_loaded,
            },
        )?;
        let warnings = validation::collect_warnings(&config);

        Ok(ConfigLoad { config, warnings })
    }

    fn load_env_file(&self) -> Result<bool, ConfigLoadError> {
        let result = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true),
            None => dotenvy::dotenv().map(|_| true),
        };

        match result {
            Ok(loaded) => Ok(loaded),
            Err(dotenvy::Error::Io(_)) => Ok(false),
            Err(err) => Err(ConfigLoadError::EnvFile(err)),
        }
    }

    fn resolve_config_path(
        &self,
        env: &EnvConfig,
    ) -> Result<PathBuf, ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env.config_path.clone());

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok(path);
        }

        DEFAULT_CONFIG_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists())
            .ok_or_else(|| ConfigLoadError::NotFound {
                searched: SearchedPaths(
                    DEFAULT_CONFIG_LOCATIONS.iter().map(PathBuf::from).collect(),
                ),
            })
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|err| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;

    match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::from_str(&contents).map_err(|err| {
            ConfigLoadError::ParseJson {
                path: path.to_path_buf(),
                source: err,
            }
        }),
        ConfigFormat::Toml => toml::from_str(&contents).map_err(|err| {
            ConfigLoadError::ParseToml {
                path: path.to_path_buf(),
                source: err,
            }
        }),
    }
}

fn compose_config(
    file: FileConfig,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<Config, ConfigLoadError> {
    let FileConfig {
        port: file_port,
        address: file_address,
        domain,
        user,
        password,
        nmap,
        scan_directory,
        cert_file,
        key_file,
    } = file;

    let port = match env.port {
        Some(raw) => raw.trim().parse().map_err(|source| {
            ConfigLoadError::InvalidPort { value: raw, source }
        })?,
        None => file_port.unwrap_or(DEFAULT_PORT),
    };

    let address = match env.address.or(file_address) {
        Some(raw) => parse_bind_address(&raw)?,
        None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
    };

    let auth = AuthConfig {
        realm: required("domain", domain)?,
        username: required("user", user)?,
        password: password.unwrap_or_default(),
    };

    let scanner = ScannerConfig {
        nmap_path: env
            .nmap
            .or(nmap)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_NMAP)),
        scan_directory: env
            .scan_directory
            .or(scan_directory)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCAN_DIRECTORY)),
    };

    let tls = match (cert_file, key_file) {
        (Some(cert_path), Some(key_path)) => Some(TlsConfig {
            cert_path,
            key_path,
        }),
        (Some(_), None) => {
            return Err(ConfigLoadError::IncompleteTls { missing: "keyFile" });
        }
        (None, Some(_)) => {
            return Err(ConfigLoadError::IncompleteTls {
                missing: "certFile",
            });
        }
        (None, None) => None,
    };

    Ok(Config {
        server: ServerConfig { address, port },
        auth,
        scanner,
        tls,
        metadata,
    })
}

fn required(
    field: &'static str,
    value: Option<String>,
) -> Result<String, ConfigLoadError> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigLoadError::MissingField { field }),
    }
}

fn parse_bind_address(raw: &str) -> Result<IpAddr, ConfigLoadError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    trimmed
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .map_err(|source| ConfigLoadError::InvalidAddress {
            value: raw.to_string(),
            source,
        })
}

#[derive(Debug)]
pub struct SearchedPaths(pub Vec<PathBuf>);

impl fmt::Display for SearchedPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("no configuration file found (searched {searched})")]
    NotFound { searched: SearchedPaths },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse TOML configuration {path}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to parse JSON configuration {path}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("missing required setting `{field}`")]
    MissingField { field: &'static str },
    #[error("invalid bind address '{value}'")]
    InvalidAddress {
        value: String,
        #[source]
        source: AddrParseError,
    },
    #[error("invalid port '{value}'")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
    #[error("TLS needs both certFile and keyFile; `{missing}` is not set")]
    IncompleteTls { missing: &'static str },
    #[error("failed to load environment file")]
    EnvFile(#[source] dotenvy::Error),
}
