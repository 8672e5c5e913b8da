//! TLS termination for the scan trigger.
//!
//! Certificate and key are PEM files named in the configuration. They are
//! read once at startup; a missing or unparsable file aborts startup.

use axum_server::tls_rustls::RustlsConfig;
use scanback_config::TlsConfig;
use std::path::{Path, PathBuf};
use tracing::info;

/// TLS-related errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Certificate file not found: {}", .0.display())]
    CertificateNotFound(PathBuf),

    #[error("Private key file not found: {}", .0.display())]
    PrivateKeyNotFound(PathBuf),

    #[error("Failed to load certificate/key pair")]
    Load(#[source] std::io::Error),
}

/// Install the process-wide rustls crypto provider. Safe to call repeatedly.
pub fn install_crypto_provider() {
    // Err only means a provider is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// Build the acceptor configuration for `axum_server::bind_rustls`.
pub async fn load_rustls_config(
    tls: &TlsConfig,
) -> Result<RustlsConfig, TlsError> {
    ensure_exists(&tls.cert_path, TlsError::CertificateNotFound)?;
    ensure_exists(&tls.key_path, TlsError::PrivateKeyNotFound)?;

    install_crypto_provider();

    let config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(TlsError::Load)?;

    info!(
        cert = %tls.cert_path.display(),
        key = %tls.key_path.display(),
        "TLS certificate loaded"
    );
    Ok(config)
}

fn ensure_exists(
    path: &Path,
    missing: fn(PathBuf) -> TlsError,
) -> Result<(), TlsError> {
    if path.exists() {
        Ok(())
    } else {
        Err(missing(path.to_path_buf()))
    }
}
