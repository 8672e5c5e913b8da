use super::models::Config;

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push<S: Into<String>>(&mut self, message: S) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint<S: Into<String>, H: Into<String>>(
        &mut self,
        message: S,
        hint: H,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

/// Non-fatal checks on a fully composed configuration.
pub fn collect_warnings(config: &Config) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();

    if config.auth.password.is_empty() {
        warnings.push_with_hint(
            "password is empty; anyone knowing the username can trigger scans",
            "set `password` in the configuration file",
        );
    }

    if config.tls.is_none() {
        warnings.push_with_hint(
            "TLS is not configured; Basic credentials travel in cleartext",
            "set `certFile` and `keyFile` to serve HTTPS",
        );
    }

    if config.scanner.scan_directory.is_relative() {
        warnings.push(format!(
            "scan directory {} is relative to the working directory",
            config.scanner.scan_directory.display()
        ));
    }

    warnings
}
