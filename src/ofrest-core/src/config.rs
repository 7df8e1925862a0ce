use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Connection settings for one Openfire server.
#[derive(Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Scheme, host and port, e.g. `https://localhost:9091`
    pub host: String,
    /// Shared secret sent as the `Authorization` header
    pub secret: String,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_verify_ssl() -> bool {
    true
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            host: normalize_host(&host.into()),
            secret: secret.into(),
            verify_ssl: default_verify_ssl(),
            timeout_secs: None,
        }
    }

    /// Skip certificate validation for this client only.
    pub fn insecure(mut self) -> Self {
        self.verify_ssl = false;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config: ClientConfig = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.host = normalize_host(&config.host);
        Ok(config)
    }

    /// Build a config entirely from `OFREST_*` environment variables.
    ///
    /// Returns `None` unless both `OFREST_HOST` and `OFREST_SECRET` are set.
    pub fn from_env() -> Option<Self> {
        EnvOverrides::read().into_config()
    }

    /// Full URL for an endpoint path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }
}

/// Connection settings taken from `OFREST_HOST`, `OFREST_SECRET`,
/// `OFREST_VERIFY_SSL` and `OFREST_TIMEOUT_SECS`. Unset or unparseable
/// variables are `None`.
#[derive(Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub host: Option<String>,
    pub secret: Option<String>,
    pub verify_ssl: Option<bool>,
    pub timeout_secs: Option<u64>,
}

impl EnvOverrides {
    pub fn read() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());
        Self {
            host: non_blank("OFREST_HOST"),
            secret: non_blank("OFREST_SECRET"),
            verify_ssl: non_blank("OFREST_VERIFY_SSL").and_then(|s| parse_bool(&s)),
            timeout_secs: non_blank("OFREST_TIMEOUT_SECS").and_then(|s| s.trim().parse().ok()),
        }
    }

    fn into_config(self) -> Option<ClientConfig> {
        let mut config = ClientConfig::new(self.host?, self.secret?);
        config.verify_ssl = self.verify_ssl.unwrap_or(true);
        config.timeout_secs = self.timeout_secs;
        Some(config)
    }
}

impl fmt::Debug for EnvOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvOverrides")
            .field("host", &self.host)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("secret", &"<redacted>")
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
