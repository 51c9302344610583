use std::env;
use thiserror::Error;

const DEFAULT_STORAGE_DOMAIN: &str = "s3.amazonaws.com";
const DEFAULT_STORAGE_SCHEME: &str = "https";
const DEFAULT_PORT: u16 = 8080;

/// Deployment-time wiring, read once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host suffix identifying the storage origin, without the leading dot.
    pub storage_domain: String,
    pub storage_backend: StorageBackend,
    /// Only used by the HTTP backend.
    pub storage_scheme: String,
    pub port: u16,
    pub trace_stdout: bool,
}

/// How originals are read from the bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    /// Signed `GetObject` through the AWS SDK.
    #[default]
    S3,
    /// Unsigned GET on the virtual-hosted URL, for public buckets and
    /// S3-compatible stand-ins.
    Http,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is invalid: {value:?}")]
    Invalid { name: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Config {
        Config {
            storage_domain: DEFAULT_STORAGE_DOMAIN.to_string(),
            storage_backend: StorageBackend::default(),
            storage_scheme: DEFAULT_STORAGE_SCHEME.to_string(),
            port: DEFAULT_PORT,
            trace_stdout: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let mut config = Config::default();

        if let Some(value) = lookup("RESIZER_STORAGE_DOMAIN") {
            let domain = value.trim().trim_start_matches('.').to_ascii_lowercase();
            if domain.is_empty() {
                return Err(invalid("RESIZER_STORAGE_DOMAIN", value));
            }
            config.storage_domain = domain;
        }

        if let Some(value) = lookup("RESIZER_STORAGE_BACKEND") {
            config.storage_backend = match value.to_ascii_lowercase().as_str() {
                "s3" => StorageBackend::S3,
                "http" => StorageBackend::Http,
                _ => return Err(invalid("RESIZER_STORAGE_BACKEND", value)),
            };
        }

        if let Some(value) = lookup("RESIZER_STORAGE_SCHEME") {
            match value.as_str() {
                "http" | "https" => config.storage_scheme = value,
                _ => return Err(invalid("RESIZER_STORAGE_SCHEME", value)),
            }
        }

        if let Some(value) = lookup("RESIZER_PORT") {
            config.port = value
                .parse()
                .map_err(|_| invalid("RESIZER_PORT", value.clone()))?;
        }

        if let Some(value) = lookup("RESIZER_TRACE_STDOUT") {
            config.trace_stdout = match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => return Err(invalid("RESIZER_TRACE_STDOUT", value)),
            };
        }

        Ok(config)
    }
}

fn invalid(name: &'static str, value: String) -> ConfigError {
    ConfigError::Invalid { name, value }
}
