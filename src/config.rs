//! Gateway configuration: TOML file merged with CLI/env overrides.
//!
//! Resolution order per setting: explicit flag (or its environment
//! variable), then the config file, then the built-in default. The Bolt
//! password has no default; it must come from a flag, the environment,
//! or the file.

use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::server::ServeOptions;

/// Default HTTP bind address.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;
/// Default Bolt endpoint.
pub const DEFAULT_BOLT_URI: &str = "bolt://localhost:7687";
/// Default engine username.
pub const DEFAULT_BOLT_USER: &str = "neo4j";

/// Loaded configuration file plus its origin path.
#[derive(Debug, Default)]
pub struct GatewayConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

/// Per-invocation overrides collected from CLI flags and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// HTTP bind host.
    pub host: Option<IpAddr>,
    /// HTTP port.
    pub port: Option<u16>,
    /// Bolt endpoint.
    pub bolt_uri: Option<String>,
    /// Engine username.
    pub bolt_user: Option<String>,
    /// Engine password.
    pub bolt_password: Option<String>,
    /// Additional allowed CORS origins.
    pub allow_origins: Vec<String>,
}

impl GatewayConfig {
    /// Loads the config file. An explicit path must exist; the default
    /// path is optional.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Ok(Self {
                data: read_file(&path)?,
                path: Some(path),
            }),
            None => match default_config_path() {
                Some(path) if path.exists() => Ok(Self {
                    data: read_file(&path)?,
                    path: Some(path),
                }),
                _ => Ok(Self::default()),
            },
        }
    }

    /// The path the configuration was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Resolves the final serve options from file values and overrides.
    pub fn serve_options(&self, overrides: &Overrides) -> Result<ServeOptions, ConfigError> {
        let host = match overrides.host {
            Some(host) => host,
            None => {
                let raw = self
                    .data
                    .http
                    .host
                    .clone()
                    .unwrap_or_else(|| DEFAULT_HOST.to_string());
                raw.parse()
                    .map_err(|_| ConfigError::InvalidHost { value: raw })?
            }
        };
        let port = overrides
            .port
            .or(self.data.http.port)
            .unwrap_or(DEFAULT_PORT);

        let bolt_uri = overrides
            .bolt_uri
            .clone()
            .or_else(|| self.data.neo4j.uri.clone())
            .unwrap_or_else(|| DEFAULT_BOLT_URI.to_string());
        let bolt_user = overrides
            .bolt_user
            .clone()
            .or_else(|| self.data.neo4j.user.clone())
            .unwrap_or_else(|| DEFAULT_BOLT_USER.to_string());
        let bolt_password = overrides
            .bolt_password
            .clone()
            .or_else(|| self.data.neo4j.password.clone())
            .ok_or(ConfigError::MissingPassword)?;

        let mut allow_origins = self.data.http.allow_origins.clone();
        allow_origins.extend(overrides.allow_origins.iter().cloned());

        Ok(ServeOptions {
            host,
            port,
            bolt_uri,
            bolt_user,
            bolt_password,
            allow_origins,
        })
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default)]
    http: HttpSection,
    #[serde(default)]
    neo4j: Neo4jSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct HttpSection {
    host: Option<String>,
    port: Option<u16>,
    #[serde(default)]
    allow_origins: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct Neo4jSection {
    uri: Option<String>,
    user: Option<String>,
    password: Option<String>,
}

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The config file is not valid TOML for the expected shape.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// The configured bind host is not an IP address.
    #[error("http.host '{value}' is not a valid IP address")]
    InvalidHost {
        /// The offending value.
        value: String,
    },
    /// No Bolt password anywhere in the resolution chain.
    #[error("no graph engine password configured; pass --bolt-password, set REDIFY_BOLT_PASSWORD, or add [neo4j].password to the config file")]
    MissingPassword,
}

/// Default config file location (`<config dir>/redify/config.toml`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("redify").join("config.toml"))
}
