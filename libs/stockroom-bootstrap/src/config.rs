//! Layered application configuration.
//!
//! Sources are merged in this order, later ones winning:
//! 1. built-in defaults
//! 2. YAML file (if provided)
//! 3. environment variables prefixed with `STOCKROOM__` (`__` separates sections)
//! 4. CLI overrides
//!
//! Module-specific settings live under `modules.<name>.config` and are read
//! with [`AppConfig::module_config_or_default`].

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use stockroom_http::CorsConfig;

/// Environment variable prefix, e.g. `STOCKROOM__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "STOCKROOM__";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file does not exist: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("invalid config for module '{module}': {source}")]
    InvalidModuleConfig {
        module: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level configuration for a Stockroom process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cors: CorsConfig,
    /// Raw per-module sections: `modules.<name> = { config: ... }`.
    pub modules: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Upper bound for a single request, enforced by the transport layer.
    pub request_timeout_secs: u64,
    /// Upper bound for request bodies, including import uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_owned(),
            port: 5000,
            request_timeout_secs: 30,
            max_upload_bytes: 1024 * 1024,
        }
    }
}

impl ServerConfig {
    /// Listen address. An IPv6 `bind_addr` may be given with or without brackets.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidAddress`] if `bind_addr` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = self.bind_addr.trim();
        let host = raw
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(raw);
        let ip: IpAddr = host.parse().map_err(|source| ConfigError::InvalidAddress {
            addr: self.bind_addr.clone(),
            source,
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-friendly output for interactive use
    #[default]
    Pretty,
    /// JSON lines for log shippers
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive (`info`, `inventory=debug,info`, ...).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Pretty,
        }
    }
}

/// Command-line values that override file and environment settings.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub port: Option<u16>,
    /// -v info, -vv debug, -vvv trace
    pub verbose: u8,
}

impl AppConfig {
    /// Build the layered configuration.
    ///
    /// # Errors
    /// Returns an error if `path` is given but missing, or any source fails to
    /// deserialize into [`AppConfig`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        let level = match args.verbose {
            0 => None,
            1 => Some("info"),
            2 => Some("debug"),
            _ => Some("trace"),
        };
        if let Some(level) = level {
            level.clone_into(&mut self.logging.level);
        }
    }

    /// Typed config for `module_name`, or `T::default()` when the module has no
    /// `config` section.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidModuleConfig`] if the section exists but
    /// cannot be deserialized into `T`.
    pub fn module_config_or_default<T: DeserializeOwned + Default>(
        &self,
        module_name: &str,
    ) -> Result<T, ConfigError> {
        let Some(section) = self
            .modules
            .get(module_name)
            .and_then(serde_json::Value::as_object)
            .and_then(|obj| obj.get("config"))
        else {
            return Ok(T::default());
        };

        serde_json::from_value(section.clone()).map_err(|source| {
            ConfigError::InvalidModuleConfig {
                module: module_name.to_owned(),
                source,
            }
        })
    }

    /// Set a single key inside `modules.<name>.config`, creating the section
    /// if needed. Used for CLI overrides of module settings.
    pub fn set_module_config_value(
        &mut self,
        module_name: &str,
        key: &str,
        value: serde_json::Value,
    ) {
        let module = self
            .modules
            .entry(module_name.to_owned())
            .or_insert_with(|| serde_json::json!({}));
        if !module.is_object() {
            *module = serde_json::json!({});
        }
        if let Some(obj) = module.as_object_mut() {
            let config = obj
                .entry("config")
                .or_insert_with(|| serde_json::json!({}));
            if !config.is_object() {
                *config = serde_json::json!({});
            }
            if let Some(config) = config.as_object_mut() {
                config.insert(key.to_owned(), value);
            }
        }
    }

    /// # Errors
    /// Returns an error if the config cannot be serialized.
    pub fn to_pretty_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
