//! Bootstrap library for Stockroom binaries
//!
//! - [`config`]: layered application configuration (defaults, YAML, env, CLI)
//! - [`logging`]: global `tracing` subscriber initialization
//! - [`signals`]: graceful shutdown on Ctrl+C / SIGTERM

pub mod config;
pub mod logging;
pub mod signals;

pub use config::{AppConfig, CliArgs, ConfigError, ENV_PREFIX, LogFormat, LoggingConfig, ServerConfig};
pub use logging::{LoggingError, init_logging};
pub use signals::{shutdown_signal, wait_for_shutdown};
