pub mod config;
pub use config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig};

/// Re-exported so callers can name configuration errors without depending on `config`
pub use ::config::ConfigError;
