use config::{Config, ConfigError, Environment, File, Map, Source};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Token lifetime: plain seconds, or an amount with a unit such as `30m`, `1.5h` or `2 days`
    #[serde(default = "default_token_expiry")]
    pub token_expiry: String,
    /// Administrator created at startup when the admin table is empty
    pub seed_admin_name: Option<String>,
    pub seed_admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Built single-page UI to serve for non-API paths
    pub static_dir: Option<PathBuf>,
    /// Only origin allowed by CORS; any origin when unset
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            cors_origin: None,
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_token_expiry() -> String {
    "1h".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

const ENV_PREFIX: &str = "PROXLIB";

/// Variables the service has always been deployed with, and the keys they set
const DEPLOYMENT_ENV: [(&str, &str); 4] = [
    ("DATABASE_URL", "database.url"),
    ("JWT_SECRET", "auth.jwt_secret"),
    ("JWT_EXPIRES_IN", "auth.token_expiry"),
    ("PORT", "server.port"),
];

impl AppConfig {
    /// Load configuration with environment variable overrides
    ///
    /// Sources, lowest to highest priority:
    /// 1. `path`, or `proxlib.toml` in the current directory if present
    /// 2. Variables prefixed with PROXLIB_, `__` between levels
    ///    (PROXLIB_DATABASE__URL, PROXLIB_AUTH__JWT_SECRET)
    /// 3. DATABASE_URL, JWT_SECRET, JWT_EXPIRES_IN and PORT
    ///
    /// Returns the config and the keys set by deployment variables
    pub fn load_with_env(path: Option<&Path>) -> Result<(Self, Vec<String>), ConfigError> {
        let env: Map<String, String> = std::env::vars().collect();

        match path {
            Some(path) => Self::build(File::from(path), env),
            None => Self::build(File::with_name("proxlib").required(false), env),
        }
    }

    fn build<S>(file: S, env: Map<String, String>) -> Result<(Self, Vec<String>), ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let mut builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .source(Some(env.clone())),
        );

        let mut overrides = Vec::new();
        for (env_var, config_key) in DEPLOYMENT_ENV {
            if let Some(value) = env.get(env_var) {
                builder = builder.set_override(config_key, value.clone())?;
                overrides.push(config_key.to_string());
            }
        }

        let app_config: Self = builder.build()?.try_deserialize()?;
        app_config.validate()?;

        Ok((app_config, overrides))
    }

    /// Reject configurations the server cannot start with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Message("database.url must not be empty".to_string()));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Message("auth.jwt_secret must not be empty".to_string()));
        }
        if self.auth.seed_admin_name.is_some() != self.auth.seed_admin_password.is_some() {
            return Err(ConfigError::Message(
                "auth.seed_admin_name and auth.seed_admin_password must be set together".to_string(),
            ));
        }
        self.token_expiry_seconds()?;
        Ok(())
    }

    pub fn token_expiry_seconds(&self) -> Result<i64, ConfigError> {
        parse_expiry(&self.auth.token_expiry)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Longest token lifetime accepted, roughly one hundred years
pub const MAX_TOKEN_EXPIRY_SECONDS: i64 = 100 * 31_557_600;

/// Parse a token lifetime into whole seconds.
///
/// Accepts plain seconds (`3600`) or an amount followed by a unit, short or
/// spelled out, with optional whitespace: `45s`, `30m`, `1.5h`, `2 days`,
/// `1y`. Years are 365.25 days. The result must be between one second and
/// [`MAX_TOKEN_EXPIRY_SECONDS`].
pub fn parse_expiry(value: &str) -> Result<i64, ConfigError> {
    let invalid = || ConfigError::Message(format!("invalid token expiry '{value}'"));

    let value = value.trim();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (amount, unit) = value.split_at(split);

    let amount: f64 = amount.parse().map_err(|_| invalid())?;
    let per_unit = unit_millis(&unit.trim().to_ascii_lowercase()).ok_or_else(invalid)?;

    let seconds = (amount * per_unit / 1_000.0).floor();
    if !seconds.is_finite() || seconds < 1.0 || seconds > MAX_TOKEN_EXPIRY_SECONDS as f64 {
        return Err(invalid());
    }
    Ok(seconds as i64)
}

fn unit_millis(unit: &str) -> Option<f64> {
    let millis = match unit {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1_000.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
        "d" | "day" | "days" => 86_400_000.0,
        "w" | "week" | "weeks" => 604_800_000.0,
        "y" | "yr" | "yrs" | "year" | "years" => 31_557_600_000.0,
        _ => return None,
    };
    Some(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const MINIMAL: &str = r#"
        [database]
        url = "postgres://localhost/proxlib"

        [auth]
        jwt_secret = "file_secret"
    "#;

    fn build(toml: &str, env: &[(&str, &str)]) -> Result<(AppConfig, Vec<String>), ConfigError> {
        let env = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::build(File::from_str(toml, FileFormat::Toml), env)
    }

    #[test]
    fn test_default_values() {
        assert_eq!(default_token_expiry(), "1h");
        assert_eq!(default_host(), "0.0.0.0");
        assert_eq!(default_port(), 3000);
        assert_eq!(default_max_connections(), 5);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let (config, overrides) = build(MINIMAL, &[]).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.token_expiry_seconds().unwrap(), 3600);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(config.server.static_dir.is_none());
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_deployment_variables_override_file() {
        let (config, overrides) = build(
            MINIMAL,
            &[
                ("DATABASE_URL", "postgres://db/prod"),
                ("JWT_SECRET", "env_secret"),
                ("JWT_EXPIRES_IN", "7d"),
                ("PORT", "8080"),
            ],
        )
        .unwrap();

        assert_eq!(config.database.url, "postgres://db/prod");
        assert_eq!(config.auth.jwt_secret, "env_secret");
        assert_eq!(config.token_expiry_seconds().unwrap(), 7 * 24 * 3600);
        assert_eq!(config.server.port, 8080);
        assert_eq!(overrides.len(), 4);
    }

    #[test]
    fn test_prefixed_variables() {
        let (config, _) = build(
            MINIMAL,
            &[
                ("PROXLIB_AUTH__JWT_SECRET", "prefixed_secret"),
                ("PROXLIB_SERVER__CORS_ORIGIN", "https://geolib.onrender.com"),
            ],
        )
        .unwrap();

        assert_eq!(config.auth.jwt_secret, "prefixed_secret");
        assert_eq!(config.server.cors_origin.as_deref(), Some("https://geolib.onrender.com"));
    }

    #[test]
    fn test_environment_only() {
        let (config, _) = build(
            "",
            &[("DATABASE_URL", "postgres://db/env"), ("JWT_SECRET", "s")],
        )
        .unwrap();

        assert_eq!(config.database.url, "postgres://db/env");
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let toml = r#"
            [database]
            url = "postgres://localhost/proxlib"

            [auth]
            jwt_secret = ""
        "#;
        assert!(build(toml, &[]).is_err());
        assert!(build("[database]\nurl = \"postgres://x\"", &[]).is_err());
    }

    #[test]
    fn test_seed_admin_requires_both_fields() {
        let toml = format!("{MINIMAL}\nseed_admin_name = \"root\"\n");
        assert!(build(&toml, &[]).is_err());

        let toml = format!("{MINIMAL}\nseed_admin_name = \"root\"\nseed_admin_password = \"pw\"\n");
        let (config, _) = build(&toml, &[]).unwrap();
        assert_eq!(config.auth.seed_admin_name.as_deref(), Some("root"));
    }

    #[test]
    fn test_parse_expiry() {
        assert_eq!(parse_expiry("3600").unwrap(), 3600);
        assert_eq!(parse_expiry("45s").unwrap(), 45);
        assert_eq!(parse_expiry("30m").unwrap(), 1800);
        assert_eq!(parse_expiry("12h").unwrap(), 43_200);
        assert_eq!(parse_expiry("7d").unwrap(), 604_800);
        assert_eq!(parse_expiry("2w").unwrap(), 1_209_600);
        assert_eq!(parse_expiry(" 1h ").unwrap(), 3600);
    }

    #[test]
    fn test_parse_expiry_long_forms() {
        assert_eq!(parse_expiry("1y").unwrap(), 31_557_600);
        assert_eq!(parse_expiry("2 days").unwrap(), 172_800);
        assert_eq!(parse_expiry("1.5h").unwrap(), 5_400);
        assert_eq!(parse_expiry("10 Minutes").unwrap(), 600);
        assert_eq!(parse_expiry("90000ms").unwrap(), 90);
        assert_eq!(parse_expiry("100y").unwrap(), MAX_TOKEN_EXPIRY_SECONDS);
    }

    #[test]
    fn test_parse_expiry_rejects_garbage() {
        for value in ["", "h", "0", "-5", "1.2.3h", "500ms", "10 fortnights", "101y", "10000000000000", "99999999999999999999"] {
            assert!(parse_expiry(value).is_err(), "{value} should be rejected");
        }
    }

    #[test]
    fn test_oversized_expiry_rejected_at_load() {
        assert!(build(MINIMAL, &[("JWT_EXPIRES_IN", "10000000000000")]).is_err());
    }
}
