use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub stripe: StripeConfig,
    pub auth: AuthConfig,
    pub slack: SlackConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct StripeConfig {
    pub webhook_secret: SecretString,
    pub signature_tolerance_secs: u64,
}

/// Credentials used inside the process. `server_secret` is the internal
/// credential handed to operations triggered by webhooks; `jwt_secret` signs
/// user tokens presented to the GraphQL endpoint.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub server_secret: SecretString,
    pub jwt_secret: SecretString,
}

#[derive(Clone, Debug)]
pub struct SlackConfig {
    pub api_base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub server_port: Option<u16>,
    pub stripe_webhook_secret: Option<String>,
    pub auth_server_secret: Option<String>,
    pub auth_jwt_secret: Option<String>,
    pub slack_api_base_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://huddle.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3000,
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            stripe: StripeConfig {
                webhook_secret: String::new().into(),
                signature_tolerance_secs: 300,
            },
            auth: AuthConfig { server_secret: String::new().into(), jwt_secret: String::new().into() },
            slack: SlackConfig {
                api_base_url: "https://slack.com/api".to_string(),
                timeout_secs: 10,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("huddle.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(stripe) = patch.stripe {
            if let Some(webhook_secret_value) = stripe.webhook_secret {
                self.stripe.webhook_secret = secret_value(webhook_secret_value);
            }
            if let Some(tolerance) = stripe.signature_tolerance_secs {
                self.stripe.signature_tolerance_secs = tolerance;
            }
        }

        if let Some(auth) = patch.auth {
            if let Some(server_secret_value) = auth.server_secret {
                self.auth.server_secret = secret_value(server_secret_value);
            }
            if let Some(jwt_secret_value) = auth.jwt_secret {
                self.auth.jwt_secret = secret_value(jwt_secret_value);
            }
        }

        if let Some(slack) = patch.slack {
            if let Some(api_base_url) = slack.api_base_url {
                self.slack.api_base_url = api_base_url;
            }
            if let Some(timeout_secs) = slack.timeout_secs {
                self.slack.timeout_secs = timeout_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("HUDDLE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("HUDDLE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("HUDDLE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("HUDDLE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("HUDDLE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("HUDDLE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("HUDDLE_SERVER_PORT") {
            self.server.port = parse_u16("HUDDLE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("HUDDLE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port = parse_u16("HUDDLE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("HUDDLE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("HUDDLE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("HUDDLE_STRIPE_WEBHOOK_SECRET") {
            self.stripe.webhook_secret = secret_value(value);
        }
        if let Some(value) = read_env("HUDDLE_STRIPE_SIGNATURE_TOLERANCE_SECS") {
            self.stripe.signature_tolerance_secs =
                parse_u64("HUDDLE_STRIPE_SIGNATURE_TOLERANCE_SECS", &value)?;
        }

        if let Some(value) = read_env("HUDDLE_AUTH_SERVER_SECRET") {
            self.auth.server_secret = secret_value(value);
        }
        if let Some(value) = read_env("HUDDLE_AUTH_JWT_SECRET") {
            self.auth.jwt_secret = secret_value(value);
        }

        if let Some(value) = read_env("HUDDLE_SLACK_API_BASE_URL") {
            self.slack.api_base_url = value;
        }
        if let Some(value) = read_env("HUDDLE_SLACK_TIMEOUT_SECS") {
            self.slack.timeout_secs = parse_u64("HUDDLE_SLACK_TIMEOUT_SECS", &value)?;
        }

        let log_level = read_env("HUDDLE_LOGGING_LEVEL").or_else(|| read_env("HUDDLE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("HUDDLE_LOGGING_FORMAT").or_else(|| read_env("HUDDLE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
        if let Some(webhook_secret) = overrides.stripe_webhook_secret {
            self.stripe.webhook_secret = secret_value(webhook_secret);
        }
        if let Some(server_secret) = overrides.auth_server_secret {
            self.auth.server_secret = secret_value(server_secret);
        }
        if let Some(jwt_secret) = overrides.auth_jwt_secret {
            self.auth.jwt_secret = secret_value(jwt_secret);
        }
        if let Some(api_base_url) = overrides.slack_api_base_url {
            self.slack.api_base_url = api_base_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_stripe(&self.stripe)?;
        validate_auth(&self.auth)?;
        validate_slack(&self.slack)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("huddle.toml"), PathBuf::from("config/huddle.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.port == server.health_check_port {
        return Err(ConfigError::Validation(
            "server.port and server.health_check_port must differ".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_stripe(stripe: &StripeConfig) -> Result<(), ConfigError> {
    let webhook_secret = stripe.webhook_secret.expose_secret();
    if webhook_secret.is_empty() {
        return Err(ConfigError::Validation(
            "stripe.webhook_secret is required. Get it from https://dashboard.stripe.com/webhooks > Your endpoint > Signing secret".to_string()
        ));
    }
    if !webhook_secret.starts_with("whsec_") {
        let hint = if webhook_secret.starts_with("sk_") || webhook_secret.starts_with("rk_") {
            " (hint: you may have used an API key instead of the endpoint signing secret)"
        } else {
            ""
        };
        return Err(ConfigError::Validation(format!(
            "stripe.webhook_secret must start with `whsec_`{hint}"
        )));
    }

    if stripe.signature_tolerance_secs == 0 || stripe.signature_tolerance_secs > 3600 {
        return Err(ConfigError::Validation(
            "stripe.signature_tolerance_secs must be in range 1..=3600".to_string(),
        ));
    }

    Ok(())
}

fn validate_auth(auth: &AuthConfig) -> Result<(), ConfigError> {
    if auth.server_secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation("auth.server_secret is required".to_string()));
    }
    if auth.jwt_secret.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation("auth.jwt_secret is required".to_string()));
    }
    Ok(())
}

fn validate_slack(slack: &SlackConfig) -> Result<(), ConfigError> {
    if !slack.api_base_url.starts_with("http://") && !slack.api_base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "slack.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    if slack.timeout_secs == 0 || slack.timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "slack.timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    stripe: Option<StripePatch>,
    auth: Option<AuthPatch>,
    slack: Option<SlackPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StripePatch {
    webhook_secret: Option<String>,
    signature_tolerance_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthPatch {
    server_secret: Option<String>,
    jwt_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SlackPatch {
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const SECRET_VARS: &[&str] =
        &["HUDDLE_STRIPE_WEBHOOK_SECRET", "HUDDLE_AUTH_SERVER_SECRET", "HUDDLE_AUTH_JWT_SECRET"];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn set_valid_secrets() {
        env::set_var("HUDDLE_STRIPE_WEBHOOK_SECRET", "whsec_test");
        env::set_var("HUDDLE_AUTH_SERVER_SECRET", "server-secret");
        env::set_var("HUDDLE_AUTH_JWT_SECRET", "jwt-secret");
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_STRIPE_SECRET", "whsec_from_env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("huddle.toml");
            fs::write(
                &path,
                r#"
[stripe]
webhook_secret = "${TEST_STRIPE_SECRET}"

[auth]
server_secret = "file-server-secret"
jwt_secret = "file-jwt-secret"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.stripe.webhook_secret.expose_secret() == "whsec_from_env",
                "webhook secret should be interpolated from environment",
            )?;
            ensure(
                config.auth.server_secret.expose_secret() == "file-server-secret",
                "server secret should be loaded from file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_STRIPE_SECRET"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_valid_secrets();
        env::set_var("HUDDLE_LOG_LEVEL", "warn");
        env::set_var("HUDDLE_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "pretty logging format should be set from env var",
            )?;
            Ok(())
        })();

        clear_vars(SECRET_VARS);
        clear_vars(&["HUDDLE_LOG_LEVEL", "HUDDLE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("HUDDLE_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("HUDDLE_STRIPE_WEBHOOK_SECRET", "whsec_from_env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("huddle.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[stripe]
webhook_secret = "whsec_from_file"
signature_tolerance_secs = 120

[auth]
server_secret = "file-server-secret"
jwt_secret = "file-jwt-secret"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.stripe.webhook_secret.expose_secret() == "whsec_from_env",
                "env webhook secret should win over file and defaults",
            )?;
            ensure(
                config.stripe.signature_tolerance_secs == 120,
                "file tolerance should win over default",
            )?;
            Ok(())
        })();

        clear_vars(&["HUDDLE_DATABASE_URL", "HUDDLE_STRIPE_WEBHOOK_SECRET"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_valid_secrets();
        env::set_var("HUDDLE_STRIPE_WEBHOOK_SECRET", "sk_live_wrong");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message)
                    if message.contains("stripe.webhook_secret") && message.contains("hint")
            );
            ensure(has_message, "validation failure should mention stripe.webhook_secret")
        })();

        clear_vars(SECRET_VARS);
        result
    }

    #[test]
    fn missing_internal_credential_is_rejected() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        set_valid_secrets();
        env::remove_var("HUDDLE_AUTH_SERVER_SECRET");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected missing server secret to fail validation".to_string()),
            Err(ConfigError::Validation(message)) => {
                ensure(message.contains("auth.server_secret"), "error should name the field")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(SECRET_VARS);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("HUDDLE_STRIPE_WEBHOOK_SECRET", "whsec_secret_value");
        env::set_var("HUDDLE_AUTH_SERVER_SECRET", "server-secret-value");
        env::set_var("HUDDLE_AUTH_JWT_SECRET", "jwt-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("whsec_secret_value"),
                "debug output should not contain webhook secret",
            )?;
            ensure(
                !debug.contains("server-secret-value"),
                "debug output should not contain server secret",
            )?;
            ensure(!debug.contains("jwt-secret-value"), "debug output should not contain jwt secret")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(SECRET_VARS);
        result
    }
}
