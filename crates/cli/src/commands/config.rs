use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use huddle_core::config::{AppConfig, LoadOptions};
use secrecy::{ExposeSecret, SecretString};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let fields: Vec<(&str, &str, String)> = vec![
        ("database.url", "HUDDLE_DATABASE_URL", config.database.url.clone()),
        (
            "database.max_connections",
            "HUDDLE_DATABASE_MAX_CONNECTIONS",
            config.database.max_connections.to_string(),
        ),
        (
            "database.timeout_secs",
            "HUDDLE_DATABASE_TIMEOUT_SECS",
            config.database.timeout_secs.to_string(),
        ),
        ("server.bind_address", "HUDDLE_SERVER_BIND_ADDRESS", config.server.bind_address.clone()),
        ("server.port", "HUDDLE_SERVER_PORT", config.server.port.to_string()),
        (
            "server.health_check_port",
            "HUDDLE_SERVER_HEALTH_CHECK_PORT",
            config.server.health_check_port.to_string(),
        ),
        (
            "server.graceful_shutdown_secs",
            "HUDDLE_SERVER_GRACEFUL_SHUTDOWN_SECS",
            config.server.graceful_shutdown_secs.to_string(),
        ),
        (
            "stripe.webhook_secret",
            "HUDDLE_STRIPE_WEBHOOK_SECRET",
            redact_prefixed(&config.stripe.webhook_secret),
        ),
        (
            "stripe.signature_tolerance_secs",
            "HUDDLE_STRIPE_SIGNATURE_TOLERANCE_SECS",
            config.stripe.signature_tolerance_secs.to_string(),
        ),
        ("auth.server_secret", "HUDDLE_AUTH_SERVER_SECRET", redact(&config.auth.server_secret)),
        ("auth.jwt_secret", "HUDDLE_AUTH_JWT_SECRET", redact(&config.auth.jwt_secret)),
        ("slack.api_base_url", "HUDDLE_SLACK_API_BASE_URL", config.slack.api_base_url.clone()),
        ("slack.timeout_secs", "HUDDLE_SLACK_TIMEOUT_SECS", config.slack.timeout_secs.to_string()),
        ("logging.level", "HUDDLE_LOGGING_LEVEL", config.logging.level.clone()),
        ("logging.format", "HUDDLE_LOGGING_FORMAT", format!("{:?}", config.logging.format)),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(
        fields
            .into_iter()
            .map(|(key, env_key, value)| render_line(key, &value, source(key, env_key))),
    );
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    ["huddle.toml", "config/huddle.toml"].into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a Stripe-style prefix (`whsec_`) visible so the key type can be checked.
fn redact_prefixed(secret: &SecretString) -> String {
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('_') {
        return format!("{prefix}_***");
    }

    "<redacted>".to_string()
}

fn redact(secret: &SecretString) -> String {
    if secret.expose_secret().trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
