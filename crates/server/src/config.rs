use std::{collections::HashMap, fs, net::SocketAddr, str::FromStr};

use anyhow::Context;
use tracing::warn;

const CONFIG_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub session_cookie: String,
    pub session_ttl_seconds: i64,
    pub sweep_interval_seconds: u64,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:4567".into(),
            session_cookie: "todo_session".into(),
            session_ttl_seconds: storage::DEFAULT_TTL_SECONDS,
            sweep_interval_seconds: 300,
            max_body_bytes: 16 * 1024,
        }
    }
}

impl Settings {
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.server_bind
            .parse()
            .with_context(|| format!("invalid bind address '{}'", self.server_bind))
    }
}

pub fn load_settings() -> Settings {
    let raw = fs::read_to_string(CONFIG_FILE).ok();
    settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then `server.toml`, then environment; later sources win.
pub(crate) fn settings_from(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(error) => warn!(%error, file = CONFIG_FILE, "ignoring unreadable config file"),
        }
    }

    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("APP__SESSION_COOKIE") {
        set_cookie_name(&mut settings, v);
    }

    if let Some(parsed) = env("APP__SESSION_TTL_SECONDS").and_then(|v| v.trim().parse().ok()) {
        settings.session_ttl_seconds = parsed;
    }
    if let Some(parsed) = env("APP__SWEEP_INTERVAL_SECONDS").and_then(|v| v.trim().parse().ok()) {
        settings.sweep_interval_seconds = parsed;
    }
    if let Some(parsed) = env("APP__MAX_BODY_BYTES").and_then(|v| v.trim().parse().ok()) {
        settings.max_body_bytes = parsed;
    }

    settings
}

/// Each key is applied on its own; a bad value only loses that key.
fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_string(file_cfg, "bind_addr") {
        settings.server_bind = v;
    }
    if let Some(v) = file_string(file_cfg, "session_cookie") {
        set_cookie_name(settings, v);
    }
    if let Some(parsed) = file_number(file_cfg, "session_ttl_seconds") {
        settings.session_ttl_seconds = parsed;
    }
    if let Some(parsed) = file_number(file_cfg, "sweep_interval_seconds") {
        settings.sweep_interval_seconds = parsed;
    }
    if let Some(parsed) = file_number(file_cfg, "max_body_bytes") {
        settings.max_body_bytes = parsed;
    }
}

/// Keys are flat strings, but bare numbers are accepted too.
fn file_string(file_cfg: &HashMap<String, toml::Value>, key: &str) -> Option<String> {
    file_cfg.get(key).map(|value| match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

fn file_number<T: FromStr>(file_cfg: &HashMap<String, toml::Value>, key: &str) -> Option<T> {
    let raw = file_string(file_cfg, key)?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        warn!(key, value = %raw, file = CONFIG_FILE, "ignoring unparseable config value");
    }
    parsed
}

fn set_cookie_name(settings: &mut Settings, raw: String) {
    let name = raw.trim();
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        settings.session_cookie = name.to_string();
    } else {
        warn!(cookie = %raw, "ignoring invalid session cookie name");
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
