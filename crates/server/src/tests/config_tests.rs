use super::{settings_from, Settings};

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = settings_from(None, env_from(&[]));
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.session_cookie, "todo_session");
    settings.bind_addr().expect("default bind addr parses");
}

#[test]
fn file_values_override_defaults() {
    let raw = r#"
        bind_addr = "0.0.0.0:8080"
        session_ttl_seconds = 600
        max_body_bytes = 2048
    "#;
    let settings = settings_from(Some(raw), env_from(&[]));
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.session_ttl_seconds, 600);
    assert_eq!(settings.max_body_bytes, 2048);
    assert_eq!(settings.sweep_interval_seconds, 300);
}

#[test]
fn file_accepts_string_numbers() {
    let raw = r#"
        bind_addr = "0.0.0.0:8080"
        session_ttl_seconds = "600"
    "#;
    let settings = settings_from(Some(raw), env_from(&[]));
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.session_ttl_seconds, 600);
}

#[test]
fn bad_file_number_keeps_other_file_values() {
    let raw = r#"
        bind_addr = "0.0.0.0:8080"
        max_body_bytes = -5
        sweep_interval_seconds = "often"
        session_cookie = "sid"
    "#;
    let settings = settings_from(Some(raw), env_from(&[]));
    assert_eq!(settings.server_bind, "0.0.0.0:8080");
    assert_eq!(settings.session_cookie, "sid");
    assert_eq!(settings.max_body_bytes, Settings::default().max_body_bytes);
    assert_eq!(
        settings.sweep_interval_seconds,
        Settings::default().sweep_interval_seconds
    );
}

#[test]
fn env_overrides_file() {
    let raw = r#"bind_addr = "0.0.0.0:8080""#;
    let settings = settings_from(
        Some(raw),
        env_from(&[
            ("SERVER_BIND", "127.0.0.1:9000"),
            ("APP__SESSION_TTL_SECONDS", "120"),
        ]),
    );
    assert_eq!(settings.server_bind, "127.0.0.1:9000");
    assert_eq!(settings.session_ttl_seconds, 120);
}

#[test]
fn app_prefixed_bind_wins_over_legacy_name() {
    let settings = settings_from(
        None,
        env_from(&[
            ("SERVER_BIND", "127.0.0.1:9000"),
            ("APP__BIND_ADDR", "127.0.0.1:9001"),
        ]),
    );
    assert_eq!(settings.server_bind, "127.0.0.1:9001");
}

#[test]
fn unparseable_numbers_keep_defaults() {
    let settings = settings_from(
        None,
        env_from(&[
            ("APP__SESSION_TTL_SECONDS", "soon"),
            ("APP__MAX_BODY_BYTES", "-1"),
        ]),
    );
    assert_eq!(settings.session_ttl_seconds, Settings::default().session_ttl_seconds);
    assert_eq!(settings.max_body_bytes, Settings::default().max_body_bytes);
}

#[test]
fn malformed_file_is_ignored() {
    let settings = settings_from(Some("bind_addr = ["), env_from(&[]));
    assert_eq!(settings, Settings::default());
}

#[test]
fn invalid_cookie_name_is_rejected() {
    let settings = settings_from(None, env_from(&[("APP__SESSION_COOKIE", "bad name;")]));
    assert_eq!(settings.session_cookie, "todo_session");

    let settings = settings_from(None, env_from(&[("APP__SESSION_COOKIE", "sid")]));
    assert_eq!(settings.session_cookie, "sid");
}

#[test]
fn bad_bind_address_reports_error() {
    let settings = settings_from(None, env_from(&[("APP__BIND_ADDR", "not-an-addr")]));
    let err = settings.bind_addr().expect_err("should fail");
    assert!(err.to_string().contains("not-an-addr"));
}
