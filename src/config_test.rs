use std::collections::HashMap;

use super::*;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    move |key| map.get(key).cloned()
}

// =============================================================================
// parse_bool
// =============================================================================

#[test]
fn parse_bool_true_variants() {
    for val in ["1", "true", "yes", "on", "TRUE", " On "] {
        assert_eq!(parse_bool(val), Some(true), "expected true for {val:?}");
    }
}

#[test]
fn parse_bool_false_variants() {
    for val in ["0", "false", "no", "off", "False"] {
        assert_eq!(parse_bool(val), Some(false), "expected false for {val:?}");
    }
}

#[test]
fn parse_bool_invalid_returns_none() {
    assert_eq!(parse_bool("maybe"), None);
    assert_eq!(parse_bool(""), None);
}

// =============================================================================
// AppConfig::from_lookup
// =============================================================================

#[test]
fn defaults_when_nothing_set() {
    let config = AppConfig::from_lookup(|_| None).unwrap();
    assert!(config.database_url.is_none());
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.db_max_connections, DEFAULT_DB_MAX_CONNECTIONS);
    assert_eq!(config.session_ttl, Duration::from_secs(168 * 3600));
    assert_eq!(config.auth_token_ttl, Duration::from_secs(15 * 60));
    assert_eq!(config.toast.limit, DEFAULT_TOAST_LIMIT);
    assert_eq!(config.toast.duration, Duration::from_secs(5));
    assert!(!config.cookie_secure);
    assert_eq!(config.static_dir, PathBuf::from(DEFAULT_STATIC_DIR));
}

#[test]
fn blank_database_url_is_treated_as_unset() {
    let config = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "  ")])).unwrap();
    assert!(config.database_url.is_none());
}

#[test]
fn overrides_are_applied() {
    let config = AppConfig::from_lookup(lookup_from(&[
        ("DATABASE_URL", "postgres://localhost/washhub"),
        ("PORT", "8080"),
        ("SESSION_TTL_HOURS", "1"),
        ("TOAST_LIMIT", "5"),
        ("STATIC_DIR", "/srv/www"),
    ]))
    .unwrap();
    assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/washhub"));
    assert_eq!(config.port, 8080);
    assert_eq!(config.session_ttl, Duration::from_secs(3600));
    assert_eq!(config.toast.limit, 5);
    assert_eq!(config.static_dir, PathBuf::from("/srv/www"));
}

#[test]
fn toast_limit_zero_is_clamped_to_one() {
    let config = AppConfig::from_lookup(lookup_from(&[("TOAST_LIMIT", "0")])).unwrap();
    assert_eq!(config.toast.limit, 1);
}

#[test]
fn malformed_port_is_rejected() {
    let err = AppConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
    assert_eq!(err, ConfigError::Invalid { key: "PORT", value: "eighty".into() });
}

#[test]
fn malformed_public_url_is_rejected() {
    let err = AppConfig::from_lookup(lookup_from(&[("PUBLIC_URL", "not a url")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "PUBLIC_URL", .. }));
}

#[test]
fn cookie_secure_inferred_from_https_public_url() {
    let config = AppConfig::from_lookup(lookup_from(&[("PUBLIC_URL", "https://app.washhub.io")])).unwrap();
    assert!(config.cookie_secure);
}

#[test]
fn cookie_secure_explicit_value_wins() {
    let config = AppConfig::from_lookup(lookup_from(&[
        ("PUBLIC_URL", "https://app.washhub.io"),
        ("COOKIE_SECURE", "off"),
    ]))
    .unwrap();
    assert!(!config.cookie_secure);
}

#[test]
fn cookie_secure_garbage_is_rejected() {
    let err = AppConfig::from_lookup(lookup_from(&[("COOKIE_SECURE", "sometimes")])).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "COOKIE_SECURE", .. }));
}

#[test]
fn link_joins_onto_public_url() {
    let config = AppConfig::from_lookup(lookup_from(&[("PUBLIC_URL", "https://app.washhub.io")])).unwrap();
    assert_eq!(
        config.link("/auth/phone/callback?token=abc"),
        "https://app.washhub.io/auth/phone/callback?token=abc"
    );
}

#[test]
fn ttl_overflowing_seconds_is_rejected() {
    let max = u64::MAX.to_string();

    let err = AppConfig::from_lookup(lookup_from(&[("SESSION_TTL_HOURS", &max)])).unwrap_err();
    assert_eq!(err, ConfigError::Invalid { key: "SESSION_TTL_HOURS", value: max.clone() });

    let err = AppConfig::from_lookup(lookup_from(&[("AUTH_TOKEN_TTL_MINUTES", &max)])).unwrap_err();
    assert_eq!(err, ConfigError::Invalid { key: "AUTH_TOKEN_TTL_MINUTES", value: max });
}

#[test]
fn largest_representable_ttl_is_accepted() {
    let hours = (u64::MAX / 3600).to_string();
    let config = AppConfig::from_lookup(lookup_from(&[("SESSION_TTL_HOURS", &hours)])).unwrap();
    assert_eq!(config.session_ttl, Duration::from_secs(u64::MAX / 3600 * 3600));
}
