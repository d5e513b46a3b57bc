use super::*;

// Unique env var names avoid races with parallel tests.

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

#[test]
fn env_bool_unset_returns_none() {
    assert_eq!(env_bool("__TEST_STOREFRONT_SURELY_UNSET_42__"), None);
}

#[test]
fn env_parse_falls_back_on_garbage() {
    let key = "__TEST_STOREFRONT_PORT_771__";
    unsafe { std::env::set_var(key, "not-a-port") };
    assert_eq!(env_parse(key, 3000_u16), 3000);
    unsafe { std::env::set_var(key, " 8080 ") };
    assert_eq!(env_parse(key, 3000_u16), 8080);
    unsafe { std::env::remove_var(key) };
}

#[test]
fn test_config_mounts_mock_without_database() {
    let config = ServerConfig::for_tests();
    assert!(config.database_url.is_none());
    assert!(config.mock_api);
    assert_eq!(config.session_ttl, Duration::from_secs(168 * 3600));
}
