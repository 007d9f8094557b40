//! Integration tests for ghost-mysql
//!
//! Exercise the public API the way a migration tool does: one credential set,
//! duplicated per target instance, rendered to DSNs.

use ghost_mysql::connection::{redact_dsn, TLS_CONFIG_KEY};
use ghost_mysql::{ConnectionConfig, DsnInfo, InstanceKey, TlsPolicy, TlsRegistry};
use std::sync::Arc;

const TRANSACTION_ISOLATION: &str = "REPEATABLE-READ";

fn credentials() -> ConnectionConfig {
    ConnectionConfig::builder()
        .key(InstanceKey::new("myhost", 3306))
        .user("gromit")
        .password("penguin")
        .transaction_isolation(TRANSACTION_ISOLATION)
        .charset("utf8mb4,utf8,latin1")
        .timeout(1.2345)
        .build()
}

#[test]
fn test_dsn_without_tls() {
    let config = credentials();
    assert_eq!(
        config.db_uri("test"),
        r#"gromit:penguin@tcp(myhost:3306)/test?autocommit=true&interpolateParams=true&charset=utf8mb4,utf8,latin1&tls=false&transaction_isolation="REPEATABLE-READ"&timeout=1.234500s&readTimeout=1.234500s&writeTimeout=1.234500s"#
    );
}

#[test]
fn test_dsn_with_tls_and_wait_timeout() {
    let registry = TlsRegistry::new();
    let policy = Arc::new(TlsPolicy::builder().allow_insecure(true).build().expect("tls"));

    let mut config = credentials();
    config.wait_timeout = 60.0;
    config.set_tls_policy(Some(policy));
    config.register_tls_policy(&registry).expect("register");

    assert_eq!(
        config.db_uri("test"),
        r#"gromit:penguin@tcp(myhost:3306)/test?autocommit=true&interpolateParams=true&charset=utf8mb4,utf8,latin1&tls=ghost&transaction_isolation="REPEATABLE-READ"&timeout=1.234500s&readTimeout=1.234500s&writeTimeout=1.234500s&wait_timeout=60.000000s"#
    );
    assert!(registry.contains(TLS_CONFIG_KEY));
}

#[test]
fn test_primary_and_replicas_share_credentials() {
    let registry = TlsRegistry::new();
    let mut primary = credentials();
    primary.set_tls_policy(Some(Arc::new(
        TlsPolicy::builder().allow_insecure(true).build().expect("tls"),
    )));
    primary.register_tls_policy(&registry).expect("register");

    let replicas: Vec<ConnectionConfig> = [("replica1", 3307), ("replica2", 3308)]
        .into_iter()
        .map(|(host, port)| primary.duplicate_credentials(InstanceKey::new(host, port)))
        .collect();

    for replica in &replicas {
        assert_eq!(&replica.key, replica.implied_key());
        assert_eq!(replica.user, primary.user);
        assert_eq!(replica.password, primary.password);
        assert!(Arc::ptr_eq(
            replica.tls_policy().unwrap(),
            primary.tls_policy().unwrap()
        ));

        let info = DsnInfo::parse(&replica.db_uri("test")).expect("parse");
        assert_eq!(info.key, replica.key);
        assert_eq!(info.tls_name(), Some(TLS_CONFIG_KEY));
        assert!(registry.get(TLS_CONFIG_KEY).is_some());
    }
}

#[test]
fn test_duplicate_is_unaffected_by_source_mutation() {
    let mut config = credentials();
    let dup = config.duplicate();

    config.password = "changed".into();
    config.wait_timeout = 30.0;

    assert_eq!(dup.password, "penguin");
    assert!(!dup.db_uri("test").contains("wait_timeout"));
}

#[test]
fn test_parse_instance_key_then_render() {
    let key: InstanceKey = "[2001:db8::1]:3310".parse().expect("parse key");
    let config = credentials().duplicate_credentials(key);
    assert!(config
        .db_uri("test")
        .starts_with("gromit:penguin@tcp([2001:db8::1]:3310)/test?"));
}

#[test]
fn test_redacted_dsn_for_logging() {
    let config = credentials();
    let redacted = redact_dsn(&config.db_uri("test"));
    assert!(!redacted.contains("penguin"));
    assert!(redacted.starts_with("gromit:****@"));
    assert!(!config.to_string().contains("penguin"));
}
