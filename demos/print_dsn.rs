//! Print the DSNs a migration would open for a primary and its replicas.
//!
//! Settings come from the environment:
//! - `MYSQL_HOST`, `MYSQL_PORT` (default 3306), `MYSQL_USER`, `MYSQL_PASSWORD`
//! - `MYSQL_REPLICAS`: comma-separated `host[:port]` list
//! - `MYSQL_TLS_CA`: CA PEM file; enables TLS
//! - `MYSQL_TLS_INSECURE=true`: enables TLS without certificate verification
//!
//! Run with: RUST_LOG=debug cargo run --example print_dsn

use ghost_mysql::{ConnectionConfig, InstanceKey, TlsOptions, TlsRegistry};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> ghost_mysql::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let port = env::var("MYSQL_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3306);
    let host = env::var("MYSQL_HOST").unwrap_or_else(|_| "localhost".to_string());

    let mut primary = ConnectionConfig::builder()
        .key(InstanceKey::new(host, port))
        .user(env::var("MYSQL_USER").unwrap_or_else(|_| "root".to_string()))
        .password(env::var("MYSQL_PASSWORD").unwrap_or_default())
        .charset("utf8mb4,utf8,latin1")
        .transaction_isolation("REPEATABLE-READ")
        .timeout(10.0)
        .build();

    let ca_cert_path = env::var("MYSQL_TLS_CA").ok().map(PathBuf::from);
    let allow_insecure = env::var("MYSQL_TLS_INSECURE")
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let registry = TlsRegistry::new();
    if ca_cert_path.is_some() || allow_insecure {
        primary.use_tls(
            &registry,
            TlsOptions {
                ca_cert_path,
                allow_insecure,
                ..TlsOptions::default()
            },
        )?;
    }

    println!("{}", primary);
    println!("  {}", primary.redacted_db_uri("information_schema"));

    let replicas = env::var("MYSQL_REPLICAS").unwrap_or_default();
    for host_port in replicas.split(',').filter(|s| !s.trim().is_empty()) {
        let key = InstanceKey::parse_with_default_port(host_port.trim(), port)?;
        let replica = primary.duplicate_credentials(key);
        println!("{}", replica);
        println!("  {}", replica.redacted_db_uri("information_schema"));
    }

    Ok(())
}
