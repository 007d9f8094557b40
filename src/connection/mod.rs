//! Connection configuration
//!
//! This module handles:
//! * Per-instance connection settings and their duplication across hosts
//! * DSN rendering for the SQL driver
//! * TLS policies and the name-keyed registry DSNs refer to

mod config;
mod dsn;
mod registry;
mod tls;

pub use config::{ConnectionConfig, ConnectionConfigBuilder};
pub use dsn::{redact_dsn, DsnInfo};
pub use registry::TlsRegistry;
pub use tls::{server_name, TlsOptions, TlsPolicy, TlsPolicyBuilder, TLS_CONFIG_KEY};
