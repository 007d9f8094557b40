//! MySQL connection configuration and DSN builder.
//!
//! `ghost-mysql` holds the identity of a target MySQL instance, the credentials and
//! session settings used to reach it, and an optional TLS policy, and renders that
//! state into a go-sql-driver style DSN.
//!
//! One [`ConnectionConfig`] is typically built per credential set and duplicated
//! per target host (a primary and its replicas). TLS policies are never embedded in
//! a DSN: they are registered by name in a [`TlsRegistry`] and the DSN carries only
//! that name.
//!
//! ```ignore
//! use ghost_mysql::{ConnectionConfig, InstanceKey, TlsOptions, TlsRegistry};
//!
//! let registry = TlsRegistry::new();
//! let mut config = ConnectionConfig::builder()
//!     .key(InstanceKey::new("primary.db", 3306))
//!     .user("gromit")
//!     .password("penguin")
//!     .charset("utf8mb4,utf8,latin1")
//!     .transaction_isolation("REPEATABLE-READ")
//!     .timeout(10.0)
//!     .build();
//! config.use_tls(&registry, TlsOptions::default())?;
//!
//! let replica = config.duplicate_credentials(InstanceKey::new("replica1.db", 3306));
//! let dsn = replica.db_uri("shop");
//! ```

#![warn(missing_docs)]

pub mod connection;
pub mod error;
pub mod instance;
pub mod metrics;

pub use connection::{ConnectionConfig, DsnInfo, TlsOptions, TlsPolicy, TlsRegistry};
pub use error::{Error, Result};
pub use instance::InstanceKey;
