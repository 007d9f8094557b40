//! MySQL DSN rendering and inspection
//!
//! DSN format (go-sql-driver/mysql):
//! * user:password@tcp(host:port)/database?param=value&...
//!
//! TLS policies appear only by registered name (`tls=ghost`) or as `tls=false`.

use super::config::ConnectionConfig;
use super::registry::TlsRegistry;
use super::tls::TLS_CONFIG_KEY;
use crate::instance::InstanceKey;
use crate::{Error, Result};
use std::fmt::Write;

/// Value of the `tls` parameter when no policy is set
const TLS_DISABLED: &str = "false";

/// Password placeholder used by [`redact_dsn`]
const REDACTED: &str = "****";

impl ConnectionConfig {
    /// Render the DSN for `database`.
    ///
    /// Parameters always appear in this order:
    /// `autocommit`, `interpolateParams`, `charset`, `tls`, `transaction_isolation`,
    /// `timeout`, `readTimeout`, `writeTimeout`, then `wait_timeout` only when
    /// `wait_timeout` is nonzero. Timeouts are seconds with six decimals.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let uri = config.db_uri("test");
    /// // gromit:penguin@tcp(myhost:3306)/test?autocommit=true&interpolateParams=true&...
    /// ```
    pub fn db_uri(&self, database: &str) -> String {
        let tls = if self.uses_tls() {
            TLS_CONFIG_KEY
        } else {
            TLS_DISABLED
        };

        let mut uri = format!(
            "{}:{}@tcp({})/{}?autocommit=true&interpolateParams=true&charset={}&tls={}&transaction_isolation=\"{}\"&timeout={:.6}s&readTimeout={:.6}s&writeTimeout={:.6}s",
            self.user,
            self.password,
            tcp_address(&self.key),
            database,
            self.charset,
            tls,
            self.transaction_isolation,
            self.timeout,
            self.timeout,
            self.timeout,
        );

        if self.wait_timeout != 0.0 {
            // Writing to a String cannot fail
            let _ = write!(uri, "&wait_timeout={:.6}s", self.wait_timeout);
        }
        uri
    }

    /// [`db_uri`](Self::db_uri) with the password masked, for logs
    pub fn redacted_db_uri(&self, database: &str) -> String {
        redact_dsn(&self.db_uri(database))
    }
}

/// `host:port`, with IPv6 literals bracketed
fn tcp_address(key: &InstanceKey) -> String {
    if key.is_ipv6() {
        format!("[{}]:{}", key.hostname, key.port)
    } else {
        key.to_string()
    }
}

/// Mask the password of a DSN. Strings that are not DSNs are returned unchanged.
pub fn redact_dsn(dsn: &str) -> String {
    let Some(at) = dsn.rfind("@tcp(") else {
        return dsn.to_string();
    };
    match dsn[..at].find(':') {
        Some(colon) => format!("{}:{}{}", &dsn[..colon], REDACTED, &dsn[at..]),
        None => dsn.to_string(),
    }
}

/// Parsed DSN
#[derive(Debug, Clone, PartialEq)]
pub struct DsnInfo {
    /// Username
    pub user: String,
    /// Password
    pub password: String,
    /// Target instance
    pub key: InstanceKey,
    /// Database name
    pub database: String,
    /// Query parameters in DSN order
    pub params: Vec<(String, String)>,
}

impl DsnInfo {
    /// Parse a DSN of the form `user:password@tcp(host:port)/database?params`
    ///
    /// The password may contain `:` and `@`; the user may not contain `:`.
    pub fn parse(dsn: &str) -> Result<Self> {
        let at = dsn
            .rfind("@tcp(")
            .ok_or_else(|| Error::InvalidDsn("missing '@tcp(' address".into()))?;
        let (auth, rest) = dsn.split_at(at);
        let rest = &rest["@tcp(".len()..];

        let (user, password) = match auth.split_once(':') {
            Some((user, password)) => (user.to_string(), password.to_string()),
            None => (auth.to_string(), String::new()),
        };

        let (address, rest) = rest
            .split_once(")/")
            .ok_or_else(|| Error::InvalidDsn("unterminated tcp(...) address".into()))?;
        let key: InstanceKey = address
            .parse()
            .map_err(|e| Error::InvalidDsn(format!("bad address '{}': {}", address, e)))?;

        let (database, query) = rest.split_once('?').unwrap_or((rest, ""));

        let mut params = Vec::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (name, value) = pair
                .split_once('=')
                .ok_or_else(|| Error::InvalidDsn(format!("parameter '{}' has no value", pair)))?;
            params.push((name.to_string(), value.to_string()));
        }

        Ok(Self {
            user,
            password,
            key,
            database: database.to_string(),
            params,
        })
    }

    /// Value of the first parameter named `name`
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Name of the referenced TLS policy, `None` for `tls=false` or no `tls` parameter
    pub fn tls_name(&self) -> Option<&str> {
        self.param("tls").filter(|name| *name != TLS_DISABLED)
    }

    /// Rebuild the configuration this DSN was rendered from.
    ///
    /// The TLS policy is resolved by name in `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is malformed or the TLS name is not registered.
    pub fn to_config(&self, registry: &TlsRegistry) -> Result<ConnectionConfig> {
        let mut config = ConnectionConfig::builder()
            .key(self.key.clone())
            .user(self.user.as_str())
            .password(self.password.as_str())
            .charset(self.param("charset").unwrap_or_default())
            .transaction_isolation(
                self.param("transaction_isolation")
                    .map(|v| v.trim_matches('"'))
                    .unwrap_or_default(),
            )
            .timeout(self.seconds("timeout")?.unwrap_or_default())
            .wait_timeout(self.seconds("wait_timeout")?.unwrap_or_default())
            .build();

        if let Some(name) = self.tls_name() {
            let policy = registry.get(name).ok_or_else(|| {
                Error::InvalidDsn(format!("TLS policy '{}' is not registered", name))
            })?;
            config.set_tls_policy(Some(policy));
        }
        Ok(config)
    }

    /// Parse a `<float>s` parameter
    fn seconds(&self, name: &str) -> Result<Option<f64>> {
        let Some(value) = self.param(name) else {
            return Ok(None);
        };
        value
            .strip_suffix('s')
            .and_then(|v| v.parse::<f64>().ok())
            .map(Some)
            .ok_or_else(|| Error::InvalidDsn(format!("bad duration {}={}", name, value)))
    }
}
