//! Connection configuration

use super::registry::TlsRegistry;
use super::tls::{self, TlsOptions, TlsPolicy, TLS_CONFIG_KEY};
use crate::instance::InstanceKey;
use crate::Result;
use std::sync::Arc;

/// Connection configuration for one MySQL instance.
///
/// Holds the target identity, credentials, session settings and an optional TLS
/// policy. Construct one per credential set, then derive per-host copies with
/// [`duplicate_credentials`](Self::duplicate_credentials).
///
/// Nothing here is validated; bad values surface when the driver opens the DSN.
#[derive(Clone, Default)]
pub struct ConnectionConfig {
    /// Identity used to connect
    pub key: InstanceKey,
    /// Username
    pub user: String,
    /// Password
    pub password: String,
    /// Session isolation level, e.g. `REPEATABLE-READ` (empty = server default)
    pub transaction_isolation: String,
    /// Character set, or comma-separated fallback list
    pub charset: String,
    /// Connect, read and write timeout in seconds
    pub timeout: f64,
    /// Server-side `wait_timeout` in seconds (0 = not requested)
    pub wait_timeout: f64,
    // None follows `key`
    implied_key: Option<InstanceKey>,
    tls_policy: Option<Arc<TlsPolicy>>,
}

impl ConnectionConfig {
    /// Create a configuration with every field unset
    ///
    /// # Defaults
    ///
    /// - `key`, `implied_key`: `("", 0)`
    /// - `user`, `password`, `transaction_isolation`, `charset`: empty
    /// - `timeout`, `wait_timeout`: `0.0`
    /// - TLS policy: none
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = ConnectionConfig::builder()
    ///     .key(InstanceKey::new("myhost", 3306))
    ///     .user("gromit")
    ///     .password("penguin")
    ///     .timeout(1.2345)
    ///     .build();
    /// ```
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::default()
    }

    /// Copy credentials and session settings onto a new identity.
    ///
    /// Both `key` and `implied_key` of the result equal `key`. The TLS policy is
    /// shared by reference; everything else is an independent copy.
    pub fn duplicate_credentials(&self, key: InstanceKey) -> Self {
        Self {
            key,
            implied_key: None,
            user: self.user.clone(),
            password: self.password.clone(),
            transaction_isolation: self.transaction_isolation.clone(),
            charset: self.charset.clone(),
            timeout: self.timeout,
            wait_timeout: self.wait_timeout,
            tls_policy: self.tls_policy.clone(),
        }
    }

    /// Independent copy keeping this config's `key`.
    ///
    /// `implied_key` of the copy is reset to `key`.
    pub fn duplicate(&self) -> Self {
        self.duplicate_credentials(self.key.clone())
    }

    /// Identity as originally resolved, before any host mapping.
    ///
    /// Equals `key` unless diverged with [`set_implied_key`](Self::set_implied_key).
    pub fn implied_key(&self) -> &InstanceKey {
        self.implied_key.as_ref().unwrap_or(&self.key)
    }

    /// Remember a logical identity distinct from `key`
    pub fn set_implied_key(&mut self, key: InstanceKey) {
        self.implied_key = Some(key);
    }

    /// Check if both configs address the same instance, directly or by implied identity
    pub fn same_instance(&self, other: &ConnectionConfig) -> bool {
        self.key == other.key || self.implied_key() == other.implied_key()
    }

    /// TLS policy, if any
    pub fn tls_policy(&self) -> Option<&Arc<TlsPolicy>> {
        self.tls_policy.as_ref()
    }

    /// Check if connections will negotiate TLS
    pub fn uses_tls(&self) -> bool {
        self.tls_policy.is_some()
    }

    /// Set or clear the TLS policy.
    ///
    /// The policy must also be registered under [`TLS_CONFIG_KEY`] before the DSN
    /// is opened; see [`register_tls_policy`](Self::register_tls_policy).
    pub fn set_tls_policy(&mut self, policy: Option<Arc<TlsPolicy>>) {
        self.tls_policy = policy;
    }

    /// Register this config's TLS policy under [`TLS_CONFIG_KEY`].
    ///
    /// Does nothing without a policy. If another policy already holds the name,
    /// this config adopts it so the DSN and the handle agree.
    ///
    /// # Errors
    ///
    /// Returns an error if `key.hostname` cannot serve as a TLS server name.
    pub fn register_tls_policy(&mut self, registry: &TlsRegistry) -> Result<()> {
        let Some(policy) = self.tls_policy.clone() else {
            return Ok(());
        };
        tls::server_name(&self.key)?;
        self.tls_policy = Some(registry.register(TLS_CONFIG_KEY, policy));
        Ok(())
    }

    /// Build a TLS policy from `options`, register it and attach it to this config.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy cannot be built or `key.hostname` cannot serve
    /// as a TLS server name.
    pub fn use_tls(&mut self, registry: &TlsRegistry, options: TlsOptions) -> Result<()> {
        tls::server_name(&self.key)?;
        let policy = TlsPolicy::from_options(options)?;
        self.tls_policy = Some(Arc::new(policy));
        self.register_tls_policy(registry)?;

        tracing::info!(
            instance = %self.key,
            insecure = self.tls_policy.as_ref().is_some_and(|p| p.allow_insecure()),
            "TLS enabled"
        );
        Ok(())
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}, user={}, usingTLS={}",
            self.key,
            self.user,
            self.uses_tls()
        )
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("key", &self.key)
            .field("implied_key", self.implied_key())
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("transaction_isolation", &self.transaction_isolation)
            .field("charset", &self.charset)
            .field("timeout", &self.timeout)
            .field("wait_timeout", &self.wait_timeout)
            .field("tls_policy", &self.tls_policy)
            .finish()
    }
}

/// Builder for [`ConnectionConfig`]
///
/// `build()` sets `implied_key` equal to `key`.
#[derive(Clone, Default)]
pub struct ConnectionConfigBuilder {
    key: InstanceKey,
    user: String,
    password: String,
    transaction_isolation: String,
    charset: String,
    timeout: f64,
    wait_timeout: f64,
    tls_policy: Option<Arc<TlsPolicy>>,
}

impl ConnectionConfigBuilder {
    /// Set the target instance
    pub fn key(mut self, key: InstanceKey) -> Self {
        self.key = key;
        self
    }

    /// Set the username
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the session isolation level
    pub fn transaction_isolation(mut self, isolation: impl Into<String>) -> Self {
        self.transaction_isolation = isolation.into();
        self
    }

    /// Set the character set or fallback list
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    /// Set connect/read/write timeout
    ///
    /// # Arguments
    ///
    /// * `seconds` - Timeout in (fractional) seconds
    pub fn timeout(mut self, seconds: f64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set server-side wait timeout. `0.0` leaves it unrequested.
    pub fn wait_timeout(mut self, seconds: f64) -> Self {
        self.wait_timeout = seconds;
        self
    }

    /// Attach a TLS policy
    pub fn tls_policy(mut self, policy: Arc<TlsPolicy>) -> Self {
        self.tls_policy = Some(policy);
        self
    }

    /// Build the configuration
    pub fn build(self) -> ConnectionConfig {
        ConnectionConfig {
            key: self.key,
            implied_key: None,
            user: self.user,
            password: self.password,
            transaction_isolation: self.transaction_isolation,
            charset: self.charset,
            timeout: self.timeout,
            wait_timeout: self.wait_timeout,
            tls_policy: self.tls_policy,
        }
    }
}
