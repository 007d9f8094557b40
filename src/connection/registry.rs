//! Name-keyed store of TLS policies
//!
//! DSNs reference TLS policies by name only; whoever opens the connection resolves
//! the name here. Handles are cheap to clone and all clones share one map.

use super::tls::TlsPolicy;
use crate::metrics::{counters, labels};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared registry of TLS policies.
///
/// Registration is register-if-absent: the first policy stored under a name wins
/// and stays for the lifetime of the registry.
#[derive(Debug, Clone, Default)]
pub struct TlsRegistry {
    policies: Arc<RwLock<HashMap<String, Arc<TlsPolicy>>>>,
}

impl TlsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `policy` under `name` unless the name is taken.
    ///
    /// Returns the policy held under `name` after the call: `policy` itself if it
    /// was stored, otherwise the previously registered one. The entry is visible to
    /// every clone of this registry before this returns.
    pub fn register(&self, name: impl Into<String>, policy: Arc<TlsPolicy>) -> Arc<TlsPolicy> {
        let name = name.into();
        let mut policies = self.policies.write();

        if let Some(existing) = policies.get(&name) {
            if !Arc::ptr_eq(existing, &policy) && existing.options() != policy.options() {
                tracing::warn!(
                    name = %name,
                    "TLS policy already registered with different options, keeping existing"
                );
            }
            counters::tls_registration(labels::OUTCOME_EXISTING);
            return existing.clone();
        }

        tracing::debug!(name = %name, "registered TLS policy");
        counters::tls_registration(labels::OUTCOME_REGISTERED);
        policies.insert(name, policy.clone());
        policy
    }

    /// Look up the policy registered under `name`
    pub fn get(&self, name: &str) -> Option<Arc<TlsPolicy>> {
        self.policies.read().get(name).cloned()
    }

    /// Check if `name` is registered
    pub fn contains(&self, name: &str) -> bool {
        self.policies.read().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.policies.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered policies
    pub fn len(&self) -> usize {
        self.policies.read().len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.policies.read().is_empty()
    }
}
