//! Metrics for TLS policy handling
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding process installs a recorder. Rendering a DSN records nothing.

/// Label names and values
pub mod labels {
    /// Outcome of a registry registration
    pub const OUTCOME: &str = "outcome";
    /// A new entry was stored
    pub const OUTCOME_REGISTERED: &str = "registered";
    /// The name was already taken; the existing entry was kept
    pub const OUTCOME_EXISTING: &str = "existing";

    /// Certificate verification mode of a built policy
    pub const MODE: &str = "mode";
    /// Server certificates are not verified
    pub const MODE_INSECURE: &str = "insecure";
    /// Verified against a custom CA file
    pub const MODE_CUSTOM_CA: &str = "custom_ca";
    /// Verified against system or bundled roots
    pub const MODE_SYSTEM_ROOTS: &str = "system_roots";
}

/// Counter metrics
pub mod counters {
    use super::labels;

    /// Registry registration attempt, by outcome
    pub fn tls_registration(outcome: &'static str) {
        ::metrics::counter!(
            "ghost_mysql_tls_registrations_total",
            labels::OUTCOME => outcome
        )
        .increment(1);
    }

    /// Successful TLS policy build, by verification mode
    pub fn tls_policy_built(mode: &'static str) {
        ::metrics::counter!(
            "ghost_mysql_tls_policy_builds_total",
            labels::MODE => mode
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_without_recorder_are_noops() {
        counters::tls_registration(labels::OUTCOME_REGISTERED);
        counters::tls_policy_built(labels::MODE_INSECURE);
    }
}
