//! Database instance identity

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;

/// Identity of one MySQL endpoint.
///
/// The default value (`""`, `0`) denotes an unset key. Keys order by hostname, then port.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct InstanceKey {
    /// Hostname or IP address
    pub hostname: String,
    /// TCP port
    pub port: u16,
}

impl InstanceKey {
    /// Create a key from a hostname and port
    pub fn new(hostname: impl Into<String>, port: u16) -> Self {
        Self {
            hostname: hostname.into(),
            port,
        }
    }

    /// Parse `host:port`, `[ipv6]:port`, a bare hostname or a bare IPv6 literal.
    ///
    /// `default_port` is used when the input carries no port.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the hostname is empty or the port is not a valid `u16`.
    pub fn parse_with_default_port(host_port: &str, default_port: u16) -> Result<Self> {
        let (hostname, port) = split_host_port(host_port)?;
        let port = match port {
            Some(port) => parse_port(port, host_port)?,
            None => default_port,
        };
        Ok(Self::new(hostname, port))
    }

    /// Whether the key names a usable endpoint.
    ///
    /// `"_"` is the placeholder hostname used for detached instances.
    pub fn is_valid(&self) -> bool {
        !self.hostname.is_empty() && self.hostname != "_" && self.port > 0
    }

    /// Whether the hostname is an IPv6 literal
    pub fn is_ipv6(&self) -> bool {
        self.hostname.parse::<Ipv6Addr>().is_ok()
    }
}

impl std::fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

impl std::str::FromStr for InstanceKey {
    type Err = Error;

    /// Parse `host:port` or `[ipv6]:port`. The port is mandatory.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match split_host_port(s)? {
            (hostname, Some(port)) => Ok(Self::new(hostname, parse_port(port, s)?)),
            (_, None) => Err(Error::Config(format!(
                "instance key '{}' has no port: expected host:port",
                s
            ))),
        }
    }
}

/// Split an address into hostname and optional port text
fn split_host_port(s: &str) -> Result<(&str, Option<&str>)> {
    let (hostname, port) = if let Some(rest) = s.strip_prefix('[') {
        // [2001:db8::1]:3306
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| cannot_parse(s))?;
        let port = tail.strip_prefix(':').ok_or_else(|| cannot_parse(s))?;
        if !is_ipv6_literal(host) {
            return Err(cannot_parse(s));
        }
        (host, Some(port))
    } else {
        match s.matches(':').count() {
            0 => (s, None),
            1 => {
                let (host, port) = s.split_once(':').ok_or_else(|| cannot_parse(s))?;
                (host, Some(port))
            }
            // Bare IPv6 literal, never carries a port
            _ if is_ipv6_literal(s) => (s, None),
            _ => return Err(cannot_parse(s)),
        }
    };

    if hostname.is_empty() {
        return Err(Error::Config(format!(
            "instance key '{}' has an empty hostname",
            s
        )));
    }
    Ok((hostname, port))
}

fn parse_port(port: &str, input: &str) -> Result<u16> {
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(cannot_parse(input));
    }
    port.parse()
        .map_err(|_| Error::Config(format!("invalid port '{}' in '{}'", port, input)))
}

/// Same rule `is_ipv6` and DSN rendering use, so bracketed output parses back
fn is_ipv6_literal(s: &str) -> bool {
    s.parse::<Ipv6Addr>().is_ok()
}

fn cannot_parse(s: &str) -> Error {
    Error::Config(format!("cannot parse instance key from '{}'", s))
}
