// Shared transport configuration for opening NETCONF sessions.
//
// Timeout and SSH host-key handling live here so that every session
// opened by a process uses the same settings.

use std::time::Duration;

/// Well-known NETCONF-over-SSH port (RFC 6242).
pub const NETCONF_PORT: u16 = 830;

/// How the SSH host key presented by a controller is verified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyPolicy {
    /// Accept any key when no fingerprint is pinned for the controller.
    /// Pinned fingerprints are still enforced.
    #[default]
    AcceptUnknown,
    /// Require a pinned fingerprint for every controller.
    PinnedOnly,
}

/// Shared transport configuration for NETCONF sessions.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub host_keys: HostKeyPolicy,
    /// Bound on TCP connect + SSH handshake + authentication + hello.
    pub connect_timeout: Duration,
    /// SSH inactivity timeout for an idle established session.
    pub inactivity_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host_keys: HostKeyPolicy::default(),
            connect_timeout: Duration::from_secs(30),
            inactivity_timeout: Duration::from_secs(120),
        }
    }
}

/// Normalise a fingerprint for comparison: drop an optional `SHA256:`
/// prefix and base64 padding.
pub fn normalize_fingerprint(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix("SHA256:")
        .unwrap_or(raw)
        .trim_end_matches('=')
}
