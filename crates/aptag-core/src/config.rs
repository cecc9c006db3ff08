// ── Runtime provisioning configuration ──
//
// These types describe *what* to provision and *how* to reach the
// controllers. They never touch disk: `aptag-config` reads the JSON file
// and the environment, then hands a fully-populated `ProvisionerConfig`
// in. After construction it is shared read-only behind an `Arc`.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;

use crate::model::TagTriple;

pub use aptag_netconf::NETCONF_PORT;

/// A wireless LAN controller the provisioner may talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirelessController {
    /// Controller name as announced on the bus. Also its network address.
    pub name: String,
    /// Port recorded in the config file. Only used for sessions when
    /// `SessionSettings::honor_controller_port` is set.
    pub port: u16,
    /// Pinned SHA-256 SSH host-key fingerprint.
    pub host_key: Option<String>,
}

/// MQTT subscription parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionConfig {
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    pub topic: String,
}

/// SSH host-key verification strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostKeyVerification {
    /// Accept unknown keys unless a fingerprint is pinned for the controller.
    #[default]
    AcceptUnpinned,
    /// Reject controllers without a pinned fingerprint.
    PinnedOnly,
}

/// Per-session settings shared by every provisioning run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Bound applied separately to open, edit, commit, and close.
    pub timeout: Duration,
    pub host_keys: HostKeyVerification,
    /// Use the controller's configured port instead of 830.
    pub honor_controller_port: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            host_keys: HostKeyVerification::default(),
            honor_controller_port: false,
        }
    }
}

/// Everything the provisioning pipeline reads.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    /// Ordered; lookups return the first match.
    pub controllers: Vec<WirelessController>,
    /// Keyed by MAC exactly as announced (case-sensitive).
    pub tag_map: HashMap<String, TagTriple>,
    pub subscription: SubscriptionConfig,
    pub session: SessionSettings,
    /// Upper bound on concurrent provisioning runs. `None` = unbounded.
    pub max_in_flight: Option<usize>,
}

/// Credentials used for every controller session.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}
