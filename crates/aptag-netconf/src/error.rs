use thiserror::Error;

/// Top-level error type for the `aptag-netconf` crate.
///
/// Covers every failure mode of a NETCONF session: SSH establishment,
/// authentication, message framing, XML decoding, and RPC exchange.
/// `aptag-core` maps these into provisioning errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Establishment ───────────────────────────────────────────────
    /// TCP or SSH handshake failed before authentication.
    #[error("Cannot connect to {address}: {reason}")]
    Connect { address: String, reason: String },

    /// The controller rejected the username/password pair.
    #[error("Authentication failed for user '{username}' on {address}")]
    Authentication { username: String, address: String },

    /// The controller presented a host key that the policy does not accept.
    #[error("Host key for {address} rejected")]
    HostKeyRejected { address: String },

    /// The controller refused the `netconf` subsystem request.
    #[error("NETCONF subsystem unavailable on {address}")]
    SubsystemRefused { address: String },

    // ── Transport ───────────────────────────────────────────────────
    /// Error raised by the SSH library after the session was set up.
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Read or write on the NETCONF channel failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the channel while a reply was expected.
    #[error("Session closed by peer")]
    SessionClosed,

    /// An operation did not complete in time.
    #[error("Timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Protocol ────────────────────────────────────────────────────
    /// Malformed end-of-message or chunked frame.
    #[error("Framing error: {0}")]
    Framing(String),

    /// The peer sent XML that could not be decoded.
    #[error("XML error: {0}")]
    Xml(String),

    /// Server hello did not advertise a base capability we speak.
    #[error("Server does not support NETCONF base:1.0 or base:1.1")]
    NoCommonBase,

    /// The reply carried a `message-id` other than the one we sent.
    #[error("Reply message-id mismatch: expected {expected}, got {got}")]
    MessageIdMismatch { expected: u64, got: String },
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Self::Xml(err.to_string())
    }
}
